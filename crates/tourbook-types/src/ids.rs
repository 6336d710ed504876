//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Bands, tours and tour dates each get their own identifier type so they
//! cannot be mixed up at compile time. New identifiers are random UUID v4
//! values drawn from the operating system's cryptographic RNG. Nothing may
//! derive ordering from them.
//!
//! On the wire every identifier is a plain UUID string.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier (UUID v4).
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a tracked band.
    BandId
}

define_id! {
    /// Unique identifier for a tour.
    TourId
}

define_id! {
    /// Unique identifier for a single tour date, unique across all tours.
    TourDateId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn new_ids_are_random_v4() {
        let id = BandId::new();
        assert_eq!(id.into_inner().get_version_num(), 4);
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let ids: BTreeSet<TourDateId> = (0..1000).map(|_| TourDateId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = TourId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let restored: TourId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn id_parses_from_display() {
        let id = BandId::new();
        let parsed: BandId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<BandId>().is_err());
    }
}
