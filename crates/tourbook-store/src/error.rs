//! Error types for the store and its persistence layer.
//!
//! [`StoreError`] is what callers of the entity store see. Validation and
//! not-found failures leave the store untouched and are safe to report to
//! the user and retry. [`StoreError::Persistence`] means the in-memory
//! change was applied but could not be made durable.

use std::path::PathBuf;

use tourbook_types::{BandId, TourId};

/// Errors raised while reading or writing the persisted snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The storage location could not be prepared.
    #[error("failed to open storage at {}: {source}", path.display())]
    Open {
        /// Directory that could not be created or accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading a key from the medium failed.
    #[error("failed to read `{key}`: {source}")]
    Read {
        /// Key being read.
        key: &'static str,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Writing a key to the medium failed.
    #[error("failed to write `{key}`: {source}")]
    Write {
        /// Key being written.
        key: &'static str,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A collection could not be serialized.
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        /// Key being written.
        key: &'static str,
        /// The underlying serialization error.
        source: serde_json::Error,
    },

    /// A stored value is not a valid collection.
    #[error("failed to decode `{key}`: {source}")]
    Decode {
        /// Key being read.
        key: &'static str,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },
}

/// Errors returned by [`EntityStore`](crate::store::EntityStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A creation input is missing a required value.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending input field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The referenced band does not exist.
    #[error("band not found: {0}")]
    BandNotFound(BandId),

    /// The referenced tour does not exist.
    #[error("tour not found: {0}")]
    TourNotFound(TourId),

    /// The change could not be persisted; it may not survive a restart.
    #[error("changes may not be saved: {0}")]
    Persistence(#[from] PersistError),
}

impl StoreError {
    /// Whether the store was left exactly as it was before the call.
    ///
    /// `false` only for [`StoreError::Persistence`], where the in-memory
    /// mutation has already been applied.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }

    pub(crate) fn blank(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "must not be blank".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_errors_are_not_recoverable() {
        let err = StoreError::from(PersistError::Write {
            key: "bands",
            source: std::io::Error::other("disk full"),
        });
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "changes may not be saved: failed to write `bands`: disk full"
        );
    }

    #[test]
    fn lookup_and_validation_errors_are_recoverable() {
        assert!(StoreError::BandNotFound(BandId::new()).is_recoverable());
        assert!(StoreError::TourNotFound(TourId::new()).is_recoverable());
        let blank = StoreError::blank("name");
        assert!(blank.is_recoverable());
        assert_eq!(blank.to_string(), "invalid name: must not be blank");
    }
}
