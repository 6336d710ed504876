//! Date ordering for tour date lists.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tourbook_types::TourDateEntry;

/// Which way to order shows by date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Earliest first.
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Latest first.
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Stable sort by show date.
///
/// Entries with the same date keep their relative order in both
/// directions; descending is not a reversal of ascending.
pub fn sort_by_date(entries: &mut [TourDateEntry], direction: SortDirection) {
    match direction {
        SortDirection::Ascending => entries.sort_by_key(|e| e.date.date),
        SortDirection::Descending => entries.sort_by_key(|e| Reverse(e.date.date)),
    }
}
