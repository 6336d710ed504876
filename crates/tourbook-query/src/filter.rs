//! Predicates for narrowing a list of [`TourDateEntry`] rows.
//!
//! Each predicate is independent. [`TourDateFilter`] combines them with a
//! logical AND, so the order in which they are checked never changes which
//! entries survive.

use serde::{Deserialize, Serialize};
use tourbook_types::{BandId, Timestamp, TourDateEntry};

/// True when the entry's show starts strictly after `now`.
pub fn is_upcoming(entry: &TourDateEntry, now: Timestamp) -> bool {
    entry.date.date > now
}

/// True when no band is selected or the entry belongs to `band`.
pub fn matches_band(entry: &TourDateEntry, band: Option<BandId>) -> bool {
    band.is_none_or(|id| entry.band_id == id)
}

/// Case-insensitive substring search over band name, venue, city and
/// country. An absent or empty term matches everything.
pub fn matches_search(entry: &TourDateEntry, term: Option<&str>) -> bool {
    let Some(term) = term.filter(|t| !t.is_empty()) else {
        return true;
    };
    let needle = term.to_lowercase();
    [
        entry.band_name.as_str(),
        entry.date.venue.as_str(),
        entry.date.city.as_str(),
        entry.date.country.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Case-insensitive exact match of `token` against city or country.
///
/// Stricter than [`matches_search`]: `"Berl"` does not match `"Berlin"`.
/// An empty token matches nothing.
pub fn matches_location(entry: &TourDateEntry, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let token = token.to_lowercase();
    entry.date.city.to_lowercase() == token || entry.date.country.to_lowercase() == token
}

/// Criteria for the tour date list views.
///
/// Unset criteria are no-ops. Set criteria must all pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TourDateFilter {
    /// Keep only shows strictly after the evaluation instant.
    pub upcoming_only: bool,
    /// Keep only shows of this band.
    pub band: Option<BandId>,
    /// Free-text search term (see [`matches_search`]).
    pub search: Option<String>,
    /// City or country token (see [`matches_location`]).
    pub location: Option<String>,
}

impl TourDateFilter {
    /// Whether `entry` passes every active criterion at instant `now`.
    pub fn matches(&self, entry: &TourDateEntry, now: Timestamp) -> bool {
        (!self.upcoming_only || is_upcoming(entry, now))
            && matches_band(entry, self.band)
            && matches_search(entry, self.search.as_deref())
            && self
                .location
                .as_deref()
                .is_none_or(|token| matches_location(entry, token))
    }

    /// Keep the entries that pass, preserving their order.
    pub fn apply(&self, entries: Vec<TourDateEntry>, now: Timestamp) -> Vec<TourDateEntry> {
        entries
            .into_iter()
            .filter(|entry| self.matches(entry, now))
            .collect()
    }

    /// Whether any criterion is active.
    pub const fn is_active(&self) -> bool {
        self.upcoming_only
            || self.band.is_some()
            || self.search.is_some()
            || self.location.is_some()
    }
}
