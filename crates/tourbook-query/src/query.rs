//! One-call tour date queries for the list views.

use serde::{Deserialize, Serialize};
use tourbook_types::{BandId, Timestamp, TourDateEntry};

use crate::Snapshot;
use crate::entries::flatten;
use crate::filter::TourDateFilter;
use crate::sort::{SortDirection, sort_by_date};

/// Flatten, filter and sort tour dates in one step.
///
/// The default query returns every date, earliest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TourDateQuery {
    /// Which entries to keep.
    pub filter: TourDateFilter,
    /// How to order the survivors.
    pub direction: SortDirection,
}

impl TourDateQuery {
    /// Every date, earliest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Future dates only, earliest first.
    pub fn upcoming() -> Self {
        Self::new().upcoming_only(true)
    }

    /// Future dates in one city or country, earliest first.
    pub fn at_location(token: impl Into<String>) -> Self {
        let mut query = Self::upcoming();
        query.filter.location = Some(token.into());
        query
    }

    /// Toggle the "upcoming only" criterion.
    #[must_use]
    pub const fn upcoming_only(mut self, upcoming_only: bool) -> Self {
        self.filter.upcoming_only = upcoming_only;
        self
    }

    /// Restrict to one band, or lift the restriction with `None`.
    #[must_use]
    pub const fn band(mut self, band: Option<BandId>) -> Self {
        self.filter.band = band;
        self
    }

    /// Set the free-text search term.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.filter.search = Some(term.into());
        self
    }

    /// Set the sort direction.
    #[must_use]
    pub const fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Run against `snapshot`, reading the clock once for this call.
    pub fn run(&self, snapshot: &Snapshot<'_>) -> Vec<TourDateEntry> {
        self.run_at(snapshot, Timestamp::now())
    }

    /// Run against `snapshot` with an explicit evaluation instant.
    pub fn run_at(&self, snapshot: &Snapshot<'_>, now: Timestamp) -> Vec<TourDateEntry> {
        let mut entries = self.filter.apply(flatten(snapshot.tours), now);
        sort_by_date(&mut entries, self.direction);
        entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tourbook_types::{NewTourDate, Tour, TourDateId, TourId};

    use super::*;

    fn tour(band_id: BandId, band_name: &str, shows: &[(i32, &str, &str)]) -> Tour {
        Tour {
            id: TourId::new(),
            band_id,
            band_name: band_name.to_owned(),
            dates: shows
                .iter()
                .map(|(year, city, country)| {
                    NewTourDate::new(
                        Timestamp::from_ymd_hms(*year, 1, 1, 20, 0, 0).unwrap(),
                        "Hall",
                        *city,
                        *country,
                    )
                    .into_tour_date(TourDateId::new())
                })
                .collect(),
            created_at: Timestamp::from_ymd_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn now() -> Timestamp {
        Timestamp::from_ymd_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn years(entries: &[TourDateEntry]) -> Vec<String> {
        entries.iter().map(|e| e.date.date.to_iso()).collect()
    }

    #[test]
    fn default_query_lists_everything_ascending() {
        let a = BandId::new();
        let tours = vec![tour(a, "A", &[(2999, "Oslo", "Norway"), (2020, "Rome", "Italy")])];
        let snapshot = Snapshot::new(&[], &tours);
        let result = TourDateQuery::new().run_at(&snapshot, now());
        assert_eq!(
            years(&result),
            vec!["2020-01-01T20:00:00.000Z", "2999-01-01T20:00:00.000Z"]
        );
    }

    #[test]
    fn upcoming_band_search_descending() {
        let a = BandId::new();
        let b = BandId::new();
        let tours = vec![
            tour(a, "Aphex", &[(2998, "Berlin", "Germany"), (2020, "Berlin", "Germany")]),
            tour(b, "Boards", &[(2999, "Berlin", "Germany")]),
            tour(a, "Aphex", &[(2999, "Paris", "France")]),
        ];
        let snapshot = Snapshot::new(&[], &tours);
        let result = TourDateQuery::upcoming()
            .band(Some(a))
            .search("germany")
            .direction(SortDirection::Descending)
            .run_at(&snapshot, now());
        assert_eq!(result.len(), 1);
        assert_eq!(result.first().map(|e| e.band_id), Some(a));
        assert_eq!(years(&result), vec!["2998-01-01T20:00:00.000Z"]);
    }

    #[test]
    fn location_view_is_upcoming_and_exact() {
        let a = BandId::new();
        let tours = vec![tour(
            a,
            "A",
            &[
                (2999, "Berlin", "Germany"),
                (2020, "Berlin", "Germany"),
                (2999, "Berlingen", "Swiss"),
            ],
        )];
        let snapshot = Snapshot::new(&[], &tours);
        let result = TourDateQuery::at_location("berlin").run_at(&snapshot, now());
        assert_eq!(result.len(), 1);
        assert_eq!(result.first().map(|e| e.date.city.as_str()), Some("Berlin"));
    }

    #[test]
    fn run_uses_the_current_clock() {
        let a = BandId::new();
        let tours = vec![tour(a, "A", &[(2999, "Oslo", "Norway"), (2001, "Rome", "Italy")])];
        let snapshot = Snapshot::new(&[], &tours);
        let result = TourDateQuery::upcoming().run(&snapshot);
        assert_eq!(years(&result), vec!["2999-01-01T20:00:00.000Z"]);
    }

    #[test]
    fn query_deserializes_with_defaults() {
        let json = r#"{"direction": "desc", "filter": {"upcomingOnly": true}}"#;
        let query: TourDateQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query, TourDateQuery::upcoming().direction(SortDirection::Descending));
        let empty: TourDateQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, TourDateQuery::new());
    }
}
