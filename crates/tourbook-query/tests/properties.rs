//! Behavioural properties of the query layer over a hand-built snapshot.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use tourbook_query::filter::{matches_band, matches_search};
use tourbook_query::sort::sort_by_date;
use tourbook_query::{Snapshot, SortDirection, TourDateFilter, TourDateQuery};
use tourbook_types::{
    Band, BandId, NewTourDate, Timestamp, Tour, TourDateEntry, TourDateId, TourId,
};

fn band(name: &str) -> Band {
    Band {
        id: BandId::new(),
        name: name.to_owned(),
        genre: "Various".to_owned(),
        image_url: None,
        created_at: Timestamp::from_ymd_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn show(year: i32, venue: &str, city: &str, country: &str) -> NewTourDate {
    NewTourDate::new(
        Timestamp::from_ymd_hms(year, 1, 1, 20, 0, 0).unwrap(),
        venue,
        city,
        country,
    )
}

fn tour(band: &Band, shows: Vec<NewTourDate>) -> Tour {
    Tour {
        id: TourId::new(),
        band_id: band.id,
        band_name: band.name.clone(),
        dates: shows
            .into_iter()
            .map(|s| s.into_tour_date(TourDateId::new()))
            .collect(),
        created_at: band.created_at,
    }
}

fn fixture() -> (Vec<Band>, Vec<Tour>) {
    let aphex = band("Aphex");
    let boards = band("Boards of Canada");
    let tours = vec![
        tour(
            &aphex,
            vec![
                show(2999, "Arena", "Berlin", "Germany"),
                show(2020, "Club", "Berlin", "Germany"),
                show(2999, "Hall", "Toronto", "Canada"),
            ],
        ),
        tour(
            &boards,
            vec![
                show(2999, "Arena", "Berlin", "Germany"),
                show(2030, "Stadium", "Paris", "France"),
            ],
        ),
    ];
    (vec![aphex, boards], tours)
}

fn now() -> Timestamp {
    Timestamp::from_ymd_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn ids(entries: &[TourDateEntry]) -> Vec<TourDateId> {
    entries.iter().map(|e| e.date.id).collect()
}

#[test]
fn band_and_text_filters_commute() {
    let (bands, tours) = fixture();
    let snapshot = Snapshot::new(&bands, &tours);
    let entries = snapshot.entries();

    for band in [None, Some(bands[0].id), Some(bands[1].id), Some(BandId::new())] {
        for term in [None, Some("canada"), Some("berlin"), Some("ARENA"), Some("")] {
            let band_then_text: Vec<TourDateEntry> = entries
                .iter()
                .filter(|e| matches_band(e, band))
                .filter(|e| matches_search(e, term))
                .cloned()
                .collect();
            let text_then_band: Vec<TourDateEntry> = entries
                .iter()
                .filter(|e| matches_search(e, term))
                .filter(|e| matches_band(e, band))
                .cloned()
                .collect();
            assert_eq!(ids(&band_then_text), ids(&text_then_band));
        }
    }
}

#[test]
fn filter_results_equal_intersection_of_single_filters() {
    let (bands, tours) = fixture();
    let snapshot = Snapshot::new(&bands, &tours);
    let all = snapshot.entries();

    let combined = TourDateFilter {
        upcoming_only: true,
        band: Some(bands[0].id),
        search: Some("arena".to_owned()),
        location: None,
    };
    let only_upcoming = TourDateFilter {
        upcoming_only: true,
        ..TourDateFilter::default()
    };
    let only_band = TourDateFilter {
        band: Some(bands[0].id),
        ..TourDateFilter::default()
    };
    let only_text = TourDateFilter {
        search: Some("arena".to_owned()),
        ..TourDateFilter::default()
    };

    let expected: Vec<TourDateId> = all
        .iter()
        .filter(|e| only_upcoming.matches(e, now()))
        .filter(|e| only_band.matches(e, now()))
        .filter(|e| only_text.matches(e, now()))
        .map(|e| e.date.id)
        .collect();
    assert_eq!(ids(&combined.apply(all, now())), expected);
    assert_eq!(expected.len(), 1);
}

#[test]
fn identical_dates_keep_flatten_order_across_repeated_sorts() {
    let (bands, tours) = fixture();
    let snapshot = Snapshot::new(&bands, &tours);
    let flattened = snapshot.entries();
    let aphex_arena = flattened[0].date.id;
    let boards_arena = flattened[3].date.id;
    assert_eq!(flattened[0].date.date, flattened[3].date.date);

    let mut entries = flattened;
    for direction in [
        SortDirection::Descending,
        SortDirection::Ascending,
        SortDirection::Descending,
        SortDirection::Ascending,
    ] {
        sort_by_date(&mut entries, direction);
        let first = entries.iter().position(|e| e.date.id == aphex_arena).unwrap();
        let second = entries.iter().position(|e| e.date.id == boards_arena).unwrap();
        assert!(first < second, "tie order flipped for {direction:?}");
    }
}

#[test]
fn location_scenario_is_exact_and_case_insensitive() {
    let (bands, tours) = fixture();
    let snapshot = Snapshot::new(&bands, &tours);

    let exact = TourDateQuery::at_location("Berlin").run_at(&snapshot, now());
    let lower = TourDateQuery::at_location("berlin").run_at(&snapshot, now());
    let partial = TourDateQuery::at_location("Berl").run_at(&snapshot, now());

    assert_eq!(exact.len(), 2);
    assert_eq!(ids(&exact), ids(&lower));
    assert!(partial.is_empty());
}

#[test]
fn upcoming_scenario_drops_past_dates() {
    let band = band("Solo");
    let tours = vec![
        tour(&band, vec![show(2020, "Old", "Rome", "Italy")]),
        tour(&band, vec![show(2999, "New", "Rome", "Italy")]),
    ];
    let bands = vec![band];
    let snapshot = Snapshot::new(&bands, &tours);

    let upcoming = TourDateQuery::upcoming().run(&snapshot);
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].date.venue, "New");

    let everything = TourDateQuery::new().run(&snapshot);
    assert_eq!(everything.len(), 2);
}
