//! Aggregates for summary views: recency previews, per-band statistics
//! and collection totals.

use std::cmp::Reverse;

use serde::Serialize;
use tourbook_types::{Band, BandId, Timestamp, Tour, TourDateEntry};

use crate::Snapshot;
use crate::entries::flatten;
use crate::filter::is_upcoming;
use crate::lookup::band_tours;
use crate::sort::{SortDirection, sort_by_date};

/// How many items a preview shows unless configured otherwise.
pub const DEFAULT_PREVIEW_LIMIT: usize = 3;

/// The most recently added bands, newest first, at most `limit` of them.
pub fn recent_bands(bands: &[Band], limit: usize) -> Vec<&Band> {
    let mut recent: Vec<&Band> = bands.iter().collect();
    recent.sort_by_key(|b| Reverse(b.created_at));
    recent.truncate(limit);
    recent
}

/// The next upcoming shows after `now`, soonest first, at most `limit`.
pub fn next_tour_dates(tours: &[Tour], now: Timestamp, limit: usize) -> Vec<TourDateEntry> {
    let mut upcoming: Vec<TourDateEntry> = flatten(tours)
        .into_iter()
        .filter(|e| is_upcoming(e, now))
        .collect();
    sort_by_date(&mut upcoming, SortDirection::Ascending);
    upcoming.truncate(limit);
    upcoming
}

/// Bands whose name or genre contains `term`, ignoring case.
///
/// An empty term returns every band.
pub fn search_bands<'a>(bands: &'a [Band], term: &str) -> Vec<&'a Band> {
    let needle = term.to_lowercase();
    bands
        .iter()
        .filter(|b| {
            b.name.to_lowercase().contains(&needle) || b.genre.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Per-band numbers shown on a band card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandStats {
    /// Number of tours recorded for the band.
    pub tour_count: usize,
    /// Number of the band's shows strictly after the evaluation instant.
    pub upcoming_dates: usize,
}

/// Tour and upcoming-show counts for one band.
pub fn band_stats(tours: &[Tour], band_id: BandId, now: Timestamp) -> BandStats {
    let own = band_tours(tours, band_id);
    BandStats {
        tour_count: own.len(),
        upcoming_dates: own
            .iter()
            .flat_map(|t| t.dates.iter())
            .filter(|d| d.date > now)
            .count(),
    }
}

/// Size of each collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Number of bands.
    pub bands: usize,
    /// Number of tours.
    pub tours: usize,
    /// Number of tour dates across every tour.
    pub dates: usize,
}

/// Count bands, tours and tour dates.
pub fn totals(snapshot: &Snapshot<'_>) -> Totals {
    Totals {
        bands: snapshot.bands.len(),
        tours: snapshot.tours.len(),
        dates: snapshot.tours.iter().map(|t| t.dates.len()).sum(),
    }
}

/// Everything the landing view needs in one value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview<'a> {
    /// Newest bands first.
    pub recent_bands: Vec<&'a Band>,
    /// Soonest upcoming shows first.
    pub next_dates: Vec<TourDateEntry>,
    /// Collection sizes.
    pub totals: Totals,
}

/// Build the landing view summary, with each preview capped at `limit`.
pub fn overview<'a>(snapshot: &Snapshot<'a>, now: Timestamp, limit: usize) -> Overview<'a> {
    Overview {
        recent_bands: recent_bands(snapshot.bands, limit),
        next_dates: next_tour_dates(snapshot.tours, now, limit),
        totals: totals(snapshot),
    }
}
