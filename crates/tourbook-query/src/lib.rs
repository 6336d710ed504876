//! Derived queries over the Tourbook band and tour collections.
//!
//! Every function in this crate is a pure function of a borrowed
//! [`Snapshot`] (or its slices), optional criteria and, where time matters,
//! an evaluation instant. Nothing here mutates, caches or performs I/O, so
//! the same snapshot may be queried any number of times.
//!
//! # Modules
//!
//! - [`lookup`] -- Find bands, tours and tour dates by id; band to tours.
//! - [`entries`] -- Flatten tours into ordered [`TourDateEntry`] rows.
//! - [`filter`] -- Time, band, text-search and location predicates.
//! - [`sort`] -- Stable date ordering in either direction.
//! - [`query`] -- [`TourDateQuery`]: flatten, filter and sort in one call.
//! - [`summary`] -- Recency previews, per-band stats and collection totals.
//!
//! [`TourDateEntry`]: tourbook_types::TourDateEntry

pub mod entries;
pub mod filter;
pub mod lookup;
pub mod query;
pub mod sort;
pub mod summary;

use tourbook_types::{Band, BandId, Tour, TourDateEntry, TourId};

pub use filter::TourDateFilter;
pub use query::TourDateQuery;
pub use sort::SortDirection;
pub use summary::{BandStats, Overview, Totals};

/// A read-only view of the store's collections at one instant.
///
/// Holding a snapshot borrows the store, so a consumer has to take a fresh
/// one after every mutation.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// All bands in insertion order.
    pub bands: &'a [Band],
    /// All tours in insertion order, each with its dates.
    pub tours: &'a [Tour],
}

impl<'a> Snapshot<'a> {
    /// Wrap the two collections.
    pub const fn new(bands: &'a [Band], tours: &'a [Tour]) -> Self {
        Self { bands, tours }
    }

    /// Find a band by id.
    pub fn band(&self, id: BandId) -> Option<&'a Band> {
        lookup::find_band(self.bands, id)
    }

    /// Find a tour by id.
    pub fn tour(&self, id: TourId) -> Option<&'a Tour> {
        lookup::find_tour(self.tours, id)
    }

    /// All tours of one band, in collection order.
    pub fn band_tours(&self, band_id: BandId) -> Vec<&'a Tour> {
        lookup::band_tours(self.tours, band_id)
    }

    /// Every tour date, flattened in tour order then date order.
    pub fn entries(&self) -> Vec<TourDateEntry> {
        entries::flatten(self.tours)
    }
}
