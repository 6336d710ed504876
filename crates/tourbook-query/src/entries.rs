//! Flattening tours into list rows.

use tourbook_types::{Tour, TourDateEntry};

/// Produce one [`TourDateEntry`] per tour date, in tour order and then
/// date-within-tour order.
pub fn flatten(tours: &[Tour]) -> Vec<TourDateEntry> {
    tours
        .iter()
        .flat_map(|tour| tour.dates.iter().map(move |date| TourDateEntry::new(tour, date)))
        .collect()
}
