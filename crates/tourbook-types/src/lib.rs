//! Shared type definitions for Tourbook.
//!
//! This crate is the single source of truth for the band, tour and tour date
//! records used by the store and the query layer. Types defined here flow
//! downstream to `TypeScript` via `ts-rs` for the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`timestamp`] -- Millisecond-precision UTC instants and their ISO form
//! - [`structs`] -- Entity records, creation inputs and flattened entries

pub mod ids;
pub mod structs;
pub mod timestamp;

// Re-export all public types at crate root for convenience.
pub use ids::{BandId, TourDateId, TourId};
pub use structs::{Band, NewBand, NewTourDate, Tour, TourDate, TourDateEntry};
pub use timestamp::Timestamp;
