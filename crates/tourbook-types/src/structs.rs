//! Core entity structs: [`Band`], [`Tour`], [`TourDate`], their creation
//! inputs, and the flattened [`TourDateEntry`] used by list views.
//!
//! Field names serialize in camelCase, which is also the persisted layout.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{BandId, TourDateId, TourId};
use crate::timestamp::Timestamp;

// ---------------------------------------------------------------------------
// Band
// ---------------------------------------------------------------------------

/// A tracked music act.
///
/// Bands are immutable once created; they disappear only when the whole
/// store is reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Band {
    /// Store-generated identifier.
    pub id: BandId,
    /// Display name.
    pub name: String,
    /// Free-form genre label.
    pub genre: String,
    /// Optional artwork URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub image_url: Option<String>,
    /// When the band was added.
    #[ts(as = "String")]
    pub created_at: Timestamp,
}

/// Input for creating a [`Band`]: everything except the generated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NewBand {
    /// Display name. Must not be blank.
    pub name: String,
    /// Genre label. Must not be blank.
    pub genre: String,
    /// Optional artwork URL. A blank value is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub image_url: Option<String>,
}

impl NewBand {
    /// Band input without artwork.
    pub fn new(name: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            genre: genre.into(),
            image_url: None,
        }
    }

    /// Attach an artwork URL.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tour / TourDate
// ---------------------------------------------------------------------------

/// A single scheduled performance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TourDate {
    /// Identifier, unique across every tour in the store.
    pub id: TourDateId,
    /// When the show starts.
    #[ts(as = "String")]
    pub date: Timestamp,
    /// Venue name.
    pub venue: String,
    /// City the venue is in.
    pub city: String,
    /// Country the venue is in.
    pub country: String,
}

/// Input for a [`TourDate`]: a tour date without its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NewTourDate {
    /// When the show starts.
    #[ts(as = "String")]
    pub date: Timestamp,
    /// Venue name. Must not be blank.
    pub venue: String,
    /// City. Must not be blank.
    pub city: String,
    /// Country. Must not be blank.
    pub country: String,
}

impl NewTourDate {
    /// Build a tour date input.
    pub fn new(
        date: Timestamp,
        venue: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            date,
            venue: venue.into(),
            city: city.into(),
            country: country.into(),
        }
    }

    /// Attach an identifier, producing the stored [`TourDate`].
    pub fn into_tour_date(self, id: TourDateId) -> TourDate {
        TourDate {
            id,
            date: self.date,
            venue: self.venue,
            city: self.city,
            country: self.country,
        }
    }
}

/// A run of tour dates belonging to one band.
///
/// `band_name` is copied from the band when the tour is created and is
/// never refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Tour {
    /// Store-generated identifier.
    pub id: TourId,
    /// The band this tour belongs to.
    pub band_id: BandId,
    /// Band name at the time the tour was created.
    pub band_name: String,
    /// Dates in the order they were added.
    pub dates: Vec<TourDate>,
    /// When the tour was added.
    #[ts(as = "String")]
    pub created_at: Timestamp,
}

impl Tour {
    /// Look up one of this tour's dates.
    pub fn date(&self, id: TourDateId) -> Option<&TourDate> {
        self.dates.iter().find(|d| d.id == id)
    }
}

// ---------------------------------------------------------------------------
// Flattened view
// ---------------------------------------------------------------------------

/// A tour date together with the band it belongs to.
///
/// Serializes as the tour date's fields plus `bandName` and `bandId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TourDateEntry {
    /// The tour date itself.
    #[serde(flatten)]
    pub date: TourDate,
    /// Denormalized band name from the owning tour.
    pub band_name: String,
    /// The owning tour's band.
    pub band_id: BandId,
}

impl TourDateEntry {
    /// Pair a tour date with its owning tour's band.
    pub fn new(tour: &Tour, date: &TourDate) -> Self {
        Self {
            date: date.clone(),
            band_name: tour.band_name.clone(),
            band_id: tour.band_id,
        }
    }
}
