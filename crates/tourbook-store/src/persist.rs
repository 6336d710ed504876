//! JSON snapshot persistence on top of a [`KeyValueMedium`].
//!
//! # Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `bands` | JSON array of bands, `createdAt` as ISO-8601 |
//! | `tours` | JSON array of tours with nested dates, all times ISO-8601 |
//!
//! Every save writes a whole collection. A key that has never been written
//! loads as an empty collection.
//!
//! A snapshot is saved tours first, then bands. Bands only ever disappear
//! through a reset, so a save interrupted between the two writes leaves no
//! tour pointing at a removed band. Tours whose band is missing anyway are
//! dropped on load.

use std::collections::HashSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tourbook_query::Snapshot;
use tourbook_types::{Band, BandId, Tour};
use tracing::{debug, warn};

use crate::error::PersistError;
use crate::medium::KeyValueMedium;

/// Key holding the band collection.
pub const BANDS_KEY: &str = "bands";

/// Key holding the tour collection.
pub const TOURS_KEY: &str = "tours";

/// Both collections as read from the medium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Bands in stored order.
    pub bands: Vec<Band>,
    /// Tours in stored order.
    pub tours: Vec<Tour>,
}

/// Reads and writes the band and tour collections.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter<M> {
    medium: M,
}

impl<M: KeyValueMedium> PersistenceAdapter<M> {
    /// Persist through `medium`.
    pub const fn new(medium: M) -> Self {
        Self { medium }
    }

    /// Load both collections. Missing keys yield empty collections.
    ///
    /// Tours referencing a band that is not stored are left out.
    pub fn load(&self) -> Result<PersistedState, PersistError> {
        let bands: Vec<Band> = self.read_json(BANDS_KEY)?.unwrap_or_default();
        let mut tours: Vec<Tour> = self.read_json(TOURS_KEY)?.unwrap_or_default();

        let known: HashSet<BandId> = bands.iter().map(|b| b.id).collect();
        let stored = tours.len();
        tours.retain(|t| known.contains(&t.band_id));
        let dropped = stored.saturating_sub(tours.len());
        if dropped > 0 {
            warn!(dropped, "Dropped stored tours whose band no longer exists");
        }
        Ok(PersistedState { bands, tours })
    }

    /// Overwrite the stored band collection.
    pub fn save_bands(&mut self, bands: &[Band]) -> Result<(), PersistError> {
        self.write_json(BANDS_KEY, bands)
    }

    /// Overwrite the stored tour collection.
    pub fn save_tours(&mut self, tours: &[Tour]) -> Result<(), PersistError> {
        self.write_json(TOURS_KEY, tours)
    }

    /// Overwrite both collections from one snapshot, tours first.
    pub fn save_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<(), PersistError> {
        self.save_tours(snapshot.tours)?;
        self.save_bands(snapshot.bands)
    }

    /// Borrow the underlying medium.
    pub const fn medium(&self) -> &M {
        &self.medium
    }

    /// Give back the underlying medium.
    pub fn into_medium(self) -> M {
        self.medium
    }

    fn read_json<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, PersistError> {
        let Some(raw) = self
            .medium
            .read(key)
            .map_err(|source| PersistError::Read { key, source })?
        else {
            debug!(key, "No stored value, starting empty");
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistError::Decode { key, source })
    }

    fn write_json<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), PersistError> {
        let json =
            serde_json::to_string(value).map_err(|source| PersistError::Encode { key, source })?;
        self.medium
            .write(key, &json)
            .map_err(|source| PersistError::Write { key, source })?;
        debug!(key, bytes = json.len(), "Collection persisted");
        Ok(())
    }
}
