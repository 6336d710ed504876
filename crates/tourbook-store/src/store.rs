//! The entity store: owner of every band, tour and tour date.
//!
//! An [`EntityStore`] is constructed once at startup, passed by reference
//! to whatever needs it, and closed at shutdown. Every successful mutation
//! follows the same sequence:
//!
//! 1. Validate the input and resolve referenced ids (no state touched yet)
//! 2. Apply the change to the in-memory collections
//! 3. Write both collections through the [`PersistenceAdapter`]
//! 4. Notify subscribed [`ChangeListener`]s with the new [`Snapshot`]
//!
//! If step 3 fails the change stays in memory, the store remembers that it
//! has unsaved changes, the caller gets [`StoreError::Persistence`], and
//! listeners are not notified. [`EntityStore::flush`] retries the write.

use tourbook_query::{Snapshot, lookup};
use tourbook_types::{
    Band, BandId, NewBand, NewTourDate, Timestamp, Tour, TourDate, TourDateId, TourId,
};
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::{PersistError, StoreError};
use crate::medium::{FileMedium, KeyValueMedium, MemoryMedium};
use crate::persist::PersistenceAdapter;

// =============================================================================
// Change notification
// =============================================================================

/// What a successful mutation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// A band was added.
    BandCreated {
        /// The new band.
        band_id: BandId,
    },
    /// A tour was added to an existing band.
    TourCreated {
        /// The new tour.
        tour_id: TourId,
        /// Its band.
        band_id: BandId,
    },
    /// A date was appended to an existing tour.
    TourDateAppended {
        /// The extended tour.
        tour_id: TourId,
        /// The new date.
        tour_date_id: TourDateId,
    },
    /// Every band and tour was removed.
    Reset,
}

/// Receives a callback after every persisted mutation.
pub trait ChangeListener {
    /// Called synchronously once the change has been written.
    fn on_change(&mut self, change: &StoreChange, snapshot: &Snapshot<'_>);
}

/// Adapts a closure to [`ChangeListener`].
struct FnListener<F>(F);

impl<F> ChangeListener for FnListener<F>
where
    F: FnMut(&StoreChange, &Snapshot<'_>),
{
    fn on_change(&mut self, change: &StoreChange, snapshot: &Snapshot<'_>) {
        (self.0)(change, snapshot);
    }
}

/// Handle returned by [`EntityStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// =============================================================================
// EntityStore
// =============================================================================

/// In-memory band and tour collections mirrored to a durable medium.
pub struct EntityStore<M: KeyValueMedium = FileMedium> {
    bands: Vec<Band>,
    tours: Vec<Tour>,
    adapter: PersistenceAdapter<M>,
    listeners: Vec<(ListenerId, Box<dyn ChangeListener>)>,
    next_listener: u64,
    unsaved: bool,
}

impl EntityStore<FileMedium> {
    /// Open the file-backed store in `config.data_dir`, loading whatever was
    /// persisted there.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let medium = FileMedium::open(&config.data_dir).map_err(|source| PersistError::Open {
            path: config.data_dir.clone(),
            source,
        })?;
        Self::with_medium(medium)
    }
}

impl EntityStore<MemoryMedium> {
    /// An empty store that persists to memory only.
    pub fn in_memory() -> Self {
        Self::from_parts(PersistenceAdapter::new(MemoryMedium::new()), Vec::new(), Vec::new())
    }
}

impl<M: KeyValueMedium> EntityStore<M> {
    /// Build a store over `medium`, loading its current contents.
    pub fn with_medium(medium: M) -> Result<Self, StoreError> {
        let adapter = PersistenceAdapter::new(medium);
        let state = adapter.load()?;
        info!(
            bands = state.bands.len(),
            tours = state.tours.len(),
            "Store loaded"
        );
        Ok(Self::from_parts(adapter, state.bands, state.tours))
    }

    fn from_parts(adapter: PersistenceAdapter<M>, bands: Vec<Band>, tours: Vec<Tour>) -> Self {
        Self {
            bands,
            tours,
            adapter,
            listeners: Vec::new(),
            next_listener: 0,
            unsaved: false,
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Add a band. Name, genre and image URL are stored trimmed.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] if `name` or `genre` is blank.
    /// [`StoreError::Persistence`] if the snapshot could not be written.
    pub fn create_band(&mut self, input: NewBand) -> Result<Band, StoreError> {
        require("name", &input.name)?;
        require("genre", &input.genre)?;

        let band = Band {
            id: self.fresh_band_id(),
            name: input.name.trim().to_owned(),
            genre: input.genre.trim().to_owned(),
            image_url: input
                .image_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
            created_at: Timestamp::now(),
        };
        self.bands.push(band.clone());
        info!(band_id = %band.id, name = %band.name, "Band created");

        self.commit(StoreChange::BandCreated { band_id: band.id })?;
        Ok(band)
    }

    /// Add a tour with its initial dates to an existing band.
    ///
    /// `band_name` is copied from the band as it is now.
    ///
    /// # Errors
    ///
    /// [`StoreError::BandNotFound`] if `band_id` is unknown, checked first.
    /// [`StoreError::Validation`] if `dates` is empty or any date has a
    /// blank venue, city or country.
    /// [`StoreError::Persistence`] if the snapshot could not be written.
    pub fn create_tour(
        &mut self,
        band_id: BandId,
        dates: Vec<NewTourDate>,
    ) -> Result<Tour, StoreError> {
        let band_name = lookup::find_band(&self.bands, band_id)
            .ok_or(StoreError::BandNotFound(band_id))?
            .name
            .clone();
        if dates.is_empty() {
            return Err(StoreError::Validation {
                field: "dates",
                reason: "a tour needs at least one date".to_owned(),
            });
        }
        dates.iter().try_for_each(validate_date)?;

        let mut assigned: Vec<TourDate> = Vec::with_capacity(dates.len());
        for date in dates {
            let id = self.fresh_tour_date_id(&assigned);
            assigned.push(date.into_tour_date(id));
        }
        let tour = Tour {
            id: self.fresh_tour_id(),
            band_id,
            band_name,
            dates: assigned,
            created_at: Timestamp::now(),
        };
        self.tours.push(tour.clone());
        info!(
            tour_id = %tour.id,
            band_id = %band_id,
            dates = tour.dates.len(),
            "Tour created"
        );

        self.commit(StoreChange::TourCreated { tour_id: tour.id, band_id })?;
        Ok(tour)
    }

    /// Append a date to the end of an existing tour.
    ///
    /// # Errors
    ///
    /// [`StoreError::TourNotFound`] if `tour_id` is unknown.
    /// [`StoreError::Validation`] if venue, city or country is blank.
    /// [`StoreError::Persistence`] if the snapshot could not be written.
    pub fn append_tour_date(
        &mut self,
        tour_id: TourId,
        date: NewTourDate,
    ) -> Result<TourDate, StoreError> {
        if lookup::find_tour(&self.tours, tour_id).is_none() {
            return Err(StoreError::TourNotFound(tour_id));
        }
        validate_date(&date)?;

        let tour_date = date.into_tour_date(self.fresh_tour_date_id(&[]));
        let tour = self
            .tours
            .iter_mut()
            .find(|t| t.id == tour_id)
            .ok_or(StoreError::TourNotFound(tour_id))?;
        tour.dates.push(tour_date.clone());
        info!(
            tour_id = %tour_id,
            tour_date_id = %tour_date.id,
            city = %tour_date.city,
            "Tour date appended"
        );

        self.commit(StoreChange::TourDateAppended {
            tour_id,
            tour_date_id: tour_date.id,
        })?;
        Ok(tour_date)
    }

    /// Remove every band and tour.
    ///
    /// # Errors
    ///
    /// [`StoreError::Persistence`] if the empty snapshot could not be written.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let (bands, tours) = (self.bands.len(), self.tours.len());
        self.bands.clear();
        self.tours.clear();
        warn!(bands, tours, "Store reset");
        self.commit(StoreChange::Reset)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Find a band by id.
    pub fn band(&self, id: BandId) -> Option<&Band> {
        lookup::find_band(&self.bands, id)
    }

    /// Find a tour by id.
    pub fn tour(&self, id: TourId) -> Option<&Tour> {
        lookup::find_tour(&self.tours, id)
    }

    /// All tours of one band, in the order they were created.
    pub fn band_tours(&self, band_id: BandId) -> Vec<&Tour> {
        lookup::band_tours(&self.tours, band_id)
    }

    /// All bands in creation order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// All tours in creation order.
    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    /// A read-only view for the query layer.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(&self.bands, &self.tours)
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Register a listener for future changes.
    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        debug!(listener = id.0, "Listener subscribed");
        id
    }

    /// Register a closure for future changes.
    pub fn subscribe_fn<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StoreChange, &Snapshot<'_>) + 'static,
    {
        self.subscribe(FnListener(listener))
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // -------------------------------------------------------------------------
    // Durability
    // -------------------------------------------------------------------------

    /// Whether an earlier write failed and memory is ahead of the medium.
    pub const fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Write the current snapshot if an earlier write failed.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.unsaved {
            self.persist()?;
            info!("Pending changes flushed");
        }
        Ok(())
    }

    /// Flush pending changes and hand back the medium.
    pub fn close(mut self) -> Result<M, StoreError> {
        self.flush()?;
        info!(bands = self.bands.len(), tours = self.tours.len(), "Store closed");
        Ok(self.adapter.into_medium())
    }

    /// Borrow the medium the store persists to.
    pub const fn medium(&self) -> &M {
        self.adapter.medium()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.unsaved = true;
        let snapshot = Snapshot::new(&self.bands, &self.tours);
        if let Err(e) = self.adapter.save_snapshot(&snapshot) {
            warn!(error = %e, "Persisting snapshot failed; change kept in memory only");
            return Err(e.into());
        }
        self.unsaved = false;
        Ok(())
    }

    fn commit(&mut self, change: StoreChange) -> Result<(), StoreError> {
        self.persist()?;
        let snapshot = Snapshot::new(&self.bands, &self.tours);
        for (_, listener) in &mut self.listeners {
            listener.on_change(&change, &snapshot);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    fn fresh_band_id(&self) -> BandId {
        loop {
            let id = BandId::new();
            if lookup::find_band(&self.bands, id).is_none() {
                return id;
            }
        }
    }

    fn fresh_tour_id(&self) -> TourId {
        loop {
            let id = TourId::new();
            if lookup::find_tour(&self.tours, id).is_none() {
                return id;
            }
        }
    }

    /// A date id unused by the store and by `pending`.
    fn fresh_tour_date_id(&self, pending: &[TourDate]) -> TourDateId {
        loop {
            let id = TourDateId::new();
            let taken = lookup::find_tour_date(&self.tours, id).is_some()
                || pending.iter().any(|d| d.id == id);
            if !taken {
                return id;
            }
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::blank(field));
    }
    Ok(())
}

fn validate_date(date: &NewTourDate) -> Result<(), StoreError> {
    require("venue", &date.venue)?;
    require("city", &date.city)?;
    require("country", &date.country)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::persist::TOURS_KEY;

    /// A medium whose writes can be made to fail.
    #[derive(Debug, Default)]
    struct FlakyMedium {
        inner: MemoryMedium,
        failing: Rc<RefCell<bool>>,
    }

    impl KeyValueMedium for FlakyMedium {
        fn read(&self, key: &str) -> io::Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
            if *self.failing.borrow() {
                return Err(io::Error::other("disk full"));
            }
            self.inner.write(key, value)
        }
    }

    fn show(year: i32, venue: &str, city: &str) -> NewTourDate {
        NewTourDate::new(
            Timestamp::from_ymd_hms(year, 1, 1, 20, 0, 0).unwrap(),
            venue,
            city,
            "Germany",
        )
    }

    #[test]
    fn create_band_assigns_unique_ids() {
        let mut store = EntityStore::in_memory();
        let ids: BTreeSet<BandId> = (0..50)
            .map(|i| store.create_band(NewBand::new(format!("Band {i}"), "Rock")).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 50);
        assert_eq!(store.bands().len(), 50);
    }

    #[test]
    fn create_band_rejects_blank_fields() {
        let mut store = EntityStore::in_memory();
        let err = store.create_band(NewBand::new("  ", "Rock")).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "name", .. }));
        let err = store.create_band(NewBand::new("Aphex", "")).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "genre", .. }));
        assert!(store.bands().is_empty());
        assert!(store.medium().is_empty());
    }

    #[test]
    fn band_fields_are_stored_trimmed() {
        let mut store = EntityStore::in_memory();
        let band = store
            .create_band(
                NewBand::new("  Aphex ", " Electronic\n").with_image_url(" https://x/a.png "),
            )
            .unwrap();
        assert_eq!(band.name, "Aphex");
        assert_eq!(band.genre, "Electronic");
        assert_eq!(band.image_url.as_deref(), Some("https://x/a.png"));
        assert_eq!(store.band(band.id), Some(&band));
    }

    #[test]
    fn blank_image_url_is_dropped() {
        let mut store = EntityStore::in_memory();
        let band = store
            .create_band(NewBand::new("Aphex", "Electronic").with_image_url(" "))
            .unwrap();
        assert_eq!(band.image_url, None);
        let band = store
            .create_band(NewBand::new("Boards", "IDM").with_image_url("https://x/y.png"))
            .unwrap();
        assert_eq!(band.image_url.as_deref(), Some("https://x/y.png"));
    }

    #[test]
    fn create_tour_denormalizes_band_name_and_assigns_ids() {
        let mut store = EntityStore::in_memory();
        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        let tour = store
            .create_tour(band.id, vec![show(2999, "Arena", "Berlin"), show(2999, "Hall", "Munich")])
            .unwrap();
        assert_eq!(tour.band_name, "Aphex");
        assert_eq!(tour.band_id, band.id);
        assert_eq!(tour.dates.len(), 2);
        assert_ne!(tour.dates[0].id, tour.dates[1].id);
        assert_eq!(store.tour(tour.id), Some(&tour));
    }

    #[test]
    fn create_tour_for_unknown_band_changes_nothing() {
        let mut store = EntityStore::in_memory();
        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        store.create_tour(band.id, vec![show(2999, "Arena", "Berlin")]).unwrap();
        let before = store.tours().to_vec();
        let persisted_before = store.medium().clone();

        let missing = BandId::new();
        let err = store.create_tour(missing, vec![show(2999, "Arena", "Berlin")]).unwrap_err();
        assert!(matches!(err, StoreError::BandNotFound(id) if id == missing));
        // Unknown band wins over invalid input.
        let err = store.create_tour(missing, Vec::new()).unwrap_err();
        assert!(matches!(err, StoreError::BandNotFound(_)));

        assert_eq!(store.tours(), before.as_slice());
        assert_eq!(store.medium(), &persisted_before);
    }

    #[test]
    fn create_tour_validates_dates() {
        let mut store = EntityStore::in_memory();
        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        let err = store.create_tour(band.id, Vec::new()).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "dates", .. }));
        let err = store
            .create_tour(band.id, vec![show(2999, "Arena", "Berlin"), show(2999, "Hall", "")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "city", .. }));
        assert!(store.tours().is_empty());
    }

    #[test]
    fn append_keeps_existing_dates_and_goes_last() {
        let mut store = EntityStore::in_memory();
        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        let tour = store
            .create_tour(
                band.id,
                vec![show(2999, "Arena", "Berlin"), show(2998, "Club", "Hamburg")],
            )
            .unwrap();

        let added = store.append_tour_date(tour.id, show(2001, "Early", "Bonn")).unwrap();
        let stored = store.tour(tour.id).unwrap();
        assert_eq!(stored.dates.len(), 3);
        assert_eq!(&stored.dates[..2], tour.dates.as_slice());
        assert_eq!(stored.dates[2], added);
    }

    #[test]
    fn append_to_unknown_tour_fails() {
        let mut store = EntityStore::in_memory();
        let missing = TourId::new();
        let err = store.append_tour_date(missing, show(2999, "Arena", "Berlin")).unwrap_err();
        assert!(matches!(err, StoreError::TourNotFound(id) if id == missing));
        assert!(err.is_recoverable());
    }

    #[test]
    fn band_tours_filters_by_band() {
        let mut store = EntityStore::in_memory();
        let a = store.create_band(NewBand::new("A", "x")).unwrap();
        let b = store.create_band(NewBand::new("B", "x")).unwrap();
        let t1 = store.create_tour(a.id, vec![show(2999, "v", "c")]).unwrap();
        store.create_tour(b.id, vec![show(2999, "v", "c")]).unwrap();
        let t3 = store.create_tour(a.id, vec![show(2999, "v", "c")]).unwrap();
        let ids: Vec<TourId> = store.band_tours(a.id).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t1.id, t3.id]);
    }

    #[test]
    fn listeners_see_each_persisted_change() {
        let mut store = EntityStore::in_memory();
        let seen: Rc<RefCell<Vec<(StoreChange, usize)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let id = store.subscribe_fn(move |change, snapshot| {
            sink.borrow_mut().push((*change, snapshot.tours.len()));
        });

        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        let tour = store.create_tour(band.id, vec![show(2999, "Arena", "Berlin")]).unwrap();
        let _ = store.create_tour(BandId::new(), vec![show(2999, "Arena", "Berlin")]);

        assert_eq!(
            *seen.borrow(),
            vec![
                (StoreChange::BandCreated { band_id: band.id }, 0),
                (StoreChange::TourCreated { tour_id: tour.id, band_id: band.id }, 1),
            ]
        );

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.reset().unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn persistence_failure_keeps_change_and_flush_recovers() {
        let failing = Rc::new(RefCell::new(false));
        let medium = FlakyMedium {
            inner: MemoryMedium::new(),
            failing: Rc::clone(&failing),
        };
        let mut store = EntityStore::with_medium(medium).unwrap();
        let notified = Rc::new(RefCell::new(0_u32));
        let counter = Rc::clone(&notified);
        store.subscribe_fn(move |_, _| *counter.borrow_mut() += 1);

        *failing.borrow_mut() = true;
        let err = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(PersistError::Write { .. })));
        assert!(!err.is_recoverable());
        assert_eq!(store.bands().len(), 1);
        assert!(store.has_unsaved_changes());
        assert_eq!(*notified.borrow(), 0);
        assert!(store.flush().is_err());

        *failing.borrow_mut() = false;
        store.flush().unwrap();
        assert!(!store.has_unsaved_changes());
        let medium = store.close().unwrap();
        let reopened = EntityStore::with_medium(medium).unwrap();
        assert_eq!(reopened.bands().len(), 1);
        assert_eq!(reopened.bands()[0].name, "Aphex");
    }

    /// A medium whose writes to one key can be made to fail.
    #[derive(Debug, Clone, Default)]
    struct KeyFailingMedium {
        inner: MemoryMedium,
        failing_key: Option<&'static str>,
    }

    impl KeyValueMedium for KeyFailingMedium {
        fn read(&self, key: &str) -> io::Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
            if self.failing_key.is_some_and(|k| k == key) {
                return Err(io::Error::other("disk full"));
            }
            self.inner.write(key, value)
        }
    }

    #[test]
    fn interrupted_reset_leaves_no_dangling_tours_on_disk() {
        let mut store = EntityStore::with_medium(KeyFailingMedium::default()).unwrap();
        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        store.create_tour(band.id, vec![show(2999, "Arena", "Berlin")]).unwrap();

        let mut medium = store.close().unwrap();
        medium.failing_key = Some(TOURS_KEY);
        let mut store = EntityStore::with_medium(medium).unwrap();
        let err = store.reset().unwrap_err();
        assert!(matches!(
            err,
            StoreError::Persistence(PersistError::Write { key: TOURS_KEY, .. })
        ));
        assert!(store.has_unsaved_changes());

        let reloaded = EntityStore::with_medium(store.medium().clone()).unwrap();
        let dangling = reloaded
            .tours()
            .iter()
            .filter(|t| reloaded.band(t.band_id).is_none())
            .count();
        assert_eq!(dangling, 0);
        assert_eq!(reloaded.bands().len(), 1);
        assert_eq!(reloaded.tours().len(), 1);
    }

    #[test]
    fn reset_clears_and_persists() {
        let mut store = EntityStore::in_memory();
        let band = store.create_band(NewBand::new("Aphex", "Electronic")).unwrap();
        store.create_tour(band.id, vec![show(2999, "Arena", "Berlin")]).unwrap();
        store.reset().unwrap();
        assert!(store.bands().is_empty());
        assert!(store.band(band.id).is_none());
        let reopened = EntityStore::with_medium(store.close().unwrap()).unwrap();
        assert!(reopened.bands().is_empty());
        assert!(reopened.tours().is_empty());
    }
}
