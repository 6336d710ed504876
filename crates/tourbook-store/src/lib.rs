//! Entity store and local persistence for Tourbook.
//!
//! The store owns the band and tour collections, generates identities,
//! enforces that every tour points at an existing band, and mirrors every
//! change to a durable key-value medium. Reads go through
//! [`tourbook_query`] over the store's [`Snapshot`](tourbook_query::Snapshot).
//!
//! # Architecture
//!
//! ```text
//! consumer
//!     |
//!     +-- mutate --> EntityStore --save--> PersistenceAdapter --> KeyValueMedium
//!     |                  |                                        (FileMedium)
//!     |                  +-- notify --> ChangeListener
//!     |
//!     +-- read ----> Snapshot --> tourbook_query
//! ```
//!
//! # Modules
//!
//! - [`store`] -- [`EntityStore`], change notification
//! - [`persist`] -- JSON snapshot load/save, key layout
//! - [`medium`] -- File and in-memory key-value media
//! - [`config`] -- YAML configuration with environment overrides
//! - [`telemetry`] -- `tracing` subscriber setup
//! - [`error`] -- Shared error types

pub mod config;
pub mod error;
pub mod medium;
pub mod persist;
pub mod store;
pub mod telemetry;

// Re-export primary types for convenience.
pub use config::{ConfigError, LoggingConfig, StorageConfig, TourbookConfig, ViewConfig};
pub use error::{PersistError, StoreError};
pub use medium::{FileMedium, KeyValueMedium, MemoryMedium};
pub use persist::{BANDS_KEY, PersistedState, PersistenceAdapter, TOURS_KEY};
pub use store::{ChangeListener, EntityStore, ListenerId, StoreChange};
pub use telemetry::init_logging;
