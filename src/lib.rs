//! Application core for CineLaunch TV, a personal catalog of external
//! video links. Owns the persisted entry collection, the language/genre
//! taxonomy, the admin/viewer role gate, pull-based remote sync, and the
//! optional AI metadata collaborator. A GUI shell links against this crate
//! and renders from its reads.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod role;
pub mod storage;
pub mod store;
pub mod sync;
pub mod taxonomy;


pub use ai::{AiConfig, MetadataClient};
pub use app::App;
pub use error::{Error, Result};
pub use models::{
    Entry, EntryDraft, EntryFilter, Language, MetadataGuess, SyncConfig, DEFAULT_GENRES,
    PLACEHOLDER_IMAGE,
};
pub use role::{Role, RoleGate};
pub use storage::Storage;
pub use store::CatalogStore;
pub use sync::{SyncClient, SyncScheduler};
pub use taxonomy::Taxonomy;
