pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use catalog::{
    CATEGORIES, CatalogClient, CatalogConfig, Episode, Podcast, SortOrder, sort_podcasts,
};
pub use config::Config;
pub use error::{CatalogError, ConfigError, StorageError};
pub use format::{format_date, format_duration, strip_html};
pub use http::{HttpClient, ReqwestClient};
pub use store::{
    ExternalWatch, FavoriteEntry, FavoritesChange, FavoritesListener, FavoritesStore, FileStorage,
    MemoryStorage, Storage, Subscription, ThemePreference,
};
pub use view::{LoadState, LoadTicket, ViewSlot};
