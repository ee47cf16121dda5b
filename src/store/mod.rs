mod favorites;
mod notify;
mod storage;
mod theme;

pub use favorites::{FAVORITES_KEY, FavoriteEntry, FavoritesStore};
pub use notify::{ExternalWatch, FavoritesChange, FavoritesListener, Subscription};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use theme::{DARK_MODE_KEY, ThemePreference};
pub(crate) use storage::lock;
