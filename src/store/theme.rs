// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::warn;

use crate::error::StorageError;

use super::storage::Storage;

/// Storage key holding the dark-mode flag as a JSON boolean
pub const DARK_MODE_KEY: &str = "darkMode";

/// The persisted light/dark display preference
pub struct ThemePreference {
    storage: Box<dyn Storage>,
}

impl ThemePreference {
    pub fn open<S: Storage + 'static>(storage: S) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Whether dark mode is on; missing or malformed values mean light mode
    pub fn is_dark(&self) -> bool {
        let stored = match self.storage.get(DARK_MODE_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Could not read theme preference");
                return false;
            }
        };

        stored
            .and_then(|value| match serde_json::from_str::<bool>(&value) {
                Ok(dark) => Some(dark),
                Err(e) => {
                    warn!(error = %e, value = %value, "Ignoring malformed theme preference");
                    None
                }
            })
            .unwrap_or(false)
    }

    pub fn set_dark(&self, dark: bool) -> Result<(), StorageError> {
        let value = serde_json::to_string(&dark)?;
        self.storage.set(DARK_MODE_KEY, &value)
    }

    /// Flip the preference and return the new value
    pub fn toggle(&self) -> Result<bool, StorageError> {
        let dark = !self.is_dark();
        self.set_dark(dark)?;
        Ok(dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;
    use std::sync::Arc;

    #[test]
    fn defaults_to_light() {
        let theme = ThemePreference::open(MemoryStorage::new());
        assert!(!theme.is_dark());
    }

    #[test]
    fn set_and_read_back() {
        let storage = MemoryStorage::shared();
        let theme = ThemePreference::open(Arc::clone(&storage));

        theme.set_dark(true).unwrap();

        assert!(theme.is_dark());
        assert_eq!(storage.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn toggle_flips_and_persists() {
        let storage = MemoryStorage::shared();
        let theme = ThemePreference::open(Arc::clone(&storage));

        assert!(theme.toggle().unwrap());
        assert!(!theme.toggle().unwrap());

        let reopened = ThemePreference::open(Arc::clone(&storage));
        assert!(!reopened.is_dark());
    }

    #[test]
    fn malformed_value_means_light() {
        let storage = MemoryStorage::shared();
        storage.set(DARK_MODE_KEY, "\"yes please\"").unwrap();

        let theme = ThemePreference::open(Arc::clone(&storage));
        assert!(!theme.is_dark());
        assert!(theme.toggle().unwrap());
    }
}
