// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use url::Url;

use crate::catalog::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_TRENDING_TERMS};
use crate::error::ConfigError;
use crate::store::FileStorage;

const APP_NAME: &str = "podfinder";

/// Used when the platform has no notion of a per-user data directory
const FALLBACK_DATA_DIR: &str = ".podfinder";

/// Runtime configuration shared by the catalog client and local stores
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the search API
    pub base_url: Url,
    /// Directory holding the persisted key/value documents
    pub data_dir: PathBuf,
    /// Seed terms for the trending list
    pub trending_terms: Vec<String>,
}

impl Config {
    /// Resolve the configuration, falling back to defaults for anything not
    /// given explicitly
    pub fn resolve(base_url: Option<&str>, data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        Ok(Self {
            base_url,
            data_dir,
            trending_terms: DEFAULT_TRENDING_TERMS.iter().map(|t| t.to_string()).collect(),
        })
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url.clone(),
            trending_terms: self.trending_terms.clone(),
        }
    }

    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.data_dir)
    }
}

/// Platform data directory for podfinder, e.g. `~/.local/share/podfinder`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        source: e,
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::CannotBeABase(value.to_string()));
    }
    Ok(url)
}
