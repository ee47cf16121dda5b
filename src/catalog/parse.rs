// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::format::parse_timestamp;

/// A podcast summary as returned by catalog searches and lookups
///
/// Only the identifier and the name are required; every other field is a
/// snapshot of upstream data that may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub collection_id: u64,
    pub collection_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_genre_name: Option<String>,
    #[serde(rename = "artworkUrl600", default, skip_serializing_if = "Option::is_none")]
    pub artwork_url_600: Option<String>,
    #[serde(rename = "artworkUrl100", default, skip_serializing_if = "Option::is_none")]
    pub artwork_url_100: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_view_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_advisory_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Podcast {
    /// Most recent publish time, if present and parseable
    pub fn released_at(&self) -> Option<DateTime<FixedOffset>> {
        self.release_date.as_deref().and_then(parse_timestamp)
    }
}

/// A single episode returned by an episode lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub track_id: u64,
    pub track_name: String,
    /// May contain HTML markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_time_millis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_url: Option<String>,
    #[serde(rename = "artworkUrl60", default, skip_serializing_if = "Option::is_none")]
    pub artwork_url_60: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl Episode {
    /// Whether a preview can be played for this episode
    pub fn is_playable(&self) -> bool {
        self.preview_url.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Vec<Value>,
}

/// Parse a search or podcast lookup response into podcasts
///
/// Records that lack the required fields are dropped; the rest are kept.
pub fn parse_podcasts(json_bytes: &[u8]) -> Result<Vec<Podcast>, serde_json::Error> {
    let envelope: ResultsEnvelope = serde_json::from_slice(json_bytes)?;
    Ok(decode_records(envelope.results, "podcast"))
}

/// Parse an episode lookup response into episodes
///
/// The first raw result of an episode lookup is always the parent podcast,
/// so exactly one record is skipped before validation.
pub fn parse_episodes(json_bytes: &[u8]) -> Result<Vec<Episode>, serde_json::Error> {
    let envelope: ResultsEnvelope = serde_json::from_slice(json_bytes)?;
    Ok(decode_records(envelope.results.into_iter().skip(1), "episode"))
}

fn decode_records<T, I>(values: I, kind: &str) -> Vec<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(kind, error = %e, "Dropping malformed catalog record");
                None
            }
        })
        .collect()
}
