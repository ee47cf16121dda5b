// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bytes::Bytes;
use rand::seq::SliceRandom;
use tracing::{debug, warn};
use url::Url;

use crate::error::CatalogError;
use crate::http::HttpClient;

use super::parse::{Episode, Podcast, parse_episodes, parse_podcasts};
use super::query::CatalogQuery;

/// Public iTunes Search API endpoint
pub const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// Seed terms used to approximate a trending list
pub const DEFAULT_TRENDING_TERMS: [&str; 4] = [
    "tech podcast",
    "business podcast",
    "comedy podcast",
    "news podcast",
];

/// Categories offered for browsing; "All" stands for the trending list
pub const CATEGORIES: [&str; 12] = [
    "All",
    "Technology",
    "Business",
    "Comedy",
    "Education",
    "Health & Fitness",
    "Music",
    "News",
    "Sports",
    "True Crime",
    "Science",
    "Arts",
];

const CATEGORY_SUFFIX: &str = "podcast";

/// Options for the catalog client
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL the search and lookup endpoints are resolved against
    pub base_url: Url,
    /// Pool the trending term is picked from, uniformly at random
    pub trending_terms: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            trending_terms: DEFAULT_TRENDING_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Client for the upstream podcast catalog
///
/// Every public operation is fail-soft: transport, status and parse failures
/// are logged and come back as an empty list or `None`.
pub struct CatalogClient<C: HttpClient> {
    http: C,
    config: CatalogConfig,
}

impl<C: HttpClient> CatalogClient<C> {
    /// Create a client against the public iTunes endpoint
    pub fn new(http: C) -> Self {
        Self::with_config(http, CatalogConfig::default())
    }

    pub fn with_config(http: C, config: CatalogConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Search podcasts by free-text term
    ///
    /// The query is forwarded as given, including an empty one.
    pub async fn search_podcasts(&self, query: &str, limit: u32) -> Vec<Podcast> {
        self.search(query, limit).await.unwrap_or_else(|e| {
            warn!(term = query, error = %e, "Podcast search failed");
            Vec::new()
        })
    }

    /// Look up a single podcast by its collection identifier
    pub async fn get_podcast_by_id(&self, id: &str) -> Option<Podcast> {
        let query = CatalogQuery::Podcast { id };
        match self.fetch(&query).await.and_then(|(url, body)| {
            parse_podcasts(&body).map_err(|source| CatalogError::ParseFailed { url, source })
        }) {
            Ok(podcasts) => podcasts.into_iter().next(),
            Err(e) => {
                warn!(id, error = %e, "Podcast lookup failed");
                None
            }
        }
    }

    /// Fetch the most recent episodes of a podcast
    pub async fn get_podcast_episodes(&self, id: &str, limit: u32) -> Vec<Episode> {
        let query = CatalogQuery::Episodes { id, limit };
        self.fetch(&query)
            .await
            .and_then(|(url, body)| {
                parse_episodes(&body).map_err(|source| CatalogError::ParseFailed { url, source })
            })
            .unwrap_or_else(|e| {
                warn!(id, error = %e, "Episode lookup failed");
                Vec::new()
            })
    }

    /// Approximate a trending list by searching a randomly picked seed term
    ///
    /// Repeated calls may return different results.
    pub async fn get_trending_podcasts(&self, limit: u32) -> Vec<Podcast> {
        let term = self.pick_trending_term();
        debug!(term, "Picked trending seed term");
        self.search(term, limit).await.unwrap_or_else(|e| {
            warn!(term, error = %e, "Trending lookup failed");
            Vec::new()
        })
    }

    /// Search podcasts in a category, e.g. "Comedy" searches "Comedy podcast"
    pub async fn search_by_category(&self, category: &str, limit: u32) -> Vec<Podcast> {
        let term = category_term(category);
        self.search(&term, limit).await.unwrap_or_else(|e| {
            warn!(category, error = %e, "Category search failed");
            Vec::new()
        })
    }

    /// Browse a category, where "All" means the trending list
    pub async fn browse(&self, category: &str, limit: u32) -> Vec<Podcast> {
        if category.eq_ignore_ascii_case(CATEGORIES[0]) {
            self.get_trending_podcasts(limit).await
        } else {
            self.search_by_category(category, limit).await
        }
    }

    fn pick_trending_term(&self) -> &str {
        self.config
            .trending_terms
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(CATEGORY_SUFFIX)
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Podcast>, CatalogError> {
        let (url, body) = self.fetch(&CatalogQuery::Search { term, limit }).await?;
        parse_podcasts(&body).map_err(|source| CatalogError::ParseFailed { url, source })
    }

    async fn fetch(&self, query: &CatalogQuery<'_>) -> Result<(String, Bytes), CatalogError> {
        let url = query.to_url(&self.config.base_url)?.to_string();
        debug!(%url, "Querying catalog");

        let body = self
            .http
            .get_bytes(&url)
            .await
            .map_err(|e| CatalogError::FetchFailed {
                url: url.clone(),
                source: e,
            })?;
        Ok((url, body))
    }
}

/// Build the search term used for a category
pub fn category_term(category: &str) -> String {
    format!("{category} {CATEGORY_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Serves canned bodies by URL and records every request
    #[derive(Default)]
    struct MockHttpClient {
        responses: HashMap<String, String>,
        fallback: Option<String>,
        fail: bool,
        requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn serving(body: &str) -> Self {
            Self {
                fallback: Some(body.to_string()),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    /// A genuine reqwest error without touching the network
    fn transport_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
            self.requests.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(transport_error());
            }
            let body = self
                .responses
                .get(url)
                .or(self.fallback.as_ref())
                .cloned()
                .unwrap_or_else(|| r#"{"results": []}"#.to_string());
            Ok(Bytes::from(body))
        }
    }

    const PODCASTS: &str = r#"{"resultCount": 2, "results": [
        {"collectionId": 1, "collectionName": "First", "artistName": "A", "trackCount": 10},
        {"collectionId": 2, "collectionName": "Second", "artistName": "B"}
    ]}"#;

    fn episodes_body(count: usize) -> String {
        let mut results = vec![r#"{"collectionId": 1, "collectionName": "Parent"}"#.to_string()];
        for i in 0..count {
            results.push(format!(
                r#"{{"trackId": {}, "trackName": "Episode {}", "releaseDate": "2024-01-01T00:00:00Z"}}"#,
                100 + i,
                i
            ));
        }
        format!(r#"{{"results": [{}]}}"#, results.join(","))
    }

    fn with_terms(http: MockHttpClient, terms: &[&str]) -> CatalogClient<MockHttpClient> {
        CatalogClient::with_config(
            http,
            CatalogConfig {
                trending_terms: terms.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    fn term_of(url: &str) -> String {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "term")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn search_returns_normalized_podcasts() {
        let client = CatalogClient::new(MockHttpClient::serving(PODCASTS));

        let podcasts = client.search_podcasts("rust", 20).await;

        assert_eq!(podcasts.len(), 2);
        assert_eq!(podcasts[0].collection_name, "First");
        assert_eq!(podcasts[1].track_count, None);

        let requests = client.http.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("https://itunes.apple.com/search?"));
        assert!(requests[0].contains("entity=podcast"));
        assert!(requests[0].contains("limit=20"));
    }

    #[tokio::test]
    async fn get_podcast_by_id_returns_first_record() {
        let client = CatalogClient::new(MockHttpClient::serving(PODCASTS));

        let podcast = client.get_podcast_by_id("1").await.unwrap();

        assert_eq!(podcast.collection_id, 1);
        assert!(client.http.requests()[0].contains("/lookup?id=1&entity=podcast"));
    }

    #[tokio::test]
    async fn get_podcast_by_id_absent_on_zero_results() {
        let client = CatalogClient::new(MockHttpClient::serving(r#"{"resultCount": 0, "results": []}"#));
        assert!(client.get_podcast_by_id("999").await.is_none());
    }

    #[tokio::test]
    async fn episodes_exclude_the_parent_record() {
        for n in [0usize, 1, 5] {
            let client = CatalogClient::new(MockHttpClient::serving(&episodes_body(n)));
            let episodes = client.get_podcast_episodes("1", 50).await;

            assert_eq!(episodes.len(), n, "with {n} episodes");
            assert!(episodes.iter().all(|e| e.track_name.starts_with("Episode")));
        }
    }

    #[tokio::test]
    async fn episode_lookup_uses_episode_entity() {
        let client = CatalogClient::new(MockHttpClient::serving(&episodes_body(1)));
        client.get_podcast_episodes("77", 15).await;

        let request = &client.http.requests()[0];
        assert!(request.contains("id=77"));
        assert!(request.contains("entity=podcastEpisode"));
        assert!(request.contains("limit=15"));
    }

    #[tokio::test]
    async fn trending_uses_a_term_from_the_pool() {
        let client = CatalogClient::new(MockHttpClient::serving(PODCASTS));

        for _ in 0..10 {
            client.get_trending_podcasts(24).await;
        }

        for request in client.http.requests() {
            let term = term_of(&request);
            assert!(DEFAULT_TRENDING_TERMS.contains(&term.as_str()), "{term}");
        }
    }

    #[tokio::test]
    async fn trending_term_varies_between_calls() {
        let client = CatalogClient::new(MockHttpClient::serving(PODCASTS));

        for _ in 0..200 {
            client.get_trending_podcasts(24).await;
        }

        let terms: HashSet<String> = client.http.requests().iter().map(|r| term_of(r)).collect();
        assert!(terms.len() > 1, "every call searched {terms:?}");
    }

    #[tokio::test]
    async fn trending_term_can_be_pinned() {
        let client = with_terms(MockHttpClient::serving(PODCASTS), &["science podcast"]);

        let podcasts = client.get_trending_podcasts(5).await;

        assert_eq!(podcasts.len(), 2);
        assert_eq!(term_of(&client.http.requests()[0]), "science podcast");
    }

    #[tokio::test]
    async fn trending_with_empty_pool_still_searches() {
        let client = with_terms(MockHttpClient::serving(PODCASTS), &[]);
        client.get_trending_podcasts(5).await;
        assert_eq!(term_of(&client.http.requests()[0]), "podcast");
    }

    #[tokio::test]
    async fn category_search_matches_direct_term_search() {
        let by_category = CatalogClient::new(MockHttpClient::serving(PODCASTS));
        let direct = CatalogClient::new(MockHttpClient::serving(PODCASTS));

        let category_results = by_category.search_by_category("Comedy", 20).await;
        let direct_results = direct.search_podcasts("Comedy podcast", 20).await;

        assert_eq!(category_results, direct_results);
        assert_eq!(by_category.http.requests(), direct.http.requests());
    }

    #[tokio::test]
    async fn browse_all_means_trending() {
        let client = with_terms(MockHttpClient::serving(PODCASTS), &["pinned"]);

        client.browse("All", 24).await;
        client.browse("Music", 24).await;

        let requests = client.http.requests();
        assert_eq!(term_of(&requests[0]), "pinned");
        assert_eq!(term_of(&requests[1]), "Music podcast");
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed_everywhere() {
        let client = CatalogClient::new(MockHttpClient::failing());

        assert!(client.search_podcasts("rust", 20).await.is_empty());
        assert!(client.get_podcast_by_id("1").await.is_none());
        assert!(client.get_podcast_episodes("1", 20).await.is_empty());
        assert!(client.get_trending_podcasts(20).await.is_empty());
        assert!(client.search_by_category("News", 20).await.is_empty());
        assert_eq!(client.http.requests().len(), 5);
    }

    #[tokio::test]
    async fn invalid_json_is_swallowed_everywhere() {
        let client = CatalogClient::new(MockHttpClient::serving("<html>502 Bad Gateway</html>"));

        assert!(client.search_podcasts("rust", 20).await.is_empty());
        assert!(client.get_podcast_by_id("1").await.is_none());
        assert!(client.get_podcast_episodes("1", 20).await.is_empty());
        assert!(client.get_trending_podcasts(20).await.is_empty());
        assert!(client.search_by_category("News", 20).await.is_empty());
    }

    #[tokio::test]
    async fn responses_are_routed_by_url() {
        let mut responses = HashMap::new();
        responses.insert(
            "https://itunes.apple.com/lookup?id=1&entity=podcast".to_string(),
            PODCASTS.to_string(),
        );
        let client = CatalogClient::new(MockHttpClient {
            responses,
            ..Default::default()
        });

        assert!(client.get_podcast_by_id("1").await.is_some());
        assert!(client.get_podcast_by_id("2").await.is_none());
    }

    #[test]
    fn category_term_appends_suffix() {
        assert_eq!(category_term("Comedy"), "Comedy podcast");
        assert_eq!(category_term("Health & Fitness"), "Health & Fitness podcast");
    }
}
