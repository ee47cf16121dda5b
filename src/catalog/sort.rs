// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use super::parse::Podcast;

/// Ordering applied to search results before display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Upstream order
    #[default]
    Relevance,
    /// Most recently published first
    Newest,
    /// Most episodes first; the API exposes no ratings
    Popular,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Newest => "newest",
            SortOrder::Popular => "popular",
        };
        f.write_str(name)
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortOrder::Relevance),
            "newest" => Ok(SortOrder::Newest),
            "popular" | "rating" => Ok(SortOrder::Popular),
            other => Err(format!(
                "unknown sort order '{other}' (expected relevance, newest or popular)"
            )),
        }
    }
}

/// Sort podcasts in place; all orders are stable
pub fn sort_podcasts(podcasts: &mut [Podcast], order: SortOrder) {
    match order {
        SortOrder::Relevance => {}
        // None sorts before Some, so reversing puts undated podcasts last
        SortOrder::Newest => podcasts.sort_by_key(|p| Reverse(p.released_at())),
        SortOrder::Popular => podcasts.sort_by_key(|p| Reverse(p.track_count.unwrap_or(0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_podcast(id: u64, release_date: Option<&str>, track_count: Option<u32>) -> Podcast {
        Podcast {
            collection_id: id,
            collection_name: format!("Podcast {id}"),
            artist_name: None,
            primary_genre_name: None,
            artwork_url_600: None,
            artwork_url_100: None,
            track_count,
            release_date: release_date.map(String::from),
            collection_view_url: None,
            feed_url: None,
            content_advisory_rating: None,
            country: None,
        }
    }

    fn ids(podcasts: &[Podcast]) -> Vec<u64> {
        podcasts.iter().map(|p| p.collection_id).collect()
    }

    #[test]
    fn relevance_keeps_upstream_order() {
        let mut podcasts = vec![
            make_podcast(3, Some("2020-01-01T00:00:00Z"), Some(1)),
            make_podcast(1, Some("2024-01-01T00:00:00Z"), Some(100)),
            make_podcast(2, None, None),
        ];
        sort_podcasts(&mut podcasts, SortOrder::Relevance);
        assert_eq!(ids(&podcasts), vec![3, 1, 2]);
    }

    #[test]
    fn newest_first_with_undated_last() {
        let mut podcasts = vec![
            make_podcast(1, Some("2020-01-01T00:00:00Z"), None),
            make_podcast(2, None, None),
            make_podcast(3, Some("2024-06-01T00:00:00Z"), None),
            make_podcast(4, Some("garbage"), None),
            make_podcast(5, Some("2022-03-15"), None),
        ];
        sort_podcasts(&mut podcasts, SortOrder::Newest);
        assert_eq!(ids(&podcasts), vec![3, 5, 1, 2, 4]);
    }

    #[test]
    fn popular_by_track_count_treating_missing_as_zero() {
        let mut podcasts = vec![
            make_podcast(1, None, Some(10)),
            make_podcast(2, None, None),
            make_podcast(3, None, Some(500)),
            make_podcast(4, None, Some(0)),
        ];
        sort_podcasts(&mut podcasts, SortOrder::Popular);
        assert_eq!(ids(&podcasts), vec![3, 1, 2, 4]);
    }

    #[test]
    fn sort_order_parses_names() {
        assert_eq!("Newest".parse::<SortOrder>().unwrap(), SortOrder::Newest);
        assert_eq!("rating".parse::<SortOrder>().unwrap(), SortOrder::Popular);
        assert!("alphabetical".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default().to_string(), "relevance");
    }
}
