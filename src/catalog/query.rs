// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::CatalogError;

/// A request against the upstream catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery<'a> {
    /// Free-text term search restricted to podcasts
    Search { term: &'a str, limit: u32 },
    /// Exact identifier lookup of a single podcast
    Podcast { id: &'a str },
    /// Identifier lookup of a podcast's episodes
    Episodes { id: &'a str, limit: u32 },
}

impl CatalogQuery<'_> {
    /// Build the request URL below the given base
    ///
    /// Any path the base already carries is kept, so `https://host/api`
    /// becomes `https://host/api/search?...`.
    pub fn to_url(&self, base: &Url) -> Result<Url, CatalogError> {
        let endpoint = match self {
            CatalogQuery::Search { .. } => "search",
            CatalogQuery::Podcast { .. } | CatalogQuery::Episodes { .. } => "lookup",
        };

        let mut url = base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(endpoint);

        {
            let mut pairs = url.query_pairs_mut();
            match self {
                CatalogQuery::Search { term, limit } => {
                    pairs
                        .append_pair("term", term)
                        .append_pair("entity", "podcast")
                        .append_pair("limit", &limit.to_string());
                }
                CatalogQuery::Podcast { id } => {
                    pairs.append_pair("id", id).append_pair("entity", "podcast");
                }
                CatalogQuery::Episodes { id, limit } => {
                    pairs
                        .append_pair("id", id)
                        .append_pair("entity", "podcastEpisode")
                        .append_pair("limit", &limit.to_string());
                }
            }
        }

        Ok(url)
    }
}
