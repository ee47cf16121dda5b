mod client;
mod parse;
mod query;
mod sort;

pub use client::{
    CATEGORIES, CatalogClient, CatalogConfig, DEFAULT_BASE_URL, DEFAULT_TRENDING_TERMS,
    category_term,
};
pub use parse::{Episode, Podcast, parse_episodes, parse_podcasts};
pub use query::CatalogQuery;
pub use sort::{SortOrder, sort_podcasts};
