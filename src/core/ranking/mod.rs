// Ranking: how links are retrieved and ordered for the feeds.

pub mod feed_service;
pub mod link_query;
pub mod ranking_query;

pub use feed_service::FeedService;
pub use link_query::{Boost, LinkQuery, SortOrder, TermFilter, TextField, TextMatch};
pub use ranking_query::{RankingConfig, RankingQuery};
