// Feed service - read side of the board.
//
// The public feed is fail-soft: a broken store yields an empty page, never an
// error. The moderation queue is admin-only and fail-loud.

use super::ranking_query::RankingQuery;
use crate::core::links::{BoardError, DocumentStore, Link};
use crate::core::moderation::ModerationGate;
use chrono::Utc;
use std::sync::Arc;

pub struct FeedService<S: DocumentStore> {
    store: Arc<S>,
    ranking: RankingQuery,
    gate: ModerationGate,
}

impl<S: DocumentStore> FeedService<S> {
    pub fn new(store: Arc<S>, ranking: RankingQuery, gate: ModerationGate) -> Self {
        Self {
            store,
            ranking,
            gate,
        }
    }

    /// Ranked approved links, optionally narrowed by a search.
    pub async fn feed(&self, search_text: Option<&str>) -> Vec<Link> {
        let query = self.ranking.build_feed_query(search_text, Utc::now());
        match self.store.search(&query).await {
            Ok(links) => links,
            Err(e) => {
                tracing::error!(query = ?search_text, error = %e, "Feed query failed, serving an empty feed");
                Vec::new()
            }
        }
    }

    /// Links waiting for moderation, newest first.
    pub async fn unapproved(&self, viewer: Option<&str>) -> Result<Vec<Link>, BoardError> {
        self.gate.require_admin(viewer)?;
        let query = self.ranking.build_unapproved_query();
        Ok(self.store.search(&query).await?)
    }

    /// A single link. Unapproved links only exist for admins.
    pub async fn show_link(&self, viewer: Option<&str>, id: &str) -> Result<Link, BoardError> {
        match self.store.get_link(id).await? {
            Some(link) if link.approved || self.gate.is_admin(viewer) => Ok(link),
            _ => Err(BoardError::NotFound),
        }
    }
}
