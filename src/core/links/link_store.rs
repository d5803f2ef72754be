use super::link_models::{Link, LinkId, NewLink, UserVoteRecord};
use crate::core::ranking::LinkQuery;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Document was modified concurrently")]
    Conflict,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Numeric link fields that can be bumped in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    Votes,
}

/// Single-field updates. Approval is one-way, so there is no way to express
/// un-approving a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    MarkApproved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// The increment landed; carries the counter value right after it.
    Applied(u64),
    /// Every attempt hit a write conflict.
    Conflict,
}

/// The document repository the board is built on.
///
/// Links and vote records are independent documents. Nothing here spans two
/// documents atomically; callers must not assume it does.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_link(&self, id: &str) -> Result<Option<Link>, StoreError>;

    /// Store a brand new link and return the id assigned to it.
    async fn create_link(&self, link: NewLink) -> Result<LinkId, StoreError>;

    /// First hit of `query`, if any.
    async fn search_one(&self, query: &LinkQuery) -> Result<Option<Link>, StoreError>;

    async fn count(&self, query: &LinkQuery) -> Result<u64, StoreError>;

    /// All hits of `query`, ordered and truncated the way the query asks.
    async fn search(&self, query: &LinkQuery) -> Result<Vec<Link>, StoreError>;

    /// Add `delta` to a counter without reading it into the caller first.
    ///
    /// Retries up to `max_retries` times on write conflicts. The new value is
    /// visible to every read issued after this returns.
    async fn increment(
        &self,
        id: &str,
        field: CounterField,
        delta: u64,
        max_retries: u32,
    ) -> Result<IncrementOutcome, StoreError>;

    async fn set_field(&self, id: &str, update: FieldUpdate) -> Result<(), StoreError>;

    async fn delete_link(&self, id: &str) -> Result<(), StoreError>;

    async fn get_vote_record(&self, user: &str) -> Result<Option<UserVoteRecord>, StoreError>;

    /// Create or overwrite a vote record.
    ///
    /// Fails with `StoreError::Conflict` when the stored version no longer
    /// matches `record.version` (0 meaning "must not exist yet").
    async fn save_vote_record(&self, record: &UserVoteRecord) -> Result<(), StoreError>;
}
