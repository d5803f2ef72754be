// This is the infra layer - it implements the traits defined in core.
// This file provides an IN-MEMORY implementation of DocumentStore, used by the
// tests and handy for trying the board out without a database file.

use crate::core::links::{
    CounterField, DocumentStore, FieldUpdate, IncrementOutcome, Link, LinkId, NewLink, StoreError,
    UserVoteRecord,
};
use crate::core::ranking::LinkQuery;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// In-memory implementation of DocumentStore.
///
/// **DashMap:**
/// Every write below happens while holding the shard lock of a single key,
/// which gives us per-document atomicity the same way a real document store
/// does. There is nothing cross-document.
pub struct InMemoryDocumentStore {
    /// Maps link id -> link
    links: DashMap<LinkId, Link>,
    /// Maps user handle -> vote record
    vote_records: DashMap<String, UserVoteRecord>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            vote_records: DashMap::new(),
        }
    }

    /// Copy the links out so no shard lock is held while scoring.
    fn snapshot(&self) -> Vec<Link> {
        self.links.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_link(&self, id: &str) -> Result<Option<Link>, StoreError> {
        Ok(self.links.get(id).map(|entry| entry.value().clone()))
    }

    async fn create_link(&self, link: NewLink) -> Result<LinkId, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.links.insert(id.clone(), link.into_link(id.clone()));
        Ok(id)
    }

    async fn search_one(&self, query: &LinkQuery) -> Result<Option<Link>, StoreError> {
        Ok(query.clone().limit(1).execute(self.snapshot()).into_iter().next())
    }

    async fn count(&self, query: &LinkQuery) -> Result<u64, StoreError> {
        Ok(self
            .links
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .count() as u64)
    }

    async fn search(&self, query: &LinkQuery) -> Result<Vec<Link>, StoreError> {
        Ok(query.execute(self.snapshot()))
    }

    async fn increment(
        &self,
        id: &str,
        field: CounterField,
        delta: u64,
        _max_retries: u32,
    ) -> Result<IncrementOutcome, StoreError> {
        // get_mut holds the shard lock, so concurrent increments serialize and
        // there is never a conflict to retry
        let mut link = self
            .links
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let value = match field {
            CounterField::Votes => {
                link.votes = link.votes.saturating_add(delta);
                link.votes
            }
        };
        Ok(IncrementOutcome::Applied(value))
    }

    async fn set_field(&self, id: &str, update: FieldUpdate) -> Result<(), StoreError> {
        let mut link = self
            .links
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match update {
            FieldUpdate::MarkApproved => link.approved = true,
        }
        Ok(())
    }

    async fn delete_link(&self, id: &str) -> Result<(), StoreError> {
        self.links
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_vote_record(&self, user: &str) -> Result<Option<UserVoteRecord>, StoreError> {
        Ok(self.vote_records.get(user).map(|entry| entry.value().clone()))
    }

    async fn save_vote_record(&self, record: &UserVoteRecord) -> Result<(), StoreError> {
        let stored = UserVoteRecord {
            version: record.version + 1,
            ..record.clone()
        };

        // entry() holds the lock between the version check and the write
        match self.vote_records.entry(record.user.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().version != record.version {
                    return Err(StoreError::Conflict);
                }
                existing.insert(stored);
            }
            Entry::Vacant(slot) => {
                if record.version != 0 {
                    return Err(StoreError::Conflict);
                }
                slot.insert(stored);
            }
        }
        Ok(())
    }
}

// Default trait implementation for convenient initialization
impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
