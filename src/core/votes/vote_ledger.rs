// Vote ledger - one vote per user per link.
//
// The user's vote record is the only thing that de-duplicates votes. A vote
// is two separate writes: first the record, then an in-place increment of the
// link's counter. They are not atomic together. If the counter update is
// lost, the vote stays in the user's history and the count lags behind.

use crate::core::links::{
    BoardError, CounterField, DocumentStore, IncrementOutcome, StoreError, UserVoteRecord,
};
use std::sync::Arc;

/// Conflict retries for the counter increment and the record save.
pub const DEFAULT_VOTE_RETRIES: u32 = 3;
/// Upper bound for any configured retry budget.
pub const MAX_VOTE_RETRIES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote recorded and counted; carries the link's new vote count.
    Counted { votes: u64 },
    /// The user had voted for this link before. Nothing was written.
    AlreadyVoted,
    /// Vote recorded in the user's history, but the counter update ran out
    /// of retries.
    CountDeferred,
}

impl VoteOutcome {
    pub fn already_voted(&self) -> bool {
        matches!(self, VoteOutcome::AlreadyVoted)
    }
}

pub struct VoteLedger<S: DocumentStore> {
    store: Arc<S>,
    max_retries: u32,
}

impl<S: DocumentStore> VoteLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_retries: DEFAULT_VOTE_RETRIES,
        }
    }

    /// Capped at `MAX_VOTE_RETRIES`.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_VOTE_RETRIES);
        self
    }

    /// Register `user`'s vote for `link_id`.
    ///
    /// **Returns:**
    /// - `Ok(Counted)` when the vote was new and the counter moved
    /// - `Ok(AlreadyVoted)` when the user had voted before (no writes at all)
    /// - `Ok(CountDeferred)` when the counter update was lost to contention
    /// - `Err(NotFound)` when the link does not exist
    pub async fn register_vote(
        &self,
        user: &str,
        link_id: &str,
    ) -> Result<VoteOutcome, BoardError> {
        if user.trim().is_empty() {
            return Err(BoardError::Validation(
                "a user handle is required".to_string(),
            ));
        }

        let link = self
            .store
            .get_link(link_id)
            .await
            .inspect_err(|e| tracing::error!(user, link_id, error = %e, "Link lookup failed"))?;
        if link.is_none() {
            return Err(BoardError::NotFound);
        }

        if !self.append_to_record(user, link_id).await? {
            tracing::info!(user, link_id, "User tried to vote a second time");
            return Ok(VoteOutcome::AlreadyVoted);
        }

        match self
            .store
            .increment(link_id, CounterField::Votes, 1, self.max_retries)
            .await
        {
            Ok(IncrementOutcome::Applied(votes)) => {
                tracing::debug!(user, link_id, votes, "Vote counted");
                Ok(VoteOutcome::Counted { votes })
            }
            Ok(IncrementOutcome::Conflict) => {
                let err = BoardError::ConflictExhausted {
                    link_id: link_id.to_string(),
                };
                tracing::warn!(user, attempts = self.max_retries.saturating_add(1), "{}", err);
                Ok(VoteOutcome::CountDeferred)
            }
            Err(e) => {
                tracing::error!(user, link_id, error = %e, "Vote recorded but counting it failed");
                Err(e.into())
            }
        }
    }

    /// Has `user` voted for `link_id` already?
    pub async fn has_voted(&self, user: &str, link_id: &str) -> Result<bool, BoardError> {
        Ok(self
            .store
            .get_vote_record(user)
            .await?
            .is_some_and(|record| record.has_voted(link_id)))
    }

    /// Add the link to the user's record and persist it.
    ///
    /// Returns `false` when the link was already there. A concurrent save of
    /// the same record makes us re-read and check again.
    async fn append_to_record(&self, user: &str, link_id: &str) -> Result<bool, BoardError> {
        let mut attempt = 0;
        loop {
            let mut record = self
                .store
                .get_vote_record(user)
                .await
                .inspect_err(|e| tracing::error!(user, error = %e, "Vote record lookup failed"))?
                .unwrap_or_else(|| UserVoteRecord::empty(user));

            if !record.record_vote(link_id) {
                return Ok(false);
            }

            match self.store.save_vote_record(&record).await {
                Ok(()) => return Ok(true),
                Err(StoreError::Conflict) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(user, link_id, attempt, "Vote record changed underneath us, retrying");
                }
                Err(e) => {
                    tracing::error!(user, link_id, attempt, error = %e, "Failed to save vote record");
                    return Err(e.into());
                }
            }
        }
    }
}
