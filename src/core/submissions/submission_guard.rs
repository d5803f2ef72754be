// Submission guard - decides whether a submitted link gets stored.
//
// Order of checks: sanitize, then duplicate url, then the pending quota.
// A duplicate always wins over the quota.

use crate::core::links::sanitizer::sanitize_submission;
use crate::core::links::{BoardError, DocumentStore, LinkId, LinkSubmission};
use crate::core::ranking::LinkQuery;
use chrono::Utc;
use std::sync::Arc;

/// How many unapproved links a user may have waiting at once.
pub const DEFAULT_PENDING_QUOTA: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The url is already on the board; point the user at it.
    DuplicateApproved(LinkId),
    /// The url is already waiting for moderation.
    DuplicatePending,
    /// Too many of the user's links are still unapproved.
    RateLimited,
    /// Stored as a new, unapproved link.
    Accepted(LinkId),
}

pub struct SubmissionGuard<S: DocumentStore> {
    store: Arc<S>,
    pending_quota: u64,
}

impl<S: DocumentStore> SubmissionGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            pending_quota: DEFAULT_PENDING_QUOTA,
        }
    }

    pub fn with_pending_quota(mut self, pending_quota: u64) -> Self {
        self.pending_quota = pending_quota;
        self
    }

    pub async fn try_submit(
        &self,
        user: &str,
        submission: &LinkSubmission,
    ) -> Result<SubmissionOutcome, BoardError> {
        let link = sanitize_submission(user, submission, Utc::now())?;

        let existing = self
            .store
            .search_one(&LinkQuery::by_url(&link.url))
            .await
            .inspect_err(|e| tracing::error!(user, url = %link.url, error = %e, "Duplicate lookup failed"))?;
        if let Some(existing) = existing {
            tracing::info!(user, url = %link.url, existing = %existing.id, "Duplicate submission");
            return Ok(if existing.approved {
                SubmissionOutcome::DuplicateApproved(existing.id)
            } else {
                SubmissionOutcome::DuplicatePending
            });
        }

        let pending = self
            .store
            .count(&LinkQuery::pending_by(&link.submitted_by))
            .await
            .inspect_err(|e| tracing::error!(user, error = %e, "Pending link count failed"))?;
        if pending >= self.pending_quota {
            tracing::info!(user, pending, quota = self.pending_quota, "Submission rate limited");
            return Ok(SubmissionOutcome::RateLimited);
        }

        let url = link.url.clone();
        match self.store.create_link(link).await {
            Ok(id) => {
                tracing::info!(user, link_id = %id, %url, "Link submitted");
                Ok(SubmissionOutcome::Accepted(id))
            }
            Err(e) => {
                tracing::error!(user, %url, error = %e, "Failed to store submission");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::links::test_support::{FailingStore, LogCapture};
    use crate::core::links::{FieldUpdate, NewLink};
    use crate::infra::links::InMemoryDocumentStore;

    fn submission(url: &str) -> LinkSubmission {
        LinkSubmission {
            title: "<b>Title</b>".into(),
            description: "description".into(),
            url: url.into(),
            category: "Category".into(),
        }
    }

    async fn seed_pending(store: &InMemoryDocumentStore, user: &str, n: usize) {
        for i in 0..n {
            store
                .create_link(NewLink {
                    title: format!("pending {}", i),
                    description: String::new(),
                    url: format!("http://example.org/pending/{}", i),
                    category: "misc".into(),
                    submitted_by: user.into(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn accepted_submission_is_stored_sanitized() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let outcome = guard
            .try_submit("user", &submission("http://example.org"))
            .await
            .unwrap();

        let id = match outcome {
            SubmissionOutcome::Accepted(id) => id,
            other => panic!("expected an accepted submission, got {:?}", other),
        };
        let link = store.get_link(&id).await.unwrap().unwrap();
        assert_eq!(link.title, "Title");
        assert_eq!(link.description, "description");
        assert_eq!(link.category, "category");
        assert_eq!(link.url, "http://example.org");
        assert_eq!(link.submitted_by, "user");
        assert!(!link.approved);
        assert_eq!(link.votes, 1);
    }

    #[tokio::test]
    async fn approved_duplicate_points_at_existing_link() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let guard = SubmissionGuard::new(Arc::clone(&store));
        let Ok(SubmissionOutcome::Accepted(id)) =
            guard.try_submit("user", &submission("http://example.org")).await
        else {
            panic!("first submission should be accepted");
        };
        store.set_field(&id, FieldUpdate::MarkApproved).await.unwrap();

        let outcome = guard
            .try_submit("someone", &submission("http://example.org"))
            .await
            .unwrap();

        assert_eq!(outcome, SubmissionOutcome::DuplicateApproved(id));
        assert_eq!(store.count(&LinkQuery::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_duplicate_is_not_stored_again() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let guard = SubmissionGuard::new(Arc::clone(&store));
        guard
            .try_submit("user", &submission("http://example.org"))
            .await
            .unwrap();

        let outcome = guard
            .try_submit("user", &submission("<i>http://example.org</i>"))
            .await
            .unwrap();

        assert_eq!(outcome, SubmissionOutcome::DuplicatePending);
        assert_eq!(store.count(&LinkQuery::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ten_pending_links_hit_the_quota() {
        let store = Arc::new(InMemoryDocumentStore::new());
        seed_pending(&store, "user", 10).await;
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let outcome = guard
            .try_submit("user", &submission("http://example.org"))
            .await
            .unwrap();

        assert_eq!(outcome, SubmissionOutcome::RateLimited);
        assert_eq!(store.count(&LinkQuery::new()).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn nine_pending_links_still_pass() {
        let store = Arc::new(InMemoryDocumentStore::new());
        seed_pending(&store, "user", 9).await;
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let outcome = guard
            .try_submit("user", &submission("http://example.org"))
            .await
            .unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Accepted(_)));
    }

    #[tokio::test]
    async fn quota_only_counts_the_users_own_pending_links() {
        let store = Arc::new(InMemoryDocumentStore::new());
        seed_pending(&store, "someone else", 10).await;
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let outcome = guard
            .try_submit("user", &submission("http://example.org"))
            .await
            .unwrap();

        assert!(matches!(outcome, SubmissionOutcome::Accepted(_)));
    }

    #[tokio::test]
    async fn duplicate_check_runs_before_the_quota() {
        let store = Arc::new(InMemoryDocumentStore::new());
        seed_pending(&store, "user", 10).await;
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let outcome = guard
            .try_submit("user", &submission("http://example.org/pending/3"))
            .await
            .unwrap();

        assert_eq!(outcome, SubmissionOutcome::DuplicatePending);
    }

    #[tokio::test]
    async fn custom_quota_is_respected() {
        let store = Arc::new(InMemoryDocumentStore::new());
        seed_pending(&store, "user", 2).await;
        let guard = SubmissionGuard::new(Arc::clone(&store)).with_pending_quota(2);

        let outcome = guard
            .try_submit("user", &submission("http://example.org"))
            .await
            .unwrap();

        assert_eq!(outcome, SubmissionOutcome::RateLimited);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_lookup() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let result = guard.try_submit("user", &submission("not a url")).await;

        assert!(matches!(result, Err(BoardError::Validation(_))));
        assert_eq!(store.count(&LinkQuery::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_duplicate_lookup_is_logged_and_nothing_is_stored() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let store = Arc::new(FailingStore::failing(["search_one"]));
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let result = guard.try_submit("user", &submission("http://example.org")).await;

        assert!(matches!(result, Err(BoardError::Unavailable(_))));
        assert!(logs.contents().contains("Duplicate lookup failed"));
        assert_eq!(store.inner.count(&LinkQuery::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_pending_count_is_logged_and_nothing_is_stored() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let store = Arc::new(FailingStore::failing(["count"]));
        let guard = SubmissionGuard::new(Arc::clone(&store));

        let result = guard.try_submit("user", &submission("http://example.org")).await;

        assert!(matches!(result, Err(BoardError::Unavailable(_))));
        assert!(logs.contents().contains("Pending link count failed"));
        assert_eq!(store.inner.count(&LinkQuery::new()).await.unwrap(), 0);
    }
}
