// Test doubles shared by the service tests.

use super::{
    CounterField, DocumentStore, FieldUpdate, IncrementOutcome, Link, LinkId, NewLink, StoreError,
    UserVoteRecord,
};
use crate::core::ranking::LinkQuery;
use crate::infra::links::InMemoryDocumentStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// In-memory store whose chosen operations fail as if the backend were down.
#[derive(Default)]
pub struct FailingStore {
    pub inner: InMemoryDocumentStore,
    failing: HashSet<&'static str>,
    all: bool,
}

impl FailingStore {
    /// Every operation fails.
    pub fn down() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    /// Only the named operations fail, e.g. `["count"]`.
    pub fn failing<const N: usize>(operations: [&'static str; N]) -> Self {
        Self {
            failing: operations.into_iter().collect(),
            ..Self::default()
        }
    }

    fn check(&self, operation: &str) -> Result<(), StoreError> {
        if self.all || self.failing.contains(operation) {
            Err(StoreError::Unavailable(format!("{} is down", operation)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get_link(&self, id: &str) -> Result<Option<Link>, StoreError> {
        self.check("get_link")?;
        self.inner.get_link(id).await
    }
    async fn create_link(&self, link: NewLink) -> Result<LinkId, StoreError> {
        self.check("create_link")?;
        self.inner.create_link(link).await
    }
    async fn search_one(&self, query: &LinkQuery) -> Result<Option<Link>, StoreError> {
        self.check("search_one")?;
        self.inner.search_one(query).await
    }
    async fn count(&self, query: &LinkQuery) -> Result<u64, StoreError> {
        self.check("count")?;
        self.inner.count(query).await
    }
    async fn search(&self, query: &LinkQuery) -> Result<Vec<Link>, StoreError> {
        self.check("search")?;
        self.inner.search(query).await
    }
    async fn increment(
        &self,
        id: &str,
        field: CounterField,
        delta: u64,
        max_retries: u32,
    ) -> Result<IncrementOutcome, StoreError> {
        self.check("increment")?;
        self.inner.increment(id, field, delta, max_retries).await
    }
    async fn set_field(&self, id: &str, update: FieldUpdate) -> Result<(), StoreError> {
        self.check("set_field")?;
        self.inner.set_field(id, update).await
    }
    async fn delete_link(&self, id: &str) -> Result<(), StoreError> {
        self.check("delete_link")?;
        self.inner.delete_link(id).await
    }
    async fn get_vote_record(&self, user: &str) -> Result<Option<UserVoteRecord>, StoreError> {
        self.check("get_vote_record")?;
        self.inner.get_vote_record(user).await
    }
    async fn save_vote_record(&self, record: &UserVoteRecord) -> Result<(), StoreError> {
        self.check("save_vote_record")?;
        self.inner.save_vote_record(record).await
    }
}

/// Collects tracing output of the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Logs go into the buffer until the returned guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
