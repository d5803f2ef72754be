// Implementations of the document store.

pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
pub use in_memory::InMemoryDocumentStore;
pub use sqlite_store::SqliteDocumentStore;
