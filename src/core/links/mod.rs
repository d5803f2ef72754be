// Core links module - the data model shared by every feature, plus the
// document store port they all talk to.

pub mod board_error;
pub mod link_models;
pub mod link_store;
pub mod sanitizer;
#[cfg(test)]
pub mod test_support;

pub use board_error::BoardError;
pub use link_models::*;
pub use link_store::{CounterField, DocumentStore, FieldUpdate, IncrementOutcome, StoreError};
