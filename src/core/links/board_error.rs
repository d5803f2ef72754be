use super::link_models::LinkId;
use super::link_store::StoreError;
use thiserror::Error;

/// Failures surfaced by the board services.
///
/// Business states such as "already voted" or "duplicate url" are not errors;
/// they come back as outcome enums. Only the cases below interrupt a request.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Bad user input, recoverable by asking again.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The resource is absent or the caller may not see it. The two cases are
    /// deliberately indistinguishable.
    #[error("Not found")]
    NotFound,

    /// The vote counter could not be updated within the retry budget.
    #[error("Vote count update for link {link_id} ran out of retries")]
    ConflictExhausted { link_id: LinkId },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => BoardError::NotFound,
            StoreError::Unavailable(msg) => BoardError::Unavailable(msg),
            StoreError::Conflict => {
                BoardError::Unavailable("concurrent update could not be resolved".to_string())
            }
            StoreError::Serialization(e) => BoardError::Unavailable(e.to_string()),
        }
    }
}
