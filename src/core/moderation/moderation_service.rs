// Moderation service - approve and delete links.
//
// Both actions are admin-only and go through the gate first. Deleting a link
// leaves its id in users' vote records; nothing cleans those up.

use super::moderation_gate::ModerationGate;
use crate::core::links::{BoardError, DocumentStore, FieldUpdate};
use std::sync::Arc;

pub struct ModerationService<S: DocumentStore> {
    store: Arc<S>,
    gate: ModerationGate,
}

impl<S: DocumentStore> ModerationService<S> {
    pub fn new(store: Arc<S>, gate: ModerationGate) -> Self {
        Self { store, gate }
    }

    /// Make a link visible in the public feed. Visible to reads right away.
    pub async fn approve(&self, actor: Option<&str>, link_id: &str) -> Result<(), BoardError> {
        self.gate.require_admin(actor)?;

        if let Err(e) = self.store.set_field(link_id, FieldUpdate::MarkApproved).await {
            tracing::error!(link_id, error = %e, "Failed to approve link");
            return Err(e.into());
        }

        tracing::info!(link_id, admin = ?actor, "Link approved");
        Ok(())
    }

    /// Remove a link for good.
    pub async fn delete(&self, actor: Option<&str>, link_id: &str) -> Result<(), BoardError> {
        self.gate.require_admin(actor)?;

        if let Err(e) = self.store.delete_link(link_id).await {
            tracing::error!(link_id, error = %e, "Failed to delete link");
            return Err(e.into());
        }

        tracing::info!(link_id, admin = ?actor, "Link deleted");
        Ok(())
    }
}
