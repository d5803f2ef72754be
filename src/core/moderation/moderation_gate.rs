// Moderation gate - who is allowed to moderate.
//
// The allowlist is fixed at startup and handed in by the caller; the gate
// never looks at the environment itself.

use crate::core::links::BoardError;
use std::collections::HashSet;
use std::sync::Arc;

/// Handles allowed to moderate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowlist {
    handles: HashSet<String>,
}

impl AdminAllowlist {
    pub fn new<I, T>(handles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            handles: handles
                .into_iter()
                .map(Into::into)
                .map(|h: String| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Parse a comma separated list such as `"alice, bob"`.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.handles.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ModerationGate {
    admins: Arc<AdminAllowlist>,
}

impl ModerationGate {
    pub fn new(admins: AdminAllowlist) -> Self {
        Self {
            admins: Arc::new(admins),
        }
    }

    pub fn is_admin(&self, handle: Option<&str>) -> bool {
        handle.is_some_and(|h| self.admins.contains(h))
    }

    /// Let admins through. Everyone else, including anonymous callers, gets
    /// `NotFound` so admin-only routes look exactly like missing ones.
    pub fn require_admin(&self, handle: Option<&str>) -> Result<(), BoardError> {
        if self.is_admin(handle) {
            Ok(())
        } else {
            tracing::debug!(user = ?handle, "Denied admin-only action");
            Err(BoardError::NotFound)
        }
    }
}
