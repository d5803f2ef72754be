// Core moderation module - admin allowlist and the actions it guards.

pub mod moderation_gate;
pub mod moderation_service;

pub use moderation_gate::{AdminAllowlist, ModerationGate};
pub use moderation_service::ModerationService;
