// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "links/mod.rs"]
pub mod links;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "ranking/mod.rs"]
pub mod ranking;

#[path = "submissions/submission_guard.rs"]
pub mod submissions;

#[path = "votes/vote_ledger.rs"]
pub mod votes;
