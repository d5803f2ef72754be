// CLI layer - command definitions and dispatch.
//
// Same rule as any adapter: parse arguments, call one core service, print the
// result. No business logic lives here.

#[path = "formatting.rs"]
pub mod formatting;

use crate::config::BoardConfig;
use crate::core::links::{DocumentStore, LinkSubmission};
use crate::core::moderation::{ModerationGate, ModerationService};
use crate::core::ranking::{FeedService, RankingQuery};
use crate::core::submissions::SubmissionGuard;
use crate::core::votes::VoteLedger;
use chrono::Utc;
use clap::{Parser, Subcommand};
use formatting::{format_link, format_links, format_submission, format_vote};
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "link-rating")]
#[command(version)]
#[command(about = "Community link board: submit, vote on and moderate links")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit a link for moderation
    Submit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        category: String,
    },
    /// Vote for a link
    Vote {
        #[arg(long)]
        user: String,
        link_id: String,
    },
    /// Show the ranked feed of approved links
    Feed {
        /// Only links mentioning most of these words
        #[arg(long, short)]
        query: Option<String>,
        /// Print the links as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single link
    Show {
        link_id: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// List links waiting for approval (admins only)
    Unapproved {
        #[arg(long)]
        user: String,
        /// Print the links as JSON
        #[arg(long)]
        json: bool,
    },
    /// Approve a link (admins only)
    Approve {
        #[arg(long)]
        user: String,
        link_id: String,
    },
    /// Delete a link (admins only)
    Delete {
        #[arg(long)]
        user: String,
        link_id: String,
    },
}

/// Everything a command needs, wired once at startup.
pub struct AppContext<S: DocumentStore> {
    pub votes: VoteLedger<S>,
    pub submissions: SubmissionGuard<S>,
    pub feed: FeedService<S>,
    pub moderation: ModerationService<S>,
}

impl<S: DocumentStore> AppContext<S> {
    pub fn new(store: Arc<S>, config: &BoardConfig) -> Self {
        let gate = ModerationGate::new(config.admins.clone());
        Self {
            votes: VoteLedger::new(Arc::clone(&store))
                .with_max_retries(config.vote_retry_limit),
            submissions: SubmissionGuard::new(Arc::clone(&store))
                .with_pending_quota(config.pending_quota),
            feed: FeedService::new(
                Arc::clone(&store),
                RankingQuery::new(config.ranking.clone()),
                gate.clone(),
            ),
            moderation: ModerationService::new(store, gate),
        }
    }
}

pub async fn run<S, W>(ctx: &AppContext<S>, command: Command, out: &mut W) -> anyhow::Result<()>
where
    S: DocumentStore,
    W: Write,
{
    let now = Utc::now();

    match command {
        Command::Submit {
            user,
            title,
            description,
            url,
            category,
        } => {
            let submission = LinkSubmission {
                title,
                description,
                url,
                category,
            };
            let outcome = ctx.submissions.try_submit(&user, &submission).await?;
            writeln!(out, "{}", format_submission(&outcome))?;
        }
        Command::Vote { user, link_id } => {
            let outcome = ctx.votes.register_vote(&user, &link_id).await?;
            writeln!(out, "{}", format_vote(&link_id, &outcome))?;
        }
        Command::Feed { query, json } => {
            let links = ctx.feed.feed(query.as_deref()).await;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&links)?)?;
            } else {
                writeln!(out, "{}", format_links(&links, now, "No links yet."))?;
            }
        }
        Command::Show { link_id, user } => {
            let link = ctx.feed.show_link(user.as_deref(), &link_id).await?;
            writeln!(out, "{}", format_link(&link, now))?;
            if let Some(user) = user.as_deref() {
                if ctx.votes.has_voted(user, &link_id).await? {
                    writeln!(out, "    (you voted for this link)")?;
                }
            }
        }
        Command::Unapproved { user, json } => {
            let links = ctx.feed.unapproved(Some(&user)).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&links)?)?;
            } else {
                writeln!(
                    out,
                    "{}",
                    format_links(&links, now, "Nothing is waiting for approval.")
                )?;
            }
        }
        Command::Approve { user, link_id } => {
            ctx.moderation.approve(Some(&user), &link_id).await?;
            writeln!(out, "Approved {}.", link_id)?;
        }
        Command::Delete { user, link_id } => {
            ctx.moderation.delete(Some(&user), &link_id).await?;
            writeln!(out, "Deleted {}.", link_id)?;
        }
    }

    Ok(())
}
