use crate::core::links::Link;
use crate::core::submissions::SubmissionOutcome;
use crate::core::votes::VoteOutcome;
use chrono::{DateTime, Utc};

/// One block per link: title line, url, then the details.
pub fn format_link(link: &Link, now: DateTime<Utc>) -> String {
    // Clock skew between writer and reader can put created_at slightly ahead
    let age = link
        .age_label(now)
        .unwrap_or_else(|_| "just now".to_string());

    let mut out = format!(
        "[{}] {} ({} vote{})\n    {}\n    {} | submitted by {} {}",
        link.id,
        link.title,
        link.votes,
        if link.votes == 1 { "" } else { "s" },
        link.url,
        link.category,
        link.submitted_by,
        age
    );
    if !link.approved {
        out.push_str(" | awaiting approval");
    }
    if !link.description.is_empty() {
        out.push_str("\n    ");
        out.push_str(&link.description);
    }
    out
}

pub fn format_links(links: &[Link], now: DateTime<Utc>, empty: &str) -> String {
    if links.is_empty() {
        return empty.to_string();
    }
    links
        .iter()
        .map(|link| format_link(link, now))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_submission(outcome: &SubmissionOutcome) -> String {
    match outcome {
        SubmissionOutcome::Accepted(id) => {
            format!("Thanks! Link {} was submitted and is waiting for approval.", id)
        }
        SubmissionOutcome::DuplicateApproved(id) => {
            format!("That link is already on the board as {}.", id)
        }
        SubmissionOutcome::DuplicatePending => {
            "That link was already submitted and is waiting for approval.".to_string()
        }
        SubmissionOutcome::RateLimited => {
            "You have too many links waiting for approval. Try again once some are reviewed."
                .to_string()
        }
    }
}

pub fn format_vote(link_id: &str, outcome: &VoteOutcome) -> String {
    match outcome {
        VoteOutcome::Counted { votes } => {
            format!("Voted for {}. It now has {} votes.", link_id, votes)
        }
        VoteOutcome::AlreadyVoted => format!("You already voted for {}.", link_id),
        VoteOutcome::CountDeferred => {
            format!("Vote for {} recorded. The count will catch up shortly.", link_id)
        }
    }
}
