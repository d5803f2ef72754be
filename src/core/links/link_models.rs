// Link domain models - the documents the board stores.
//
// These are pure domain types with no storage dependencies.
// Stores persist them however they like; the services only ever see these shapes.

use super::board_error::BoardError;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Opaque document id, assigned by the store when a link is created.
pub type LinkId = String;

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const URL_MAX_LEN: usize = 500;
pub const CATEGORY_MAX_LEN: usize = 100;
pub const SUBMITTED_BY_MAX_LEN: usize = 100;

/// Every link starts out with the submitter's own vote.
pub const INITIAL_VOTES: u64 = 1;

/// A stored link.
///
/// `votes` only ever grows outside of moderation, and `approved` goes from
/// `false` to `true` once and stays there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
    pub votes: u64,
}

impl Link {
    /// Human readable age of the link relative to `now`, e.g. "3 hours ago".
    ///
    /// Days, months and years are counted on calendar dates, so a link posted
    /// late last night is already "yesterday".
    pub fn age_label(&self, now: DateTime<Utc>) -> Result<String, BoardError> {
        let elapsed = now.signed_duration_since(self.created_at);
        if elapsed < chrono::Duration::zero() {
            return Err(BoardError::Validation(format!(
                "link created at {} is later than {}",
                self.created_at, now
            )));
        }

        let (years, months, days) = calendar_period(self.created_at.date_naive(), now.date_naive());

        let label = if years > 1 {
            format!("{} years ago", years)
        } else if years == 1 {
            "1 year ago".to_string()
        } else if months > 1 {
            format!("{} months ago", months)
        } else if months == 1 {
            "1 month ago".to_string()
        } else if days > 1 {
            format!("{} days ago", days)
        } else if days == 1 {
            "yesterday".to_string()
        } else if elapsed.num_hours() > 1 {
            format!("{} hours ago", elapsed.num_hours())
        } else if elapsed.num_hours() == 1 {
            "1 hour ago".to_string()
        } else if elapsed.num_minutes() > 5 {
            format!("{} minutes ago", elapsed.num_minutes())
        } else {
            "just now".to_string()
        };

        Ok(label)
    }
}

/// Years, months and days between two dates, borrowing from the month count
/// when the day of month has not been reached yet.
fn calendar_period(start: NaiveDate, end: NaiveDate) -> (i32, i32, i64) {
    let mut total_months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    let mut days = end.day() as i64 - start.day() as i64;

    if total_months > 0 && days < 0 {
        total_months -= 1;
        let shifted = start
            .checked_add_months(Months::new(total_months as u32))
            .unwrap_or(start);
        days = end.signed_duration_since(shifted).num_days();
    }

    (total_months / 12, total_months % 12, days)
}

/// Raw form fields of a submission, exactly as the user typed them.
#[derive(Debug, Clone, Default)]
pub struct LinkSubmission {
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
}

/// A sanitized link that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewLink {
    /// Materialize the stored document under the id the store picked.
    pub fn into_link(self, id: LinkId) -> Link {
        Link {
            id,
            title: self.title,
            description: self.description,
            url: self.url,
            category: self.category,
            submitted_by: self.submitted_by,
            created_at: self.created_at,
            approved: false,
            votes: INITIAL_VOTES,
        }
    }
}

/// Which links a user has already voted for.
///
/// `version` is 0 until the record is first persisted and is bumped by the
/// store on every save, so two concurrent writers cannot both win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVoteRecord {
    pub user: String,
    pub link_ids: BTreeSet<LinkId>,
    pub version: u64,
}

impl UserVoteRecord {
    /// A record for a user who has never voted. Not persisted yet.
    pub fn empty(user: &str) -> Self {
        Self {
            user: user.to_string(),
            link_ids: BTreeSet::new(),
            version: 0,
        }
    }

    pub fn has_voted(&self, link_id: &str) -> bool {
        self.link_ids.contains(link_id)
    }

    /// Add a vote. Returns `false` if the user had already voted for the link.
    pub fn record_vote(&mut self, link_id: &str) -> bool {
        self.link_ids.insert(link_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn link_created_at(created_at: DateTime<Utc>) -> Link {
        NewLink {
            title: "Title".into(),
            description: "description".into(),
            url: "http://example.org".into(),
            category: "category".into(),
            submitted_by: "user".into(),
            created_at,
        }
        .into_link("my_id".into())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap()
    }

    fn age_of(created_at: DateTime<Utc>) -> String {
        link_created_at(created_at).age_label(now()).unwrap()
    }

    #[test]
    fn new_links_start_unapproved_with_one_vote() {
        let link = link_created_at(now());
        assert_eq!(link.id, "my_id");
        assert!(!link.approved);
        assert_eq!(link.votes, 1);
    }

    #[test]
    fn age_label_within_the_same_day() {
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 15, 11, 58, 0).unwrap()), "just now");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 15, 11, 55, 0).unwrap()), "just now");
        assert_eq!(
            age_of(Utc.with_ymd_and_hms(2020, 6, 15, 11, 30, 0).unwrap()),
            "30 minutes ago"
        );
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 15, 10, 30, 0).unwrap()), "1 hour ago");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 15, 2, 0, 0).unwrap()), "10 hours ago");
    }

    #[test]
    fn age_label_uses_calendar_days_months_and_years() {
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 14, 12, 0, 0).unwrap()), "yesterday");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 14, 23, 0, 0).unwrap()), "yesterday");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 6, 10, 12, 0, 0).unwrap()), "5 days ago");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 5, 15, 12, 0, 0).unwrap()), "1 month ago");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap()), "3 months ago");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2019, 6, 15, 12, 0, 0).unwrap()), "1 year ago");
        assert_eq!(age_of(Utc.with_ymd_and_hms(2017, 1, 1, 12, 0, 0).unwrap()), "3 years ago");
    }

    #[test]
    fn age_label_borrows_a_month_when_day_not_reached() {
        // May 20th -> June 15th is 26 days, not a month
        assert_eq!(age_of(Utc.with_ymd_and_hms(2020, 5, 20, 12, 0, 0).unwrap()), "26 days ago");
    }

    #[test]
    fn age_label_rejects_future_links() {
        let link = link_created_at(Utc.with_ymd_and_hms(2020, 6, 16, 0, 0, 0).unwrap());
        assert!(matches!(
            link.age_label(now()),
            Err(BoardError::Validation(_))
        ));
    }

    #[test]
    fn vote_record_never_holds_duplicates() {
        let mut record = UserVoteRecord::empty("user");
        assert!(record.record_vote("123"));
        assert!(!record.record_vote("123"));
        assert!(record.record_vote("456"));

        assert_eq!(record.link_ids.len(), 2);
        assert!(record.has_voted("123"));
        assert!(!record.has_voted("789"));
        assert_eq!(record.version, 0);
    }
}
