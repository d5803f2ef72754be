use super::link_query::{Boost, LinkQuery, SortOrder, TermFilter, TextField, TextMatch};
use chrono::{DateTime, Duration, Utc};

/// Tunables for the feed. The defaults mirror what the board has always used.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    /// Age at which the recency boost has dropped to half.
    pub recency_pivot: Duration,
    /// Vote count at which the popularity boost reaches half.
    pub vote_saturation_pivot: f64,
    /// Share of search terms a link has to contain.
    pub minimum_should_match: f64,
    pub feed_page_size: usize,
    pub unapproved_page_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            recency_pivot: Duration::days(7),
            vote_saturation_pivot: 10.0,
            minimum_should_match: 0.66,
            feed_page_size: 10,
            unapproved_page_size: 50,
        }
    }
}

/// Builds the queries behind the public feed and the moderation queue.
#[derive(Debug, Clone, Default)]
pub struct RankingQuery {
    config: RankingConfig,
}

impl RankingQuery {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Approved links, scored by recency plus saturated popularity.
    ///
    /// With `search_text`, links must also contain enough of its terms in the
    /// title or description. An empty string counts as no search.
    pub fn build_feed_query(&self, search_text: Option<&str>, now: DateTime<Utc>) -> LinkQuery {
        let mut query = LinkQuery::new()
            .filter(TermFilter::Approved(true))
            .boost(Boost::Recency {
                origin: now,
                pivot: self.config.recency_pivot,
            })
            .boost(Boost::VoteSaturation {
                pivot: self.config.vote_saturation_pivot,
            })
            .sort(SortOrder::Score)
            .limit(self.config.feed_page_size);

        if let Some(text) = search_text.filter(|t| !t.is_empty()) {
            query = query.text(TextMatch {
                text: text.to_string(),
                fields: vec![TextField::Title, TextField::Description],
                minimum_should_match: self.config.minimum_should_match,
            });
        }

        query
    }

    /// The newest links still waiting for approval, unscored.
    pub fn build_unapproved_query(&self) -> LinkQuery {
        LinkQuery::new()
            .filter(TermFilter::Approved(false))
            .sort(SortOrder::CreatedAtDesc)
            .limit(self.config.unapproved_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::links::Link;

    fn link(id: &str, approved: bool) -> Link {
        Link {
            id: id.into(),
            title: "Rust ownership explained".into(),
            description: "borrowing and lifetimes".into(),
            url: format!("http://example.org/{}", id),
            category: "rust".into(),
            submitted_by: "user".into(),
            created_at: Utc::now(),
            approved,
            votes: 1,
        }
    }

    #[test]
    fn feed_query_only_admits_approved_links() {
        let query = RankingQuery::default().build_feed_query(None, Utc::now());
        let hits = query.execute(vec![link("a", true), link("b", false), link("c", true)]);

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|l| l.approved));
    }

    #[test]
    fn feed_query_carries_both_boosts_and_the_page_size() {
        let query = RankingQuery::default().build_feed_query(None, Utc::now());
        assert_eq!(query.boosts.len(), 2);
        assert_eq!(query.limit, Some(10));
        assert!(query.text.is_none());
    }

    #[test]
    fn empty_search_text_is_ignored() {
        let query = RankingQuery::default().build_feed_query(Some(""), Utc::now());
        assert!(query.text.is_none());
    }

    #[test]
    fn whitespace_only_search_matches_nothing() {
        let query = RankingQuery::default().build_feed_query(Some("   "), Utc::now());
        assert!(query.text.is_some());
        assert!(!query.matches(&link("a", true)));
    }

    #[test]
    fn search_text_filters_on_title_and_description() {
        let query = RankingQuery::default().build_feed_query(Some("lifetimes rust"), Utc::now());
        assert!(query.matches(&link("a", true)));

        let query = RankingQuery::default().build_feed_query(Some("python django flask"), Utc::now());
        assert!(!query.matches(&link("a", true)));
    }

    #[test]
    fn unapproved_query_is_newest_first_and_capped() {
        let query = RankingQuery::default().build_unapproved_query();
        assert_eq!(query.filters, vec![TermFilter::Approved(false)]);
        assert_eq!(query.sort, SortOrder::CreatedAtDesc);
        assert_eq!(query.limit, Some(50));
        assert!(query.boosts.is_empty());
    }
}
