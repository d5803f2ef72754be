// Link queries - a small retrieval language over links.
//
// A query is plain data. The evaluator lives here too so every store executes
// the same filtering, scoring and ordering rules; a store may push the term
// filters down to its backend but must finish through `LinkQuery::execute`.

use crate::core::links::Link;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Exact-value filters on keyword fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TermFilter {
    Approved(bool),
    Url(String),
    SubmittedBy(String),
}

impl TermFilter {
    pub fn matches(&self, link: &Link) -> bool {
        match self {
            TermFilter::Approved(approved) => link.approved == *approved,
            TermFilter::Url(url) => link.url == *url,
            TermFilter::SubmittedBy(user) => link.submitted_by == *user,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
}

/// Full-text requirement: at least `minimum_should_match` of the query terms
/// have to appear somewhere in `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub text: String,
    pub fields: Vec<TextField>,
    pub minimum_should_match: f64,
}

/// Lower-cased alphanumeric terms.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| term.to_lowercase())
}

impl TextMatch {
    fn query_terms(&self) -> BTreeSet<String> {
        tokenize(&self.text).collect()
    }

    /// How many distinct query terms must match. Never less than one.
    pub fn required_terms(&self) -> usize {
        let total = self.query_terms().len();
        let required = (total as f64 * self.minimum_should_match).floor() as usize;
        required.max(1).min(total.max(1))
    }

    /// Fraction of query terms found in the link, or `None` when the link
    /// misses the threshold. A query without any terms matches nothing.
    pub fn evaluate(&self, link: &Link) -> Option<f64> {
        let wanted = self.query_terms();
        if wanted.is_empty() {
            return None;
        }

        let mut present = BTreeSet::new();
        for field in &self.fields {
            let text = match field {
                TextField::Title => &link.title,
                TextField::Description => &link.description,
            };
            present.extend(tokenize(text));
        }

        let matched = wanted.iter().filter(|term| present.contains(*term)).count();
        if matched >= self.required_terms() {
            Some(matched as f64 / wanted.len() as f64)
        } else {
            None
        }
    }
}

/// Optional score contributions. Each one lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Boost {
    /// `pivot / (pivot + distance)` between `created_at` and `origin`:
    /// 1.0 for brand new links, 0.5 at one pivot of age.
    Recency {
        origin: DateTime<Utc>,
        pivot: Duration,
    },
    /// `votes / (votes + pivot)`: every extra vote helps less than the last.
    VoteSaturation { pivot: f64 },
}

impl Boost {
    pub fn score(&self, link: &Link) -> f64 {
        match self {
            Boost::Recency { origin, pivot } => {
                let distance = origin
                    .signed_duration_since(link.created_at)
                    .num_seconds()
                    .unsigned_abs() as f64;
                let pivot = pivot.num_seconds().max(1) as f64;
                pivot / (pivot + distance)
            }
            Boost::VoteSaturation { pivot } => {
                let votes = link.votes as f64;
                if votes <= 0.0 {
                    0.0
                } else {
                    votes / (votes + pivot.max(f64::MIN_POSITIVE))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Highest score first; newer links win ties.
    #[default]
    Score,
    /// Newest first, scores ignored.
    CreatedAtDesc,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkQuery {
    pub filters: Vec<TermFilter>,
    pub text: Option<TextMatch>,
    pub boosts: Vec<Boost>,
    pub sort: SortOrder,
    pub limit: Option<usize>,
}

impl LinkQuery {
    /// Match every link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links stored under exactly this url.
    pub fn by_url(url: &str) -> Self {
        Self::new().filter(TermFilter::Url(url.to_string()))
    }

    /// Links of `user` still waiting for moderation.
    pub fn pending_by(user: &str) -> Self {
        Self::new()
            .filter(TermFilter::SubmittedBy(user.to_string()))
            .filter(TermFilter::Approved(false))
    }

    pub fn filter(mut self, filter: TermFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn text(mut self, text: TextMatch) -> Self {
        self.text = Some(text);
        self
    }

    pub fn boost(mut self, boost: Boost) -> Self {
        self.boosts.push(boost);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, link: &Link) -> bool {
        self.filters.iter().all(|f| f.matches(link))
            && self
                .text
                .as_ref()
                .map_or(true, |text| text.evaluate(link).is_some())
    }

    /// Relevance of a matching link. Filters contribute nothing.
    pub fn score(&self, link: &Link) -> f64 {
        let text_score = self
            .text
            .as_ref()
            .and_then(|text| text.evaluate(link))
            .unwrap_or(0.0);
        text_score + self.boosts.iter().map(|b| b.score(link)).sum::<f64>()
    }

    /// Run the query over a candidate set.
    pub fn execute<I>(&self, candidates: I) -> Vec<Link>
    where
        I: IntoIterator<Item = Link>,
    {
        let mut hits: Vec<(f64, Link)> = candidates
            .into_iter()
            .filter(|link| self.matches(link))
            .map(|link| {
                let score = match self.sort {
                    SortOrder::Score => self.score(&link),
                    SortOrder::CreatedAtDesc => 0.0,
                };
                (score, link)
            })
            .collect();

        hits.sort_by(|(score_a, a), (score_b, b)| {
            let by_score = match self.sort {
                SortOrder::Score => score_b.total_cmp(score_a),
                SortOrder::CreatedAtDesc => Ordering::Equal,
            };
            by_score
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        if let Some(limit) = self.limit {
            hits.truncate(limit);
        }

        hits.into_iter().map(|(_, link)| link).collect()
    }
}
