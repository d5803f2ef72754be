// Process configuration, read once at startup and handed to the services.

use crate::core::moderation::AdminAllowlist;
use crate::core::ranking::RankingConfig;
use crate::core::submissions::DEFAULT_PENDING_QUOTA;
use crate::core::votes::{DEFAULT_VOTE_RETRIES, MAX_VOTE_RETRIES};
use anyhow::Context;
use std::str::FromStr;

pub const DEFAULT_DATABASE_PATH: &str = "data/links.db";

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub admins: AdminAllowlist,
    pub database_path: String,
    pub pending_quota: u64,
    pub vote_retry_limit: u32,
    pub ranking: RankingConfig,
}

impl BoardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let admins = get("ADMINS")
            .map(|raw| AdminAllowlist::parse(&raw))
            .unwrap_or_default();
        let database_path = get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.into());
        let pending_quota = parse_or(get("PENDING_QUOTA"), DEFAULT_PENDING_QUOTA, "PENDING_QUOTA")?;
        let vote_retry_limit =
            parse_or(get("VOTE_RETRY_LIMIT"), DEFAULT_VOTE_RETRIES, "VOTE_RETRY_LIMIT")?;
        if vote_retry_limit > MAX_VOTE_RETRIES {
            anyhow::bail!("VOTE_RETRY_LIMIT must be <= {}", MAX_VOTE_RETRIES);
        }

        let defaults = RankingConfig::default();
        let vote_saturation_pivot = parse_or(
            get("VOTE_SATURATION_PIVOT"),
            defaults.vote_saturation_pivot,
            "VOTE_SATURATION_PIVOT",
        )?;
        if !(vote_saturation_pivot.is_finite() && vote_saturation_pivot > 0.0) {
            anyhow::bail!("VOTE_SATURATION_PIVOT must be a positive number");
        }
        let feed_page_size =
            parse_or(get("FEED_PAGE_SIZE"), defaults.feed_page_size, "FEED_PAGE_SIZE")?;
        if feed_page_size == 0 {
            anyhow::bail!("FEED_PAGE_SIZE must be >= 1");
        }

        if admins.is_empty() {
            tracing::warn!("ADMINS is empty, nobody can moderate");
        }

        Ok(Self {
            admins,
            database_path,
            pending_quota,
            vote_retry_limit,
            ranking: RankingConfig {
                vote_saturation_pivot,
                feed_page_size,
                ..defaults
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, default: T, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
