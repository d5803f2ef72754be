// Sanitizer - keeps markup out of stored links and enforces field limits.
//
// Everything in here is a pure function. Stripping runs to a fixed point, so
// sanitizing already-sanitized text never changes it again.

use super::board_error::BoardError;
use super::link_models::{
    LinkSubmission, NewLink, CATEGORY_MAX_LEN, DESCRIPTION_MAX_LEN, SUBMITTED_BY_MAX_LEN,
    TITLE_MAX_LEN, URL_MAX_LEN,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("valid regex"));
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|$)").expect("valid regex"));
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?(?:</style\s*>|$)").expect("valid regex"));
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</?[A-Za-z!?][^>]*>").expect("valid regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("valid regex")
});

/// Decode character references such as `&amp;` or `&#38;`. Anything that is
/// not a known entity stays as written.
fn decode_entities(input: &str) -> String {
    ENTITY_RE
        .replace_all(input, |caps: &regex::Captures| {
            htmlescape::decode_html(&caps[0]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Remove tags, comments and script/style blocks and decode entities. Text
/// between ordinary tags is kept, so `<b>Tom &amp; Jerry</b>` becomes
/// `Tom & Jerry`.
pub fn strip_markup(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = COMMENT_RE.replace_all(&current, "");
        let next = SCRIPT_RE.replace_all(&next, "");
        let next = STYLE_RE.replace_all(&next, "");
        let next = TAG_RE.replace_all(&next, "");
        let next = decode_entities(&next);
        // Removing one tag can glue the halves of another together, and a
        // decoded `&lt;` can open a new one
        if next == current {
            return current;
        }
        current = next;
    }
}

fn check_length(field: &str, input: &str, max_len: usize) -> Result<(), BoardError> {
    if input.chars().count() > max_len {
        return Err(BoardError::Validation(format!(
            "{} was more than {} characters",
            field, max_len
        )));
    }
    Ok(())
}

/// Length-check the raw input, then strip markup from it.
pub fn sanitize(field: &str, input: &str, max_len: usize) -> Result<String, BoardError> {
    check_length(field, input, max_len)?;
    Ok(strip_markup(input))
}

/// Like `sanitize`, lower-cased.
pub fn sanitize_category(input: &str, max_len: usize) -> Result<String, BoardError> {
    check_length("category", input, max_len)?;
    // `&#65;` decodes to an upper-case letter, so lower-case until stable
    let mut current = strip_markup(&input.to_lowercase());
    loop {
        let next = strip_markup(&current.to_lowercase());
        if next == current {
            return Ok(current);
        }
        current = next;
    }
}

/// Like `sanitize`, and the result must be an absolute url with a host.
/// The url text itself is kept as typed (minus surrounding whitespace).
pub fn sanitize_url(input: &str, max_len: usize) -> Result<String, BoardError> {
    let stripped = sanitize("url", input, max_len)?;
    let trimmed = stripped.trim();

    match Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => Ok(trimmed.to_string()),
        _ => Err(BoardError::Validation("invalid url".to_string())),
    }
}

/// Turn raw form input into a link ready to be stored.
pub fn sanitize_submission(
    user: &str,
    submission: &LinkSubmission,
    now: DateTime<Utc>,
) -> Result<NewLink, BoardError> {
    let submitted_by = sanitize("submitted_by", user, SUBMITTED_BY_MAX_LEN)?;
    if submitted_by.trim().is_empty() {
        return Err(BoardError::Validation(
            "a user handle is required".to_string(),
        ));
    }

    Ok(NewLink {
        title: sanitize("title", &submission.title, TITLE_MAX_LEN)?,
        description: sanitize("description", &submission.description, DESCRIPTION_MAX_LEN)?,
        url: sanitize_url(&submission.url, URL_MAX_LEN)?,
        category: sanitize_category(&submission.category, CATEGORY_MAX_LEN)?,
        submitted_by,
        created_at: now,
    })
}
