//! Field clean-up shared by the provider normalizers.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::ExternalSource;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Removes markup tags and decodes the handful of entities providers emit.
pub fn strip_html(text: &str) -> String {
    let stripped = HTML_TAG.replace_all(text, "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Trims and discards blank strings.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`non_empty`], rewriting `http://` image links to `https://`.
pub fn secure_url(value: Option<String>) -> Option<String> {
    non_empty(value).map(|url| match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url,
    })
}

/// Joins non-blank names with `", "`.
pub fn join_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Picks the ISBN-13 out of a space separated list, falling back to ISBN-10.
pub fn pick_isbn(raw: &str) -> String {
    let candidates: Vec<String> = raw
        .split_whitespace()
        .map(|token| token.chars().filter(|c| *c != '-').collect())
        .collect();

    candidates
        .iter()
        .find(|isbn| isbn.len() == 13)
        .or_else(|| candidates.iter().find(|isbn| isbn.len() == 10))
        .cloned()
        .unwrap_or_default()
}

/// True for 10 or 13 character ISBNs (hyphens ignored, ISBN-10 may end in X).
pub fn looks_like_isbn(value: &str) -> bool {
    let compact: Vec<char> = value.trim().chars().filter(|c| *c != '-').collect();
    match compact.len() {
        13 => compact.iter().all(char::is_ascii_digit),
        10 => {
            compact[..9].iter().all(char::is_ascii_digit)
                && (compact[9].is_ascii_digit() || compact[9].eq_ignore_ascii_case(&'x'))
        }
        _ => false,
    }
}

/// Renders `YYYYMMDD` as `YYYY-MM-DD`; other shapes pass through unchanged.
pub fn compact_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y%m%d") {
        Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
        Err(_) => Some(raw.to_string()),
    }
}

/// Stable identifier for items the provider does not identify itself.
///
/// FNV-1a over the parts, so the same item maps to the same id across runs.
pub fn synthetic_id(source: ExternalSource, parts: &[&str]) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0x1f)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    format!("{}:{hash:016x}", source.as_str())
}
