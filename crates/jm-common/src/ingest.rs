use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Rows per multi-row upsert statement.
pub const UPSERT_CHUNK_SIZE: usize = 100;

/// A scraped listing on its way into the store.
///
/// `posted_at` is only used when the url is new; the store stamps `NOW()` when
/// it is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

/// Storage key for a listing url: origin plus path, without query, fragment
/// or a trailing slash. Unparseable input is only trimmed.
pub fn normalize_url_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let joined = match Url::parse(trimmed) {
        Ok(url) => format!("{}{}", url.origin().ascii_serialization(), url.path()),
        Err(_) => trimmed.to_string(),
    };

    match joined.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => joined,
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Normalize keys and collapse duplicates.
///
/// The last row for a key wins, but the key keeps the position of its first
/// occurrence. Rows whose key is empty are dropped. A blank `source` falls back
/// to the url's host.
pub fn dedupe_by_url(rows: Vec<NewListing>) -> Vec<NewListing> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<NewListing> = Vec::new();

    for mut row in rows {
        let key = normalize_url_key(&row.url);
        if key.is_empty() {
            continue;
        }
        if row.source.trim().is_empty() {
            row.source = host_of(&key).unwrap_or_default();
        }
        row.url = key.clone();

        match positions.get(&key) {
            Some(&idx) => deduped[idx] = row,
            None => {
                positions.insert(key, deduped.len());
                deduped.push(row);
            }
        }
    }

    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(url: &str, title: &str) -> NewListing {
        NewListing {
            url: url.into(),
            title: title.into(),
            source: "siteA".into(),
            ..NewListing::default()
        }
    }

    #[test]
    fn key_drops_query_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url_key(" https://Jobs.Example.com/projects/42/?ref=top#apply "),
            "https://jobs.example.com/projects/42"
        );
        assert_eq!(normalize_url_key("https://example.com/"), "https://example.com");
        assert_eq!(
            normalize_url_key("https://example.com:443/a"),
            "https://example.com/a"
        );
    }

    #[test]
    fn unparseable_key_is_trimmed_only() {
        assert_eq!(normalize_url_key("  /projects/7/ "), "/projects/7");
        assert_eq!(normalize_url_key("   "), "");
    }

    #[test]
    fn last_row_wins_at_first_position() {
        let deduped = dedupe_by_url(vec![
            row("https://a.example/jobs/1?utm=x", "first"),
            row("https://a.example/jobs/2", "other"),
            row("https://a.example/jobs/1/", "second"),
        ]);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].url, "https://a.example/jobs/1");
        assert_eq!(deduped[0].title, "second");
        assert_eq!(deduped[1].url, "https://a.example/jobs/2");
    }

    #[test]
    fn blank_urls_are_dropped_and_source_falls_back_to_host() {
        let mut nameless = row("https://b.example/p/9", "nameless");
        nameless.source = " ".into();

        let deduped = dedupe_by_url(vec![row("", "no url"), nameless]);

        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].source, "b.example");
    }

    #[test]
    fn scraper_output_needs_only_a_url() {
        let parsed: NewListing =
            serde_json::from_value(serde_json::json!({ "url": "https://c.example/x" })).unwrap();
        assert_eq!(parsed.period, None);
        assert_eq!(parsed.posted_at, None);
    }
}
