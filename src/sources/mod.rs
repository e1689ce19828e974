// src/sources/mod.rs
//! News and calendar acquisition. Providers are opaque data sources behind
//! traits; HTTP and parse failures surface as typed errors here and are
//! converted to empty lists plus a reported message at the session boundary.

pub mod calendar;
pub mod news;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::calendar::CalendarEvent;
use crate::error::LensError;

/// One-time metrics registration (so series carry descriptions on export).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "headlines_fetched_total",
            "Headline snippets returned by news providers."
        );
        describe_counter!("llm_requests_total", "Chat completions requested.");
        describe_counter!(
            "llm_parse_failures_total",
            "Analysis replies that failed structured parsing."
        );
        describe_counter!("cache_hits_total", "Result-cache lookups served from memory.");
        describe_counter!("cache_misses_total", "Result-cache lookups that recomputed.");
        describe_histogram!("llm_request_ms", "Chat completion round-trip in milliseconds.");
    });
}

/// Fetches bounded lists of short text snippets for a query.
#[async_trait::async_trait]
pub trait HeadlineProvider: Send + Sync {
    /// Fetch up to `count` snippets for `query`.
    async fn fetch(&self, query: &str, count: u32) -> Result<Vec<String>, LensError>;
    fn name(&self) -> &'static str;
}

/// Fetches upcoming scheduled economic events.
#[async_trait::async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn fetch_upcoming(&self) -> Result<Vec<CalendarEvent>, LensError>;
    fn name(&self) -> &'static str;
}

/// Assemble one headline snippet as `"{title} — {description}"`, cleaned.
pub fn snippet_from(title: &str, description: &str) -> String {
    clean_fragment(&format!("{} — {}", title.trim(), description.trim()))
}

/// Normalize raw provider text: decode HTML entities, strip tags, collapse
/// whitespace.
pub fn clean_fragment(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_joins_title_and_description() {
        assert_eq!(
            snippet_from("ECB hints at pause", "Rates likely on hold through Q4."),
            "ECB hints at pause — Rates likely on hold through Q4."
        );
    }

    #[test]
    fn clean_fragment_decodes_entities_and_strips_tags() {
        let s = "  Fed &amp; BoJ <b>diverge</b>&nbsp;&nbsp;on policy  ";
        assert_eq!(clean_fragment(s), "Fed & BoJ diverge on policy");
    }
}
