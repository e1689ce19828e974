// src/analyze/normalize.rs
//! Insight text repair for known LLM formatting defects: glued words and
//! inconsistent emphasis markers. Not a general text processor.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_scale() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d)(billion|million|trillion)").unwrap())
}

fn re_camel() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"([a-z])([A-Z])").unwrap())
}

fn re_emphasis() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\*{2,}").unwrap())
}

fn re_lead() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^\*\*([^*]+)\*\*(.*)$").unwrap())
}

/// Repair one insight bullet. Idempotent: applying it twice yields the same
/// output as applying it once.
///
/// 1) Insert a space between a digit and a glued scale word ("5billion").
/// 2) Insert a space at a glued lowercase→uppercase boundary ("cutsFed").
/// 3) Collapse any run of 2+ emphasis markers down to exactly `**`.
pub fn polish_insight(s: &str) -> String {
    let out = re_scale().replace_all(s, "$1 $2");
    let out = re_camel().replace_all(&out, "$1 $2");
    let out = re_emphasis().replace_all(&out, "**");
    out.trim().to_string()
}

/// An insight bullet split for display: an optional bold lead-in and the
/// trailing explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightSegments {
    pub lead: Option<String>,
    pub body: String,
}

/// Split a bullet on a leading `**…**` span. Without one, the whole bullet is
/// rendered as plain text.
pub fn split_lead(s: &str) -> InsightSegments {
    match re_lead().captures(s.trim()) {
        Some(caps) => {
            let body = caps[2]
                .trim_start_matches([':', '-', '–', '—', ' '])
                .trim()
                .to_string();
            let lead = caps[1].trim().trim_end_matches(':').trim_end().to_string();
            InsightSegments {
                lead: Some(lead),
                body,
            }
        }
        None => InsightSegments {
            lead: None,
            body: s.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_space_before_scale_words() {
        assert_eq!(polish_insight("deficit hits $2trillion"), "deficit hits $2 trillion");
        assert_eq!(polish_insight("inflows of 5billion"), "inflows of 5 billion");
        assert_eq!(polish_insight("about 300Million"), "about 300 Million");
    }

    #[test]
    fn splits_glued_words_at_case_boundary() {
        assert_eq!(polish_insight("rate cutsFed signals"), "rate cuts Fed signals");
    }

    #[test]
    fn collapses_emphasis_runs_to_double() {
        assert_eq!(polish_insight("***Dollar*** strength"), "**Dollar** strength");
        assert_eq!(polish_insight("****Euro**** slips"), "**Euro** slips");
        // a clean pair is left alone
        assert_eq!(polish_insight("**Yen** rallies"), "**Yen** rallies");
    }

    #[test]
    fn polish_is_idempotent() {
        let cases = [
            "5billion stimulus boosts risk appetite",
            "***ECB*** hints at pauseMarkets cheer",
            "**USD** weakens on jobs data",
        ];
        for c in cases {
            let once = polish_insight(c);
            let twice = polish_insight(&once);
            assert_eq!(once, twice, "not idempotent for {c:?}");
        }
    }

    #[test]
    fn lead_split_on_bold_prefix() {
        let seg = split_lead("**Dollar strength:** safe-haven flows lift USD across majors.");
        assert_eq!(seg.lead.as_deref(), Some("Dollar strength"));
        assert_eq!(seg.body, "safe-haven flows lift USD across majors.");
    }

    #[test]
    fn lead_split_with_dash_separator() {
        let seg = split_lead("**ECB pause** — softer CPI lets the council wait.");
        assert_eq!(seg.lead.as_deref(), Some("ECB pause"));
        assert_eq!(seg.body, "softer CPI lets the council wait.");
    }

    #[test]
    fn no_bold_prefix_means_plain_bullet() {
        let seg = split_lead("Yields fell after the auction.");
        assert_eq!(seg.lead, None);
        assert_eq!(seg.body, "Yields fell after the auction.");
    }
}
