// src/analyze/mod.rs
//! # Sentiment Analyzer
//! Turns a list of headline snippets into a structured sentiment artifact via
//! one LLM round-trip at temperature 0.
//!
//! The model is treated as an untrusted, semi-structured data source: every
//! field is defaulted, parse and transport failures degrade to a neutral
//! fallback artifact instead of raising, and insight bullets pass through a
//! repair step for known formatting defects.

pub mod normalize;
pub mod parse;

use std::fmt;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::LensError;
use crate::llm::{ChatMessage, DynLlmClient};
use parse::{parse_analysis, ParseMode, RawAnalysis};

/// Upper bound on insight bullets kept from a reply.
pub const MAX_INSIGHTS: usize = 5;

/// Deterministic decoding for the analysis step.
pub const ANALYSIS_TEMPERATURE: f32 = 0.0;

const ANALYST_PERSONA: &str = "You are an FX market analyst.";
const NO_DATA_EXPLANATION: &str = "No headlines were available to analyze.";
const PARSE_FAILURE_EXPLANATION: &str =
    "The model reply could not be parsed; showing a neutral summary instead.";
const REQUEST_FAILURE_EXPLANATION: &str =
    "The analysis request failed; showing a neutral summary instead.";

/// Fixed five-value ordinal sentiment scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    Positive,
    TrendingPositive,
    #[default]
    Neutral,
    TrendingNegative,
    Negative,
}

impl Overall {
    /// Tolerant mapping from the model's free-text label. Unknown labels
    /// return `None`; callers default to `Neutral`.
    pub fn parse(s: &str) -> Option<Self> {
        let norm = s
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        match norm.as_str() {
            "positive" => Some(Self::Positive),
            "trending positive" => Some(Self::TrendingPositive),
            "neutral" => Some(Self::Neutral),
            "trending negative" => Some(Self::TrendingNegative),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "Positive",
            Self::TrendingPositive => "Trending Positive",
            Self::Neutral => "Neutral",
            Self::TrendingNegative => "Trending Negative",
            Self::Negative => "Negative",
        })
    }
}

/// Three-bucket tally; all keys always present, absent ones default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: u32,
    #[serde(default)]
    pub neutral: u32,
    #[serde(default)]
    pub negative: u32,
}

impl SentimentCounts {
    pub fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }
}

/// Structured output of one analysis. Immutable once returned; owned by the
/// caller until superseded by a new fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentArtifact {
    /// Up to five narrative bullets, already repaired for display.
    pub insights: Vec<String>,
    pub overall: Overall,
    pub explanation: String,
    pub counts: SentimentCounts,
}

impl SentimentArtifact {
    /// Empty artifact with a neutral label and zero counts.
    pub fn neutral(explanation: impl Into<String>) -> Self {
        Self {
            insights: Vec::new(),
            overall: Overall::Neutral,
            explanation: explanation.into(),
            counts: SentimentCounts::default(),
        }
    }
}

/// Degraded-but-valid artifact for a failed analysis, with an explanation
/// distinguishing parse failure from request failure.
pub fn fallback_artifact(err: &LensError) -> SentimentArtifact {
    error!(error = %err, "sentiment analysis degraded to neutral fallback");
    let explanation = match err {
        LensError::MalformedResponse(_) => PARSE_FAILURE_EXPLANATION,
        _ => REQUEST_FAILURE_EXPLANATION,
    };
    SentimentArtifact::neutral(explanation)
}

pub struct SentimentAnalyzer {
    client: DynLlmClient,
    parse_mode: ParseMode,
}

impl SentimentAnalyzer {
    pub fn new(client: DynLlmClient) -> Self {
        Self {
            client,
            parse_mode: ParseMode::default(),
        }
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    /// Degrading surface: never raises. Failures come back as the neutral
    /// fallback artifact with an error-specific explanation.
    pub async fn analyze(&self, snippets: &[String]) -> SentimentArtifact {
        match self.try_analyze(snippets).await {
            Ok(artifact) => artifact,
            Err(e) => fallback_artifact(&e),
        }
    }

    /// Fallible variant for callers that memoize results: errors propagate so
    /// a failed run is retried on the next call instead of being cached.
    pub async fn try_analyze(&self, snippets: &[String]) -> Result<SentimentArtifact, LensError> {
        if snippets.is_empty() {
            // No LLM call for empty input.
            return Ok(SentimentArtifact::neutral(NO_DATA_EXPLANATION));
        }

        let messages = [
            ChatMessage::system(ANALYST_PERSONA),
            ChatMessage::user(build_prompt(snippets)),
        ];

        counter!("llm_requests_total").increment(1);
        let t0 = Instant::now();
        let raw = self.client.complete(&messages, ANALYSIS_TEMPERATURE).await?;
        histogram!("llm_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let parsed = match parse_analysis(&raw, self.parse_mode) {
            Ok(p) => p,
            Err(e) => {
                counter!("llm_parse_failures_total").increment(1);
                return Err(e);
            }
        };
        Ok(artifact_from_raw(parsed))
    }
}

/// Single prompt embedding all snippets verbatim plus the output contract.
fn build_prompt(snippets: &[String]) -> String {
    let joined = snippets
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Here are the latest news items:\n{joined}\n\n\
         1) Produce exactly five insight bullets. Start each with a bold headline-style lead-in \
         wrapped in **double asterisks**, then explain the cause, its effect, and the market implication.\n\
         2) State the overall tone: exactly one of [positive, trending positive, neutral, trending negative, negative].\n\
         3) In one or two sentences, explain why that tone fits, grounded in the items above.\n\
         4) Tally the sentiment-bearing headlines into positive/neutral/negative counts.\n\n\
         Respond only in this exact JSON format:\n\n\
         {{\n  \
         \"summary_points\": [\"...\", \"...\", \"...\", \"...\", \"...\"],\n  \
         \"overall_sentiment\": \"positive|trending positive|neutral|trending negative|negative\",\n  \
         \"sentiment_explainer\": \"...\",\n  \
         \"counts\": {{\"positive\": X, \"neutral\": Y, \"negative\": Z}}\n\
         }}"
    )
}

/// Map the raw payload onto the typed artifact: repair bullets, cap at five,
/// default the label and every missing count key.
fn artifact_from_raw(raw: RawAnalysis) -> SentimentArtifact {
    let insights: Vec<String> = raw
        .summary_points
        .iter()
        .map(|b| normalize::polish_insight(b))
        .filter(|b| !b.is_empty())
        .take(MAX_INSIGHTS)
        .collect();

    let overall = raw
        .overall_sentiment
        .as_deref()
        .and_then(Overall::parse)
        .unwrap_or_default();

    SentimentArtifact {
        insights,
        overall,
        explanation: raw.sentiment_explainer.unwrap_or_default(),
        counts: SentimentCounts {
            positive: raw.counts.positive.unwrap_or(0),
            neutral: raw.counts.neutral.unwrap_or(0),
            negative: raw.counts.negative.unwrap_or(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parsing_is_tolerant_to_case_and_separators() {
        assert_eq!(
            Overall::parse("Trending  Positive"),
            Some(Overall::TrendingPositive)
        );
        assert_eq!(
            Overall::parse("trending_negative"),
            Some(Overall::TrendingNegative)
        );
        assert_eq!(Overall::parse("NEUTRAL"), Some(Overall::Neutral));
        assert_eq!(Overall::parse("mildly bullish"), None);
    }

    #[test]
    fn prompt_embeds_snippets_verbatim() {
        let snippets = vec![
            "ECB hints at pause".to_string(),
            "USD weakens on jobs data".to_string(),
        ];
        let p = build_prompt(&snippets);
        assert!(p.contains("- ECB hints at pause"));
        assert!(p.contains("- USD weakens on jobs data"));
        assert!(p.contains("\"summary_points\""));
        assert!(p.contains("\"overall_sentiment\""));
        assert!(p.contains("\"sentiment_explainer\""));
        assert!(p.contains("\"counts\""));
    }

    #[test]
    fn raw_conversion_caps_insights_and_defaults_counts() {
        let raw = RawAnalysis {
            summary_points: (0..7).map(|i| format!("**P{i}** body")).collect(),
            overall_sentiment: Some("weirdly upbeat".into()),
            sentiment_explainer: None,
            counts: parse::RawCounts {
                positive: Some(4),
                neutral: None,
                negative: None,
            },
        };
        let artifact = artifact_from_raw(raw);
        assert_eq!(artifact.insights.len(), MAX_INSIGHTS);
        assert_eq!(artifact.overall, Overall::Neutral);
        assert_eq!(artifact.counts.positive, 4);
        assert_eq!(artifact.counts.neutral, 0);
        assert_eq!(artifact.counts.negative, 0);
    }
}
