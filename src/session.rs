// src/session.rs
//! # Session Context
//! Explicit per-session state: the result cache, the last sentiment artifact,
//! and the follow-up conversation. One logical action runs at a time; each
//! converts provider failures into a degraded-but-valid result plus a
//! display message, never a crash.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::analyze::parse::ParseMode;
use crate::analyze::{fallback_artifact, SentimentAnalyzer, SentimentArtifact};
use crate::cache::{CacheKey, ResultCache};
use crate::calendar::{group_by_weekday, WeekGrid};
use crate::chat::{ConversationManager, Turn};
use crate::config::app::AppConfig;
use crate::error::LensError;
use crate::llm::DynLlmClient;
use crate::sources::{ensure_metrics_described, CalendarProvider, HeadlineProvider};

/// Outcome of a sentiment action: always a usable artifact, plus an optional
/// user-facing message when the pipeline degraded along the way.
#[derive(Debug, Clone)]
pub struct SentimentReport {
    pub snippets: Vec<String>,
    pub artifact: SentimentArtifact,
    pub notice: Option<String>,
}

pub struct Session {
    config: AppConfig,
    cache: ResultCache,
    headlines: Arc<dyn HeadlineProvider>,
    calendar: Arc<dyn CalendarProvider>,
    analyzer: SentimentAnalyzer,
    conversation: ConversationManager,
    last_artifact: Option<SentimentArtifact>,
}

impl Session {
    pub fn new(
        config: AppConfig,
        headlines: Arc<dyn HeadlineProvider>,
        calendar: Arc<dyn CalendarProvider>,
        llm: DynLlmClient,
    ) -> Self {
        ensure_metrics_described();
        Self {
            config,
            cache: ResultCache::new(),
            headlines,
            calendar,
            analyzer: SentimentAnalyzer::new(Arc::clone(&llm)),
            conversation: ConversationManager::new(llm),
            last_artifact: None,
        }
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.analyzer = self.analyzer.with_parse_mode(mode);
        self
    }

    /// Fetch and analyze the global market sweep. Stores the artifact as the
    /// grounding for follow-ups and resets the conversation.
    pub async fn fetch_global_sentiment(&mut self) -> SentimentReport {
        let query = self.config.global_query.clone();
        let count = self.config.global_count;
        let report = self.fetch_and_analyze(&query, count).await;

        // A fresh global summary starts a fresh conversation.
        self.conversation.reset();
        self.last_artifact = Some(report.artifact.clone());
        report
    }

    /// Instrument deep-dive. Leaves the global conversation and its grounding
    /// artifact untouched.
    pub async fn analyze_pair(&self, pair: &str) -> SentimentReport {
        let query = self.config.pair_query(pair);
        self.fetch_and_analyze(&query, self.config.pair_count).await
    }

    /// Ask a follow-up grounded in the last stored artifact. Blank questions
    /// are a no-op (`Ok(None)`).
    pub async fn ask_followup(&mut self, question: &str) -> Result<Option<String>, LensError> {
        let Some(artifact) = self.last_artifact.clone() else {
            // Should not occur given the fetch-then-ask flow; log, don't crash.
            warn!("follow-up asked with no stored sentiment artifact");
            return Err(LensError::State(
                "no sentiment summary to ground the follow-up; fetch one first",
            ));
        };
        self.conversation.ask(question, &artifact).await
    }

    /// Week-ahead grid of upcoming calendar events. A provider failure yields
    /// an empty grid plus a message.
    pub async fn week_ahead(&self) -> (WeekGrid, Option<String>) {
        let key = CacheKey::of("calendar_events")
            .arg(self.config.calendar_countries.join(","))
            .arg(self.config.calendar_days_ahead.to_string())
            .finish();
        let ttl = Some(Duration::from_secs(self.config.calendar_ttl_secs));

        match self
            .cache
            .get_or_compute(key, ttl, || self.calendar.fetch_upcoming())
            .await
        {
            Ok(events) => (group_by_weekday(&events), None),
            Err(e) => {
                error!(error = %e, provider = self.calendar.name(), "calendar fetch failed");
                (WeekGrid::default(), Some(format!("Economic calendar error: {e}")))
            }
        }
    }

    pub fn clear_chat(&mut self) {
        self.conversation.reset();
    }

    pub fn conversation(&self) -> &[Turn] {
        self.conversation.turns()
    }

    pub fn last_artifact(&self) -> Option<&SentimentArtifact> {
        self.last_artifact.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    async fn fetch_and_analyze(&self, query: &str, count: u32) -> SentimentReport {
        let (snippets, notice) = self.cached_headlines(query, count).await;

        // Analysis is memoized by its input headlines; a failed run is
        // retried on the next action instead of being cached.
        let key = snippets
            .iter()
            .fold(CacheKey::of("sentiment_analysis"), |b, s| b.arg(s))
            .finish();
        let ttl = Some(Duration::from_secs(self.config.analysis_ttl_secs));

        let artifact = match self
            .cache
            .get_or_compute(key, ttl, || self.analyzer.try_analyze(&snippets))
            .await
        {
            Ok(artifact) => artifact,
            Err(e) => fallback_artifact(&e),
        };

        SentimentReport {
            snippets,
            artifact,
            notice,
        }
    }

    async fn cached_headlines(&self, query: &str, count: u32) -> (Vec<String>, Option<String>) {
        let key = CacheKey::of("fetch_headlines")
            .arg(query)
            .arg(count.to_string())
            .finish();
        let ttl = Some(Duration::from_secs(self.config.headline_ttl_secs));

        match self
            .cache
            .get_or_compute(key, ttl, || self.headlines.fetch(query, count))
            .await
        {
            Ok(snippets) => (snippets, None),
            Err(e) => {
                error!(error = %e, query, provider = self.headlines.name(), "headline fetch failed");
                (Vec::new(), Some(format!("Error fetching headlines: {e}")))
            }
        }
    }
}
