// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analyze;
pub mod cache;
pub mod calendar;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod session;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    fallback_artifact, Overall, SentimentAnalyzer, SentimentArtifact, SentimentCounts,
};
pub use crate::cache::{CacheKey, ResultCache};
pub use crate::calendar::{group_by_weekday, CalendarEvent, WeekGrid};
pub use crate::chat::{ConversationManager, Turn, TurnTag};
pub use crate::error::LensError;
pub use crate::llm::{build_client, ChatMessage, DynLlmClient, LlmClient, Role};
pub use crate::session::{SentimentReport, Session};
