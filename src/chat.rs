// src/chat.rs
//! # Conversation Manager
//! Ordered follow-up dialogue grounded in a previously produced sentiment
//! artifact. Turns are strictly append-only; the grounding turn, once
//! inserted, is never duplicated or reordered.

use serde::{Deserialize, Serialize};

use crate::analyze::SentimentArtifact;
use crate::error::LensError;
use crate::llm::{ChatMessage, DynLlmClient, Role};

/// Conversational variance is tolerated here, unlike the analysis step.
pub const CHAT_TEMPERATURE: f32 = 0.4;

const ASSISTANT_PERSONA: &str = "You are a helpful FX market assistant. \
     Be concise, insightful, and use macro/FX terminology when relevant.";
const SUMMARY_HEADER: &str = "Summary of recent FX sentiment:";

/// Marker for the injected summary-context turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnTag {
    SentimentSummary,
}

/// One stored conversation turn. The tag stays local to the session; only
/// role and content ever go over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TurnTag>,
}

pub struct ConversationManager {
    client: DynLlmClient,
    turns: Vec<Turn>,
}

impl ConversationManager {
    pub fn new(client: DynLlmClient) -> Self {
        Self {
            client,
            turns: Vec::new(),
        }
    }

    /// Clear all turns; valid from any state.
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Ask a follow-up grounded in `grounding`.
    ///
    /// Blank/whitespace questions are a no-op (`Ok(None)`), not an error: no
    /// LLM call, turn count unchanged. On the first call of a conversation a
    /// single tagged summary-context turn is prepended. On LLM failure the
    /// user turn stays in history (the question is not lost) and no assistant
    /// turn is appended.
    pub async fn ask(
        &mut self,
        question: &str,
        grounding: &SentimentArtifact,
    ) -> Result<Option<String>, LensError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }

        self.ensure_grounding_turn(grounding);
        self.turns.push(Turn {
            role: Role::User,
            content: question.to_string(),
            tag: None,
        });

        let reply = self
            .client
            .complete(&self.outbound_messages(), CHAT_TEMPERATURE)
            .await?;

        self.turns.push(Turn {
            role: Role::Assistant,
            content: reply.clone(),
            tag: None,
        });
        Ok(Some(reply))
    }

    /// Insert the summary-context turn exactly once per conversation lifetime.
    fn ensure_grounding_turn(&mut self, grounding: &SentimentArtifact) {
        let already_grounded = self
            .turns
            .iter()
            .any(|t| t.tag == Some(TurnTag::SentimentSummary));
        if already_grounded {
            return;
        }

        let bullets = grounding
            .insights
            .iter()
            .map(|p| format!("- {p}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.turns.insert(
            0,
            Turn {
                role: Role::User,
                content: format!("{SUMMARY_HEADER}\n{bullets}"),
                tag: Some(TurnTag::SentimentSummary),
            },
        );
    }

    /// Fixed system instruction first, then every stored turn in insertion
    /// order, with tag metadata stripped.
    fn outbound_messages(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.turns.len() + 1);
        out.push(ChatMessage::system(ASSISTANT_PERSONA));
        out.extend(self.turns.iter().map(|t| ChatMessage {
            role: t.role,
            content: t.content.clone(),
        }));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedClient;
    use std::sync::Arc;

    fn artifact() -> SentimentArtifact {
        SentimentArtifact {
            insights: vec!["**EUR firm** on hawkish ECB talk.".into()],
            ..SentimentArtifact::neutral("test")
        }
    }

    #[tokio::test]
    async fn grounding_turn_carries_header_and_bullets() {
        let client = Arc::new(ScriptedClient::fixed("Sure."));
        let mut conv = ConversationManager::new(client);
        conv.ask("what about GBP?", &artifact()).await.unwrap();

        let first = &conv.turns()[0];
        assert_eq!(first.tag, Some(TurnTag::SentimentSummary));
        assert!(first.content.starts_with(SUMMARY_HEADER));
        assert!(first.content.contains("- **EUR firm** on hawkish ECB talk."));
    }

    #[tokio::test]
    async fn outbound_list_has_system_persona_first_and_no_tags() {
        let client = Arc::new(ScriptedClient::fixed("Sure."));
        let mut conv = ConversationManager::new(client.clone());
        conv.ask("what about GBP?", &artifact()).await.unwrap();

        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        let msgs = &sent[0];
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, ASSISTANT_PERSONA);
        // summary turn travels as a plain user message
        assert_eq!(msgs[1].role, Role::User);
        assert!(msgs[1].content.starts_with(SUMMARY_HEADER));
        assert_eq!(msgs[2].role, Role::User);
        assert_eq!(msgs[2].content, "what about GBP?");
    }
}
