use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::language::Language;
use crate::text::{detect_language, normalize, truncate_chars};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inbound user message. Fields are fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Utterance {
    conversation_id: ConversationId,
    text: String,
    normalized: String,
    detected_language: Option<Language>,
    received_at: DateTime<Utc>,
}

impl Utterance {
    pub const MAX_CHARS: usize = 5000;

    pub fn new(conversation_id: ConversationId, text: &str) -> Self {
        Self::received_at(conversation_id, text, Utc::now())
    }

    pub fn received_at(
        conversation_id: ConversationId,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Self {
        let text = truncate_chars(text.trim(), Self::MAX_CHARS).to_string();
        let normalized = normalize(&text);
        let detected_language = detect_language(&text);
        Self { conversation_id, text, normalized, detected_language, received_at }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn detected_language(&self) -> Option<Language> {
        self.detected_language
    }

    pub fn received_at_time(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
