use std::collections::VecDeque;

use serde::Serialize;

use crate::domain::intent::Intent;
use crate::domain::language::Language;
use crate::domain::utterance::ConversationId;

/// Per-conversation state passed explicitly through every turn.
///
/// The active language can only be changed by
/// [`crate::language::LanguageTracker`]; everything else is updated by the
/// policy engine once a turn has been emitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    id: ConversationId,
    active_language: Option<Language>,
    turn_count: u64,
    recent_intents: VecDeque<Intent>,
    intent_window: usize,
    creative_mode: bool,
    introduced: bool,
}

impl ConversationState {
    pub const DEFAULT_INTENT_WINDOW: usize = 5;

    pub fn new(id: ConversationId) -> Self {
        Self::with_intent_window(id, Self::DEFAULT_INTENT_WINDOW)
    }

    pub fn with_intent_window(id: ConversationId, intent_window: usize) -> Self {
        Self {
            id,
            active_language: None,
            turn_count: 0,
            recent_intents: VecDeque::with_capacity(intent_window.max(1)),
            intent_window: intent_window.max(1),
            creative_mode: false,
            introduced: false,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// `None` until the first utterance has been tracked.
    pub fn active_language(&self) -> Option<Language> {
        self.active_language
    }

    pub(crate) fn set_active_language(&mut self, language: Language) {
        self.active_language = Some(language);
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn is_first_turn(&self) -> bool {
        self.turn_count == 0
    }

    pub fn recent_intents(&self) -> impl Iterator<Item = &Intent> {
        self.recent_intents.iter()
    }

    pub fn last_intent(&self) -> Option<Intent> {
        self.recent_intents.back().copied()
    }

    pub fn creative_mode(&self) -> bool {
        self.creative_mode
    }

    pub fn introduced(&self) -> bool {
        self.introduced
    }

    /// Records an emitted turn. The oldest intent falls out once the window
    /// is full.
    pub fn record_turn(&mut self, intent: Intent) {
        self.turn_count += 1;
        if self.recent_intents.len() == self.intent_window {
            self.recent_intents.pop_front();
        }
        self.recent_intents.push_back(intent);
        self.creative_mode = intent == Intent::CreativeRequest;
    }

    pub fn mark_introduced(&mut self) {
        self.introduced = true;
    }
}
