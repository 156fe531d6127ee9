//! Language-state tracking.
//!
//! The active language is decided on the first turn and changes afterwards
//! only on an explicit switch command. A command matches when the whole
//! utterance, after normalization and after dropping one leading or
//! trailing courtesy word, equals one of the configured trigger phrases.
//! Mixed-language sentences never match, so they never flip the language.

use serde::Serialize;

use crate::domain::conversation::ConversationState;
use crate::domain::language::Language;
use crate::domain::utterance::Utterance;
use crate::text::normalize;

pub const DEFAULT_SWITCH_TO_ENGLISH: &[&str] = &[
    "speak english",
    "talk in english",
    "in english",
    "english please",
    "switch to english",
    "english",
    "بالانجليزي",
    "تكلم انجليزي",
    "كلمني انجليزي",
    "تكلم بالانجليزي",
];

pub const DEFAULT_SWITCH_TO_ARABIC: &[&str] = &[
    "تكلم عربي",
    "بالعربي",
    "بالعربية",
    "كلمني عربي",
    "تكلم بالعربي",
    "تكلم معاي بالعربي",
    "speak arabic",
    "in arabic",
    "arabic please",
    "switch to arabic",
    "arabic",
    "عربي",
];

const COURTESY_WORDS: &[&str] = &["please", "pls", "plz", "لو سمحت", "من فضلك", "تكفى"];

/// Normalized trigger phrases per target language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchCommands {
    to_arabic: Vec<String>,
    to_english: Vec<String>,
}

impl Default for SwitchCommands {
    fn default() -> Self {
        Self::new(DEFAULT_SWITCH_TO_ARABIC.iter().copied(), DEFAULT_SWITCH_TO_ENGLISH.iter().copied())
    }
}

impl SwitchCommands {
    pub fn new<A, E, S>(to_arabic: A, to_english: E) -> Self
    where
        A: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalize_all = |phrases: Vec<String>| {
            let mut phrases =
                phrases.into_iter().filter(|phrase| !phrase.is_empty()).collect::<Vec<_>>();
            phrases.sort();
            phrases.dedup();
            phrases
        };

        Self {
            to_arabic: normalize_all(
                to_arabic.into_iter().map(|phrase| normalize(phrase.as_ref())).collect(),
            ),
            to_english: normalize_all(
                to_english.into_iter().map(|phrase| normalize(phrase.as_ref())).collect(),
            ),
        }
    }

    /// Language requested by `normalized`, if it is a switch command.
    pub fn requested_language(&self, normalized: &str) -> Option<Language> {
        for candidate in command_candidates(normalized) {
            if self.to_arabic.iter().any(|phrase| phrase == &candidate) {
                return Some(Language::Arabic);
            }
            if self.to_english.iter().any(|phrase| phrase == &candidate) {
                return Some(Language::English);
            }
        }
        None
    }
}

fn command_candidates(normalized: &str) -> Vec<String> {
    let mut candidates = vec![normalized.to_string()];
    for courtesy in COURTESY_WORDS {
        let courtesy = normalize(courtesy);
        if let Some(rest) = normalized.strip_prefix(&format!("{courtesy} ")) {
            candidates.push(rest.to_string());
        }
        if let Some(rest) = normalized.strip_suffix(&format!(" {courtesy}")) {
            candidates.push(rest.to_string());
        }
    }
    candidates
}

/// Outcome of tracking one utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageUpdate {
    pub language: Language,
    pub switched_to: Option<Language>,
    pub detection_failed: bool,
}

#[derive(Clone, Debug)]
pub struct LanguageTracker {
    commands: SwitchCommands,
    fallback: Language,
}

impl Default for LanguageTracker {
    fn default() -> Self {
        Self::new(SwitchCommands::default(), Language::Arabic)
    }
}

impl LanguageTracker {
    pub fn new(commands: SwitchCommands, fallback: Language) -> Self {
        Self { commands, fallback }
    }

    pub fn commands(&self) -> &SwitchCommands {
        &self.commands
    }

    pub fn fallback(&self) -> Language {
        self.fallback
    }

    /// Updates `state` for `utterance` and reports what happened.
    pub fn update(&self, state: &mut ConversationState, utterance: &Utterance) -> LanguageUpdate {
        let requested = self.commands.requested_language(utterance.normalized());

        let update = match (state.active_language(), requested) {
            (_, Some(requested)) => {
                LanguageUpdate { language: requested, switched_to: Some(requested), detection_failed: false }
            }
            (Some(active), None) => {
                LanguageUpdate { language: active, switched_to: None, detection_failed: false }
            }
            (None, None) => match utterance.detected_language() {
                Some(detected) => {
                    LanguageUpdate { language: detected, switched_to: None, detection_failed: false }
                }
                None => LanguageUpdate {
                    language: self.fallback,
                    switched_to: None,
                    detection_failed: true,
                },
            },
        };

        state.set_active_language(update.language);
        update
    }
}

#[cfg(test)]
mod tests {
    use super::{LanguageTracker, SwitchCommands};
    use crate::domain::conversation::ConversationState;
    use crate::domain::language::Language;
    use crate::domain::utterance::{ConversationId, Utterance};

    fn utterance(text: &str) -> Utterance {
        Utterance::new(ConversationId("c-lang".to_string()), text)
    }

    fn state() -> ConversationState {
        ConversationState::new(ConversationId("c-lang".to_string()))
    }

    #[test]
    fn first_turn_takes_the_detected_language() {
        let tracker = LanguageTracker::default();
        let mut state = state();

        let update = tracker.update(&mut state, &utterance("كم يدوم البطارية؟"));

        assert_eq!(update.language, Language::Arabic);
        assert_eq!(state.active_language(), Some(Language::Arabic));
        assert!(!update.detection_failed);
    }

    #[test]
    fn first_turn_mixed_script_follows_the_carrier_language() {
        let tracker = LanguageTracker::default();

        let mut english = state();
        let update = tracker.update(&mut english, &utterance("Delivery to جدة?"));
        assert_eq!(update.language, Language::English);
        assert_eq!(english.active_language(), Some(Language::English));

        let mut arabic = state();
        let update = tracker.update(&mut arabic, &utterance("ابي BOOX Go Color"));
        assert_eq!(update.language, Language::Arabic);
        assert_eq!(arabic.active_language(), Some(Language::Arabic));
    }

    #[test]
    fn later_turns_ignore_detected_language() {
        let tracker = LanguageTracker::default();
        let mut state = state();
        tracker.update(&mut state, &utterance("السلام عليكم"));
        state.record_turn(crate::domain::intent::Intent::Greeting);

        let update = tracker.update(&mut state, &utterance("Do you have the BOOX Palma?"));

        assert_eq!(update.language, Language::Arabic);
        assert_eq!(update.switched_to, None);
    }

    #[test]
    fn explicit_command_switches_and_is_reported() {
        let tracker = LanguageTracker::default();
        let mut state = state();
        tracker.update(&mut state, &utterance("مرحبا"));

        let update = tracker.update(&mut state, &utterance("Speak English please"));
        assert_eq!(update.switched_to, Some(Language::English));
        assert_eq!(state.active_language(), Some(Language::English));

        let back = tracker.update(&mut state, &utterance("تكلم عربي"));
        assert_eq!(back.switched_to, Some(Language::Arabic));
    }

    #[test]
    fn mixed_sentence_mentioning_a_language_does_not_switch() {
        let tracker = LanguageTracker::default();
        let mut state = state();
        tracker.update(&mut state, &utterance("هل عندكم قارئ؟"));

        let update =
            tracker.update(&mut state, &utterance("هل الجهاز يدعم english keyboard"));

        assert_eq!(update.switched_to, None);
        assert_eq!(state.active_language(), Some(Language::Arabic));
    }

    #[test]
    fn undetectable_first_turn_uses_fallback() {
        let tracker = LanguageTracker::new(SwitchCommands::default(), Language::English);
        let mut state = state();

        let update = tracker.update(&mut state, &utterance("???"));

        assert!(update.detection_failed);
        assert_eq!(update.language, Language::English);
    }

    #[test]
    fn configured_commands_replace_the_defaults() {
        let commands = SwitchCommands::new(["عربي لو سمحت"], ["english mode"]);
        assert_eq!(commands.requested_language("english mode"), Some(Language::English));
        assert_eq!(commands.requested_language("speak english"), None);
    }
}
