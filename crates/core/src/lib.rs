pub mod catalog;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod errors;
pub mod grounding;
pub mod language;
pub mod rules;
pub mod text;
pub mod turn;

pub use catalog::{CatalogDocument, CatalogLookup, InMemoryCatalog, QueryDescriptor};
pub use classifier::{Classification, IntentClassifier};
pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::conversation::ConversationState;
pub use domain::fact::{Fact, FactSource, GroundedFact, StaticRuleId};
pub use domain::intent::Intent;
pub use domain::language::Language;
pub use domain::product::{Capability, Category, ProductField, ProductId, ProductRecord};
pub use domain::response::{PhraseKey, Response, Segment};
pub use domain::utterance::{ConversationId, Utterance};
pub use errors::{CatalogError, PolicyError, TurnError, TurnNotice};
pub use grounding::{Draft, DraftSegment, Evidence, FactDecision, GroundingValidator, ValidatedDraft};
pub use language::{LanguageTracker, LanguageUpdate, SwitchCommands};
pub use rules::{ContactDirectory, StaticRuleTable};
pub use turn::{TurnStage, TurnTrace, TurnTransitionError};
