use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use smorti_core::catalog::{enforce_domain_exclusions, QueryDescriptor};
use smorti_core::domain::response::ResponseHeader;
use smorti_core::grounding::{Draft, DraftSegment};
use smorti_core::{
    AppConfig, CatalogError, CatalogLookup, ConversationId, ConversationState, Evidence,
    GroundingValidator, Intent, IntentClassifier, LanguageTracker, PhraseKey, PolicyError,
    Response, StaticRuleTable, SwitchCommands, TurnError, TurnNotice, TurnStage, TurnTrace,
    Utterance,
};

use crate::drafting::{draft_response, redirect_link, DraftInput, Gathered};
use crate::writer::{CannedJokeWriter, CreativeRequest, CreativeWriter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    /// Bound on each catalog lookup and each creative-writer call.
    pub lookup_timeout_ms: u64,
    pub intent_window: usize,
}

impl EngineSettings {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { lookup_timeout_ms: 1_500, intent_window: 5 }
    }
}

/// Runs one turn at a time per conversation:
/// `Received → Classified → FactsGathered → Drafted → Validated → Emitted`.
///
/// The engine holds no per-conversation data. Callers own each
/// [`ConversationState`] and pass it in, so one engine serves any number of
/// conversations concurrently.
pub struct PolicyEngine<C: ?Sized, W = CannedJokeWriter> {
    tracker: LanguageTracker,
    classifier: IntentClassifier,
    rules: Arc<StaticRuleTable>,
    validator: GroundingValidator,
    catalog: Arc<C>,
    writer: W,
    settings: EngineSettings,
}

impl<C> PolicyEngine<C, CannedJokeWriter>
where
    C: CatalogLookup + ?Sized,
{
    pub fn from_config(config: &AppConfig, catalog: Arc<C>) -> Self {
        Self::from_config_with_writer(config, catalog, CannedJokeWriter)
    }
}

impl<C, W> PolicyEngine<C, W>
where
    C: CatalogLookup + ?Sized,
    W: CreativeWriter,
{
    pub fn new(
        tracker: LanguageTracker,
        classifier: IntentClassifier,
        rules: StaticRuleTable,
        catalog: Arc<C>,
        writer: W,
        settings: EngineSettings,
    ) -> Self {
        let rules = Arc::new(rules);
        let validator = GroundingValidator::new(Arc::clone(&rules));
        Self { tracker, classifier, rules, validator, catalog, writer, settings }
    }

    pub fn from_config_with_writer(config: &AppConfig, catalog: Arc<C>, writer: W) -> Self {
        let language = &config.language;
        let commands = SwitchCommands::new(&language.switch_to_arabic, &language.switch_to_english);
        let tracker = LanguageTracker::new(commands.clone(), language.fallback);
        let classifier = IntentClassifier::new(commands, &language.greeting_phrases);
        let rules = StaticRuleTable::new(config.contact.directory());
        let settings = EngineSettings {
            lookup_timeout_ms: config.catalog.timeout_ms,
            intent_window: language.recent_intent_window,
        };
        Self::new(tracker, classifier, rules, catalog, writer, settings)
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn rules(&self) -> &StaticRuleTable {
        &self.rules
    }

    pub fn new_conversation(&self, id: ConversationId) -> ConversationState {
        ConversationState::with_intent_window(id, self.settings.intent_window)
    }

    pub async fn handle_turn(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<Response, TurnError> {
        let utterance = Utterance::new(state.id().clone(), text);
        if utterance.is_empty() {
            return Err(TurnError::EmptyUtterance);
        }

        let turn_id = Uuid::new_v4();
        let conversation_id = state.id().to_string();
        let mut trace = TurnTrace::received();
        let mut notices = Vec::new();

        let update = self.tracker.update(state, &utterance);
        if update.detection_failed {
            notices.push(TurnNotice::from(PolicyError::LanguageDetectionFailure {
                fallback: update.language.to_string(),
            }));
        }

        let classification = self.classifier.classify_detailed(state, &utterance);
        let intent = classification.intent;
        if classification.is_ambiguous() {
            notices.push(TurnNotice::from(PolicyError::AmbiguousIntent));
        }
        trace.advance(TurnStage::Classified)?;
        debug!(
            event_name = "policy.turn.classified",
            conversation_id = %conversation_id,
            turn_id = %turn_id,
            intent = intent.as_str(),
            language = update.language.as_str(),
            candidates = classification.candidates.len(),
            "utterance classified"
        );

        let gathered = self.gather(intent, &utterance, &conversation_id, turn_id, &mut notices).await;
        trace.advance(TurnStage::FactsGathered)?;

        let creative_text = if intent == Intent::CreativeRequest {
            self.compose(&utterance, update.language, state.turn_count(), &conversation_id, turn_id)
                .await
        } else {
            None
        };
        let draft = draft_response(
            DraftInput {
                intent,
                language: update.language,
                normalized: utterance.normalized(),
                introduced: state.introduced(),
                gathered: &gathered,
                creative_text,
            },
            &self.rules,
            self.catalog.as_ref(),
        );
        trace.advance(TurnStage::Drafted)?;

        let evidence = self.evidence(intent, &gathered);
        let mut validated = self.validator.validate_draft(draft, &evidence);
        if validated.all_claims_rejected() {
            warn!(
                event_name = "policy.turn.fallback",
                conversation_id = %conversation_id,
                turn_id = %turn_id,
                claims = validated.claim_count(),
                "no drafted claim survived validation"
            );
            let fallback = self.fallback_draft(update.language, &gathered, utterance.normalized());
            let rejected = validated.notices().to_vec();
            validated = self.validator.validate_draft(fallback, &evidence);
            notices.extend(rejected);
        }
        trace.advance(TurnStage::Validated)?;
        trace.advance(TurnStage::Emitted)?;

        state.record_turn(intent);
        if intent == Intent::Greeting {
            state.mark_introduced();
        }

        let response = Response::from_validated(
            ResponseHeader {
                turn_id,
                conversation_id: state.id().clone(),
                language: update.language,
                intent,
                acknowledged_switch: update.switched_to,
            },
            validated,
            notices,
            trace.into_stages(),
        );

        info!(
            event_name = "policy.turn.emitted",
            conversation_id = %conversation_id,
            turn_id = %turn_id,
            intent = intent.as_str(),
            language = response.language.as_str(),
            facts = response.facts().count(),
            notices = response.notices.len(),
            "turn emitted"
        );
        Ok(response)
    }

    async fn gather(
        &self,
        intent: Intent,
        utterance: &Utterance,
        conversation_id: &str,
        turn_id: Uuid,
        notices: &mut Vec<TurnNotice>,
    ) -> Gathered {
        if !intent.needs_catalog() {
            return Gathered::NotNeeded;
        }

        let descriptor = QueryDescriptor::from_text(utterance.normalized());
        match self.lookup(&descriptor).await {
            Ok(records) => {
                let records = enforce_domain_exclusions(&descriptor, records);
                debug!(
                    event_name = "policy.catalog.lookup",
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    results = records.len(),
                    "catalog lookup finished"
                );
                Gathered::Records { descriptor, records }
            }
            Err(error) => {
                warn!(
                    event_name = "policy.catalog.unavailable",
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    error = %error,
                    "catalog lookup failed; degrading to store link"
                );
                notices.push(TurnNotice::from(error.to_policy_error()));
                Gathered::Unavailable { descriptor }
            }
        }
    }

    async fn lookup(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<Vec<smorti_core::ProductRecord>, CatalogError> {
        match tokio::time::timeout(self.settings.lookup_timeout(), self.catalog.find(descriptor)).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout { ms: self.settings.lookup_timeout_ms }),
        }
    }

    async fn compose(
        &self,
        utterance: &Utterance,
        language: smorti_core::Language,
        sequence: u64,
        conversation_id: &str,
        turn_id: Uuid,
    ) -> Option<String> {
        let request = CreativeRequest { text: utterance.text().to_string(), language, sequence };
        match tokio::time::timeout(self.settings.lookup_timeout(), self.writer.compose(&request)).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(error)) => {
                warn!(
                    event_name = "policy.creative.failed",
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    error = %error,
                    "creative writer failed"
                );
                None
            }
            Err(_) => {
                warn!(
                    event_name = "policy.creative.timeout",
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    "creative writer timed out"
                );
                None
            }
        }
    }

    fn evidence(&self, intent: Intent, gathered: &Gathered) -> Evidence {
        let category_links = smorti_core::Category::ALL
            .iter()
            .filter_map(|category| self.catalog.category_link(*category))
            .map(str::to_string)
            .collect::<Vec<_>>();

        let evidence = Evidence::new(gathered.records().to_vec())
            .allow_links(self.catalog.store_link())
            .allow_links(category_links)
            .allow_links(self.rules.links());
        // Creative turns retrieve no records, so every catalog name is screened.
        if intent == Intent::CreativeRequest {
            evidence.screen_mentions(self.catalog.product_names())
        } else {
            evidence
        }
    }

    fn fallback_draft(
        &self,
        language: smorti_core::Language,
        gathered: &Gathered,
        normalized: &str,
    ) -> Draft {
        let mut draft = Draft::new(language);
        draft.push(DraftSegment::Phrase(PhraseKey::NotFound));
        draft.push(DraftSegment::NotListed {
            subject: normalized.to_string(),
            attribute: "product".to_string(),
        });
        let link = match gathered {
            Gathered::Records { descriptor, .. } | Gathered::Unavailable { descriptor } => {
                redirect_link(descriptor, self.catalog.as_ref())
            }
            Gathered::NotNeeded => self.catalog.store_link().map(str::to_string),
        };
        if let Some(link) = link {
            draft.push(DraftSegment::Redirect(link));
        }
        draft
    }
}
