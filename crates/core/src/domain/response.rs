use serde::Serialize;
use uuid::Uuid;

use crate::domain::fact::GroundedFact;
use crate::domain::intent::Intent;
use crate::domain::language::Language;
use crate::domain::utterance::ConversationId;
use crate::errors::TurnNotice;
use crate::grounding::ValidatedDraft;
use crate::turn::TurnStage;

/// Fixed connective phrases. Wording per language lives in the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseKey {
    SalamReply,
    Intro,
    ShortGreeting,
    HowCanIHelp,
    SwitchAcknowledged,
    ProductIntro,
    InstallmentIntro,
    LifespanIntro,
    BatteryIntro,
    WarrantyIntro,
    ReturnsIntro,
    ShippingIntro,
    LocationIntro,
    ContactIntro,
    NonCommittal,
    CatalogUnavailable,
    NotFound,
    CreativeIntro,
}

/// One ordered piece of an emitted response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Phrase { key: PhraseKey },
    Text { text: String },
    Fact { fact: GroundedFact },
    /// The fallback marker in place of a claim that could not be grounded.
    NotListed { subject: String, attribute: String },
    Redirect { url: String },
}

impl Segment {
    pub fn is_fact(&self) -> bool {
        matches!(self, Self::Fact { .. })
    }
}

/// Final structured output of one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Response {
    pub turn_id: Uuid,
    pub conversation_id: ConversationId,
    pub language: Language,
    pub intent: Intent,
    pub acknowledged_switch: Option<Language>,
    pub segments: Vec<Segment>,
    pub notices: Vec<TurnNotice>,
    pub stages: Vec<TurnStage>,
}

pub struct ResponseHeader {
    pub turn_id: Uuid,
    pub conversation_id: ConversationId,
    pub language: Language,
    pub intent: Intent,
    pub acknowledged_switch: Option<Language>,
}

impl Response {
    /// A response can only be assembled from validator output.
    pub fn from_validated(
        header: ResponseHeader,
        validated: ValidatedDraft,
        mut notices: Vec<TurnNotice>,
        stages: Vec<TurnStage>,
    ) -> Self {
        let (segments, validator_notices) = validated.into_parts();
        notices.extend(validator_notices);
        Self {
            turn_id: header.turn_id,
            conversation_id: header.conversation_id,
            language: header.language,
            intent: header.intent,
            acknowledged_switch: header.acknowledged_switch,
            segments,
            notices,
            stages,
        }
    }

    pub fn facts(&self) -> impl Iterator<Item = &GroundedFact> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Fact { fact } => Some(fact),
            _ => None,
        })
    }

    pub fn redirect(&self) -> Option<&str> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Redirect { url } => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn has_not_listed_marker(&self) -> bool {
        self.segments.iter().any(|segment| matches!(segment, Segment::NotListed { .. }))
    }

    pub fn has_notice(&self, code: &str) -> bool {
        self.notices.iter().any(|notice| notice.code == code)
    }
}
