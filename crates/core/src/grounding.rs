//! Grounding validation.
//!
//! Every drafted claim is checked against the records retrieved for this
//! turn or against the static-rule table. Claims that hold are approved
//! (rewritten to the source wording when the draft paraphrased them).
//! Claims that do not hold are replaced by the "not listed in the catalog"
//! marker and reported on the turn. Free text is scrubbed of links that no
//! catalog or contact source published; creative text additionally loses
//! any sentence that reads like a product fact.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::fact::{Fact, FactSource, GroundedFact, GroundedSource};
use crate::domain::language::Language;
use crate::domain::product::ProductRecord;
use crate::domain::response::{PhraseKey, Segment};
use crate::errors::{PolicyError, TurnNotice};
use crate::rules::StaticRuleTable;
use crate::text::{matches_any, matches_keyword, normalize, strip_links};

/// Brand names screened out of creative text even when the catalog does
/// not list them.
pub const KNOWN_BRANDS: &[&str] = &[
    "boox",
    "onyx",
    "maxhub",
    "ideahub",
    "lenovo",
    "thinkvision",
    "sparq",
    "palma",
    "note air",
    "tab ultra",
    "go color",
    "بوكس",
    "ماكس هب",
    "لينوفو",
];

const QUANTITY_UNITS: &[&str] = &[
    "sar", "sr", "riyal", "riyals", "ريال", "usd", "dollars", "gb", "tb", "inch", "inches", "انش",
    "بوصه", "mah", "hz", "هرتز",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NoSource,
    RecordNotRetrieved,
    FieldAbsent,
    UnknownRuleStatement,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSource => "claim has no source",
            Self::RecordNotRetrieved => "product record was not retrieved for this turn",
            Self::FieldAbsent => "catalog field is absent",
            Self::UnknownRuleStatement => "static rule does not define this statement",
        }
    }
}

/// Validator verdict for one drafted fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum FactDecision {
    Approved { fact: GroundedFact },
    Rewritten { fact: GroundedFact, original_value: Option<String> },
    Substituted { subject: String, attribute: String, reason: RejectionReason },
}

impl FactDecision {
    pub fn grounded(&self) -> Option<&GroundedFact> {
        match self {
            Self::Approved { fact } | Self::Rewritten { fact, .. } => Some(fact),
            Self::Substituted { .. } => None,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, Self::Substituted { .. })
    }
}

/// One drafted piece of a response, before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftSegment {
    Phrase(PhraseKey),
    Text(String),
    Claim(Fact),
    Creative(String),
    NotListed { subject: String, attribute: String },
    Redirect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub language: Language,
    pub segments: Vec<DraftSegment>,
}

impl Draft {
    pub fn new(language: Language) -> Self {
        Self { language, segments: Vec::new() }
    }

    pub fn push(&mut self, segment: DraftSegment) -> &mut Self {
        self.segments.push(segment);
        self
    }

    pub fn claim_count(&self) -> usize {
        self.segments.iter().filter(|segment| matches!(segment, DraftSegment::Claim(_))).count()
    }
}

/// What this turn is allowed to cite: the records actually retrieved and
/// the links catalog or contact sources published. `mentions` holds the
/// catalog product names creative text must not carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evidence {
    records: Vec<ProductRecord>,
    links: BTreeSet<String>,
    mentions: BTreeSet<String>,
}

impl Evidence {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        let links = records
            .iter()
            .filter_map(|record| record.link.as_deref())
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .map(str::to_string)
            .collect();
        Self { records, links, mentions: BTreeSet::new() }
    }

    pub fn screen_mentions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mentions.extend(
            names.into_iter().map(|name| normalize(name.as_ref())).filter(|name| name.chars().count() >= 4),
        );
        self
    }

    pub fn allow_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.links.extend(
            links.into_iter().map(|link| link.as_ref().trim().to_string()).filter(|link| !link.is_empty()),
        );
        self
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn allows_link(&self, link: &str) -> bool {
        let link = link.trim();
        self.links.contains(link) || self.links.contains(link.trim_end_matches('/'))
    }

    fn record(&self, id: &crate::domain::product::ProductId) -> Option<&ProductRecord> {
        self.records.iter().find(|record| &record.id == id)
    }
}

/// Validator output. Only [`GroundingValidator::validate_draft`] builds it,
/// and only it can be turned into a [`crate::domain::response::Response`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidatedDraft {
    segments: Vec<Segment>,
    decisions: Vec<FactDecision>,
    notices: Vec<TurnNotice>,
}

impl ValidatedDraft {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn decisions(&self) -> &[FactDecision] {
        &self.decisions
    }

    pub fn notices(&self) -> &[TurnNotice] {
        &self.notices
    }

    pub fn claim_count(&self) -> usize {
        self.decisions.len()
    }

    pub fn approved_count(&self) -> usize {
        self.decisions.iter().filter(|decision| decision.grounded().is_some()).count()
    }

    /// True when the draft made claims and none of them survived.
    pub fn all_claims_rejected(&self) -> bool {
        self.claim_count() > 0 && self.approved_count() == 0
    }

    pub(crate) fn into_parts(self) -> (Vec<Segment>, Vec<TurnNotice>) {
        (self.segments, self.notices)
    }
}

#[derive(Clone, Debug)]
pub struct GroundingValidator {
    rules: Arc<StaticRuleTable>,
}

impl GroundingValidator {
    pub fn new(rules: Arc<StaticRuleTable>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &StaticRuleTable {
        &self.rules
    }

    /// Decides every fact independently. Same input, same decisions.
    pub fn validate(&self, facts: &[Fact], evidence: &Evidence, language: Language) -> Vec<FactDecision> {
        facts.iter().map(|fact| self.decide(fact, evidence, language)).collect()
    }

    fn decide(&self, fact: &Fact, evidence: &Evidence, language: Language) -> FactDecision {
        let substituted = |reason: RejectionReason| FactDecision::Substituted {
            subject: fact.subject.clone(),
            attribute: fact.attribute.clone(),
            reason,
        };

        let (subject, attribute, canonical, source) = match &fact.source {
            FactSource::Ungrounded => return substituted(RejectionReason::NoSource),
            FactSource::Catalog { product_id, field } => {
                let Some(record) = evidence.record(product_id) else {
                    return substituted(RejectionReason::RecordNotRetrieved);
                };
                let Some(value) = record.field_value(*field) else {
                    return substituted(RejectionReason::FieldAbsent);
                };
                (
                    record.name.clone(),
                    field.as_str().to_string(),
                    value,
                    GroundedSource::Catalog { product_id: product_id.clone(), field: *field },
                )
            }
            FactSource::StaticRule { rule } => {
                let Some(value) = self.rules.canonical(*rule, &fact.attribute, language) else {
                    return substituted(RejectionReason::UnknownRuleStatement);
                };
                (
                    fact.subject.clone(),
                    fact.attribute.clone(),
                    value.to_string(),
                    GroundedSource::StaticRule { rule: *rule },
                )
            }
        };

        let matches_source = fact.value.as_deref().map(str::trim) == Some(canonical.as_str());
        let grounded = GroundedFact::new(subject, attribute, canonical, source);
        if matches_source {
            FactDecision::Approved { fact: grounded }
        } else {
            FactDecision::Rewritten { fact: grounded, original_value: fact.value.clone() }
        }
    }

    /// Validates a whole draft into emit-ready segments.
    pub fn validate_draft(&self, draft: Draft, evidence: &Evidence) -> ValidatedDraft {
        let mut segments = Vec::with_capacity(draft.segments.len());
        let mut decisions = Vec::new();
        let mut notices = Vec::new();
        let product_names = evidence
            .records()
            .iter()
            .map(|record| normalize(&record.name))
            .filter(|name| name.chars().count() >= 4)
            .chain(evidence.mentions.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        for segment in draft.segments {
            match segment {
                DraftSegment::Phrase(key) => segments.push(Segment::Phrase { key }),
                DraftSegment::Text(text) => {
                    if let Some(text) = self.scrub_links(&text, evidence, &mut notices) {
                        segments.push(Segment::Text { text });
                    }
                }
                DraftSegment::Claim(fact) => {
                    let decision = self.decide(&fact, evidence, draft.language);
                    match &decision {
                        FactDecision::Approved { fact } => {
                            segments.push(Segment::Fact { fact: fact.clone() });
                        }
                        FactDecision::Rewritten { fact: grounded, original_value } => {
                            debug!(
                                event_name = "grounding.fact.rewritten",
                                subject = %grounded.subject(),
                                attribute = %grounded.attribute(),
                                drafted = ?original_value,
                                "drafted value replaced with source wording"
                            );
                            segments.push(Segment::Fact { fact: grounded.clone() });
                        }
                        FactDecision::Substituted { subject, attribute, reason } => {
                            warn!(
                                event_name = "grounding.fact.substituted",
                                subject = %subject,
                                attribute = %attribute,
                                reason = reason.as_str(),
                                "claim replaced with not-listed marker"
                            );
                            notices.push(TurnNotice::from(PolicyError::UngroundedClaim {
                                subject: subject.clone(),
                                attribute: attribute.clone(),
                                reason: reason.as_str().to_string(),
                            }));
                            segments.push(Segment::NotListed {
                                subject: subject.clone(),
                                attribute: attribute.clone(),
                            });
                        }
                    }
                    decisions.push(decision);
                }
                DraftSegment::Creative(text) => {
                    let Some(text) = self.scrub_links(&text, evidence, &mut notices) else {
                        continue;
                    };
                    let (clean, smuggled) = screen_creative(&text, &product_names);
                    if !clean.is_empty() {
                        segments.push(Segment::Text { text: clean });
                    }
                    if smuggled > 0 {
                        warn!(
                            event_name = "grounding.creative.screened",
                            sentences = smuggled,
                            "creative text carried product claims"
                        );
                        notices.push(TurnNotice::from(PolicyError::UngroundedClaim {
                            subject: "creative".to_string(),
                            attribute: "product_claim".to_string(),
                            reason: format!("{smuggled} sentence(s) stated product facts"),
                        }));
                        segments.push(Segment::NotListed {
                            subject: "creative".to_string(),
                            attribute: "product_claim".to_string(),
                        });
                    }
                }
                DraftSegment::NotListed { subject, attribute } => {
                    segments.push(Segment::NotListed { subject, attribute });
                }
                DraftSegment::Redirect(url) => {
                    if evidence.allows_link(&url) {
                        segments.push(Segment::Redirect { url: url.trim().to_string() });
                    } else {
                        notices.push(unlisted_link_notice(1));
                    }
                }
            }
        }

        ValidatedDraft { segments, decisions, notices }
    }

    fn scrub_links(&self, text: &str, evidence: &Evidence, notices: &mut Vec<TurnNotice>) -> Option<String> {
        let (scrubbed, removed) = strip_links(text, |link| evidence.allows_link(link));
        if removed > 0 {
            warn!(event_name = "grounding.link.removed", removed, "unlisted links removed from text");
            notices.push(unlisted_link_notice(removed));
        }
        let scrubbed = scrubbed.trim().to_string();
        (!scrubbed.is_empty()).then_some(scrubbed)
    }
}

fn unlisted_link_notice(count: usize) -> TurnNotice {
    TurnNotice::from(PolicyError::UngroundedClaim {
        subject: "link".to_string(),
        attribute: "url".to_string(),
        reason: format!("{count} link(s) not published by the catalog"),
    })
}

/// Drops every sentence that names a product or states a quantity. Returns
/// the remaining text and the number of dropped sentences.
fn screen_creative(text: &str, product_names: &[String]) -> (String, usize) {
    let mut dropped = 0;
    let mut lines = Vec::new();

    for line in text.lines() {
        let kept = split_sentences(line)
            .into_iter()
            .filter(|sentence| {
                let claim = is_product_claim(sentence, product_names);
                if claim {
                    dropped += 1;
                }
                !claim
            })
            .collect::<Vec<_>>()
            .join(" ");
        if !kept.is_empty() {
            lines.push(kept);
        }
    }

    (lines.join("\n"), dropped)
}

fn split_sentences(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?' | '؟') {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn is_product_claim(sentence: &str, product_names: &[String]) -> bool {
    let normalized = normalize(sentence);
    if matches_any(&normalized, KNOWN_BRANDS) {
        return true;
    }
    if product_names.iter().any(|name| matches_keyword(&normalized, name)) {
        return true;
    }
    (sentence.contains('$') && sentence.chars().any(|ch| ch.is_ascii_digit())) || has_quantity(&normalized)
}

fn has_quantity(normalized: &str) -> bool {
    let tokens = normalized.split_whitespace().collect::<Vec<_>>();
    let is_number = |token: &str| token.chars().any(|ch| ch.is_numeric()) && token.chars().all(|ch| ch.is_numeric());
    let is_unit = |token: &str| QUANTITY_UNITS.contains(&token);

    tokens.iter().enumerate().any(|(index, &token)| {
        if is_number(token) {
            let next = tokens.get(index + 1).copied();
            let previous = index.checked_sub(1).and_then(|previous| tokens.get(previous)).copied();
            let ar_currency = next == Some("ر") && tokens.get(index + 2).copied() == Some("س");
            return next.is_some_and(is_unit) || previous.is_some_and(is_unit) || ar_currency;
        }
        let digits = token.chars().take_while(|ch| ch.is_numeric()).count();
        digits > 0 && is_unit(&token[token.char_indices().nth(digits).map_or(token.len(), |(i, _)| i)..])
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{Draft, DraftSegment, Evidence, FactDecision, GroundingValidator, RejectionReason};
    use crate::domain::fact::{Fact, StaticRuleId};
    use crate::domain::language::Language;
    use crate::domain::product::{Capability, Category, ProductField, ProductId, ProductRecord};
    use crate::domain::response::{PhraseKey, Segment};
    use crate::rules::{ContactDirectory, StaticRuleTable};

    fn validator() -> GroundingValidator {
        GroundingValidator::new(Arc::new(StaticRuleTable::new(ContactDirectory {
            whatsapp: "https://wa.me/966500000000".to_string(),
            email: "care@example.sa".to_string(),
        })))
    }

    fn palma() -> ProductRecord {
        ProductRecord {
            id: ProductId("boox-palma".to_string()),
            name: "BOOX Palma".to_string(),
            name_ar: None,
            category: Category::EReader,
            capabilities: BTreeSet::from([Capability::Reading]),
            price_sar: Some(Decimal::new(1199, 0)),
            link: Some("https://shop.example.sa/ar/p/palma".to_string()),
            screen_size_in: None,
            storage_gb: Some(128),
            display_type: None,
            keywords: Vec::new(),
        }
    }

    fn catalog_fact(field: ProductField, value: Option<&str>) -> Fact {
        Fact::catalog("BOOX Palma", ProductId("boox-palma".to_string()), field, value.map(str::to_string))
    }

    #[test]
    fn present_catalog_field_is_approved() {
        let evidence = Evidence::new(vec![palma()]);
        let decisions = validator().validate(
            &[catalog_fact(ProductField::Price, Some("1199 SAR"))],
            &evidence,
            Language::English,
        );
        assert!(matches!(&decisions[0], FactDecision::Approved { fact } if fact.value() == "1199 SAR"));
    }

    #[test]
    fn paraphrased_catalog_value_is_rewritten_to_the_record() {
        let evidence = Evidence::new(vec![palma()]);
        let decisions = validator().validate(
            &[catalog_fact(ProductField::Price, Some("about 999 SAR"))],
            &evidence,
            Language::English,
        );
        match &decisions[0] {
            FactDecision::Rewritten { fact, original_value } => {
                assert_eq!(fact.value(), "1199 SAR");
                assert_eq!(original_value.as_deref(), Some("about 999 SAR"));
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn absent_field_and_missing_record_are_substituted() {
        let evidence = Evidence::new(vec![palma()]);
        let validator = validator();

        let absent = validator.validate(
            &[catalog_fact(ProductField::ScreenSize, Some("6.13\""))],
            &evidence,
            Language::English,
        );
        assert!(matches!(
            &absent[0],
            FactDecision::Substituted { reason: RejectionReason::FieldAbsent, .. }
        ));

        let missing = validator.validate(
            &[catalog_fact(ProductField::Price, Some("1199 SAR"))],
            &Evidence::default(),
            Language::English,
        );
        assert!(matches!(
            &missing[0],
            FactDecision::Substituted { reason: RejectionReason::RecordNotRetrieved, .. }
        ));
    }

    #[test]
    fn ungrounded_claims_are_always_substituted() {
        let decisions = validator().validate(
            &[Fact::ungrounded("BOOX Palma", "refresh_rate", Some("120Hz".to_string()))],
            &Evidence::new(vec![palma()]),
            Language::English,
        );
        assert!(decisions[0].is_substituted());
    }

    #[test]
    fn static_rule_facts_are_approved_in_canonical_wording() {
        let validator = validator();
        let canonical = validator
            .rules()
            .canonical(StaticRuleId::BatteryRule, "typical_duration", Language::Arabic)
            .expect("battery statement")
            .to_string();

        let decisions = validator.validate(
            &[
                Fact::static_rule(StaticRuleId::BatteryRule, "typical_duration", canonical.clone()),
                Fact::static_rule(StaticRuleId::BatteryRule, "typical_duration", "two weeks"),
                Fact::static_rule(StaticRuleId::BatteryRule, "solar_charging", "yes"),
            ],
            &Evidence::default(),
            Language::Arabic,
        );

        assert!(matches!(&decisions[0], FactDecision::Approved { .. }));
        assert!(matches!(&decisions[1], FactDecision::Rewritten { fact, .. } if fact.value() == canonical));
        assert!(matches!(
            &decisions[2],
            FactDecision::Substituted { reason: RejectionReason::UnknownRuleStatement, .. }
        ));
    }

    #[test]
    fn draft_validation_marks_substitutions_and_scrubs_links() {
        let evidence =
            Evidence::new(vec![palma()]).allow_links(["https://shop.example.sa/ar"]);
        let mut draft = Draft::new(Language::English);
        draft
            .push(DraftSegment::Phrase(PhraseKey::ProductIntro))
            .push(DraftSegment::Claim(catalog_fact(ProductField::Price, Some("1199 SAR"))))
            .push(DraftSegment::Claim(Fact::ungrounded("BOOX Palma", "weight", None)))
            .push(DraftSegment::Text("Details: https://made-up.example/palma".to_string()))
            .push(DraftSegment::Redirect("https://phishing.example".to_string()))
            .push(DraftSegment::Redirect("https://shop.example.sa/ar".to_string()));

        let validated = validator().validate_draft(draft, &evidence);

        assert_eq!(validated.claim_count(), 2);
        assert_eq!(validated.approved_count(), 1);
        assert!(validated
            .segments()
            .iter()
            .any(|segment| matches!(segment, Segment::NotListed { attribute, .. } if attribute == "weight")));
        assert!(validated
            .segments()
            .iter()
            .any(|segment| matches!(segment, Segment::Text { text } if text == "Details:")));
        let redirects = validated
            .segments()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Redirect { url } => Some(url.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(redirects, vec!["https://shop.example.sa/ar"]);
        assert!(validated.notices().iter().all(|notice| notice.code == "ungrounded_claim"));
        assert_eq!(validated.notices().len(), 3);
    }

    #[test]
    fn creative_text_loses_smuggled_product_claims() {
        let mut draft = Draft::new(Language::English);
        draft.push(DraftSegment::Creative(
            "Why did the computer go to the doctor? It had a virus! The BOOX Palma costs 999 SAR."
                .to_string(),
        ));

        let validated = validator().validate_draft(draft, &Evidence::default());

        let text = validated
            .segments()
            .iter()
            .find_map(|segment| match segment {
                Segment::Text { text } => Some(text.clone()),
                _ => None,
            })
            .expect("clean joke text survives");
        assert_eq!(text, "Why did the computer go to the doctor? It had a virus!");
        assert!(validated.segments().iter().any(|segment| matches!(segment, Segment::NotListed { .. })));
        assert_eq!(validated.notices().len(), 1);
    }

    #[test]
    fn creative_text_naming_an_unretrieved_catalog_product_is_screened() {
        let evidence = Evidence::default().screen_mentions(["Logitech MX Keys", "office 2021"]);
        let mut draft = Draft::new(Language::English);
        draft.push(DraftSegment::Creative(
            "Why was the keyboard calm? It had the right keys. The Logitech MX Keys never loses its cool. Comes with Office 2021 too."
                .to_string(),
        ));

        let validated = validator().validate_draft(draft, &evidence);

        let text = validated
            .segments()
            .iter()
            .find_map(|segment| match segment {
                Segment::Text { text } => Some(text.clone()),
                _ => None,
            })
            .expect("clean joke text survives");
        assert_eq!(text, "Why was the keyboard calm? It had the right keys.");
        assert!(validated.notices().iter().any(|notice| notice.code == "ungrounded_claim"));
    }

    #[test]
    fn quantity_claims_are_detected_without_brand_names() {
        let mut draft = Draft::new(Language::Arabic);
        draft.push(DraftSegment::Creative("الجهاز هذا بـ 500 ريال بس".to_string()));
        let validated = validator().validate_draft(draft, &Evidence::default());
        assert!(validated.segments().iter().all(|segment| !matches!(segment, Segment::Text { .. })));

        let mut draft = Draft::new(Language::English);
        draft.push(DraftSegment::Creative("Only 64GB of memes.".to_string()));
        let validated = validator().validate_draft(draft, &Evidence::default());
        assert_eq!(validated.notices().len(), 1);
    }

    #[test]
    fn validation_is_deterministic() {
        let evidence = Evidence::new(vec![palma()]);
        let facts = [
            catalog_fact(ProductField::Price, Some("1199 SAR")),
            catalog_fact(ProductField::Link, None),
            Fact::ungrounded("BOOX Palma", "weight", None),
        ];
        let validator = validator();
        assert_eq!(
            validator.validate(&facts, &evidence, Language::English),
            validator.validate(&facts, &evidence, Language::English)
        );
    }
}
