//! Per-intent response drafts.
//!
//! Drafts are built only from the retrieved records, the static-rule table
//! and the creative writer's output. Whatever they claim is checked again
//! by the grounding validator before anything is emitted.

use smorti_core::catalog::QueryDescriptor;
use smorti_core::grounding::{Draft, DraftSegment};
use smorti_core::text::matches_any;
use smorti_core::{
    CatalogLookup, Fact, Intent, Language, PhraseKey, ProductField, ProductRecord, StaticRuleId,
    StaticRuleTable,
};

const SALAM_CUES: &[&str] = &["السلام عليكم", "سلام عليكم", "سلام", "assalamu alaikum", "salam alaikum"];

const BRANCH_CUES: &[(&[&str], &str)] = &[
    (&["جده", "jeddah", "jedda"], "jeddah_branch"),
    (&["الرياض", "رياض", "riyadh"], "riyadh_branch"),
];

/// Attribute a shopper asked about. Catalog-backed attributes map to a
/// record field; the rest have no catalog source at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestedAttribute {
    Field(ProductField),
    Unlisted(&'static str),
}

const FIELD_CUES: &[(&[&str], ProductField)] = &[
    (&["price", "how much", "cost", "سعر", "السعر", "بكم"], ProductField::Price),
    (&["screen size", "size", "inch", "inches", "مقاس", "حجم الشاشه", "انش", "بوصه"], ProductField::ScreenSize),
    (&["storage", "memory", "capacity", "ذاكره", "مساحه", "تخزين", "سعه"], ProductField::Storage),
    (&["display type", "e ink", "eink", "color screen", "color display", "ملونه", "نوع الشاشه", "حبر"], ProductField::DisplayType),
    (&["link", "url", "رابط", "لينك"], ProductField::Link),
];

const UNLISTED_CUES: &[(&[&str], &str)] = &[
    (&["refresh rate", "hz", "معدل التحديث"], "refresh_rate"),
    (&["resolution", "دقه"], "resolution"),
    (&["weight", "heavy", "وزن", "الوزن"], "weight"),
    (&["processor", "cpu", "معالج"], "processor"),
    (&["ram"], "ram"),
    (&["battery capacity", "mah"], "battery_capacity"),
];

/// Attributes named in `normalized`, in a fixed order. Falls back to price
/// and link when nothing specific was asked.
pub fn requested_attributes(normalized: &str) -> Vec<RequestedAttribute> {
    let mut requested = FIELD_CUES
        .iter()
        .filter(|(cues, _)| matches_any(normalized, cues))
        .map(|(_, field)| RequestedAttribute::Field(*field))
        .collect::<Vec<_>>();
    requested.extend(
        UNLISTED_CUES
            .iter()
            .filter(|(cues, _)| matches_any(normalized, cues))
            .map(|(_, attribute)| RequestedAttribute::Unlisted(*attribute)),
    );

    if requested.is_empty() {
        requested = vec![
            RequestedAttribute::Field(ProductField::Price),
            RequestedAttribute::Field(ProductField::Link),
        ];
    }
    requested
}

/// Outcome of the facts-gathering stage for a product inquiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gathered {
    NotNeeded,
    Records { descriptor: QueryDescriptor, records: Vec<ProductRecord> },
    Unavailable { descriptor: QueryDescriptor },
}

impl Gathered {
    pub fn records(&self) -> &[ProductRecord] {
        match self {
            Self::Records { records, .. } => records,
            Self::NotNeeded | Self::Unavailable { .. } => &[],
        }
    }
}

pub struct DraftInput<'a> {
    pub intent: Intent,
    pub language: Language,
    pub normalized: &'a str,
    pub introduced: bool,
    pub gathered: &'a Gathered,
    pub creative_text: Option<String>,
}

pub fn draft_response<C>(input: DraftInput<'_>, rules: &StaticRuleTable, catalog: &C) -> Draft
where
    C: CatalogLookup + ?Sized,
{
    let mut draft = Draft::new(input.language);

    match input.intent {
        Intent::LanguageSwitch => {
            draft.push(DraftSegment::Phrase(PhraseKey::SwitchAcknowledged));
            draft.push(DraftSegment::Phrase(PhraseKey::HowCanIHelp));
        }
        Intent::Greeting => {
            let salam = matches_any(input.normalized, SALAM_CUES);
            if salam {
                draft.push(DraftSegment::Phrase(PhraseKey::SalamReply));
            }
            if !input.introduced {
                draft.push(DraftSegment::Phrase(PhraseKey::Intro));
            } else if !salam {
                draft.push(DraftSegment::Phrase(PhraseKey::ShortGreeting));
            }
            draft.push(DraftSegment::Phrase(PhraseKey::HowCanIHelp));
        }
        Intent::PaymentInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::InstallmentIntro, StaticRuleId::InstallmentFormula)
        }
        Intent::ReturnsInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::ReturnsIntro, StaticRuleId::ReturnsRule)
        }
        Intent::WarrantyInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::WarrantyIntro, StaticRuleId::WarrantyRule)
        }
        Intent::ShippingInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::ShippingIntro, StaticRuleId::ShippingRule);
            if let Some(store) = catalog.store_link() {
                draft.push(DraftSegment::Redirect(store.to_string()));
            }
        }
        Intent::LocationInquiry => location_draft(&mut draft, rules, input.normalized),
        Intent::ContactInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::ContactIntro, StaticRuleId::ContactDirectory)
        }
        Intent::LifespanInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::LifespanIntro, StaticRuleId::LifespanRule)
        }
        Intent::BatteryInquiry => {
            rule_draft(&mut draft, rules, PhraseKey::BatteryIntro, StaticRuleId::BatteryRule)
        }
        Intent::ProductInquiry => product_draft(&mut draft, &input, catalog),
        Intent::CreativeRequest => match input.creative_text {
            Some(text) => {
                draft.push(DraftSegment::Phrase(PhraseKey::CreativeIntro));
                draft.push(DraftSegment::Creative(text));
            }
            None => {
                draft.push(DraftSegment::Phrase(PhraseKey::NonCommittal));
            }
        },
        Intent::Other => {
            draft.push(DraftSegment::Phrase(PhraseKey::NonCommittal));
            draft.push(DraftSegment::Phrase(PhraseKey::HowCanIHelp));
        }
    }

    draft
}

fn rule_draft(draft: &mut Draft, rules: &StaticRuleTable, intro: PhraseKey, rule: StaticRuleId) {
    draft.push(DraftSegment::Phrase(intro));
    for fact in rules.facts(rule, draft.language) {
        draft.push(DraftSegment::Claim(fact));
    }
}

/// The branch the shopper named, or every branch when none was named.
fn location_draft(draft: &mut Draft, rules: &StaticRuleTable, normalized: &str) {
    let named = BRANCH_CUES
        .iter()
        .filter(|(cues, _)| matches_any(normalized, cues))
        .map(|(_, attribute)| *attribute)
        .collect::<Vec<_>>();

    draft.push(DraftSegment::Phrase(PhraseKey::LocationIntro));
    for fact in rules.facts(StaticRuleId::LocationRule, draft.language) {
        if named.is_empty() || named.contains(&fact.attribute.as_str()) {
            draft.push(DraftSegment::Claim(fact));
        }
    }
}

fn product_draft<C>(draft: &mut Draft, input: &DraftInput<'_>, catalog: &C)
where
    C: CatalogLookup + ?Sized,
{
    match input.gathered {
        Gathered::Unavailable { .. } => {
            draft.push(DraftSegment::Phrase(PhraseKey::CatalogUnavailable));
            if let Some(store) = catalog.store_link() {
                draft.push(DraftSegment::Redirect(store.to_string()));
            }
        }
        Gathered::Records { descriptor, records } if records.is_empty() => {
            draft.push(DraftSegment::Phrase(PhraseKey::NotFound));
            draft.push(DraftSegment::NotListed {
                subject: input.normalized.to_string(),
                attribute: "product".to_string(),
            });
            if let Some(link) = redirect_link(descriptor, catalog) {
                draft.push(DraftSegment::Redirect(link));
            }
        }
        Gathered::Records { records, .. } => {
            draft.push(DraftSegment::Phrase(PhraseKey::ProductIntro));
            let requested = requested_attributes(input.normalized);
            for record in records {
                draft.push(DraftSegment::Claim(Fact::catalog(
                    record.name.clone(),
                    record.id.clone(),
                    ProductField::Name,
                    record.field_value(ProductField::Name),
                )));
                for attribute in &requested {
                    let fact = match attribute {
                        RequestedAttribute::Field(field) => Fact::catalog(
                            record.name.clone(),
                            record.id.clone(),
                            *field,
                            record.field_value(*field),
                        ),
                        RequestedAttribute::Unlisted(attribute) => {
                            Fact::ungrounded(record.name.clone(), *attribute, None)
                        }
                    };
                    draft.push(DraftSegment::Claim(fact));
                }
            }
        }
        Gathered::NotNeeded => {
            draft.push(DraftSegment::Phrase(PhraseKey::NonCommittal));
        }
    }
}

/// Category page when one category was hinted and the catalog publishes
/// its link, otherwise the store page.
pub fn redirect_link<C>(descriptor: &QueryDescriptor, catalog: &C) -> Option<String>
where
    C: CatalogLookup + ?Sized,
{
    let category_link = match descriptor.categories.len() {
        1 => descriptor.primary_category().and_then(|category| catalog.category_link(category)),
        _ => None,
    };
    category_link.or_else(|| catalog.store_link()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use smorti_core::text::normalize;
    use smorti_core::ProductField;

    use super::{requested_attributes, RequestedAttribute};

    #[test]
    fn named_attributes_are_requested_in_order() {
        let requested = requested_attributes(&normalize("what is the price and refresh rate"));
        assert_eq!(
            requested,
            vec![
                RequestedAttribute::Field(ProductField::Price),
                RequestedAttribute::Unlisted("refresh_rate"),
            ]
        );
    }

    #[test]
    fn plain_product_question_asks_for_price_and_link() {
        let requested = requested_attributes(&normalize("ابي شاشة"));
        assert_eq!(
            requested,
            vec![
                RequestedAttribute::Field(ProductField::Price),
                RequestedAttribute::Field(ProductField::Link),
            ]
        );
    }
}
