//! Intent classification.
//!
//! Every intent whose cues appear in the utterance becomes a candidate; the
//! winner is the candidate with the highest precedence
//! ([`Intent::PRECEDENCE`]). Greetings are the exception to cue matching:
//! only a complete canonical greeting counts, never a greeting embedded in
//! a longer request.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::conversation::ConversationState;
use crate::domain::intent::Intent;
use crate::domain::language::Language;
use crate::domain::utterance::Utterance;
use crate::language::SwitchCommands;
use crate::text::{matches_any, normalize};

pub const DEFAULT_GREETINGS: &[&str] = &[
    "السلام عليكم",
    "السلام عليكم ورحمة الله",
    "السلام عليكم ورحمة الله وبركاته",
    "سلام عليكم",
    "سلام",
    "وعليكم السلام",
    "عليكم السلام",
    "assalamu alaikum",
    "salam alaikum",
    "peace be upon you",
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "greetings",
    "howdy",
    "مرحبا",
    "اهلا",
    "اهلين",
    "هلا",
    "هلا والله",
    "يا هلا",
    "حياك",
    "صباح الخير",
    "مساء الخير",
];

const PAYMENT_CUES: &[&str] = &[
    "installment",
    "installments",
    "tabby",
    "tamara",
    "mispay",
    "pay later",
    "buy now pay later",
    "payment plan",
    "تقسيط",
    "اقساط",
    "تابي",
    "تمارا",
    "مس باي",
    "الدفع",
];

const RETURNS_CUES: &[&str] = &[
    "return",
    "returns",
    "return policy",
    "refund",
    "exchange",
    "استرجاع",
    "استبدال",
    "ارجاع",
    "استرداد",
    "ترجيع",
];

const WARRANTY_CUES: &[&str] = &["warranty", "guarantee", "ضمان", "كفاله"];

// "شحن" alone is left out on purpose: it also means charging.
const SHIPPING_CUES: &[&str] = &[
    "shipping",
    "ship",
    "delivery",
    "deliver",
    "smsa",
    "aramex",
    "redbox",
    "dhl",
    "توصيل",
    "يوصل",
    "تشحنون",
    "سمسا",
    "ارامكس",
    "ريدبوكس",
];

// City names alone are left out: "delivery to Jeddah" is a shipping question.
const LOCATION_CUES: &[&str] = &[
    "location",
    "address",
    "branch",
    "branches",
    "where are you",
    "where is your store",
    "visit your store",
    "موقع",
    "موقعكم",
    "لوكيشن",
    "عنوان",
    "عنوانكم",
    "فرع",
    "فروع",
    "فرعكم",
];

const CONTACT_CUES: &[&str] = &[
    "contact",
    "whatsapp",
    "email",
    "customer service",
    "phone number",
    "تواصل",
    "واتساب",
    "واتس",
    "ايميل",
    "خدمه العملاء",
    "موظف",
];

const PRODUCT_CUES: &[&str] = &[
    "want",
    "need",
    "recommend",
    "suggest",
    "buy",
    "price",
    "how much",
    "do you have",
    "looking for",
    "screen",
    "monitor",
    "display",
    "e reader",
    "ereader",
    "reader",
    "tablet",
    "software",
    "laptop",
    "ابي",
    "ابغى",
    "ابغي",
    "اريد",
    "سعر",
    "بكم",
    "كم سعر",
    "عندكم",
    "تنصحني",
    "شاشه",
    "قارئ",
    "قاري",
    "تابلت",
    "جهاز لوحي",
    "برامج",
    "برنامج",
];

const LIFESPAN_CUES: &[&str] = &[
    "lifespan",
    "life span",
    "how many years",
    "how long will it last",
    "how long does it last",
    "durability",
    "durable",
    "عمر الجهاز",
    "العمر الافتراضي",
    "كم سنه",
    "يعيش",
    "يعمر",
];

const BATTERY_CUES: &[&str] = &[
    "battery",
    "charge",
    "charging",
    "بطاريه",
    "البطاريه",
    "شحنه",
    "الشحن يقعد",
];

const CREATIVE_CUES: &[&str] = &[
    "joke",
    "story",
    "poem",
    "funny",
    "make me laugh",
    "نكته",
    "نكت",
    "ضحكني",
    "قصه",
    "قصيده",
];

const FOLLOW_UP_CUES: &[&str] =
    &["another", "another one", "one more", "more", "again", "ثانيه", "وحده ثانيه", "كمان", "زياده"];

/// Full classification outcome, for tracing and tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    pub candidates: BTreeSet<Intent>,
    pub requested_language: Option<Language>,
}

impl Classification {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct IntentClassifier {
    switch_commands: SwitchCommands,
    greetings: Vec<String>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(SwitchCommands::default(), DEFAULT_GREETINGS.iter().copied())
    }
}

impl IntentClassifier {
    pub fn new<G, S>(switch_commands: SwitchCommands, greetings: G) -> Self
    where
        G: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let greetings = greetings
            .into_iter()
            .map(|phrase| normalize(phrase.as_ref()))
            .filter(|phrase| !phrase.is_empty())
            .collect();
        Self { switch_commands, greetings }
    }

    pub fn classify(&self, state: &ConversationState, utterance: &Utterance) -> Intent {
        self.classify_detailed(state, utterance).intent
    }

    pub fn classify_detailed(
        &self,
        state: &ConversationState,
        utterance: &Utterance,
    ) -> Classification {
        let text = utterance.normalized();
        let mut candidates = BTreeSet::new();

        let requested_language = self.switch_commands.requested_language(text);
        if requested_language.is_some() {
            candidates.insert(Intent::LanguageSwitch);
        }
        if self.is_full_greeting(text) {
            candidates.insert(Intent::Greeting);
        }

        let cue_tables = [
            (Intent::PaymentInquiry, PAYMENT_CUES),
            (Intent::ReturnsInquiry, RETURNS_CUES),
            (Intent::WarrantyInquiry, WARRANTY_CUES),
            (Intent::ShippingInquiry, SHIPPING_CUES),
            (Intent::LocationInquiry, LOCATION_CUES),
            (Intent::ContactInquiry, CONTACT_CUES),
            (Intent::ProductInquiry, PRODUCT_CUES),
            (Intent::LifespanInquiry, LIFESPAN_CUES),
            (Intent::BatteryInquiry, BATTERY_CUES),
            (Intent::CreativeRequest, CREATIVE_CUES),
        ];
        for (intent, cues) in cue_tables {
            if matches_any(text, cues) {
                candidates.insert(intent);
            }
        }

        if state.last_intent() == Some(Intent::CreativeRequest) && matches_any(text, FOLLOW_UP_CUES) {
            candidates.insert(Intent::CreativeRequest);
        }

        let intent = Intent::resolve(candidates.iter().copied());
        Classification { intent, candidates, requested_language }
    }

    fn is_full_greeting(&self, normalized: &str) -> bool {
        self.greetings.iter().any(|greeting| greeting == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::IntentClassifier;
    use crate::domain::conversation::ConversationState;
    use crate::domain::intent::Intent;
    use crate::domain::utterance::{ConversationId, Utterance};

    fn classify(text: &str) -> Intent {
        let state = ConversationState::new(ConversationId("c-intent".to_string()));
        IntentClassifier::default()
            .classify(&state, &Utterance::new(ConversationId("c-intent".to_string()), text))
    }

    #[test]
    fn gaming_screen_request_is_a_product_inquiry() {
        assert_eq!(classify("I want a gaming screen"), Intent::ProductInquiry);
    }

    #[test]
    fn arabic_battery_question_is_a_battery_inquiry() {
        assert_eq!(classify("كم يدوم البطارية؟"), Intent::BatteryInquiry);
    }

    #[test]
    fn complete_greeting_is_a_greeting() {
        assert_eq!(classify("السلام عليكم"), Intent::Greeting);
        assert_eq!(classify("Hello!"), Intent::Greeting);
        assert_eq!(classify("أهلاً"), Intent::Greeting);
    }

    #[test]
    fn greeting_inside_a_request_falls_through() {
        assert_eq!(classify("السلام عليكم ابي شاشة"), Intent::ProductInquiry);
        assert_eq!(classify("hello do you have a tablet"), Intent::ProductInquiry);
        assert_eq!(classify("السلام"), Intent::Other);
    }

    #[test]
    fn switch_command_outranks_everything() {
        assert_eq!(classify("speak english"), Intent::LanguageSwitch);
        assert_eq!(classify("تكلم عربي"), Intent::LanguageSwitch);
    }

    #[test]
    fn payment_outranks_product() {
        assert_eq!(classify("can I buy the BOOX Palma with tabby?"), Intent::PaymentInquiry);
        assert_eq!(classify("عندكم تقسيط؟"), Intent::PaymentInquiry);
    }

    #[test]
    fn supplementary_policy_intents_are_recognised() {
        assert_eq!(classify("what is the warranty?"), Intent::WarrantyInquiry);
        assert_eq!(classify("تشحنون للرياض؟"), Intent::ShippingInquiry);
        assert_eq!(classify("رقم الواتساب"), Intent::ContactInquiry);
    }

    #[test]
    fn returns_and_branch_questions_are_recognised() {
        assert_eq!(classify("what is your return policy?"), Intent::ReturnsInquiry);
        assert_eq!(classify("ابي استرجاع الجهاز"), Intent::ReturnsInquiry);
        assert_eq!(classify("can I get a refund under warranty"), Intent::ReturnsInquiry);
        assert_eq!(classify("وين موقعكم في جدة؟"), Intent::LocationInquiry);
        assert_eq!(classify("where is your Riyadh branch"), Intent::LocationInquiry);
    }

    #[test]
    fn city_names_alone_do_not_make_a_location_question() {
        assert_eq!(classify("Delivery to جدة?"), Intent::ShippingInquiry);
        assert_eq!(classify("do you ship to the branch city Riyadh"), Intent::ShippingInquiry);
    }

    #[test]
    fn lifespan_outranks_battery() {
        assert_eq!(classify("how many years will the battery hold up"), Intent::LifespanInquiry);
    }

    #[test]
    fn creative_request_and_follow_up() {
        let classifier = IntentClassifier::default();
        let id = ConversationId("c-joke".to_string());
        let mut state = ConversationState::new(id.clone());

        let first = classifier.classify(&state, &Utterance::new(id.clone(), "tell me a joke"));
        assert_eq!(first, Intent::CreativeRequest);
        state.record_turn(first);

        let follow_up = classifier.classify(&state, &Utterance::new(id.clone(), "another one"));
        assert_eq!(follow_up, Intent::CreativeRequest);

        state.record_turn(Intent::Other);
        let out_of_context = classifier.classify(&state, &Utterance::new(id, "another one"));
        assert_eq!(out_of_context, Intent::Other);
    }

    #[test]
    fn unmatched_text_is_other_and_ambiguous() {
        let classifier = IntentClassifier::default();
        let id = ConversationId("c-other".to_string());
        let state = ConversationState::new(id.clone());

        let classification =
            classifier.classify_detailed(&state, &Utterance::new(id, "the weather is nice"));

        assert_eq!(classification.intent, Intent::Other);
        assert!(classification.is_ambiguous());
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = IntentClassifier::default();
        let id = ConversationId("c-det".to_string());
        let state = ConversationState::new(id.clone());
        let utterance = Utterance::new(id, "ابي شاشة للألعاب بالتقسيط");

        let first = classifier.classify_detailed(&state, &utterance);
        let second = classifier.classify_detailed(&state, &utterance);
        assert_eq!(first, second);
        assert_eq!(first.intent, Intent::PaymentInquiry);
    }
}
