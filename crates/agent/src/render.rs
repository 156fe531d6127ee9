//! Plain-text rendering of validated responses.
//!
//! The renderer only formats what the response already carries. It adds
//! fixed connective wording per language and never introduces facts.

use anyhow::{Context as _, Result};
use serde::Serialize;
use tera::{Context, Tera};

use smorti_core::{Language, PhraseKey, Response, Segment};

const RESPONSE_TEMPLATE: &str = "response.txt";

pub const NOT_LISTED_EN: &str = "not listed in the catalog";
pub const NOT_LISTED_AR: &str = "غير مدرج في الكتالوج";

pub fn not_listed_marker(language: Language) -> &'static str {
    match language {
        Language::Arabic => NOT_LISTED_AR,
        Language::English => NOT_LISTED_EN,
    }
}

pub fn phrase(key: PhraseKey, language: Language) -> &'static str {
    use PhraseKey::*;

    match (key, language) {
        (SalamReply, Language::English) => "Wa alaikum assalam 🤍",
        (SalamReply, Language::Arabic) => "وعليكم السلام ورحمة الله 🤍",
        (Intro, Language::English) => {
            "I'm Smorti, the smart assistant for the Smart store 🛒 I'm still under development, but I'll do my best to show you what's available."
        }
        (Intro, Language::Arabic) => {
            "أنا سمورتي، مساعد ذكي لمتجر سمارت 🛒 لسّه تحت التطوير، بس بحاول أخدمك قد ما أقدر وأوضح لك المتاح."
        }
        (ShortGreeting, Language::English) => "Hello again 👋",
        (ShortGreeting, Language::Arabic) => "هلا فيك 👋",
        (HowCanIHelp, Language::English) => {
            "Tell me what you need (e-reader, screen, software, price, comparison) and I'll help."
        }
        (HowCanIHelp, Language::Arabic) => {
            "قلّي وش تحتاج (جهاز قراءة، شاشة، برامج، سعر، مقارنة) وأنا أساعدك 😊"
        }
        (SwitchAcknowledged, Language::English) => "Sure, I'll continue in English.",
        (SwitchAcknowledged, Language::Arabic) => "أكيد، بكمل معك بالعربي.",
        (ProductIntro, Language::English) => "Here is what the catalog lists:",
        (ProductIntro, Language::Arabic) => "هذا المتوفر في الكتالوج:",
        (InstallmentIntro, Language::English) => "Installment options 💳",
        (InstallmentIntro, Language::Arabic) => "خيارات التقسيط 💳",
        (LifespanIntro, Language::English) => "Device lifespan ⏳",
        (LifespanIntro, Language::Arabic) => "عمر الجهاز ⏳",
        (BatteryIntro, Language::English) => "Battery life on e-ink devices 🔋",
        (BatteryIntro, Language::Arabic) => "عمر البطارية لأجهزة الحبر الإلكتروني 🔋",
        (WarrantyIntro, Language::English) => "Warranty 🛡️",
        (WarrantyIntro, Language::Arabic) => "الضمان 🛡️",
        (ReturnsIntro, Language::English) => "Returns and exchanges 🔄",
        (ReturnsIntro, Language::Arabic) => "الاسترجاع والاستبدال 🔄",
        (ShippingIntro, Language::English) => "Shipping 🚚",
        (ShippingIntro, Language::Arabic) => "الشحن 🚚",
        (LocationIntro, Language::English) => "Our branches 📍",
        (LocationIntro, Language::Arabic) => "فروعنا 📍",
        (ContactIntro, Language::English) => "You can reach the team here:",
        (ContactIntro, Language::Arabic) => "تقدر تتواصل مع الفريق هنا:",
        (NonCommittal, Language::English) => {
            "I'm not sure I understood. Could you tell me a bit more about what you're looking for?"
        }
        (NonCommittal, Language::Arabic) => "ما فهمت عليك تمامًا، ممكن توضح لي وش تدور عليه؟",
        (CatalogUnavailable, Language::English) => {
            "I can't reach the catalog right now. You can browse the store directly."
        }
        (CatalogUnavailable, Language::Arabic) => {
            "ما قدرت أوصل للكتالوج حاليًا، تقدر تتصفح المتجر مباشرة."
        }
        (NotFound, Language::English) => "I couldn't find that in the catalog.",
        (NotFound, Language::Arabic) => "ما لقيت هذا في الكتالوج.",
        (CreativeIntro, Language::English) => "Sure 😄",
        (CreativeIntro, Language::Arabic) => "أكيد 😄",
    }
}

/// Display label for a fact attribute. `None` means the value reads on its
/// own (rule statements).
pub fn label(attribute: &str, language: Language) -> Option<&'static str> {
    let (en, ar) = match attribute {
        "category" => ("Category", "الفئة"),
        "price" => ("Price", "السعر"),
        "link" => ("Link", "الرابط"),
        "screen_size" => ("Screen size", "حجم الشاشة"),
        "storage" => ("Storage", "السعة"),
        "display_type" => ("Display", "نوع الشاشة"),
        "name_ar" => ("Arabic name", "الاسم بالعربي"),
        "refresh_rate" => ("Refresh rate", "معدل التحديث"),
        "resolution" => ("Resolution", "الدقة"),
        "weight" => ("Weight", "الوزن"),
        "processor" => ("Processor", "المعالج"),
        "ram" => ("RAM", "الرام"),
        "battery_capacity" => ("Battery capacity", "سعة البطارية"),
        "whatsapp" => ("WhatsApp", "واتساب"),
        "email" => ("Email", "الإيميل"),
        "jeddah_branch" => ("Jeddah branch", "فرع جدة"),
        "riyadh_branch" => ("Riyadh branch", "فرع الرياض"),
        "product" => ("Product", "المنتج"),
        _ => return None,
    };
    Some(match language {
        Language::Arabic => ar,
        Language::English => en,
    })
}

fn link_label(language: Language) -> &'static str {
    match language {
        Language::Arabic => "🔗 الرابط",
        Language::English => "🔗 Link",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Block {
    kind: &'static str,
    label: Option<&'static str>,
    value: String,
}

pub struct ResponseRenderer {
    templates: Tera,
}

impl ResponseRenderer {
    pub fn new() -> Result<Self> {
        let mut templates = Tera::default();
        templates
            .add_raw_template(RESPONSE_TEMPLATE, include_str!("../templates/response.txt"))
            .context("failed to register response template")?;
        Ok(Self { templates })
    }

    pub fn render(&self, response: &Response) -> Result<String> {
        let language = response.language;
        let blocks = response
            .segments
            .iter()
            .map(|segment| block(segment, language))
            .collect::<Vec<_>>();

        let mut context = Context::new();
        context.insert("blocks", &blocks);
        context.insert("not_listed", not_listed_marker(language));
        context.insert("link_label", link_label(language));
        context.insert("language", language.as_str());
        context.insert("intent", response.intent.as_str());

        let rendered = self
            .templates
            .render(RESPONSE_TEMPLATE, &context)
            .context("failed to render response template")?;
        Ok(rendered.trim_end().to_string())
    }
}

fn block(segment: &Segment, language: Language) -> Block {
    match segment {
        Segment::Phrase { key } => {
            Block { kind: "text", label: None, value: phrase(*key, language).to_string() }
        }
        Segment::Text { text } => Block { kind: "text", label: None, value: text.clone() },
        Segment::Fact { fact } if fact.attribute() == "name" => {
            Block { kind: "product", label: None, value: fact.value().to_string() }
        }
        Segment::Fact { fact } => Block {
            kind: "fact",
            label: label(fact.attribute(), language),
            value: fact.value().to_string(),
        },
        Segment::NotListed { attribute, .. } => {
            Block { kind: "not_listed", label: label(attribute, language), value: String::new() }
        }
        Segment::Redirect { url } => Block { kind: "link", label: None, value: url.clone() },
    }
}
