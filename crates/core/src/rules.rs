//! Static-rule table: the only non-catalog facts the assistant may state.
//!
//! Built once at startup and read-only afterwards. Installment statements
//! describe the plan structure in percentages; they never carry an amount.
//! Branch statements carry the only map links the assistant may publish.

use serde::Serialize;

use crate::domain::fact::{Fact, StaticRuleId};
use crate::domain::language::Language;

pub const JEDDAH_MAP: &str = "https://maps.app.goo.gl/PhENEtgDbGsace158";
pub const RIYADH_MAP: &str = "https://maps.app.goo.gl/Hq7wrDydx3jQN2bE9n";

/// One canonical statement of a rule, in both languages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleStatement {
    pub rule: StaticRuleId,
    pub attribute: String,
    pub en: String,
    pub ar: String,
}

impl RuleStatement {
    fn new(rule: StaticRuleId, attribute: &str, en: &str, ar: &str) -> Self {
        Self { rule, attribute: attribute.to_string(), en: en.to_string(), ar: ar.to_string() }
    }

    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Arabic => &self.ar,
            Language::English => &self.en,
        }
    }
}

/// Contact channels published through the `contact-directory` rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContactDirectory {
    pub whatsapp: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct StaticRuleTable {
    statements: Vec<RuleStatement>,
    contact: ContactDirectory,
}

impl StaticRuleTable {
    pub fn new(contact: ContactDirectory) -> Self {
        use StaticRuleId::{
            BatteryRule, ContactDirectory as Contact, InstallmentFormula, LifespanRule,
            LocationRule, ReturnsRule, ShippingRule, WarrantyRule,
        };
        let jeddah_en = format!(
            "Albassam Business Center, Office #43, Fourth Floor, Jeddah 22234. Map: {JEDDAH_MAP}"
        );
        let jeddah_ar = format!(
            "مركز البسام للأعمال، مكتب 43، الدور الرابع، جدة 22234. الخريطة: {JEDDAH_MAP}"
        );
        let riyadh_en =
            format!("7236, 4435, 2nd Floor, Alyasmin, Office 25, Riyadh 13326. Map: {RIYADH_MAP}");
        let riyadh_ar =
            format!("7236، 4435، الدور الثاني، حي الياسمين، مكتب 25، الرياض 13326. الخريطة: {RIYADH_MAP}");

        let statements = vec![
            RuleStatement::new(
                InstallmentFormula,
                "providers",
                "Installments are available through Tabby, Tamara or MisPay.",
                "التقسيط متاح عبر تابي أو تمارا أو مس باي.",
            ),
            RuleStatement::new(
                InstallmentFormula,
                "plan",
                "4-month plan: pay 25% now at purchase, then the remaining 75% over the following 3 months.",
                "خطة 4 أشهر: تدفع 25% الآن عند الشراء، والـ 75% المتبقية على الأشهر الثلاثة التالية.",
            ),
            RuleStatement::new(InstallmentFormula, "interest", "0% interest.", "بدون فوائد، نسبة الفائدة 0%."),
            RuleStatement::new(
                InstallmentFormula,
                "extension",
                "Longer periods may be offered depending on the provider you choose.",
                "قد تتوفر مدة أطول حسب مزود التقسيط الذي تختاره.",
            ),
            RuleStatement::new(
                InstallmentFormula,
                "schedule",
                "The exact schedule and amounts are shown at checkout.",
                "الجدول والمبالغ الدقيقة تظهر لك في صفحة الدفع.",
            ),
            RuleStatement::new(
                LifespanRule,
                "expected_lifespan",
                "5 years or more under normal use.",
                "5 سنوات أو أكثر مع الاستخدام الطبيعي.",
            ),
            RuleStatement::new(
                LifespanRule,
                "conditions",
                "Actual lifespan depends on charge frequency, usage intensity and how well the device is cared for.",
                "العمر الفعلي يعتمد على عدد مرات الشحن وكثافة الاستخدام والعناية بالجهاز.",
            ),
            RuleStatement::new(
                BatteryRule,
                "typical_duration",
                "3–4 days of typical use, up to a week on some devices.",
                "من 3 إلى 4 أيام في الاستخدام المعتاد، وقد تصل إلى أسبوع في بعض الأجهزة.",
            ),
            RuleStatement::new(
                BatteryRule,
                "display_effect",
                "Monochrome displays last longer on a charge than color displays.",
                "الشاشات أحادية اللون تدوم أطول على الشحنة من الشاشات الملونة.",
            ),
            RuleStatement::new(
                BatteryRule,
                "drains",
                "Wireless radios (Wi-Fi, Bluetooth), stylus use and screen-on time reduce battery duration.",
                "تشغيل الواي فاي والبلوتوث واستخدام القلم ومدة تشغيل الشاشة تقلل مدة البطارية.",
            ),
            RuleStatement::new(
                WarrantyRule,
                "new_products",
                "New products: 2-year warranty on manufacturing defects.",
                "المنتجات الجديدة: ضمان سنتين على عيوب التصنيع.",
            ),
            RuleStatement::new(
                WarrantyRule,
                "used_products",
                "Used products: 30-day warranty on manufacturing defects.",
                "المنتجات المستعملة: ضمان 30 يومًا على عيوب التصنيع.",
            ),
            RuleStatement::new(
                WarrantyRule,
                "exclusions",
                "The warranty does not cover misuse, accidental damage or unauthorized repair.",
                "لا يشمل الضمان سوء الاستخدام أو الحوادث أو الإصلاح لدى جهة غير معتمدة.",
            ),
            RuleStatement::new(
                ReturnsRule,
                "unopened_window",
                "Returns and exchanges within 7 days of delivery, provided the product is unopened and in its original condition.",
                "الاسترجاع أو الاستبدال خلال 7 أيام من الاستلام بشرط أن يكون المنتج غير مفتوح وبحالته الأصلية.",
            ),
            RuleStatement::new(
                ReturnsRule,
                "opened_items",
                "An opened product is treated as used and its value drops 20-30% depending on condition.",
                "إذا تم فتح المنتج يُعامل كمستعمل ويقل السعر 20-30% حسب الحالة.",
            ),
            RuleStatement::new(
                ReturnsRule,
                "used_items",
                "Used products can be exchanged within 30 days.",
                "المنتجات المستعملة يمكن استبدالها خلال 30 يومًا.",
            ),
            RuleStatement::new(
                ReturnsRule,
                "return_shipping",
                "Return shipping is paid by the customer and the product must be packed safely.",
                "الشحن على العميل ويلزم تغليف المنتج بشكل آمن.",
            ),
            RuleStatement::new(
                ReturnsRule,
                "refund_timing",
                "After inspection and approval, the refund is issued within 7 working days or a replacement is sent, subject to availability.",
                "بعد الفحص والموافقة يُسترجع المبلغ خلال 7 أيام عمل أو يُرسل البديل حسب التوفر.",
            ),
            RuleStatement::new(
                ShippingRule,
                "domestic",
                "Inside Saudi Arabia: SMSA, RedBox or Aramex.",
                "داخل السعودية: سمسا أو ريدبوكس أو أرامكس.",
            ),
            RuleStatement::new(
                ShippingRule,
                "international",
                "Outside Saudi Arabia, including the GCC: DHL only.",
                "خارج السعودية ومنها دول الخليج: DHL فقط.",
            ),
            RuleStatement::new(
                ShippingRule,
                "cost_and_time",
                "Shipping cost and delivery time are shown at checkout.",
                "تكلفة الشحن ومدة التوصيل تظهر عند إتمام الطلب.",
            ),
            RuleStatement::new(LocationRule, "jeddah_branch", &jeddah_en, &jeddah_ar),
            RuleStatement::new(LocationRule, "riyadh_branch", &riyadh_en, &riyadh_ar),
            RuleStatement::new(Contact, "whatsapp", &contact.whatsapp, &contact.whatsapp),
            RuleStatement::new(Contact, "email", &contact.email, &contact.email),
        ];

        Self { statements, contact }
    }

    pub fn contact(&self) -> &ContactDirectory {
        &self.contact
    }

    pub fn statements(&self, rule: StaticRuleId) -> impl Iterator<Item = &RuleStatement> {
        self.statements.iter().filter(move |statement| statement.rule == rule)
    }

    /// Canonical wording for `rule.attribute`, if the table defines it.
    pub fn canonical(&self, rule: StaticRuleId, attribute: &str, language: Language) -> Option<&str> {
        self.statements
            .iter()
            .find(|statement| statement.rule == rule && statement.attribute == attribute)
            .map(|statement| statement.text(language))
    }

    /// Every statement of `rule` drafted as facts in `language`.
    pub fn facts(&self, rule: StaticRuleId, language: Language) -> Vec<Fact> {
        self.statements(rule)
            .map(|statement| Fact::static_rule(rule, statement.attribute.clone(), statement.text(language)))
            .collect()
    }

    /// Links the rule table itself publishes.
    pub fn links(&self) -> Vec<&str> {
        [self.contact.whatsapp.as_str(), JEDDAH_MAP, RIYADH_MAP]
            .into_iter()
            .filter(|link| link.starts_with("https://") || link.starts_with("http://"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactDirectory, StaticRuleTable, JEDDAH_MAP, RIYADH_MAP};
    use crate::domain::fact::{FactSource, StaticRuleId};
    use crate::domain::language::Language;
    use crate::text::extract_links;

    fn table() -> StaticRuleTable {
        StaticRuleTable::new(ContactDirectory {
            whatsapp: "https://wa.me/966500000000".to_string(),
            email: "care@example.sa".to_string(),
        })
    }

    #[test]
    fn installment_facts_state_the_plan_without_amounts() {
        let table = table();
        for language in [Language::English, Language::Arabic] {
            let text = table
                .facts(StaticRuleId::InstallmentFormula, language)
                .into_iter()
                .filter_map(|fact| fact.value)
                .collect::<Vec<_>>()
                .join(" ");
            assert!(text.contains("25%"));
            assert!(text.contains("0%"));
            assert!(!text.contains("SAR"));
            assert!(!text.contains("ريال"));
        }

        let plan = table
            .canonical(StaticRuleId::InstallmentFormula, "plan", Language::English)
            .expect("plan statement");
        assert!(plan.contains("3 months"));
    }

    #[test]
    fn every_rule_has_statements_in_both_languages() {
        let table = table();
        for rule in StaticRuleId::ALL {
            let statements = table.statements(rule).collect::<Vec<_>>();
            assert!(!statements.is_empty(), "{rule} has no statements");
            assert!(statements.iter().all(|statement| !statement.en.is_empty() && !statement.ar.is_empty()));
        }
    }

    #[test]
    fn rule_facts_carry_their_rule_as_source() {
        let facts = table().facts(StaticRuleId::BatteryRule, Language::Arabic);
        assert_eq!(facts.len(), 3);
        assert!(facts
            .iter()
            .all(|fact| fact.source == FactSource::StaticRule { rule: StaticRuleId::BatteryRule }));
    }

    #[test]
    fn contact_directory_comes_from_config() {
        let table = table();
        assert_eq!(
            table.canonical(StaticRuleId::ContactDirectory, "email", Language::English),
            Some("care@example.sa")
        );
        assert_eq!(table.links(), vec!["https://wa.me/966500000000", JEDDAH_MAP, RIYADH_MAP]);
        assert!(extract_links(
            table.canonical(StaticRuleId::ContactDirectory, "whatsapp", Language::Arabic).unwrap_or_default()
        )
        .contains(&"https://wa.me/966500000000"));
    }

    #[test]
    fn returns_policy_states_windows_and_refund_timing() {
        let table = table();
        let text = table
            .facts(StaticRuleId::ReturnsRule, Language::English)
            .into_iter()
            .filter_map(|fact| fact.value)
            .collect::<Vec<_>>()
            .join(" ");
        assert!(text.contains("within 7 days"));
        assert!(text.contains("20-30%"));
        assert!(text.contains("within 30 days"));
        assert!(text.contains("paid by the customer"));
        assert!(text.contains("7 working days"));
        assert!(!text.contains("SAR"));
    }

    #[test]
    fn branch_statements_carry_their_map_links() {
        let table = table();
        for language in [Language::English, Language::Arabic] {
            let jeddah = table
                .canonical(StaticRuleId::LocationRule, "jeddah_branch", language)
                .expect("jeddah branch");
            let riyadh = table
                .canonical(StaticRuleId::LocationRule, "riyadh_branch", language)
                .expect("riyadh branch");
            assert_eq!(extract_links(jeddah), vec![JEDDAH_MAP]);
            assert_eq!(extract_links(riyadh), vec![RIYADH_MAP]);
        }
    }

    #[test]
    fn unknown_attribute_has_no_canonical_statement() {
        assert_eq!(table().canonical(StaticRuleId::WarrantyRule, "lifetime", Language::English), None);
    }
}
