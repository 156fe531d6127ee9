use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::product::{ProductField, ProductId};

/// Fixed non-catalog policy constants a fact may cite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaticRuleId {
    InstallmentFormula,
    LifespanRule,
    BatteryRule,
    WarrantyRule,
    ReturnsRule,
    ShippingRule,
    LocationRule,
    ContactDirectory,
}

impl StaticRuleId {
    pub const ALL: [StaticRuleId; 8] = [
        StaticRuleId::InstallmentFormula,
        StaticRuleId::LifespanRule,
        StaticRuleId::BatteryRule,
        StaticRuleId::WarrantyRule,
        StaticRuleId::ReturnsRule,
        StaticRuleId::ShippingRule,
        StaticRuleId::LocationRule,
        StaticRuleId::ContactDirectory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstallmentFormula => "installment-formula",
            Self::LifespanRule => "lifespan-rule",
            Self::BatteryRule => "battery-rule",
            Self::WarrantyRule => "warranty-rule",
            Self::ReturnsRule => "returns-rule",
            Self::ShippingRule => "shipping-rule",
            Self::LocationRule => "location-rule",
            Self::ContactDirectory => "contact-directory",
        }
    }
}

impl fmt::Display for StaticRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claimed provenance of a drafted fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactSource {
    Catalog { product_id: ProductId, field: ProductField },
    StaticRule { rule: StaticRuleId },
    Ungrounded,
}

/// A drafted claim. Nothing about a `Fact` is trusted until the grounding
/// validator has looked at it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: String,
    pub attribute: String,
    pub value: Option<String>,
    pub source: FactSource,
}

impl Fact {
    pub fn catalog(
        subject: impl Into<String>,
        product_id: ProductId,
        field: ProductField,
        value: Option<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            attribute: field.as_str().to_string(),
            value,
            source: FactSource::Catalog { product_id, field },
        }
    }

    pub fn static_rule(rule: StaticRuleId, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            subject: rule.as_str().to_string(),
            attribute: attribute.into(),
            value: Some(value.into()),
            source: FactSource::StaticRule { rule },
        }
    }

    pub fn ungrounded(
        subject: impl Into<String>,
        attribute: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self { subject: subject.into(), attribute: attribute.into(), value, source: FactSource::Ungrounded }
    }
}

/// Provenance of an approved fact. There is no ungrounded variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroundedSource {
    Catalog { product_id: ProductId, field: ProductField },
    StaticRule { rule: StaticRuleId },
}

impl From<GroundedSource> for FactSource {
    fn from(value: GroundedSource) -> Self {
        match value {
            GroundedSource::Catalog { product_id, field } => Self::Catalog { product_id, field },
            GroundedSource::StaticRule { rule } => Self::StaticRule { rule },
        }
    }
}

/// A fact that passed validation. Only the grounding validator can build
/// one, so every fact inside an emitted response has a real source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroundedFact {
    subject: String,
    attribute: String,
    value: String,
    source: GroundedSource,
}

impl GroundedFact {
    pub(crate) fn new(
        subject: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
        source: GroundedSource,
    ) -> Self {
        Self { subject: subject.into(), attribute: attribute.into(), value: value.into(), source }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> &GroundedSource {
        &self.source
    }

    pub fn rule(&self) -> Option<StaticRuleId> {
        match self.source {
            GroundedSource::StaticRule { rule } => Some(rule),
            GroundedSource::Catalog { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Fact, FactSource, GroundedFact, GroundedSource, StaticRuleId};
    use crate::domain::product::{ProductField, ProductId};

    #[test]
    fn sources_serialize_as_tagged_variants() {
        let fact = Fact::catalog(
            "BOOX Palma",
            ProductId("boox-palma".to_string()),
            ProductField::Price,
            Some("1199 SAR".to_string()),
        );
        let encoded = serde_json::to_value(&fact.source).expect("serialize");
        assert_eq!(encoded["kind"], "catalog");
        assert_eq!(encoded["field"], "price");

        let rule = serde_json::to_value(FactSource::StaticRule { rule: StaticRuleId::BatteryRule })
            .expect("serialize");
        assert_eq!(rule["rule"], "battery-rule");
    }

    #[test]
    fn grounded_fact_exposes_rule_provenance() {
        let fact = GroundedFact::new(
            "lifespan-rule",
            "expected_lifespan",
            "5 years or more under normal use",
            GroundedSource::StaticRule { rule: StaticRuleId::LifespanRule },
        );
        assert_eq!(fact.rule(), Some(StaticRuleId::LifespanRule));
        assert_eq!(fact.value(), "5 years or more under normal use");
    }
}
