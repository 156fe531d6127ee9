use serde::{Deserialize, Serialize};

/// Exactly one intent is assigned per utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    LanguageSwitch,
    Greeting,
    PaymentInquiry,
    ReturnsInquiry,
    WarrantyInquiry,
    ShippingInquiry,
    LocationInquiry,
    ContactInquiry,
    ProductInquiry,
    LifespanInquiry,
    BatteryInquiry,
    CreativeRequest,
    Other,
}

impl Intent {
    /// Highest precedence first. Ties between plausible intents resolve to
    /// the earliest entry.
    pub const PRECEDENCE: [Intent; 13] = [
        Intent::LanguageSwitch,
        Intent::Greeting,
        Intent::PaymentInquiry,
        Intent::ReturnsInquiry,
        Intent::WarrantyInquiry,
        Intent::ShippingInquiry,
        Intent::LocationInquiry,
        Intent::ContactInquiry,
        Intent::ProductInquiry,
        Intent::LifespanInquiry,
        Intent::BatteryInquiry,
        Intent::CreativeRequest,
        Intent::Other,
    ];

    pub fn precedence_rank(&self) -> usize {
        Self::PRECEDENCE.iter().position(|intent| intent == self).unwrap_or(Self::PRECEDENCE.len())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanguageSwitch => "language_switch",
            Self::Greeting => "greeting",
            Self::PaymentInquiry => "payment_inquiry",
            Self::ReturnsInquiry => "returns_inquiry",
            Self::WarrantyInquiry => "warranty_inquiry",
            Self::ShippingInquiry => "shipping_inquiry",
            Self::LocationInquiry => "location_inquiry",
            Self::ContactInquiry => "contact_inquiry",
            Self::ProductInquiry => "product_inquiry",
            Self::LifespanInquiry => "lifespan_inquiry",
            Self::BatteryInquiry => "battery_inquiry",
            Self::CreativeRequest => "creative_request",
            Self::Other => "other",
        }
    }

    pub fn needs_catalog(&self) -> bool {
        matches!(self, Self::ProductInquiry)
    }

    /// Picks the highest-precedence intent from a plausible set.
    pub fn resolve<I>(candidates: I) -> Intent
    where
        I: IntoIterator<Item = Intent>,
    {
        candidates.into_iter().min_by_key(Intent::precedence_rank).unwrap_or(Intent::Other)
    }
}
