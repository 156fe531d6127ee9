use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    EReader,
    Monitor,
    InteractiveScreen,
    Tablet,
    ComputerAccessory,
    Software,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::EReader,
        Category::Monitor,
        Category::InteractiveScreen,
        Category::Tablet,
        Category::ComputerAccessory,
        Category::Software,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EReader => "e-reader",
            Self::Monitor => "monitor",
            Self::InteractiveScreen => "interactive-screen",
            Self::Tablet => "tablet",
            Self::ComputerAccessory => "computer-accessory",
            Self::Software => "software",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Reading,
    NoteTaking,
    Gaming,
    Video,
    Presentation,
    Office,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::NoteTaking => "note-taking",
            Self::Gaming => "gaming",
            Self::Video => "video",
            Self::Presentation => "presentation",
            Self::Office => "office",
        }
    }
}

/// Catalog fields a [`crate::domain::fact::FactSource::Catalog`] may reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    NameAr,
    Category,
    Price,
    Link,
    ScreenSize,
    Storage,
    DisplayType,
}

impl ProductField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NameAr => "name_ar",
            Self::Category => "category",
            Self::Price => "price",
            Self::Link => "link",
            Self::ScreenSize => "screen_size",
            Self::Storage => "storage",
            Self::DisplayType => "display_type",
        }
    }
}

/// A real catalog entry. Read-only to this crate; optional fields that are
/// missing from the source stay `None` and are never filled in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    #[serde(default)]
    pub price_sar: Option<Decimal>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub screen_size_in: Option<Decimal>,
    #[serde(default)]
    pub storage_gb: Option<u32>,
    #[serde(default)]
    pub display_type: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ProductRecord {
    /// Value of `field` as it would be stated to a shopper. Blank strings
    /// count as absent.
    pub fn field_value(&self, field: ProductField) -> Option<String> {
        let non_blank = |value: &Option<String>| {
            value.as_deref().map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
        };

        match field {
            ProductField::Name => Some(self.name.trim().to_string()).filter(|name| !name.is_empty()),
            ProductField::NameAr => non_blank(&self.name_ar),
            ProductField::Category => Some(self.category.as_str().to_string()),
            ProductField::Price => self.price_sar.map(|price| format!("{} SAR", price.normalize())),
            ProductField::Link => non_blank(&self.link),
            ProductField::ScreenSize => {
                self.screen_size_in.map(|size| format!("{}\"", size.normalize()))
            }
            ProductField::Storage => self.storage_gb.map(|storage| format!("{storage} GB")),
            ProductField::DisplayType => non_blank(&self.display_type),
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
