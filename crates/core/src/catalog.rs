//! Read-only catalog access.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Capability, Category, ProductRecord};
use crate::errors::CatalogError;
use crate::text::{matches_any, normalize};

const CATEGORY_HINTS: &[(&[&str], &[Category])] = &[
    (&["screen", "screens", "شاشه", "شاشات"], &[Category::Monitor, Category::InteractiveScreen]),
    (&["monitor", "monitors", "مونيتور"], &[Category::Monitor]),
    (
        &["interactive", "smart board", "whiteboard", "تفاعليه", "سبوره"],
        &[Category::InteractiveScreen],
    ),
    (&["e reader", "ereader", "reader", "قارئ", "قاري"], &[Category::EReader]),
    (&["tablet", "tablets", "تابلت", "جهاز لوحي"], &[Category::Tablet]),
    (&["software", "license", "برامج", "برنامج", "رخصه"], &[Category::Software]),
    (&["keyboard", "mouse", "accessory", "كيبورد", "ماوس", "ملحقات"], &[Category::ComputerAccessory]),
];

const CAPABILITY_HINTS: &[(&[&str], Capability)] = &[
    (&["gaming", "game", "games", "gamer", "العاب", "قيمنق"], Capability::Gaming),
    (&["video", "videos", "movies", "netflix", "youtube", "فيديو", "افلام"], Capability::Video),
    (&["reading", "read", "books", "قراءه", "الكتب"], Capability::Reading),
    (&["notes", "note taking", "handwriting", "ملاحظات", "كتابه"], Capability::NoteTaking),
    (&["presentation", "meeting", "classroom", "اجتماعات"], Capability::Presentation),
    (&["office", "work", "مكتب", "دوام"], Capability::Office),
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "you", "we", "do", "does", "is", "are", "it", "this", "that", "for",
    "to", "of", "and", "or", "in", "on", "with", "have", "has", "want", "need", "me", "my",
    "your", "please", "any", "some", "what", "which", "how", "much", "price", "cost", "can",
    "get", "buy", "sell", "tell", "about", "show", "there", "stock", "available", "hi", "hello",
    "link", "size", "storage", "memory", "display", "type", "ink", "refresh", "rate",
    "resolution", "weight", "processor", "cpu", "ram", "battery", "capacity", "في", "من", "على",
    "عن", "هل", "ابي", "ابغى", "اريد", "عندكم", "لو", "سمحت", "كم", "سعر", "بكم", "سعره", "رابط",
    "متوفر", "وش", "ايش", "تبيعون",
];

/// What a product question is looking for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueryDescriptor {
    pub categories: BTreeSet<Category>,
    pub capabilities: BTreeSet<Capability>,
    pub excluded_categories: BTreeSet<Category>,
    pub terms: Vec<String>,
}

impl QueryDescriptor {
    /// Builds a descriptor from normalized text and applies the domain
    /// exclusion rules.
    pub fn from_text(normalized: &str) -> Self {
        let mut descriptor = Self::default();

        for (hints, categories) in CATEGORY_HINTS {
            if matches_any(normalized, hints) {
                descriptor.categories.extend(categories.iter().copied());
            }
        }
        for (hints, capability) in CAPABILITY_HINTS {
            if matches_any(normalized, hints) {
                descriptor.capabilities.insert(*capability);
            }
        }

        let mut seen = BTreeSet::new();
        descriptor.terms = normalized
            .split_whitespace()
            .filter(|word| word.chars().count() >= 2 && !STOP_WORDS.contains(word))
            .filter(|word| seen.insert(word.to_string()))
            .map(str::to_string)
            .collect();

        descriptor.with_domain_rules()
    }

    /// Gaming and video never resolve to e-readers. Gaming without a
    /// category hint means a screen.
    pub fn with_domain_rules(mut self) -> Self {
        let wants_motion = self.capabilities.contains(&Capability::Gaming)
            || self.capabilities.contains(&Capability::Video);
        if wants_motion {
            self.excluded_categories.insert(Category::EReader);
        }
        let excluded = self.excluded_categories.clone();
        self.categories.retain(|category| !excluded.contains(category));
        if self.capabilities.contains(&Capability::Gaming) && self.categories.is_empty() {
            self.categories.extend([Category::Monitor, Category::InteractiveScreen]);
        }
        self
    }

    pub fn primary_category(&self) -> Option<Category> {
        self.categories.iter().next().copied()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.categories.is_empty() && self.capabilities.is_empty() && self.terms.is_empty()
    }

    pub fn admits(&self, record: &ProductRecord) -> bool {
        if self.excluded_categories.contains(&record.category) {
            return false;
        }
        self.categories.is_empty() || self.categories.contains(&record.category)
    }

    /// True when the query names a product outright, with no category or
    /// capability to go on.
    pub fn is_name_query(&self) -> bool {
        self.categories.is_empty() && self.capabilities.is_empty() && !self.terms.is_empty()
    }

    fn term_hits(&self, record: &ProductRecord) -> usize {
        let haystack = format!(" {} ", searchable_text(record));
        self.terms.iter().filter(|term| haystack.contains(&format!(" {term} "))).count()
    }

    /// A name query admits a record only when most of its terms name it.
    /// "iPad Pro" never resolves to a product that merely shares "pro".
    fn covers_terms(&self, record: &ProductRecord) -> bool {
        !self.is_name_query() || self.term_hits(record) * 2 > self.terms.len()
    }

    fn score(&self, record: &ProductRecord) -> u32 {
        let mut score = 0;
        if self.categories.contains(&record.category) {
            score += 3;
        }
        let capability_hits =
            self.capabilities.iter().filter(|capability| record.has_capability(**capability)).count();
        score += 2 * capability_hits as u32;
        score + self.term_hits(record) as u32
    }
}

fn searchable_text(record: &ProductRecord) -> String {
    let mut parts = vec![record.name.clone(), record.id.0.replace(['-', '_'], " ")];
    parts.extend(record.name_ar.iter().cloned());
    parts.extend(record.keywords.iter().cloned());
    normalize(&parts.join(" "))
}

/// Drops every record the descriptor excludes, whatever backend produced
/// the list.
pub fn enforce_domain_exclusions(
    descriptor: &QueryDescriptor,
    records: Vec<ProductRecord>,
) -> Vec<ProductRecord> {
    records.into_iter().filter(|record| !descriptor.excluded_categories.contains(&record.category)).collect()
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find(&self, descriptor: &QueryDescriptor) -> Result<Vec<ProductRecord>, CatalogError>;

    /// Store landing page, if the catalog provides one.
    fn store_link(&self) -> Option<&str>;

    fn category_link(&self, category: Category) -> Option<&str>;

    /// Normalized names of every product the catalog knows, whether or not
    /// a lookup retrieved it. Creative text may mention none of them.
    fn product_names(&self) -> Vec<String>;
}

/// Full names, Arabic names, and the brand and model parts of each name,
/// normalized. Parts shorter than four characters are skipped.
pub fn mention_names<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ProductRecord>,
{
    let mut names = BTreeSet::new();
    for record in records {
        let full = normalize(&record.name);
        if let Some((brand, model)) = full.split_once(' ') {
            names.insert(brand.to_string());
            names.insert(model.to_string());
        }
        names.insert(full);
        names.extend(record.name_ar.iter().map(|name| normalize(name)));
    }
    names.into_iter().filter(|name| name.chars().count() >= 4).collect()
}

/// Catalog file format read by [`InMemoryCatalog`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub store_link: Option<String>,
    #[serde(default)]
    pub category_links: BTreeMap<Category, String>,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
}

#[derive(Clone, Debug)]
pub struct InMemoryCatalog {
    document: CatalogDocument,
    max_results: usize,
}

impl InMemoryCatalog {
    pub const DEFAULT_MAX_RESULTS: usize = 3;

    pub fn new(document: CatalogDocument) -> Self {
        Self { document, max_results: Self::DEFAULT_MAX_RESULTS }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<CatalogDocument>(raw).map(Self::new)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::Load { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
            .map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.document.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.products.is_empty()
    }

    /// Synchronous ranking used by the async [`CatalogLookup`] impl.
    pub fn search(&self, descriptor: &QueryDescriptor) -> Vec<ProductRecord> {
        if descriptor.is_unconstrained() {
            return Vec::new();
        }

        let mut ranked = self
            .document
            .products
            .iter()
            .filter(|record| descriptor.admits(record) && descriptor.covers_terms(record))
            .map(|record| (descriptor.score(record), record))
            .filter(|(score, _)| *score > 0)
            .collect::<Vec<_>>();
        ranked.sort_by(|(left_score, left), (right_score, right)| {
            right_score.cmp(left_score).then_with(|| left.id.cmp(&right.id))
        });

        ranked.into_iter().take(self.max_results).map(|(_, record)| record.clone()).collect()
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn find(&self, descriptor: &QueryDescriptor) -> Result<Vec<ProductRecord>, CatalogError> {
        Ok(self.search(descriptor))
    }

    fn store_link(&self) -> Option<&str> {
        self.document.store_link.as_deref().filter(|link| !link.trim().is_empty())
    }

    fn category_link(&self, category: Category) -> Option<&str> {
        self.document.category_links.get(&category).map(String::as_str).filter(|link| !link.trim().is_empty())
    }

    fn product_names(&self) -> Vec<String> {
        mention_names(&self.document.products)
    }
}
