use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conversation languages the assistant answers in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported language `{0}` (expected ar|en)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ar" | "arabic" => Ok(Self::Arabic),
            "en" | "english" => Ok(Self::English),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn parses_tags_and_names() {
        assert_eq!("ar".parse::<Language>(), Ok(Language::Arabic));
        assert_eq!(" English ".parse::<Language>(), Ok(Language::English));
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn unknown_language_names_the_rejected_tag() {
        let error = "fr".parse::<Language>().expect_err("unsupported");
        assert_eq!(error.to_string(), "unsupported language `fr` (expected ar|en)");
    }

    #[test]
    fn serializes_as_short_tag() {
        let encoded = serde_json::to_string(&Language::Arabic).expect("serialize");
        assert_eq!(encoded, "\"ar\"");
    }
}
