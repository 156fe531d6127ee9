use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::DEFAULT_GREETINGS;
use crate::domain::language::Language;
use crate::language::{DEFAULT_SWITCH_TO_ARABIC, DEFAULT_SWITCH_TO_ENGLISH};
use crate::rules::ContactDirectory;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub language: LanguageConfig,
    pub contact: ContactConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub timeout_ms: u64,
    pub max_results: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageConfig {
    pub fallback: Language,
    pub switch_to_arabic: Vec<String>,
    pub switch_to_english: Vec<String>,
    pub greeting_phrases: Vec<String>,
    pub recent_intent_window: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactConfig {
    pub whatsapp: String,
    pub email: String,
}

impl ContactConfig {
    pub fn directory(&self) -> ContactDirectory {
        ContactDirectory { whatsapp: self.whatsapp.clone(), email: self.email.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub catalog_timeout_ms: Option<u64>,
    pub language_fallback: Option<Language>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

fn phrases(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|phrase| phrase.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                path: PathBuf::from("data/catalog.json"),
                timeout_ms: 1_500,
                max_results: 3,
            },
            language: LanguageConfig {
                fallback: Language::Arabic,
                switch_to_arabic: phrases(DEFAULT_SWITCH_TO_ARABIC),
                switch_to_english: phrases(DEFAULT_SWITCH_TO_ENGLISH),
                greeting_phrases: phrases(DEFAULT_GREETINGS),
                recent_intent_window: 5,
            },
            contact: ContactConfig {
                whatsapp: "https://wa.me/966593440030".to_string(),
                email: "care@smart.sa".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("smorti.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
            if let Some(timeout_ms) = catalog.timeout_ms {
                self.catalog.timeout_ms = timeout_ms;
            }
            if let Some(max_results) = catalog.max_results {
                self.catalog.max_results = max_results;
            }
        }

        if let Some(language) = patch.language {
            if let Some(fallback) = language.fallback {
                self.language.fallback = fallback;
            }
            if let Some(switch_to_arabic) = language.switch_to_arabic {
                self.language.switch_to_arabic = switch_to_arabic;
            }
            if let Some(switch_to_english) = language.switch_to_english {
                self.language.switch_to_english = switch_to_english;
            }
            if let Some(greeting_phrases) = language.greeting_phrases {
                self.language.greeting_phrases = greeting_phrases;
            }
            if let Some(recent_intent_window) = language.recent_intent_window {
                self.language.recent_intent_window = recent_intent_window;
            }
        }

        if let Some(contact) = patch.contact {
            if let Some(whatsapp) = contact.whatsapp {
                self.contact.whatsapp = whatsapp;
            }
            if let Some(email) = contact.email {
                self.contact.email = email;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SMORTI_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("SMORTI_CATALOG_TIMEOUT_MS") {
            self.catalog.timeout_ms = parse_u64("SMORTI_CATALOG_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("SMORTI_CATALOG_MAX_RESULTS") {
            self.catalog.max_results = parse_usize("SMORTI_CATALOG_MAX_RESULTS", &value)?;
        }

        if let Some(value) = read_env("SMORTI_LANGUAGE_FALLBACK") {
            self.language.fallback = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "SMORTI_LANGUAGE_FALLBACK".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = read_env("SMORTI_CONTACT_WHATSAPP") {
            self.contact.whatsapp = value;
        }
        if let Some(value) = read_env("SMORTI_CONTACT_EMAIL") {
            self.contact.email = value;
        }

        let log_level = read_env("SMORTI_LOGGING_LEVEL").or_else(|| read_env("SMORTI_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SMORTI_LOGGING_FORMAT").or_else(|| read_env("SMORTI_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(timeout_ms) = overrides.catalog_timeout_ms {
            self.catalog.timeout_ms = timeout_ms;
        }
        if let Some(fallback) = overrides.language_fallback {
            self.language.fallback = fallback;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_language(&self.language)?;
        validate_contact(&self.contact)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("smorti.toml"), PathBuf::from("config/smorti.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
    }

    if catalog.timeout_ms == 0 || catalog.timeout_ms > 30_000 {
        return Err(ConfigError::Validation(
            "catalog.timeout_ms must be in range 1..=30000".to_string(),
        ));
    }

    if catalog.max_results == 0 || catalog.max_results > 20 {
        return Err(ConfigError::Validation(
            "catalog.max_results must be in range 1..=20".to_string(),
        ));
    }

    Ok(())
}

fn validate_language(language: &LanguageConfig) -> Result<(), ConfigError> {
    let blank = |phrases: &[String]| phrases.iter().all(|phrase| phrase.trim().is_empty());

    if blank(&language.switch_to_arabic) {
        return Err(ConfigError::Validation(
            "language.switch_to_arabic needs at least one trigger phrase".to_string(),
        ));
    }
    if blank(&language.switch_to_english) {
        return Err(ConfigError::Validation(
            "language.switch_to_english needs at least one trigger phrase".to_string(),
        ));
    }
    if blank(&language.greeting_phrases) {
        return Err(ConfigError::Validation(
            "language.greeting_phrases needs at least one canonical greeting".to_string(),
        ));
    }

    let overlap = language.switch_to_arabic.iter().find(|phrase| {
        let phrase = crate::text::normalize(phrase);
        !phrase.is_empty()
            && language.switch_to_english.iter().any(|other| crate::text::normalize(other) == phrase)
    });
    if let Some(phrase) = overlap {
        return Err(ConfigError::Validation(format!(
            "switch phrase `{phrase}` is configured for both languages"
        )));
    }

    if language.recent_intent_window == 0 || language.recent_intent_window > 50 {
        return Err(ConfigError::Validation(
            "language.recent_intent_window must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_contact(contact: &ContactConfig) -> Result<(), ConfigError> {
    if !contact.whatsapp.trim().starts_with("https://") {
        return Err(ConfigError::Validation(
            "contact.whatsapp must be an https:// link (e.g. https://wa.me/9665XXXXXXXX)".to_string(),
        ));
    }

    let email = contact.email.trim();
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid_email {
        return Err(ConfigError::Validation(
            "contact.email must be an address like care@example.sa".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    language: Option<LanguagePatch>,
    contact: Option<ContactPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    timeout_ms: Option<u64>,
    max_results: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LanguagePatch {
    fallback: Option<Language>,
    switch_to_arabic: Option<Vec<String>>,
    switch_to_english: Option<Vec<String>>,
    greeting_phrases: Option<Vec<String>>,
    recent_intent_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ContactPatch {
    whatsapp: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::language::Language;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn missing_file() -> Option<PathBuf> {
        Some(PathBuf::from("/nonexistent/smorti-test.toml"))
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| err.to_string())?;
        ensure(config.catalog.timeout_ms == 1_500, "default timeout should be 1500ms")?;
        ensure(config.language.fallback == Language::Arabic, "default fallback should be arabic")?;
        ensure(config.language.recent_intent_window == 5, "default intent window should be 5")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SMORTI_WHATSAPP", "https://wa.me/966511111111");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("smorti.toml");
            fs::write(
                &path,
                r#"
[contact]
whatsapp = "${TEST_SMORTI_WHATSAPP}"
email = "sales@example.sa"

[language]
switch_to_english = ["english mode"]
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.contact.whatsapp == "https://wa.me/966511111111",
                "whatsapp link should be interpolated from environment",
            )?;
            ensure(config.contact.email == "sales@example.sa", "email should come from file")?;
            ensure(
                config.language.switch_to_english == vec!["english mode".to_string()],
                "switch phrases should be replaced by the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_SMORTI_WHATSAPP"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_SMORTI_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("smorti.toml");
        fs::write(&path, "[contact]\nemail = \"${TEST_SMORTI_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error = match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Ok(_) => return Err("expected interpolation failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_SMORTI_UNSET"),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMORTI_LOG_LEVEL", "warn");
        env::set_var("SMORTI_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions {
                config_path: missing_file(),
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SMORTI_LOG_LEVEL", "SMORTI_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMORTI_CATALOG_PATH", "from-env.json");
        env::set_var("SMORTI_CATALOG_TIMEOUT_MS", "900");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("smorti.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "from-file.json"
timeout_ms = 500
max_results = 5

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_path: Some(PathBuf::from("from-override.json")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == PathBuf::from("from-override.json"),
                "override catalog path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.catalog.timeout_ms == 900, "env timeout should win over file")?;
            ensure(config.catalog.max_results == 5, "file max_results should win over defaults")?;
            Ok(())
        })();

        clear_vars(&["SMORTI_CATALOG_PATH", "SMORTI_CATALOG_TIMEOUT_MS"]);
        result
    }

    #[test]
    fn invalid_env_number_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMORTI_CATALOG_TIMEOUT_MS", "soon");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions {
                config_path: missing_file(),
                ..LoadOptions::default()
            }) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "SMORTI_CATALOG_TIMEOUT_MS"),
                "error should name the env key",
            )
        })();

        clear_vars(&["SMORTI_CATALOG_TIMEOUT_MS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMORTI_CONTACT_WHATSAPP", "wa.me/966500000000");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions {
                config_path: missing_file(),
                ..LoadOptions::default()
            }) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("contact.whatsapp")
            );
            ensure(has_message, "validation failure should mention contact.whatsapp")
        })();

        clear_vars(&["SMORTI_CONTACT_WHATSAPP"]);
        result
    }

    #[test]
    fn switch_phrase_shared_by_both_languages_is_rejected() {
        let mut config = AppConfig::default();
        config.language.switch_to_arabic.push("Switch".to_string());
        config.language.switch_to_english.push("switch".to_string());

        let error = config.validate().expect_err("overlap must fail");
        assert!(matches!(error, ConfigError::Validation(ref message) if message.contains("both languages")));
    }

    #[test]
    fn required_file_must_exist() {
        let error = AppConfig::load(LoadOptions {
            config_path: missing_file(),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("missing file");
        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }
}
