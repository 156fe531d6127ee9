use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use smorti_core::config::{AppConfig, LoadOptions};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

/// Where a value may come from besides the file and the built-in default.
struct FieldOrigin<'a> {
    key_path: &'a str,
    env_keys: &'a [&'a str],
    cli_flag: Option<&'a str>,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;
    let source = |origin: FieldOrigin<'_>, overridden: bool| {
        field_source(origin, overridden, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines =
        vec!["effective config (source precedence: cli > env > file > default):".to_string()];

    lines.push(render_line(
        "catalog.path",
        &config.catalog.path.display().to_string(),
        source(
            FieldOrigin {
                key_path: "catalog.path",
                env_keys: &["SMORTI_CATALOG_PATH"],
                cli_flag: Some("--catalog"),
            },
            overrides.catalog_path.is_some(),
        ),
    ));
    lines.push(render_line(
        "catalog.timeout_ms",
        &config.catalog.timeout_ms.to_string(),
        source(
            FieldOrigin {
                key_path: "catalog.timeout_ms",
                env_keys: &["SMORTI_CATALOG_TIMEOUT_MS"],
                cli_flag: Some("--timeout-ms"),
            },
            overrides.catalog_timeout_ms.is_some(),
        ),
    ));
    lines.push(render_line(
        "catalog.max_results",
        &config.catalog.max_results.to_string(),
        source(
            FieldOrigin {
                key_path: "catalog.max_results",
                env_keys: &["SMORTI_CATALOG_MAX_RESULTS"],
                cli_flag: None,
            },
            false,
        ),
    ));

    lines.push(render_line(
        "language.fallback",
        config.language.fallback.as_str(),
        source(
            FieldOrigin {
                key_path: "language.fallback",
                env_keys: &["SMORTI_LANGUAGE_FALLBACK"],
                cli_flag: None,
            },
            overrides.language_fallback.is_some(),
        ),
    ));
    for (key_path, phrases) in [
        ("language.switch_to_arabic", &config.language.switch_to_arabic),
        ("language.switch_to_english", &config.language.switch_to_english),
        ("language.greeting_phrases", &config.language.greeting_phrases),
    ] {
        lines.push(render_line(
            key_path,
            &format!("{} phrase(s)", phrases.len()),
            source(FieldOrigin { key_path, env_keys: &[], cli_flag: None }, false),
        ));
    }
    lines.push(render_line(
        "language.recent_intent_window",
        &config.language.recent_intent_window.to_string(),
        source(
            FieldOrigin {
                key_path: "language.recent_intent_window",
                env_keys: &[],
                cli_flag: None,
            },
            false,
        ),
    ));

    lines.push(render_line(
        "contact.whatsapp",
        &config.contact.whatsapp,
        source(
            FieldOrigin {
                key_path: "contact.whatsapp",
                env_keys: &["SMORTI_CONTACT_WHATSAPP"],
                cli_flag: None,
            },
            false,
        ),
    ));
    lines.push(render_line(
        "contact.email",
        &config.contact.email,
        source(
            FieldOrigin {
                key_path: "contact.email",
                env_keys: &["SMORTI_CONTACT_EMAIL"],
                cli_flag: None,
            },
            false,
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source(
            FieldOrigin {
                key_path: "logging.level",
                env_keys: &["SMORTI_LOGGING_LEVEL", "SMORTI_LOG_LEVEL"],
                cli_flag: Some("--log-level"),
            },
            overrides.log_level.is_some(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        config.logging.format.as_str(),
        source(
            FieldOrigin {
                key_path: "logging.format",
                env_keys: &["SMORTI_LOGGING_FORMAT", "SMORTI_LOG_FORMAT"],
                cli_flag: Some("--log-format"),
            },
            overrides.log_format.is_some(),
        ),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("smorti.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/smorti.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    origin: FieldOrigin<'_>,
    overridden: bool,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if overridden {
        if let Some(flag) = origin.cli_flag {
            return format!("cli ({flag})");
        }
        return "cli".to_string();
    }

    if let Some(env_key) = origin.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, origin.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn nested_key_paths_resolve_through_tables() {
        let doc = "[catalog]\npath = \"data/catalog.json\"\n".parse::<toml::Value>().expect("toml");
        assert!(contains_path(&doc, "catalog.path"));
        assert!(!contains_path(&doc, "catalog.timeout_ms"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
