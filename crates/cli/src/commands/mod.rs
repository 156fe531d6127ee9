pub mod ask;
pub mod chat;
pub mod config;
pub mod doctor;

use std::sync::Arc;

use serde::Serialize;
use smorti_agent::{PolicyEngine, ResponseRenderer};
use smorti_core::config::{AppConfig, LoadOptions};
use smorti_core::{InMemoryCatalog, Response};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CATALOG: u8 = 3;
pub const EXIT_RUNTIME: u8 = 4;
pub const EXIT_INPUT: u8 = 5;

/// Everything a conversational command needs, built from one config load.
pub struct Assistant {
    pub config: AppConfig,
    pub engine: PolicyEngine<InMemoryCatalog>,
    pub renderer: ResponseRenderer,
}

impl Assistant {
    /// Loads config and catalog and installs logging. Failures come back as
    /// ready-to-print command results.
    pub fn prepare(command: &str, options: LoadOptions) -> Result<Self, CommandResult> {
        let config = AppConfig::load(options).map_err(|error| {
            CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
        })?;
        crate::init_logging(&config);

        let catalog = InMemoryCatalog::from_path(&config.catalog.path)
            .map_err(|error| {
                CommandResult::failure(command, "catalog_load", error.to_string(), EXIT_CATALOG)
            })?
            .with_max_results(config.catalog.max_results);
        tracing::info!(
            event_name = "system.catalog.loaded",
            path = %config.catalog.path.display(),
            products = catalog.len(),
            "catalog loaded"
        );

        let renderer = ResponseRenderer::new().map_err(|error| {
            CommandResult::failure(command, "template", error.to_string(), EXIT_RUNTIME)
        })?;
        let engine = PolicyEngine::from_config(&config, Arc::new(catalog));

        Ok(Self { config, engine, renderer })
    }

    /// Rendered shopper-facing text, or the structured response as one JSON
    /// document.
    pub fn format(&self, response: &Response, json: bool) -> anyhow::Result<String> {
        if json {
            return Ok(serde_json::to_string(response)?);
        }
        self.renderer.render(response)
    }
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}
