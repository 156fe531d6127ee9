use std::sync::Arc;

use serde::Serialize;
use smorti_agent::{PolicyEngine, ResponseRenderer};
use smorti_core::config::{AppConfig, LoadOptions};
use smorti_core::{CatalogLookup, ConversationId, InMemoryCatalog};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_templates());
            match load_catalog(&config) {
                Ok(catalog) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Pass,
                        details: format!(
                            "loaded {} product(s) from `{}`",
                            catalog.len(),
                            config.catalog.path.display()
                        ),
                    });
                    checks.push(check_catalog_links(&catalog));
                    checks.push(check_policy_turn(&config, catalog));
                }
                Err(check) => {
                    checks.push(check);
                    checks.push(DoctorCheck::skipped("catalog_links", "the catalog did not load"));
                    checks.push(DoctorCheck::skipped("policy_turn", "the catalog did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["response_templates", "catalog_load", "catalog_links", "policy_turn"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_templates() -> DoctorCheck {
    match ResponseRenderer::new() {
        Ok(_) => DoctorCheck {
            name: "response_templates",
            status: CheckStatus::Pass,
            details: "response template compiled".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "response_templates",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn load_catalog(config: &AppConfig) -> Result<InMemoryCatalog, DoctorCheck> {
    let catalog = InMemoryCatalog::from_path(&config.catalog.path).map_err(|error| DoctorCheck {
        name: "catalog_load",
        status: CheckStatus::Fail,
        details: error.to_string(),
    })?;
    if catalog.is_empty() {
        return Err(DoctorCheck {
            name: "catalog_load",
            status: CheckStatus::Fail,
            details: format!("`{}` lists no products", config.catalog.path.display()),
        });
    }
    Ok(catalog.with_max_results(config.catalog.max_results))
}

fn check_catalog_links(catalog: &InMemoryCatalog) -> DoctorCheck {
    match catalog.store_link() {
        Some(link) if link.starts_with("https://") => DoctorCheck {
            name: "catalog_links",
            status: CheckStatus::Pass,
            details: format!(
                "store link `{link}` and {} category link(s)",
                catalog.document().category_links.len()
            ),
        },
        Some(link) => DoctorCheck {
            name: "catalog_links",
            status: CheckStatus::Fail,
            details: format!("store link `{link}` is not https"),
        },
        None => DoctorCheck {
            name: "catalog_links",
            status: CheckStatus::Fail,
            details: "catalog has no store link to redirect unmatched requests to".to_string(),
        },
    }
}

/// Runs one greeting and one product question through the full pipeline.
fn check_policy_turn(config: &AppConfig, catalog: InMemoryCatalog) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "policy_turn",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let engine = PolicyEngine::from_config(config, Arc::new(catalog));
    let result = runtime.block_on(async {
        let mut state = engine.new_conversation(ConversationId::generate());
        engine.handle_turn(&mut state, "السلام عليكم").await?;
        engine.handle_turn(&mut state, "ابي شاشة").await
    });

    match result {
        Ok(response) => DoctorCheck {
            name: "policy_turn",
            status: CheckStatus::Pass,
            details: format!(
                "turn emitted with {} grounded fact(s) and {} notice(s)",
                response.facts().count(),
                response.notices.len()
            ),
        },
        Err(error) => {
            DoctorCheck { name: "policy_turn", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
