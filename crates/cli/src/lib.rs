pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use smorti_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use smorti_core::ConversationId;

#[derive(Debug, Parser)]
#[command(
    name = "smorti",
    about = "Smorti shopping assistant CLI",
    long_about = "Answer shopper questions from the product catalog and the store's fixed policies, inspect configuration, and check readiness.",
    after_help = "Examples:\n  smorti ask \"ابي شاشة للألعاب\"\n  smorti chat --json\n  smorti config\n  smorti doctor --json"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Config file to load instead of smorti.toml")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Catalog JSON file, overriding catalog.path")]
    pub catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Catalog lookup timeout in milliseconds")]
    pub timeout_ms: Option<u64>,
    #[arg(long, global = true, help = "Log level (trace|debug|info|warn|error)")]
    pub log_level: Option<String>,
    #[arg(long, global = true, value_parser = parse_log_format, help = "Log format (compact|pretty|json)")]
    pub log_format: Option<LogFormat>,
}

impl GlobalArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                catalog_path: self.catalog.clone(),
                catalog_timeout_ms: self.timeout_ms,
                language_fallback: None,
                log_level: self.log_level.clone(),
                log_format: self.log_format,
            },
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse::<LogFormat>().map_err(|error| error.to_string())
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer a single shopper message and print the response")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Shopper message")]
        text: Vec<String>,
        #[arg(long, help = "Conversation id to report on the response (generated when absent)")]
        conversation: Option<String>,
        #[arg(long, help = "Emit the structured response as JSON")]
        json: bool,
    },
    #[command(about = "Interactive conversation over stdin (/reset starts over, /quit exits)")]
    Chat {
        #[arg(long, help = "Emit one JSON response per line")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog loading, and a full policy turn")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();

    let result = match cli.command {
        Command::Ask { text, conversation, json } => {
            let conversation = conversation.map(ConversationId);
            commands::ask::run(options, conversation, &text.join(" "), json)
        }
        Command::Chat { json } => commands::chat::run(options, json),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(options, json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber once. Output goes to stderr so stdout
/// carries only responses. Later calls are no-ops.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
