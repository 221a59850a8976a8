// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a resilient turn pipeline for chat assistants.
//!
//! This is the binary entry point.

mod config_cmd;
mod inspect;
mod turn;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use parley_config::ParleyConfig;

/// Parley - a resilient turn pipeline for chat assistants.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one conversational turn against the completion API.
    Turn(turn::TurnArgs),
    /// Show how a message would be classified and routed.
    Classify {
        /// Message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List the built-in tools and their parameter schemas.
    Tools,
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and report errors.
    Check,
    /// Print the effective configuration as TOML, with secrets redacted.
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.agent.log_level);

    match cli.command {
        Some(Commands::Turn(args)) => match turn::run_turn(&config, args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("parley: {}", turn::describe_error(&e));
                ExitCode::FAILURE
            }
        },
        Some(Commands::Classify { text }) => {
            print!("{}", inspect::classify_report(&config, &text.join(" ")));
            ExitCode::SUCCESS
        }
        Some(Commands::Tools) => {
            print!("{}", inspect::tools_report(&config));
            ExitCode::SUCCESS
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Check => {
                println!("parley: configuration is valid (agent.name={})", config.agent.name);
                ExitCode::SUCCESS
            }
            ConfigAction::Show => match config_cmd::render_redacted(&config) {
                Ok(rendered) => {
                    print!("{rendered}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("parley: failed to render configuration: {e}");
                    ExitCode::FAILURE
                }
            },
        },
        None => {
            println!("parley: use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<ParleyConfig, Vec<parley_config::ConfigError>> {
    match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
