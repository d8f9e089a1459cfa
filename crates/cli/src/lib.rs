pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gestibank_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use commands::demands::DemandsCommand;
use commands::quotes::QuotesCommand;
use commands::users::UsersCommand;
use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "gestibank",
    about = "GestiBank procurement workflow CLI",
    long_about = "Drive demands and quotes through the GestiBank approval workflow against the procurement backend.",
    after_help = "Examples:\n  gestibank login --email resp@bank.ma\n  gestibank demands list\n  gestibank demands reject 7 --reason \"Budget insuffisant\"\n  gestibank quotes attach 12 --file bon-12.pdf\n  gestibank doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to gestibank.toml or config/gestibank.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Backend base URL, overriding config and environment")]
    base_url: Option<String>,
    #[arg(long, global = true, help = "Log level written to stderr (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, session token readiness, and backend connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Exchange email/password for a session token")]
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    #[command(subcommand, about = "Create, review and resubmit demands")]
    Demands(DemandsCommand),
    #[command(subcommand, about = "Price, review and close quotes")]
    Quotes(QuotesCommand),
    #[command(subcommand, about = "Manage user accounts (admin)")]
    Users(UsersCommand),
    #[command(about = "Dashboard counters for the session's role")]
    Stats {
        #[arg(long, help = "Compute from visible entities instead of asking the backend")]
        local: bool,
    },
    #[command(about = "Pending work for the session's role, newest first")]
    Inbox,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                base_url: self.base_url.clone(),
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

/// Installs the subscriber on stderr so stdout carries only command payloads.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Config errors are reported by the command itself.
    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run(options) },
        Command::Doctor { json } => {
            CommandResult { exit_code: 0, output: commands::doctor::run(json, options) }
        }
        Command::Login { email } => {
            let mut options = options;
            options.overrides.email = email;
            commands::login::run(options)
        }
        Command::Demands(command) => commands::demands::run(command, options),
        Command::Quotes(command) => commands::quotes::run(command, options),
        Command::Users(command) => commands::users::run(command, options),
        Command::Stats { local } => commands::stats::run(local, options),
        Command::Inbox => commands::inbox::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
