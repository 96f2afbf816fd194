use anyhow::Result;
use clap::{Parser, Subcommand};
use rulewatch_common::logging::init_logging_with_exclusions;
use rulewatch_common::util::parse_duration_secs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use rulewatch_cli::{commands, daemon};

/// `rulewatch` - watch regulatory documents for new and changed rules.
#[derive(Parser, Debug)]
#[command(name = "rulewatch")]
#[command(version)]
#[command(about = "Detect new and changed regulatory documents and route them to owners.", long_about = None)]
struct Cli {
    /// Config file (default: ~/.rulewatch/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one detection cycle over the current inbox files
    Run,

    /// Run detection cycles on a fixed interval until Ctrl+C
    Daemon {
        /// Cycle interval (30s, 5m, 1h, 1d)
        #[arg(long, default_value = "1h")]
        interval: String,
    },

    /// Show the stored snapshot for a document identity
    Show {
        /// Document identity (e.g. a Federal Register document number)
        identity: String,
    },

    /// Validate the configuration and print what it resolves to
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = commands::exit_code(&e);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    let mut stdout = std::io::stdout();
    match cli.command {
        Commands::Run => {
            let report = tokio::task::spawn_blocking(move || commands::run_cycle(&config)).await??;
            println!("{}", commands::format_summary(&report));
            Ok(())
        }
        Commands::Daemon { interval } => {
            let secs = parse_duration_secs(&interval)?;
            if secs == 0 {
                anyhow::bail!("Interval must be greater than zero");
            }
            daemon::run(config, Duration::from_secs(secs)).await
        }
        Commands::Show { identity } => commands::show(&config, &identity, &mut stdout),
        Commands::CheckConfig => commands::check_config(&config, &mut stdout),
    }
}
