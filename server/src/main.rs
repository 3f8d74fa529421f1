mod server_config;
mod simulate;
mod verify;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gridlock_common::games::blockgrid::ShapeCatalog;
use gridlock_common::{log, logger};
use server_config::{VerifierConfigManager, get_config_manager, resolve_log_prefix};
use simulate::SimulationOptions;

#[derive(Parser)]
#[command(name = "gridlock_server")]
struct Args {
    /// Path to the verifier config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    use_log_prefix: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify a single replay file
    Verify { file: PathBuf },
    /// Verify every replay file in a directory
    VerifyBatch { dir: PathBuf },
    /// Play bot games and verify each one by replay
    Simulate {
        #[arg(long, default_value_t = 1)]
        games: u32,
        #[arg(long, allow_hyphen_values = true)]
        seed: Option<i32>,
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Print the effective config as YAML
    PrintConfig,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode report: {}", e))
}

async fn run(command: Command, config_manager: &VerifierConfigManager) -> Result<ExitCode, String> {
    let config = config_manager.get_config()?;
    let limits = config.limits();
    let catalog = Arc::new(ShapeCatalog::standard());

    match command {
        Command::Verify { file } => {
            let report = verify::verify_file(catalog, &file, &limits);
            println!("{}", to_json(&report)?);
            Ok(if report.accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::VerifyBatch { dir } => {
            let reports = verify::verify_batch(catalog, &dir, limits).await?;
            let rejected = reports.iter().filter(|r| !r.accepted).count();
            log!("{} of {} replays rejected", rejected, reports.len());
            println!("{}", to_json(&reports)?);
            Ok(if rejected == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Simulate {
            games,
            seed,
            save_dir,
        } => {
            let options = SimulationOptions {
                games,
                seed,
                max_moves: config.bot_max_moves,
                save_dir,
            };
            let summary = tokio::task::spawn_blocking(move || {
                simulate::simulate(catalog, &options, &limits)
            })
            .await
            .map_err(|e| format!("Simulation task failed: {}", e))??;
            println!("{}", to_json(&summary)?);
            Ok(if summary.all_verified {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::PrintConfig => {
            print!("{}", config_manager.serialize(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config_manager = get_config_manager(args.config.as_deref());
    let prefix = match config_manager.get_config() {
        Ok(config) => resolve_log_prefix(args.use_log_prefix, &config),
        Err(_) => resolve_log_prefix(args.use_log_prefix, &Default::default()),
    };
    logger::init_logger(prefix);

    match run(args.command, &config_manager).await {
        Ok(code) => code,
        Err(e) => {
            log!("Error: {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
