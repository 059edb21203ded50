use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use rs_mysql::config::{Config, DEFAULT_CONFIG_FILE};
use rs_mysql::db::{ConnectionInfo, MySqlLoader, mysql};
use rs_mysql::{DumpImportPipeline, ImportOutcome, ProvisionError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Provision a MySQL server: dump import and master reset")]
struct Cli {
    /// TOML configuration file; `RS_MYSQL_*` env vars override it.
    #[arg(short, long, env = "RS_MYSQL_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the dump repository and import the dump unless already imported.
    DumpImport,
    /// Run `RESET MASTER` to drop binary logs written during installation.
    ResetMaster,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        config_file = %cli.config.display(),
        repository = %cfg.import.repository,
        revision = %cfg.import.revision,
        mysql_host = %cfg.mysql.host,
        loglevel = %cfg.basic.loglevel
    );

    let result = match cli.command {
        Command::DumpImport => dump_import(&cfg).await,
        Command::ResetMaster => reset_master(&cfg).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, retryable = e.is_retryable(), "provisioning failed");
            ExitCode::FAILURE
        }
    }
}

async fn dump_import(cfg: &Config) -> Result<(), ProvisionError> {
    let pipeline = DumpImportPipeline::new(cfg, MySqlLoader::new(&cfg.tools))?;
    match pipeline.run().await? {
        ImportOutcome::Imported { database } => info!(%database, "dump imported"),
        ImportOutcome::Skipped { completed_at } => {
            info!(%completed_at, "dump import skipped")
        }
    }
    Ok(())
}

async fn reset_master(cfg: &Config) -> Result<(), ProvisionError> {
    cfg.validate_mysql()?;
    mysql::reset_master(&ConnectionInfo::from(&cfg.mysql)).await
}
