mod report;
mod scan;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scan::ScanArgs;

#[derive(Debug, Parser)]
#[command(name = "flipscan")]
#[command(about = "Find retail products that resell at a profit on the marketplace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price scanned products against marketplace listings and rank the results
    Scan(ScanArgs),
    /// List stored opportunities, best ROI first
    Report {
        /// Only show opportunities with at least this ROI (percent)
        #[arg(long)]
        min_roi: Option<f64>,
        /// Maximum number of rows to show
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check the database connection
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = flipscan_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan(args) => scan::run_scan(&config, &args).await,
        Commands::Report { min_roi, limit } => {
            let pool = flipscan_db::connect_pool_from_config(&config).await?;
            report::run_report(&pool, min_roi, limit).await
        }
        Commands::Db { command } => {
            let pool = flipscan_db::connect_pool_from_config(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = flipscan_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Ping => {
                    flipscan_db::health_check(&pool).await?;
                    println!("database reachable");
                }
            }
            Ok(())
        }
    }
}

/// Attempt to mark a scan run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = flipscan_db::fail_scan_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark scan run as failed"
        );
    }
}

#[cfg(test)]
mod tests;
