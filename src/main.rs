//! fieldscan command-line driver
//!
//! Usage:
//!     fieldscan --settings ./settings.json view https://host/public/product/ABC123
//!     fieldscan unresolved

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;

use fieldscan::reconcile::unresolved;
use fieldscan::scan::{ScanOperation, ScanOutcome};
use fieldscan::settings::Settings;
use fieldscan::{init_logging, FieldClient};

#[derive(Parser, Debug)]
#[command(name = "fieldscan", about = "Field inspection data layer")]
struct Args {
    /// Settings file (JSON); environment variables override it
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a scan payload and show the asset
    View { payload: String },
    /// Resolve a scan payload for a new intervention
    Inspect { payload: String },
    /// Check that a scan payload is free for a new asset
    CheckNew { payload: String },
    /// List interventions whose owning asset could not be determined
    Unresolved,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();
    let settings = Settings::load(args.settings.as_deref())?;
    let client = FieldClient::from_settings(settings)?;

    let output = match args.command {
        Command::View { payload } => scan(&client, ScanOperation::View, &payload).await?,
        Command::Inspect { payload } => {
            scan(&client, ScanOperation::AddIntervention, &payload).await?
        }
        Command::CheckNew { payload } => scan(&client, ScanOperation::Create, &payload).await?,
        Command::Unresolved => {
            let snapshot = client.reconciler.interventions(false).await?;
            json!({
                "stale": snapshot.stale,
                "ambiguous": snapshot.reconciled.ambiguous,
                "records": unresolved(&snapshot.reconciled.records),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    client.dispose().await;
    Ok(())
}

async fn scan(
    client: &FieldClient,
    operation: ScanOperation,
    payload: &str,
) -> Result<serde_json::Value> {
    client.scan.select_operation(operation).await?;
    let outcome: ScanOutcome = client.scan.scan(payload).await?;
    Ok(serde_json::to_value(outcome)?)
}
