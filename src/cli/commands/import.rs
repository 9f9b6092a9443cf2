use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StorageBackend};
use crate::database::json_store::JsonStore;
use crate::database::manager::DatabaseManager;
use crate::database::sql_store::SqlStore;
use crate::services::import_json;

#[derive(Args)]
pub struct ImportArgs {
    #[arg(long, help = "Directory holding users.json and items.json")]
    pub data_dir: PathBuf,

    #[arg(long, help = "Username that receives items without an owner")]
    pub owner: Option<String>,
}

pub async fn handle(args: ImportArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.storage.backend != StorageBackend::Sqlite {
        bail!("import writes to the SQL database; set STORAGE_BACKEND=sqlite");
    }

    let source = JsonStore::open(&args.data_dir)
        .await
        .with_context(|| format!("failed to read {}", args.data_dir.display()))?;
    let pool = DatabaseManager::connect(&config.storage.database_url, config.storage.max_connections).await?;
    let target = SqlStore::new(pool).await?;

    let report = import_json(&source, &target, args.owner.as_deref()).await?;

    if let OutputFormat::Text = output_format {
        for name in &report.users_skipped {
            println!("  skipped user {} (already exists)", name);
        }
        for label in &report.items_skipped {
            println!("  skipped item {} (SKU already exists)", label);
        }
        if report.orphans_skipped > 0 {
            println!("  skipped {} items without an owner (use --owner)", report.orphans_skipped);
        }
    }

    let message = format!(
        "Imported {} users and {} items ({} unowned items assigned)",
        report.users_imported,
        report.items_imported,
        report.orphans_assigned
    );
    output_success(&output_format, &message, Some(serde_json::to_value(&report)?))
}
