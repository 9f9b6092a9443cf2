use anyhow::anyhow;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_empty_collection;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;

#[derive(Subcommand)]
pub enum ItemCommands {
    #[command(about = "List the items owned by a user")]
    List {
        #[arg(long, help = "Username of the owner")]
        user: String,
    },
}

pub async fn handle(cmd: ItemCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ItemCommands::List { user } => {
            let repo = DatabaseManager::open(&config.storage).await?;
            let owner = repo
                .find_user_by_username(&user)
                .await?
                .ok_or_else(|| anyhow!("user '{}' not found", user))?;
            let items = repo.list_items(owner.id).await?;

            if items.is_empty() {
                return output_empty_collection(&output_format, "items", &format!("No items for {}", user));
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "items": items }))?);
                }
                OutputFormat::Text => {
                    println!("{:<16} {:<28} {:>8} {:>10} {}", "SKU", "NAME", "QTY", "PRICE", "LOCATION");
                    println!("{}", "-".repeat(80));
                    for item in &items {
                        println!(
                            "{:<16} {:<28} {:>8} {:>10.2} {}",
                            item.sku, item.name, item.qty, item.purchase_price, item.location
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
