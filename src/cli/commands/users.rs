use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_empty_collection;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;
use crate::database::models::UserProfile;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List all registered users")]
    List,
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let repo = DatabaseManager::open(&config.storage).await?;
            let users = repo.list_users().await?;

            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users registered");
            }

            match output_format {
                OutputFormat::Json => {
                    let users: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<8} {:<24} {}", "ID", "USERNAME", "EMAIL");
                    println!("{}", "-".repeat(60));
                    for user in &users {
                        println!("{:<8} {:<24} {}", user.id, user.username, user.email);
                    }
                }
            }
            Ok(())
        }
    }
}
