pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "inventory")]
#[command(about = "Inventory Tracker CLI - inspect and migrate inventory storage")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Registered users")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Items per user")]
    Items {
        #[command(subcommand)]
        cmd: commands::items::ItemCommands,
    },

    #[command(about = "Copy a JSON data directory into the SQL database")]
    Import(commands::import::ImportArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Users { cmd } => commands::users::handle(cmd, config, output_format).await,
        Commands::Items { cmd } => commands::items::handle(cmd, config, output_format).await,
        Commands::Import(args) => commands::import::handle(args, config, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_arguments() {
        let cli = Cli::try_parse_from(["inventory", "--json", "import", "--data-dir", "/tmp/data", "--owner", "alice"])
            .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.data_dir.to_str(), Some("/tmp/data"));
                assert_eq!(args.owner.as_deref(), Some("alice"));
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn items_list_requires_user() {
        assert!(Cli::try_parse_from(["inventory", "items", "list"]).is_err());
        assert!(Cli::try_parse_from(["inventory", "items", "list", "--user", "bob"]).is_ok());
    }
}
