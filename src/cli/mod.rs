pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::identity::UserManager;

#[derive(Parser)]
#[command(name = "architex")]
#[command(about = "ArchiteX CLI - database and account administration for the ArchiteX API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create default roles, the administrator account and demo data")]
    Seed,

    #[command(about = "User account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// Database and identity services built from the environment's configuration
pub struct CliContext {
    pub config: AppConfig,
    pub db: DatabaseManager,
    pub users: UserManager,
}

impl CliContext {
    pub async fn connect() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let db = DatabaseManager::connect(&config.database).await?;
        let tokens = TokenService::new(&config.token_secret()?);
        let users = UserManager::new(db.pool().clone(), tokens, &config.security);
        Ok(Self { config, db, users })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = CliContext::connect().await?;
    tracing::debug!("CLI connected to {}", ctx.config.database.url);

    let result = match cli.command {
        Commands::Migrate => commands::database::migrate(&ctx, output_format).await,
        Commands::Seed => commands::database::seed(&ctx, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &ctx, output_format).await,
    };

    ctx.db.close().await;
    result
}
