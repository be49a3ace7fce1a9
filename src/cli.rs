//! Command-line interface and run orchestration

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::auth::{self, InstalledFlowAuthorizer, StdinCodePrompt};
use crate::client::ProductionMailboxClient;
use crate::config::{FileConfig, PrunerConfig, CREDENTIALS_ENV};
use crate::error::Result;
use crate::models::RunSummary;
use crate::pruner::MailboxPruner;
use crate::token_store::TokenStore;

#[derive(Parser, Debug)]
#[command(name = "mailbox-pruner")]
#[command(version)]
#[command(about = "Delete every Gmail message from a given sender", long_about = None)]
pub struct Cli {
    /// Sender address whose messages will be deleted
    #[arg(short, long, env = "PRUNER_SENDER")]
    pub sender: Option<String>,

    /// Path to OAuth2 credentials file [default: ./credentials.json]
    #[arg(long, env = CREDENTIALS_ENV)]
    pub credentials: Option<PathBuf>,

    /// Path to token cache file [default: token.json]
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Path to optional configuration file
    #[arg(short, long, default_value = "pruner.toml")]
    pub config: PathBuf,

    /// Messages requested per search page (1-500)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// List matching messages without deleting them
    #[arg(long)]
    pub dry_run: bool,

    /// Discard any cached token and run the authorization flow again
    #[arg(long)]
    pub reauthorize: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run all four phases: credentials, token, client, search-and-delete
pub async fn run(cli: &Cli) -> Result<RunSummary> {
    let file_config = FileConfig::load(&cli.config).await?;
    let config = PrunerConfig::resolve(cli, file_config)?;

    info!("Loading credentials from {:?}", config.credentials_path);
    let secret = auth::load_application_secret(&config.credentials_path).await?;

    let store = TokenStore::new(&config.token_path);
    if config.reauthorize {
        store.remove().await?;
    }

    let prompt = Arc::new(StdinCodePrompt);
    let authorizer = InstalledFlowAuthorizer::new(secret.clone(), &config.scope, prompt.clone());
    let token = auth::acquire_token(&store, &authorizer).await?;
    info!(
        "Using token (refresh token {})",
        if token.refresh_token.is_some() { "present" } else { "absent" }
    );

    let hub = auth::initialize_gmail_hub(secret, store, &config.scope, prompt).await?;
    let client = ProductionMailboxClient::new(hub, &config.user_id, &config.scope);

    MailboxPruner::new(client, config.filter.clone())
        .with_page_size(config.page_size)
        .with_dry_run(config.dry_run)
        .run()
        .await
}
