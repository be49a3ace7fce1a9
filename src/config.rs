use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::{PrunerError, Result};
use crate::models::MessageFilter;

/// Full mailbox access; permanent deletion is not available under narrower scopes
pub const MAIL_SCOPE: &str = "https://mail.google.com/";

/// Environment variable naming the OAuth2 client secret file
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

pub const DEFAULT_CREDENTIALS_PATH: &str = "./credentials.json";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Upper bound Gmail accepts for `maxResults` on messages.list
pub const MAX_PAGE_SIZE: u32 = 500;

/// Optional TOML file supplying defaults for command-line flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub token_path: Option<PathBuf>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            sender: None,
            credentials_path: None,
            token_path: None,
            user_id: default_user_id(),
            page_size: None,
        }
    }
}

fn default_user_id() -> String {
    "me".to_string()
}

impl FileConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PrunerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PrunerError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(PrunerError::ConfigError(
                "user_id must not be empty".to_string(),
            ));
        }
        if let Some(page_size) = self.page_size {
            validate_page_size(page_size)?;
        }
        Ok(())
    }
}

fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(PrunerError::ConfigError(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(())
}

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct PrunerConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub filter: MessageFilter,
    pub scope: String,
    pub user_id: String,
    pub page_size: Option<u32>,
    pub dry_run: bool,
    pub reauthorize: bool,
}

impl PrunerConfig {
    /// Merge command-line flags over the config file over built-in defaults
    ///
    /// `--credentials` already folds in `GOOGLE_APPLICATION_CREDENTIALS`
    /// through clap, so the environment outranks the config file.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let sender = cli.sender.clone().or(file.sender).ok_or_else(|| {
            PrunerError::ConfigError(
                "No sender given; pass --sender, set PRUNER_SENDER or add `sender` to the config file"
                    .to_string(),
            )
        })?;
        let filter = MessageFilter::from_sender(&sender)?;

        let credentials_path = cli
            .credentials
            .clone()
            .or(file.credentials_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));

        let token_path = cli
            .token_cache
            .clone()
            .or(file.token_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH));

        let page_size = cli.page_size.or(file.page_size);
        if let Some(page_size) = page_size {
            validate_page_size(page_size)?;
        }

        Ok(Self {
            credentials_path,
            token_path,
            filter,
            scope: MAIL_SCOPE.to_string(),
            user_id: file.user_id,
            page_size,
            dry_run: cli.dry_run,
            reauthorize: cli.reauthorize,
        })
    }
}
