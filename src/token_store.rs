//! File-backed OAuth2 token cache

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use google_gmail1::yup_oauth2::storage::{TokenInfo, TokenStorage};

use crate::error::{PrunerError, Result};
use crate::models::Token;

/// Token cache kept as a single JSON file
///
/// The file holds one token for the one scope this tool requests, so scope
/// lists passed in by the OAuth library are not used as keys.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token
    ///
    /// Returns `Ok(None)` when no file exists. A file that exists but cannot
    /// be read or decoded is reported as `TokenCorrupt` rather than silently
    /// forcing a new authorization.
    pub async fn load(&self) -> Result<Option<Token>> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cached token at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(self.corrupt(e)),
        };

        let token: Token = serde_json::from_slice(&content).map_err(|e| self.corrupt(e))?;
        debug!("Loaded cached token from {:?}", self.path);
        Ok(Some(token))
    }

    /// Write the token, replacing any previous contents
    pub async fn save(&self, token: &Token) -> Result<()> {
        debug!("Writing token cache {:?}", self.path);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_vec_pretty(token)?;
        write_private(&self.path, &content).await?;
        Ok(())
    }

    /// Delete the cached token if there is one
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed cached token at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn corrupt(&self, reason: impl std::fmt::Display) -> PrunerError {
        PrunerError::TokenCorrupt {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Create or truncate `path` and write `content` with mode 0600
#[cfg(unix)]
async fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.flush().await?;

    // mode() only applies on creation; tighten an existing file too
    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows relies on the profile directory ACLs
#[cfg(windows)]
async fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, content).await
}

#[async_trait]
impl TokenStorage for TokenStore {
    async fn set(
        &self,
        _scopes: &[&str],
        token: TokenInfo,
    ) -> anyhow::Result<()> {
        let token = Token::from_token_info(token)?;
        self.save(&token).await?;
        debug!("Persisted refreshed token to {:?}", self.path);
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        match self.load().await {
            Ok(token) => token.map(|t| t.to_token_info()),
            Err(e) => {
                warn!("Ignoring unusable token cache: {}", e);
                None
            }
        }
    }
}
