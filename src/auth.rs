//! OAuth2 authentication management for Gmail API

use async_trait::async_trait;
use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::{ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod};
use tracing::{debug, info};

use crate::error::{PrunerError, Result};
use crate::models::Token;
use crate::token_store::TokenStore;

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Read and parse the OAuth2 client secret file
///
/// Accepts Google's downloaded JSON with either an `installed` or a `web`
/// section.
pub async fn load_application_secret(path: &Path) -> Result<ApplicationSecret> {
    let content = tokio::fs::read(path).await.map_err(|e| {
        PrunerError::ConfigError(format!(
            "Unable to read client secret file {:?}: {}",
            path, e
        ))
    })?;

    yup_oauth2::parse_application_secret(&content).map_err(|e| {
        PrunerError::ConfigError(format!(
            "Unable to parse client secret file {:?}: {}",
            path, e
        ))
    })
}

/// Collaborator that shows the authorization URL to a human and captures
/// the code they paste back
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn read_code(&self, auth_url: &str) -> Result<String>;
}

/// Prompts on stdout and reads one line from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinCodePrompt;

#[async_trait]
impl CodePrompt for StdinCodePrompt {
    async fn read_code(&self, auth_url: &str) -> Result<String> {
        println!(
            "Go to the following link in your browser then type the authorization code: \n{}",
            auth_url
        );

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| {
                PrunerError::AuthError(format!("Unable to read authorization code: {}", e))
            })?;

        parse_code(&line)
    }
}

/// Trim a pasted authorization code, rejecting blank input
pub fn parse_code(line: &str) -> Result<String> {
    let code = line.trim();
    if code.is_empty() {
        return Err(PrunerError::AuthError(
            "Unable to read authorization code: no input".to_string(),
        ));
    }
    Ok(code.to_string())
}

/// Fixed `state` value carried on the authorization URL
pub const AUTH_STATE: &str = "state-token";

/// Bridges the OAuth library's installed-flow callback to a `CodePrompt`
///
/// The redirect target is the first one registered in the client secret,
/// so the consent page sends the user back to the address Google expects
/// for this client.
struct PromptDelegate {
    prompt: Arc<dyn CodePrompt>,
    redirect_uri: Option<String>,
}

impl PromptDelegate {
    fn new(secret: &ApplicationSecret, prompt: Arc<dyn CodePrompt>) -> Self {
        Self {
            prompt,
            redirect_uri: secret.redirect_uris.first().cloned(),
        }
    }
}

impl InstalledFlowDelegate for PromptDelegate {
    fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        _need_code: bool,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}&state={}", url, AUTH_STATE);
            self.prompt
                .read_code(&url)
                .await
                .map_err(|e| e.to_string())
        })
    }
}

/// Produces a fresh token through an interactive authorization
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> Result<Token>;
}

/// Authorization-code grant with offline access via yup-oauth2
///
/// The code is pasted by the user (interactive return method) so no local
/// redirect listener is needed.
pub struct InstalledFlowAuthorizer {
    secret: ApplicationSecret,
    scope: String,
    prompt: Arc<dyn CodePrompt>,
}

impl InstalledFlowAuthorizer {
    pub fn new(secret: ApplicationSecret, scope: &str, prompt: Arc<dyn CodePrompt>) -> Self {
        Self {
            secret,
            scope: scope.to_string(),
            prompt,
        }
    }
}

#[async_trait]
impl Authorizer for InstalledFlowAuthorizer {
    async fn authorize(&self) -> Result<Token> {
        let captured = CapturedToken::default();

        let auth = InstalledFlowAuthenticator::builder(
            self.secret.clone(),
            InstalledFlowReturnMethod::Interactive,
        )
        .flow_delegate(Box::new(PromptDelegate::new(
            &self.secret,
            Arc::clone(&self.prompt),
        )))
        .with_storage(Box::new(captured.clone()))
        .build()
        .await
        .map_err(|e| PrunerError::AuthError(format!("Failed to build authenticator: {}", e)))?;

        auth.token(&[self.scope.as_str()])
            .await
            .map_err(|e| {
                PrunerError::AuthError(format!("Unable to retrieve token from web: {}", e))
            })?;

        let info = captured.take().ok_or_else(|| {
            PrunerError::AuthError("Authorization finished without issuing a token".to_string())
        })?;
        Token::from_token_info(info)
    }
}

/// In-memory storage that keeps whatever token the exchange produced
#[derive(Clone, Default)]
struct CapturedToken {
    slot: Arc<Mutex<Option<TokenInfo>>>,
}

impl CapturedToken {
    fn take(&self) -> Option<TokenInfo> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[async_trait]
impl TokenStorage for CapturedToken {
    async fn set(
        &self,
        _scopes: &[&str],
        token: TokenInfo,
    ) -> anyhow::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("token slot poisoned"))?;
        *slot = Some(token);
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Return the cached token, or authorize once and persist the result
///
/// The authorizer is never invoked when the store already holds a token.
pub async fn acquire_token<A>(store: &TokenStore, authorizer: &A) -> Result<Token>
where
    A: Authorizer + ?Sized,
{
    if let Some(token) = store.load().await? {
        if token.is_expired(chrono::Utc::now()) {
            debug!("Cached access token has expired; it will be refreshed on first use");
        }
        info!("Using cached token from {:?}", store.path());
        return Ok(token);
    }

    info!("No cached token, starting interactive authorization");
    let token = authorizer.authorize().await?;
    println!("Saving credential file to: {}", store.path().display());
    store.save(&token).await?;
    Ok(token)
}

/// Initialize Gmail API hub backed by the token cache
///
/// Tokens refreshed by the authenticator are written back through the
/// store. If the refresh token has been revoked the interactive prompt runs
/// again.
pub async fn initialize_gmail_hub(
    secret: ApplicationSecret,
    store: TokenStore,
    scope: &str,
    prompt: Arc<dyn CodePrompt>,
) -> Result<GmailHub> {
    let delegate = PromptDelegate::new(&secret, prompt);
    let auth = InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::Interactive)
        .flow_delegate(Box::new(delegate))
        .with_storage(Box::new(store))
        .build()
        .await
        .map_err(|e| PrunerError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Refresh up front so an expired grant fails before any search is made
    auth.token(&[scope])
        .await
        .map_err(|e| PrunerError::AuthError(format!("Failed to obtain token: {}", e)))?;

    // Use HTTP/1 for compatibility with google-gmail1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| PrunerError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}
