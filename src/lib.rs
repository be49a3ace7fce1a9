//! Mailbox Pruner
//!
//! Deletes every Gmail message from one sender.
//!
//! # Overview
//!
//! A run moves through four phases, strictly in order:
//! - **Credentials**: read the OAuth2 client secret file
//! - **Token**: reuse the cached token, or authorize interactively once and cache it
//! - **Client**: build an authenticated Gmail hub
//! - **Prune**: page through `from:<sender>` results, deleting each message
//!
//! # Example Usage
//!
//! ```no_run
//! use mailbox_pruner::{auth, MailboxPruner, MessageFilter, ProductionMailboxClient, TokenStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let secret = auth::load_application_secret("credentials.json".as_ref()).await?;
//!     let store = TokenStore::new("token.json");
//!     let prompt = Arc::new(auth::StdinCodePrompt);
//!
//!     let authorizer = auth::InstalledFlowAuthorizer::new(
//!         secret.clone(),
//!         mailbox_pruner::config::MAIL_SCOPE,
//!         prompt.clone(),
//!     );
//!     auth::acquire_token(&store, &authorizer).await?;
//!
//!     let hub = auth::initialize_gmail_hub(secret, store, mailbox_pruner::config::MAIL_SCOPE, prompt).await?;
//!     let client = ProductionMailboxClient::new(hub, "me", mailbox_pruner::config::MAIL_SCOPE);
//!
//!     let summary = MailboxPruner::new(client, MessageFilter::from_sender("alerts@example.com")?)
//!         .run()
//!         .await?;
//!     println!("Deleted: {}", summary.deleted_count);
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - Credential loading, interactive authorization and hub setup
//! - [`cli`] - Command-line interface and run orchestration
//! - [`client`] - Gmail search and delete calls
//! - [`config`] - Configuration resolution
//! - [`error`] - Error types and result aliases
//! - [`models`] - Core data structures
//! - [`pruner`] - The search-and-delete loop
//! - [`token_store`] - Token cache file

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pruner;
pub mod token_store;

// Re-export commonly used types for convenience
pub use error::{PrunerError, Result};

pub use models::{MessageFilter, MessagePage, RunSummary, SearchRequest, Token};

pub use auth::{Authorizer, CodePrompt};
pub use client::{MailboxClient, ProductionMailboxClient};
pub use config::PrunerConfig;
pub use pruner::MailboxPruner;
pub use token_store::TokenStore;

pub use cli::Cli;
