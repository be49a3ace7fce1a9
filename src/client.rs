//! Gmail API client used by the pruning loop

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::auth::GmailHub;
use crate::error::Result;
use crate::models::{MessagePage, SearchRequest};

/// Mailbox operations the pruning loop depends on
#[async_trait]
pub trait MailboxClient: Send + Sync {
    /// Fetch one page of message ids matching a search query
    async fn list_messages(&self, request: &SearchRequest) -> Result<MessagePage>;

    /// Permanently delete a message (bypasses Trash)
    async fn delete_message(&self, message_id: &str) -> Result<()>;
}

/// Gmail-backed client
///
/// Every call is awaited to completion before the next one starts; there is
/// no rate limiting or retry.
pub struct ProductionMailboxClient {
    hub: GmailHub,
    user_id: String,
    scope: String,
}

impl ProductionMailboxClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `hub` - Gmail API hub instance
    /// * `user_id` - Mailbox owner, usually `me`
    /// * `scope` - OAuth2 scope attached to each call
    pub fn new(hub: GmailHub, user_id: &str, scope: &str) -> Self {
        Self {
            hub,
            user_id: user_id.to_string(),
            scope: scope.to_string(),
        }
    }
}

#[async_trait]
impl MailboxClient for ProductionMailboxClient {
    async fn list_messages(&self, request: &SearchRequest) -> Result<MessagePage> {
        let mut call = self
            .hub
            .users()
            .messages_list(&self.user_id)
            .q(&request.query);

        if let Some(token) = request.page_token.as_deref() {
            call = call.page_token(token);
        }
        if let Some(page_size) = request.page_size {
            call = call.max_results(page_size);
        }

        debug!(
            "Listing messages for '{}' (page token: {:?})",
            request.query, request.page_token
        );
        let (_, response) = call.add_scope(self.scope.as_str()).doit().await?;

        let message_ids = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .collect();

        Ok(MessagePage {
            message_ids,
            next_page_token: response.next_page_token,
        })
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        debug!("Deleting message {} via API", message_id);
        self.hub
            .users()
            .messages_delete(&self.user_id, message_id)
            .add_scope(self.scope.as_str())
            .doit()
            .await?;

        Ok(())
    }
}

// Allow shared ownership of any client, including test doubles
#[async_trait]
impl<T: MailboxClient + ?Sized> MailboxClient for Arc<T> {
    async fn list_messages(&self, request: &SearchRequest) -> Result<MessagePage> {
        self.as_ref().list_messages(request).await
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.as_ref().delete_message(message_id).await
    }
}
