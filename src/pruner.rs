//! Search-and-delete loop over paginated results

use tracing::{debug, info};

use crate::client::MailboxClient;
use crate::error::{PrunerError, Result};
use crate::models::{MessageFilter, RunSummary, SearchRequest};

/// Deletes every message matching a sender filter
///
/// Pages are processed strictly in order: all deletions for one page finish
/// before the next page is requested. The first failed search or delete
/// aborts the run; messages already deleted stay deleted.
pub struct MailboxPruner<C> {
    client: C,
    filter: MessageFilter,
    page_size: Option<u32>,
    dry_run: bool,
}

impl<C: MailboxClient> MailboxPruner<C> {
    pub fn new(client: C, filter: MessageFilter) -> Self {
        Self {
            client,
            filter,
            page_size: None,
            dry_run: false,
        }
    }

    /// Ask the provider for at most `page_size` ids per search call
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    /// Count matches without issuing any delete call
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let query = self.filter.query();
        let mut page_token: Option<String> = None;
        let mut page_count = 0usize;
        let mut total_messages = 0usize;
        let mut deleted_count = 0usize;

        info!("Searching for messages matching '{}'", self.filter);

        loop {
            let request = SearchRequest {
                query: query.clone(),
                page_token: page_token.take(),
                page_size: self.page_size,
            };
            let page = self.client.list_messages(&request).await?;
            page_count += 1;
            total_messages += page.message_ids.len();
            debug!(
                "Page {} returned {} messages",
                page_count,
                page.message_ids.len()
            );

            for message_id in &page.message_ids {
                if self.dry_run {
                    println!("Would delete message {}", message_id);
                    continue;
                }

                println!("Deleting message {}", message_id);
                self.client
                    .delete_message(message_id)
                    .await
                    .map_err(|e| PrunerError::delete_failed(message_id.as_str(), e))?;
                deleted_count += 1;
            }

            match page.continuation() {
                Some(next) => page_token = Some(next.to_string()),
                None => break,
            }
        }

        info!(
            "Finished after {} pages: {} found, {} deleted",
            page_count, total_messages, deleted_count
        );

        Ok(RunSummary {
            sender: self.filter.sender().to_string(),
            total_messages,
            deleted_count,
        })
    }
}
