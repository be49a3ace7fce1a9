//! Common test utilities and fixtures

#![allow(dead_code)]

use mailbox_pruner::auth::Authorizer;
use mailbox_pruner::client::MailboxClient;
use mailbox_pruner::error::{PrunerError, Result};
use mailbox_pruner::models::{MessagePage, SearchRequest, Token};
use mockall::mock;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a page of ids `<prefix>-0 .. <prefix>-<count>`
pub fn create_test_page(prefix: &str, count: usize, next_page_token: Option<&str>) -> MessagePage {
    MessagePage {
        message_ids: (0..count).map(|i| format!("{}-{}", prefix, i)).collect(),
        next_page_token: next_page_token.map(|s| s.to_string()),
    }
}

/// Token as a first authorization would return it
pub fn create_test_token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expiry: None,
    }
}

pub fn server_error() -> PrunerError {
    PrunerError::ServerError {
        status: 500,
        message: "HTTP 500: Internal Server Error".to_string(),
    }
}

/// Hands out canned pages in order, then empty final pages
pub struct PageScript {
    pages: Mutex<VecDeque<MessagePage>>,
}

impl PageScript {
    pub fn new(pages: Vec<MessagePage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
        }
    }

    pub fn next(&self) -> MessagePage {
        self.pages.lock().unwrap().pop_front().unwrap_or_default()
    }
}

// Mock implementation of MailboxClient for testing
mock! {
    pub MailboxClient {}

    #[async_trait::async_trait]
    impl MailboxClient for MailboxClient {
        async fn list_messages(&self, request: &SearchRequest) -> Result<MessagePage>;
        async fn delete_message(&self, message_id: &str) -> Result<()>;
    }
}

mock! {
    pub Authorizer {}

    #[async_trait::async_trait]
    impl Authorizer for Authorizer {
        async fn authorize(&self) -> Result<Token>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_page() {
        let page = create_test_page("p1", 3, Some("next"));
        assert_eq!(page.message_ids, vec!["p1-0", "p1-1", "p1-2"]);
        assert_eq!(page.continuation(), Some("next"));
    }

    #[test]
    fn test_page_script_runs_dry() {
        let script = PageScript::new(vec![create_test_page("a", 1, None)]);
        assert_eq!(script.next().message_ids.len(), 1);
        assert!(script.next().message_ids.is_empty());
    }
}
