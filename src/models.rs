use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use google_gmail1::yup_oauth2::storage::TokenInfo;

use crate::error::{PrunerError, Result};

/// OAuth2 token as persisted in the token cache file
///
/// Field names follow the conventional `token.json` layout so files written
/// by other Google client tooling remain readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// True when the access token has a known expiry at or before `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map(|expiry| expiry <= now).unwrap_or(false)
    }

    /// Convert a token handed back by the OAuth library
    pub fn from_token_info(info: TokenInfo) -> Result<Self> {
        let access_token = info.access_token.ok_or_else(|| {
            PrunerError::AuthError("Token response carried no access token".to_string())
        })?;

        let expiry = info.expires_at.and_then(|at| {
            DateTime::<Utc>::from_timestamp(at.unix_timestamp(), at.nanosecond())
        });

        Ok(Self {
            access_token,
            token_type: default_token_type(),
            refresh_token: info.refresh_token,
            expiry,
        })
    }

    /// Convert into the form the OAuth library refreshes from
    pub fn to_token_info(&self) -> TokenInfo {
        let expires_at = self.expiry.and_then(|expiry| {
            time::OffsetDateTime::from_unix_timestamp(expiry.timestamp()).ok()
        });

        TokenInfo {
            access_token: Some(self.access_token.clone()),
            refresh_token: self.refresh_token.clone(),
            expires_at,
            id_token: None,
        }
    }
}

/// Sender predicate compiled into a Gmail search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFilter {
    sender: String,
}

impl MessageFilter {
    pub fn from_sender(sender: &str) -> Result<Self> {
        let sender = sender.trim();
        if sender.is_empty() {
            return Err(PrunerError::ConfigError(
                "Sender address must not be empty".to_string(),
            ));
        }
        if sender.chars().any(char::is_whitespace) {
            return Err(PrunerError::ConfigError(format!(
                "Sender address '{}' must not contain whitespace",
                sender
            )));
        }

        Ok(Self {
            sender: sender.to_string(),
        })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Gmail search expression, e.g. `from:alerts@example.com`
    pub fn query(&self) -> String {
        format!("from:{}", self.sender)
    }
}

impl fmt::Display for MessageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query())
    }
}

/// One search call's worth of parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page_token: Option<String>,
    pub page_size: Option<u32>,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub message_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

impl MessagePage {
    /// Continuation cursor, treating an empty string as absent
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Counters published at the end of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sender: String,
    pub total_messages: usize,
    pub deleted_count: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total messages from {}: {}", self.sender, self.total_messages)?;
        write!(f, "Deleted: {}", self.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_query() {
        let filter = MessageFilter::from_sender("alerts@example.com").unwrap();
        assert_eq!(filter.query(), "from:alerts@example.com");
        assert_eq!(filter.sender(), "alerts@example.com");
        assert_eq!(filter.to_string(), filter.query());
    }

    #[test]
    fn test_filter_trims_and_rejects_bad_input() {
        let filter = MessageFilter::from_sender("  alerts@example.com \n").unwrap();
        assert_eq!(filter.sender(), "alerts@example.com");

        assert!(matches!(
            MessageFilter::from_sender("   "),
            Err(PrunerError::ConfigError(_))
        ));
        assert!(matches!(
            MessageFilter::from_sender("a@example.com OR b@example.com"),
            Err(PrunerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_continuation_treats_empty_as_final() {
        let mut page = MessagePage {
            message_ids: vec!["m1".to_string()],
            next_page_token: Some("next".to_string()),
        };
        assert_eq!(page.continuation(), Some("next"));

        page.next_page_token = Some(String::new());
        assert_eq!(page.continuation(), None);

        page.next_page_token = None;
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn test_token_reads_conventional_layout() {
        let json = r#"{
            "access_token": "ya29.access",
            "token_type": "Bearer",
            "refresh_token": "1//refresh",
            "expiry": "2024-01-01T10:00:00Z"
        }"#;

        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "ya29.access");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(
            token.expiry,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_token_type_defaults_to_bearer() {
        let token: Token = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert!(token.refresh_token.is_none());
        assert!(token.expiry.is_none());
    }

    #[test]
    fn test_is_expired() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut token = Token {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: Some(now - chrono::Duration::minutes(1)),
        };
        assert!(token.is_expired(now));

        token.expiry = Some(now + chrono::Duration::hours(1));
        assert!(!token.is_expired(now));

        token.expiry = None;
        assert!(!token.is_expired(now));
    }

    #[test]
    fn test_token_info_conversion_keeps_refresh_token_and_expiry() {
        let expiry = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let token = Token {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("refresh".to_string()),
            expiry: Some(expiry),
        };

        let info = token.to_token_info();
        assert_eq!(info.access_token.as_deref(), Some("abc"));
        assert_eq!(info.refresh_token.as_deref(), Some("refresh"));

        let back = Token::from_token_info(info).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_token_info_without_access_token_is_rejected() {
        let info = TokenInfo {
            access_token: None,
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
            id_token: None,
        };
        assert!(matches!(
            Token::from_token_info(info),
            Err(PrunerError::AuthError(_))
        ));
    }
}
