//! The mail source seam used by the ingestion pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::error::Result;

/// A message known to be in the folder, before any header is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub uid: u32,
    /// INTERNALDATE as reported by the server.
    pub received_at: DateTime<Utc>,
}

/// Header-level view of a message: enough to dedup and pre-filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub uid: u32,
    pub received_at: DateTime<Utc>,
    pub message_id: Option<String>,
    pub sender: String,
    pub subject: String,
}

impl MessageSummary {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            uid: self.uid,
            received_at: self.received_at,
        }
    }

    /// Natural key for the store: the Message-ID header, or
    /// `{uid}_{hash}` when the header is missing or blank.
    pub fn unique_id(&self) -> String {
        match self.message_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => fallback_unique_id(self.uid, &self.subject),
        }
    }
}

/// Builds the id used for messages without a Message-ID.
///
/// Stable across fetches and processes: the first 16 hex characters of the
/// SHA-256 of the subject, prefixed by the UID.
pub fn fallback_unique_id(uid: u32, subject: &str) -> String {
    let digest = Sha256::digest(subject.as_bytes());
    let hash = hex::encode(digest);
    format!("{}_{}", uid, &hash[..16])
}

/// A fully downloaded message, reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullMessage {
    pub uid: u32,
    pub sender: String,
    pub subject: String,
    pub body: String,
}

/// A remote mailbox the pipeline can read from.
///
/// Implementations must not mark messages as read.
#[async_trait]
pub trait MailSource: Send {
    /// Opens the session. Failure is fatal for the caller's cycle.
    async fn connect(&mut self) -> Result<()>;

    /// Lists messages whose server-assigned timestamp is at or after `floor`.
    async fn list_since(&mut self, floor: DateTime<Utc>) -> Result<Vec<MessageRef>>;

    /// Fetches headers for all given messages in one round trip.
    ///
    /// Messages the server returns no usable response for are left out of
    /// the result rather than failing the batch.
    async fn fetch_summaries(&mut self, refs: &[MessageRef]) -> Result<Vec<MessageSummary>>;

    async fn fetch_full(&mut self, message: &MessageRef) -> Result<FullMessage>;

    async fn disconnect(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(message_id: Option<&str>, subject: &str) -> MessageSummary {
        MessageSummary {
            uid: 42,
            received_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            message_id: message_id.map(str::to_string),
            sender: "Alice <alice@example.com>".to_string(),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_unique_id_prefers_message_id() {
        let s = summary(Some("<abc@example.com>"), "Team meeting");
        assert_eq!(s.unique_id(), "<abc@example.com>");
    }

    #[test]
    fn test_unique_id_falls_back_when_blank() {
        let s = summary(Some("   "), "Team meeting");
        assert_eq!(s.unique_id(), fallback_unique_id(42, "Team meeting"));

        let s = summary(None, "Team meeting");
        assert!(s.unique_id().starts_with("42_"));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let a = fallback_unique_id(7, "Quarterly planning");
        let b = fallback_unique_id(7, "Quarterly planning");
        assert_eq!(a, b);
        assert_eq!(a.len(), "7_".len() + 16);
        assert_ne!(a, fallback_unique_id(7, "Quarterly planning v2"));
        assert_ne!(a, fallback_unique_id(8, "Quarterly planning"));
    }

    #[test]
    fn test_fallback_known_value() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(fallback_unique_id(1, ""), "1_e3b0c44298fc1c14");
    }
}
