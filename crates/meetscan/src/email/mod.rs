//! Mail source connector.
//!
//! [`MailSource`] is the seam the ingestion pipeline reads through;
//! [`ImapClient`] implements it over IMAP with TLS, opening the configured
//! folder read-only.

pub mod client;
pub mod error;
pub mod parser;
pub mod source;

pub use client::ImapClient;
pub use error::EmailError;
pub use parser::{parse_headers, parse_message, strip_html, HeaderFields, ParsedMessage};
pub use source::{fallback_unique_id, FullMessage, MailSource, MessageRef, MessageSummary};
