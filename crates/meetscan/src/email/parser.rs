//! Message parsing: header fields and plain-text body extraction.

use std::sync::LazyLock;

use log::debug;
use mail_parser::{Message, MessageParser, PartType};
use regex::Regex;

use super::error::{EmailError, Result};

static RE_SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Header fields the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub message_id: Option<String>,
    /// First From address, "Name <addr>" when a display name is present.
    pub sender: String,
    pub subject: String,
}

/// A parsed message with its body reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub headers: HeaderFields,
    pub body: String,
}

/// Parses a raw header block (or a full message) into [`HeaderFields`].
pub fn parse_headers(raw: &[u8]) -> Result<HeaderFields> {
    let message = MessageParser::default()
        .parse_headers(raw)
        .ok_or_else(|| EmailError::ParseError("Failed to parse message headers".to_string()))?;

    Ok(header_fields(&message))
}

/// Parses a full RFC 5322 message.
///
/// The body is the plain-text part when one exists; otherwise the HTML part
/// with markup stripped. A message with neither has an empty body.
pub fn parse_message(raw: &[u8]) -> Result<ParsedMessage> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| EmailError::ParseError("Failed to parse email message".to_string()))?;

    let headers = header_fields(&message);
    let body = plain_text_body(&message);

    debug!(
        "Parsed message subject={:?} body_len={}",
        headers.subject,
        body.len()
    );

    Ok(ParsedMessage { headers, body })
}

fn header_fields(message: &Message) -> HeaderFields {
    HeaderFields {
        message_id: message
            .message_id()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        sender: message
            .from()
            .and_then(|addr| addr.first().map(format_address))
            .unwrap_or_default(),
        subject: message.subject().unwrap_or_default().to_string(),
    }
}

fn plain_text_body(message: &Message) -> String {
    let text: Vec<&str> = message
        .text_bodies()
        .filter_map(|part| match &part.body {
            PartType::Text(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect();
    let text = text.join("\n");
    if !text.trim().is_empty() {
        return text;
    }

    let html: Vec<&str> = message
        .html_bodies()
        .filter_map(|part| match &part.body {
            PartType::Html(html) => Some(html.as_ref()),
            _ => None,
        })
        .collect();
    if html.is_empty() {
        return text;
    }

    strip_html(&html.join(" "))
}

/// Reduces HTML to whitespace-separated text.
///
/// Script and style contents are dropped, every tag becomes a space and the
/// common named entities are decoded.
pub fn strip_html(html: &str) -> String {
    let without_scripts = RE_SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = RE_TAG.replace_all(&without_scripts, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    RE_WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Formats an email address for display.
/// If the address has a display name, formats as "Name <email@example.com>".
/// Otherwise, returns just the email address.
fn format_address(addr: &mail_parser::Addr) -> String {
    if let Some(name) = addr.name() {
        format!("{} <{}>", name, addr.address().unwrap_or_default())
    } else {
        addr.address().unwrap_or_default().to_string()
    }
}
