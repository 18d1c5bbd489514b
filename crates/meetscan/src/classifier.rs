//! Keyword classifier deciding whether a message is about a meeting.
//!
//! Two vocabularies: a wider one for the subject pre-filter (decides whether
//! the body is downloaded at all) and the core one applied to the downloaded
//! message, subject and body together.

const MEETING_KEYWORDS: &[&str] = &["meeting", "schedule", "appointment"];

const SUBJECT_KEYWORDS: &[&str] = &["meeting", "schedule", "appointment", "invite", "calendar"];

/// Case-insensitive substring match against the core vocabulary.
pub fn looks_like_meeting(text: &str) -> bool {
    contains_any(text, MEETING_KEYWORDS)
}

/// Subject pre-filter; accepts everything [`looks_like_meeting`] accepts.
pub fn subject_looks_like_meeting(subject: &str) -> bool {
    contains_any(subject, SUBJECT_KEYWORDS)
}

/// Full pass over a downloaded message: the core vocabulary in either the
/// subject or the body.
pub fn message_looks_like_meeting(subject: &str, body: &str) -> bool {
    looks_like_meeting(subject) || looks_like_meeting(body)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}
