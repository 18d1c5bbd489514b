//! Builders for fake mailbox contents.

#![allow(dead_code)]

use chrono::{DateTime, Utc};

/// A message held by [`FakeMailSource`](super::FakeMailSource).
#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub uid: u32,
    pub received_at: DateTime<Utc>,
    pub message_id: Option<String>,
    pub sender: String,
    pub subject: String,
    pub body: String,
    /// When set, `fetch_full` fails for this message.
    pub fail_fetch: bool,
    /// When set, `fetch_summaries` leaves this message out.
    pub fail_headers: bool,
}

impl FakeMessage {
    pub fn new(uid: u32, received_at: DateTime<Utc>) -> Self {
        Self {
            uid,
            received_at,
            message_id: Some(format!("<msg-{uid}@example.com>")),
            sender: "Alice <alice@example.com>".to_string(),
            subject: String::new(),
            body: String::new(),
            fail_fetch: false,
            fail_headers: false,
        }
    }

    /// A message that passes both classification passes.
    pub fn meeting(uid: u32, received_at: DateTime<Utc>) -> Self {
        Self::new(uid, received_at)
            .subject("Project meeting")
            .body("Agenda for the meeting is attached.")
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn message_id(mut self, id: &str) -> Self {
        self.message_id = Some(id.to_string());
        self
    }

    pub fn without_message_id(mut self) -> Self {
        self.message_id = None;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn missing_headers(mut self) -> Self {
        self.fail_headers = true;
        self
    }
}
