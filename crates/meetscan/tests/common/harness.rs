//! Fake mail source and pipeline harness.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use meetscan::db::{email_repo, Database, StoredEmail};
use meetscan::email::{
    EmailError, FullMessage, MailSource, MessageRef, MessageSummary,
};
use meetscan::extractor::{DateTimeExtractor, DateTimeRecognizer, RecognizedExpression};
use meetscan::pipeline::{CycleReport, IngestPipeline, PipelineError};

use super::builders::FakeMessage;

/// Fixed clock for all integration tests: Wednesday 2026-10-21 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap()
}

/// In-memory mailbox recording every call made by the pipeline.
#[derive(Debug, Default)]
pub struct FakeMailSource {
    pub messages: Vec<FakeMessage>,
    pub fail_connect: bool,
    pub fail_list: bool,
    pub connect_calls: usize,
    pub list_calls: usize,
    pub summary_calls: usize,
    pub disconnect_calls: usize,
    /// UIDs passed to `fetch_full`, in call order.
    pub full_fetches: Vec<u32>,
    connected: bool,
}

impl FakeMailSource {
    pub fn new(messages: Vec<FakeMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    fn find(&self, uid: u32) -> Option<&FakeMessage> {
        self.messages.iter().find(|m| m.uid == uid)
    }
}

#[async_trait]
impl MailSource for FakeMailSource {
    async fn connect(&mut self) -> Result<(), EmailError> {
        self.connect_calls += 1;
        if self.fail_connect {
            return Err(EmailError::AuthenticationFailed("invalid credentials".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn list_since(&mut self, floor: DateTime<Utc>) -> Result<Vec<MessageRef>, EmailError> {
        self.list_calls += 1;
        if !self.connected {
            return Err(EmailError::NotConnected);
        }
        if self.fail_list {
            return Err(EmailError::Timeout("search".to_string()));
        }
        let mut refs: Vec<MessageRef> = self
            .messages
            .iter()
            .filter(|m| m.received_at >= floor)
            .map(|m| MessageRef {
                uid: m.uid,
                received_at: m.received_at,
            })
            .collect();
        refs.sort_by_key(|r| (r.received_at, r.uid));
        Ok(refs)
    }

    async fn fetch_summaries(
        &mut self,
        refs: &[MessageRef],
    ) -> Result<Vec<MessageSummary>, EmailError> {
        self.summary_calls += 1;
        Ok(refs
            .iter()
            .filter_map(|r| self.find(r.uid))
            .filter(|m| !m.fail_headers)
            .map(|m| MessageSummary {
                uid: m.uid,
                received_at: m.received_at,
                message_id: m.message_id.clone(),
                sender: m.sender.clone(),
                subject: m.subject.clone(),
            })
            .collect())
    }

    async fn fetch_full(&mut self, message: &MessageRef) -> Result<FullMessage, EmailError> {
        self.full_fetches.push(message.uid);
        let m = self
            .find(message.uid)
            .ok_or(EmailError::MessageNotFound(message.uid))?;
        if m.fail_fetch {
            return Err(EmailError::ProtocolError("connection reset".to_string()));
        }
        Ok(FullMessage {
            uid: m.uid,
            sender: m.sender.clone(),
            subject: m.subject.clone(),
            body: m.body.clone(),
        })
    }

    async fn disconnect(&mut self) -> Result<(), EmailError> {
        self.disconnect_calls += 1;
        self.connected = false;
        Ok(())
    }
}

/// Recognizer returning the same single expression for any non-empty text.
pub struct FixedRecognizer(pub Vec<&'static str>);

impl DateTimeRecognizer for FixedRecognizer {
    fn recognize(&self, text: &str, _reference: NaiveDateTime) -> Vec<RecognizedExpression> {
        if text.is_empty() || self.0.is_empty() {
            return Vec::new();
        }
        vec![RecognizedExpression {
            text: "fixed".to_string(),
            start: 0,
            values: self.0.iter().map(|v| v.to_string()).collect(),
        }]
    }
}

/// An in-memory store plus a pipeline over it.
pub struct TestHarness {
    pub db: Database,
    pub pipeline: IngestPipeline,
}

impl TestHarness {
    /// Harness using the default English recognizer.
    pub fn new() -> Self {
        Self::with_extractor(DateTimeExtractor::default())
    }

    pub fn with_recognizer(recognizer: impl DateTimeRecognizer + 'static) -> Self {
        Self::with_extractor(DateTimeExtractor::new(Box::new(recognizer)))
    }

    fn with_extractor(extractor: DateTimeExtractor) -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let pipeline = IngestPipeline::new(db.clone(), extractor, Duration::hours(24));
        Self { db, pipeline }
    }

    /// Runs one cycle at the fixed test clock with the default lookback.
    pub async fn run(&self, source: &mut FakeMailSource) -> Result<CycleReport, PipelineError> {
        self.pipeline
            .run_cycle_with(source, now(), Duration::hours(24))
            .await
    }

    pub fn stored(&self) -> Vec<StoredEmail> {
        email_repo::list_all(&self.db).expect("Failed to list stored emails")
    }
}
