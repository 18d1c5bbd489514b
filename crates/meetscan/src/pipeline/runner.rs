use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::classifier;
use crate::cursor;
use crate::db::{email_repo, Database, DatabaseError, EmailRecord};
use crate::email::{EmailError, MailSource, MessageSummary};
use crate::extractor::DateTimeExtractor;

use super::error::PipelineError;
use super::outcome::{CycleReport, MessageOutcome, SkipReason};

/// Reason recorded for a listed message whose headers never arrived.
pub const MISSING_HEADERS: &str = "headers not returned by the mail source";

/// Per-message failure, recorded as [`SkipReason::Failed`].
#[derive(Debug, thiserror::Error)]
enum MessageError {
    #[error("store: {0}")]
    Store(#[from] DatabaseError),
    #[error("fetch: {0}")]
    Fetch(#[from] EmailError),
}

/// Runs ingestion cycles against a [`MailSource`].
///
/// Stateless between cycles: the cursor is derived from the store each
/// time, so cycles can be triggered at any cadence.
pub struct IngestPipeline {
    db: Database,
    extractor: DateTimeExtractor,
    lookback: Duration,
}

impl IngestPipeline {
    pub fn new(db: Database, extractor: DateTimeExtractor, lookback: Duration) -> Self {
        Self {
            db,
            extractor,
            lookback,
        }
    }

    /// Runs one cycle with the configured lookback, relative to now.
    pub async fn run_cycle<S>(&self, source: &mut S) -> Result<CycleReport, PipelineError>
    where
        S: MailSource + ?Sized,
    {
        self.run_cycle_with(source, Utc::now(), self.lookback).await
    }

    /// Runs one cycle with an explicit clock and lookback.
    ///
    /// `lookback` only matters when the store is empty. Date expressions are
    /// resolved relative to `now` in the local zone.
    pub async fn run_cycle_with<S>(
        &self,
        source: &mut S,
        now: DateTime<Utc>,
        lookback: Duration,
    ) -> Result<CycleReport, PipelineError>
    where
        S: MailSource + ?Sized,
    {
        let span = info_span!("ingest_cycle", lookback_hours = lookback.num_hours());
        async move {
            let floor = cursor::compute_floor(&self.db, now, lookback)?;
            info!(%floor, "Starting ingestion cycle");

            source.connect().await.map_err(PipelineError::Connection)?;

            let reference = now.with_timezone(&Local).naive_local();
            let result = self.process_since(source, floor, reference).await;

            if let Err(e) = source.disconnect().await {
                warn!(error = %e, "Disconnect from mail source failed");
            }

            let (listed, outcomes) = result.map_err(PipelineError::Source)?;
            let report = CycleReport {
                floor,
                listed,
                outcomes,
            };

            let summary = report.summary();
            info!(
                listed = summary.listed,
                persisted = summary.persisted,
                already_ingested = summary.already_ingested,
                subject_not_meeting = summary.subject_not_meeting,
                body_not_meeting = summary.body_not_meeting,
                failed = summary.failed,
                "Ingestion cycle complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn process_since<S>(
        &self,
        source: &mut S,
        floor: DateTime<Utc>,
        reference: NaiveDateTime,
    ) -> Result<(usize, Vec<MessageOutcome>), EmailError>
    where
        S: MailSource + ?Sized,
    {
        let refs = source.list_since(floor).await?;
        if refs.is_empty() {
            info!("No messages since {}", floor);
            return Ok((0, Vec::new()));
        }
        debug!(count = refs.len(), "Listed messages");

        let mut summaries: HashMap<u32, MessageSummary> = source
            .fetch_summaries(&refs)
            .await?
            .into_iter()
            .map(|s| (s.uid, s))
            .collect();

        let mut outcomes = Vec::with_capacity(refs.len());
        for message in &refs {
            let outcome = match summaries.remove(&message.uid) {
                Some(summary) => {
                    let span = info_span!("message", uid = message.uid);
                    self.process_message(source, &summary, reference)
                        .instrument(span)
                        .await
                }
                None => {
                    warn!(uid = message.uid, "Mail source returned no headers; skipping message");
                    MessageOutcome::Skipped(SkipReason::Failed(MISSING_HEADERS.to_string()))
                }
            };
            outcomes.push(outcome);
        }
        Ok((refs.len(), outcomes))
    }

    async fn process_message<S>(
        &self,
        source: &mut S,
        summary: &MessageSummary,
        reference: NaiveDateTime,
    ) -> MessageOutcome
    where
        S: MailSource + ?Sized,
    {
        let unique_id = summary.unique_id();
        match self
            .try_process_message(source, summary, &unique_id, reference)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(unique_id = %unique_id, error = %e, "Skipping message");
                MessageOutcome::Skipped(SkipReason::Failed(e.to_string()))
            }
        }
    }

    async fn try_process_message<S>(
        &self,
        source: &mut S,
        summary: &MessageSummary,
        unique_id: &str,
        reference: NaiveDateTime,
    ) -> Result<MessageOutcome, MessageError>
    where
        S: MailSource + ?Sized,
    {
        if email_repo::exists(&self.db, unique_id)? {
            debug!(unique_id, "Already ingested");
            return Ok(MessageOutcome::Skipped(SkipReason::AlreadyIngested));
        }

        if !classifier::subject_looks_like_meeting(&summary.subject) {
            debug!(subject = %summary.subject, "Subject does not look like a meeting");
            return Ok(MessageOutcome::Skipped(SkipReason::SubjectNotMeeting));
        }

        let full = source.fetch_full(&summary.message_ref()).await?;

        let subject = prefer_nonempty(&summary.subject, full.subject);
        if !classifier::message_looks_like_meeting(&subject, &full.body) {
            debug!(subject = %subject, "Message does not look like a meeting");
            return Ok(MessageOutcome::Skipped(SkipReason::BodyNotMeeting));
        }

        let meeting_time = self.extractor.extract_at(&full.body, reference);

        let record = EmailRecord {
            unique_id: unique_id.to_string(),
            sender: prefer_nonempty(&summary.sender, full.sender),
            subject,
            body: full.body,
            received_at: summary.received_at,
            is_meeting_candidate: true,
            meeting_time,
        };
        email_repo::upsert(&self.db, &record)?;

        info!(
            unique_id,
            subject = %record.subject,
            meeting_time = ?record.meeting_time,
            "Saved meeting email"
        );
        Ok(MessageOutcome::Persisted(record))
    }
}

fn prefer_nonempty(header: &str, fallback: String) -> String {
    if header.is_empty() {
        fallback
    } else {
        header.to_string()
    }
}
