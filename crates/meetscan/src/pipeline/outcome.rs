use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::EmailRecord;

/// Why a listed message was not persisted in this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The store already has a record with this unique id.
    AlreadyIngested,
    /// The subject pre-filter rejected it; the body was never downloaded.
    SubjectNotMeeting,
    /// Downloaded, but neither subject nor body uses the core vocabulary.
    BodyNotMeeting,
    /// Fetching, parsing or storing failed; the batch continued.
    Failed(String),
}

/// Terminal state of one message within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    Skipped(SkipReason),
    Persisted(EmailRecord),
}

/// Result of one ingestion cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Lower bound the mailbox was listed from.
    pub floor: DateTime<Utc>,
    /// Messages returned by the listing, before any filtering.
    pub listed: usize,
    pub outcomes: Vec<MessageOutcome>,
}

impl CycleReport {
    pub fn persisted(&self) -> impl Iterator<Item = &EmailRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            MessageOutcome::Persisted(record) => Some(record),
            MessageOutcome::Skipped(_) => None,
        })
    }

    pub fn skipped(&self, reason: &SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, MessageOutcome::Skipped(r) if r == reason))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, MessageOutcome::Skipped(SkipReason::Failed(_))))
            .count()
    }

    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            floor: self.floor,
            listed: self.listed,
            persisted: self.persisted().count(),
            already_ingested: self.skipped(&SkipReason::AlreadyIngested),
            subject_not_meeting: self.skipped(&SkipReason::SubjectNotMeeting),
            body_not_meeting: self.skipped(&SkipReason::BodyNotMeeting),
            failed: self.failed(),
        }
    }
}

/// Counts per outcome, as returned by the trigger endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub floor: DateTime<Utc>,
    pub listed: usize,
    pub persisted: usize,
    pub already_ingested: usize,
    pub subject_not_meeting: usize,
    pub body_not_meeting: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_counts() {
        let floor = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let record = EmailRecord {
            unique_id: "<m@x>".to_string(),
            sender: String::new(),
            subject: "Meeting".to_string(),
            body: "meeting".to_string(),
            received_at: floor,
            is_meeting_candidate: true,
            meeting_time: None,
        };
        let report = CycleReport {
            floor,
            listed: 5,
            outcomes: vec![
                MessageOutcome::Persisted(record),
                MessageOutcome::Skipped(SkipReason::AlreadyIngested),
                MessageOutcome::Skipped(SkipReason::SubjectNotMeeting),
                MessageOutcome::Skipped(SkipReason::Failed("boom".to_string())),
                MessageOutcome::Skipped(SkipReason::Failed("again".to_string())),
            ],
        };

        let summary = report.summary();
        assert_eq!(summary.listed, 5);
        assert_eq!(summary.persisted, 1);
        assert_eq!(summary.already_ingested, 1);
        assert_eq!(summary.subject_not_meeting, 1);
        assert_eq!(summary.body_not_meeting, 0);
        assert_eq!(summary.failed, 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["alreadyIngested"], 1);
        assert_eq!(json["floor"], "2026-10-20T00:00:00Z");
    }
}
