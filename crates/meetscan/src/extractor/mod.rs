//! Meeting date/time extraction.
//!
//! A [`DateTimeRecognizer`] finds date/time expressions in free text and
//! resolves each to one or more candidate values. [`DateTimeExtractor`]
//! picks the first candidate that is not in the past.

mod recognizer;

pub use recognizer::EnglishRecognizer;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Value format for a resolved date and time.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Value format for a resolved date without a time of day.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One expression found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedExpression {
    /// The matched text, as it appears in the input.
    pub text: String,
    /// Byte offset of the match.
    pub start: usize,
    /// Candidate resolutions in preference order, formatted with
    /// [`DATETIME_FORMAT`] or [`DATE_FORMAT`].
    pub values: Vec<String>,
}

/// Finds date/time expressions relative to a local reference time.
///
/// Expressions are returned in the order they appear in `text`.
pub trait DateTimeRecognizer: Send + Sync {
    fn recognize(&self, text: &str, reference: NaiveDateTime) -> Vec<RecognizedExpression>;
}

pub struct DateTimeExtractor {
    recognizer: Box<dyn DateTimeRecognizer>,
}

impl Default for DateTimeExtractor {
    fn default() -> Self {
        Self::new(Box::new(EnglishRecognizer::new()))
    }
}

impl DateTimeExtractor {
    pub fn new(recognizer: Box<dyn DateTimeRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Extracts the first non-past date/time, relative to the current local time.
    pub fn extract(&self, text: &str) -> Option<DateTime<Utc>> {
        self.extract_at(text, Local::now().naive_local())
    }

    /// Like [`extract`](Self::extract) with an explicit local reference time.
    ///
    /// Values before the start of the reference day are skipped. Values
    /// that do not parse are skipped.
    pub fn extract_at(&self, text: &str, reference: NaiveDateTime) -> Option<DateTime<Utc>> {
        if text.trim().is_empty() {
            return None;
        }

        let start_of_day = reference.date().and_time(NaiveTime::MIN);

        self.recognizer
            .recognize(text, reference)
            .iter()
            .flat_map(|expr| expr.values.iter())
            .filter_map(|value| parse_value(value))
            .find(|candidate| *candidate >= start_of_day)
            .and_then(local_to_utc)
    }
}

fn parse_value(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Interprets a naive value in the local zone. A time skipped by a DST
/// transition has no local instant and yields `None`.
fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
