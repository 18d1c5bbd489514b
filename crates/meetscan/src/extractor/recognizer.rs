use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::{Captures, Regex};

use super::{DateTimeRecognizer, RecognizedExpression, DATETIME_FORMAT, DATE_FORMAT};

macro_rules! months {
    () => {
        "january|february|march|april|may|june|july|august|september|october|november|december\
         |jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec"
    };
}

static RE_RELATIVE_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(day after tomorrow|today|tonight|tomorrow|yesterday)\b").unwrap()
});
static RE_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(next|this|last)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .unwrap()
});
static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static RE_US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").unwrap());
static RE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(",
        months!(),
        r")\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4})\b)?"
    ))
    .unwrap()
});
static RE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(",
        months!(),
        r")\b\.?(?:,?\s+(\d{4})\b)?"
    ))
    .unwrap()
});
static RE_IN_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bin\s+(\d{1,3}|an?|one|two|three|four|five|six|seven)\s+(days?|weeks?)\b")
        .unwrap()
});
static RE_TIME_12H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?m\b\.?").unwrap());
static RE_TIME_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());
static RE_TIME_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(noon|midday|midnight)\b").unwrap());
/// Text allowed between a date and the time that belongs to it.
static RE_JOINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\s,]*(?:(?:at|@|on|from|by|around)[\s,]*)?$").unwrap());

#[derive(Debug)]
struct DateSpan {
    start: usize,
    end: usize,
    dates: Vec<NaiveDate>,
}

#[derive(Debug)]
struct TimeSpan {
    start: usize,
    end: usize,
    time: NaiveTime,
}

/// Regex-based recognizer for common English date and time phrasing.
///
/// Weekdays follow calendar-week semantics with weeks starting on Monday:
/// "next Tuesday" is the Tuesday of next week, "this Tuesday" the one of the
/// current week. A bare weekday yields the most recent occurrence followed
/// by the upcoming one. Dates without a year that already passed this year
/// also yield next year's date.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishRecognizer;

impl EnglishRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl DateTimeRecognizer for EnglishRecognizer {
    fn recognize(&self, text: &str, reference: NaiveDateTime) -> Vec<RecognizedExpression> {
        let today = reference.date();
        let dates = find_dates(text, today);
        let times = find_times(text, &dates);

        let mut time_used = vec![false; times.len()];
        let mut expressions = Vec::new();

        for date in &dates {
            let attached = times
                .iter()
                .enumerate()
                .find(|(i, t)| {
                    !time_used[*i] && t.start >= date.end && joins(&text[date.end..t.start])
                })
                .or_else(|| {
                    times.iter().enumerate().rev().find(|(i, t)| {
                        !time_used[*i] && t.end <= date.start && joins(&text[t.end..date.start])
                    })
                })
                .map(|(i, t)| (i, t.start, t.end, t.time));

            let expression = match attached {
                Some((i, t_start, t_end, time)) => {
                    time_used[i] = true;
                    let start = date.start.min(t_start);
                    let end = date.end.max(t_end);
                    RecognizedExpression {
                        text: text[start..end].to_string(),
                        start,
                        values: date
                            .dates
                            .iter()
                            .map(|d| d.and_time(time).format(DATETIME_FORMAT).to_string())
                            .collect(),
                    }
                }
                None => RecognizedExpression {
                    text: text[date.start..date.end].to_string(),
                    start: date.start,
                    values: date
                        .dates
                        .iter()
                        .map(|d| d.format(DATE_FORMAT).to_string())
                        .collect(),
                },
            };
            expressions.push(expression);
        }

        for (time, used) in times.iter().zip(&time_used) {
            if !used {
                expressions.push(RecognizedExpression {
                    text: text[time.start..time.end].to_string(),
                    start: time.start,
                    values: vec![today.and_time(time.time).format(DATETIME_FORMAT).to_string()],
                });
            }
        }

        expressions.sort_by_key(|e| e.start);
        expressions
    }
}

fn joins(gap: &str) -> bool {
    RE_JOINER.is_match(gap)
}

fn find_dates(text: &str, today: NaiveDate) -> Vec<DateSpan> {
    let mut spans = Vec::new();

    collect_spans(&mut spans, &RE_RELATIVE_DAY, text, |caps| {
        let offset = match caps[1].to_lowercase().as_str() {
            "yesterday" => -1,
            "tomorrow" => 1,
            "day after tomorrow" => 2,
            _ => 0,
        };
        Some(vec![today + Duration::days(offset)])
    });

    collect_spans(&mut spans, &RE_WEEKDAY, text, |caps| {
        let weekday: Weekday = caps[2].parse().ok()?;
        let modifier = caps.get(1).map(|m| m.as_str().to_lowercase());
        Some(weekday_dates(modifier.as_deref(), weekday, today))
    });

    collect_spans(&mut spans, &RE_ISO_DATE, text, |caps| {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        Some(vec![date])
    });

    collect_spans(&mut spans, &RE_US_DATE, text, |caps| {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        match caps.get(3) {
            Some(year) => {
                let mut year: i32 = year.as_str().parse().ok()?;
                if year < 100 {
                    year += 2000;
                }
                Some(vec![NaiveDate::from_ymd_opt(year, month, day)?])
            }
            None => without_year(month, day, today),
        }
    });

    collect_spans(&mut spans, &RE_MONTH_DAY, text, |caps| {
        month_name_date(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()), today)
    });

    collect_spans(&mut spans, &RE_DAY_MONTH, text, |caps| {
        month_name_date(&caps[2], &caps[1], caps.get(3).map(|m| m.as_str()), today)
    });

    collect_spans(&mut spans, &RE_IN_DURATION, text, |caps| {
        let count: i64 = match caps[1].to_lowercase().as_str() {
            "a" | "an" | "one" => 1,
            "two" => 2,
            "three" => 3,
            "four" => 4,
            "five" => 5,
            "six" => 6,
            "seven" => 7,
            digits => digits.parse().ok()?,
        };
        let days = if caps[2].to_lowercase().starts_with("week") {
            count * 7
        } else {
            count
        };
        Some(vec![today + Duration::days(days)])
    });

    // Earliest first; on equal starts the longer match wins.
    spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.end)));
    let mut kept: Vec<DateSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if kept.last().is_some_and(|last| span.start < last.end) {
            continue;
        }
        kept.push(span);
    }
    kept
}

fn collect_spans<F>(spans: &mut Vec<DateSpan>, re: &Regex, text: &str, resolve: F)
where
    F: Fn(&Captures<'_>) -> Option<Vec<NaiveDate>>,
{
    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if let Some(dates) = resolve(&caps).filter(|d| !d.is_empty()) {
            spans.push(DateSpan {
                start: m.start(),
                end: m.end(),
                dates,
            });
        }
    }
}

fn find_times(text: &str, dates: &[DateSpan]) -> Vec<TimeSpan> {
    let mut spans: Vec<TimeSpan> = Vec::new();

    let mut push = |start: usize, end: usize, time: Option<NaiveTime>| {
        let Some(time) = time else { return };
        let overlaps = |s: usize, e: usize| start < e && s < end;
        if dates.iter().any(|d| overlaps(d.start, d.end))
            || spans.iter().any(|t| overlaps(t.start, t.end))
        {
            return;
        }
        spans.push(TimeSpan { start, end, time });
    };

    for caps in RE_TIME_12H.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let hour: u32 = caps[1].parse().unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|v| v.as_str().parse().ok()).unwrap_or(0);
        let pm = caps[3].eq_ignore_ascii_case("p");
        let time = if (1..=12).contains(&hour) {
            let hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            };
            NaiveTime::from_hms_opt(hour, minute, 0)
        } else {
            None
        };
        push(m.start(), m.end(), time);
    }

    for caps in RE_TIME_WORD.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let hour = if caps[1].eq_ignore_ascii_case("midnight") {
            0
        } else {
            12
        };
        push(m.start(), m.end(), NaiveTime::from_hms_opt(hour, 0, 0));
    }

    for caps in RE_TIME_24H.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let time = match (caps[1].parse(), caps[2].parse()) {
            (Ok(h), Ok(min)) => NaiveTime::from_hms_opt(h, min, 0),
            _ => None,
        };
        push(m.start(), m.end(), time);
    }

    spans.sort_by_key(|t| t.start);
    spans
}

fn weekday_dates(modifier: Option<&str>, weekday: Weekday, today: NaiveDate) -> Vec<NaiveDate> {
    let today_idx = i64::from(today.weekday().num_days_from_monday());
    let target_idx = i64::from(weekday.num_days_from_monday());
    let this_week = today + Duration::days(target_idx - today_idx);

    match modifier {
        Some("next") => vec![this_week + Duration::days(7)],
        Some("this") => vec![this_week],
        Some("last") => vec![this_week - Duration::days(7)],
        _ => {
            let back = (today_idx - target_idx).rem_euclid(7);
            let ahead = (target_idx - today_idx).rem_euclid(7);
            let mut dates = vec![
                today - Duration::days(back),
                today + Duration::days(ahead),
            ];
            dates.dedup();
            dates
        }
    }
}

fn month_name_date(
    month: &str,
    day: &str,
    year: Option<&str>,
    today: NaiveDate,
) -> Option<Vec<NaiveDate>> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;
    match year {
        Some(year) => Some(vec![NaiveDate::from_ymd_opt(year.parse().ok()?, month, day)?]),
        None => without_year(month, day, today),
    }
}

/// Resolves a year-less date to this year's, plus next year's when this
/// year's has already passed.
fn without_year(month: u32, day: u32, today: NaiveDate) -> Option<Vec<NaiveDate>> {
    let next_year = NaiveDate::from_ymd_opt(today.year() + 1, month, day);
    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(this_year) if this_year >= today => Some(vec![this_year]),
        Some(this_year) => Some(std::iter::once(this_year).chain(next_year).collect()),
        None => next_year.map(|d| vec![d]),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wednesday, 2026-10-21 15:00.
    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 21)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn values(text: &str) -> Vec<Vec<String>> {
        EnglishRecognizer::new()
            .recognize(text, reference())
            .into_iter()
            .map(|e| e.values)
            .collect()
    }

    fn single(text: &str) -> Vec<String> {
        let mut all = values(text);
        assert_eq!(all.len(), 1, "expected one expression in {text:?}: {all:?}");
        all.remove(0)
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(single("see you tomorrow"), vec!["2026-10-22"]);
        assert_eq!(single("Today works"), vec!["2026-10-21"]);
        assert_eq!(single("tonight"), vec!["2026-10-21"]);
        assert_eq!(single("yesterday's call"), vec!["2026-10-20"]);
        assert_eq!(single("the day after tomorrow"), vec!["2026-10-23"]);
    }

    #[test]
    fn test_weekday_modifiers() {
        assert_eq!(single("next Tuesday"), vec!["2026-10-27"]);
        assert_eq!(single("this Tuesday"), vec!["2026-10-20"]);
        assert_eq!(single("last Tuesday"), vec!["2026-10-13"]);
        assert_eq!(single("next Sunday"), vec!["2026-11-01"]);
    }

    #[test]
    fn test_bare_weekday_yields_past_then_upcoming() {
        assert_eq!(single("on Friday"), vec!["2026-10-16", "2026-10-23"]);
        assert_eq!(single("Tuesday"), vec!["2026-10-20", "2026-10-27"]);
        assert_eq!(single("wednesday"), vec!["2026-10-21"]);
    }

    #[test]
    fn test_numeric_dates() {
        assert_eq!(single("due 2026-11-03"), vec!["2026-11-03"]);
        assert_eq!(single("on 11/3/2026"), vec!["2026-11-03"]);
        assert_eq!(single("on 11/3/26"), vec!["2026-11-03"]);
        assert_eq!(single("on 12/24"), vec!["2026-12-24"]);
        assert_eq!(single("on 3/1"), vec!["2026-03-01", "2027-03-01"]);
        assert!(values("on 2026-02-30").is_empty());
    }

    #[test]
    fn test_month_name_dates() {
        assert_eq!(single("November 3"), vec!["2026-11-03"]);
        assert_eq!(single("Nov. 3rd, 2027"), vec!["2027-11-03"]);
        assert_eq!(single("3rd Nov 2026"), vec!["2026-11-03"]);
        assert_eq!(single("the 5th of January"), vec!["2026-01-05", "2027-01-05"]);
    }

    #[test]
    fn test_in_duration() {
        assert_eq!(single("in 3 days"), vec!["2026-10-24"]);
        assert_eq!(single("in two weeks"), vec!["2026-11-04"]);
        assert_eq!(single("in a week"), vec!["2026-10-28"]);
    }

    #[test]
    fn test_time_attaches_to_adjacent_date() {
        assert_eq!(single("next Tuesday at 10am"), vec!["2026-10-27 10:00:00"]);
        assert_eq!(single("3:30 pm tomorrow"), vec!["2026-10-22 15:30:00"]);
        assert_eq!(single("2026-11-03 14:00"), vec!["2026-11-03 14:00:00"]);
        assert_eq!(single("Friday, noon"), vec![
            "2026-10-16 12:00:00",
            "2026-10-23 12:00:00"
        ]);
    }

    #[test]
    fn test_lone_time_uses_reference_day() {
        assert_eq!(single("call at 9:15"), vec!["2026-10-21 09:15:00"]);
        assert_eq!(single("12am"), vec!["2026-10-21 00:00:00"]);
        assert_eq!(single("12 p.m."), vec!["2026-10-21 12:00:00"]);
        assert!(values("13pm").is_empty());
    }

    #[test]
    fn test_expressions_in_text_order() {
        let exprs = EnglishRecognizer::new().recognize(
            "Moved from last Monday to tomorrow at 4pm, backup 11/20",
            reference(),
        );
        let texts: Vec<&str> = exprs.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["last Monday", "tomorrow at 4pm", "11/20"]);
        assert_eq!(exprs[1].values, vec!["2026-10-22 16:00:00"]);
    }

    #[test]
    fn test_time_not_attached_across_words() {
        let all = values("tomorrow we review, then at 5pm");
        assert_eq!(
            all,
            vec![vec!["2026-10-22".to_string()], vec!["2026-10-21 17:00:00".to_string()]]
        );
    }

    #[test]
    fn test_no_expressions() {
        assert!(values("Quarterly numbers attached").is_empty());
        assert!(values("").is_empty());
    }
}
