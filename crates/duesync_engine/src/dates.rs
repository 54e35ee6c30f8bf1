use chrono::{
    DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Utc,
};

const DATE_TIME_FORMATS: &[&str] = &[
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M",
    "%b %d %Y %I:%M %p",
    "%d %b %Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%d-%b-%Y %I:%M %p",
    "%d-%b-%Y %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
];

const WEEKDAYS: &[&str] = &[
    "mon", "tue", "tues", "wed", "thu", "thur", "thurs", "fri", "sat", "sun", "monday", "tuesday",
    "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Lenient parse of the free-form due-date text found on schedule pages.
///
/// Dates without a time resolve to local midnight. Text carrying an offset
/// (RFC 3339) is converted to local wall-clock time.
pub fn parse_due_date(text: &str) -> Option<NaiveDateTime> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(instant.with_timezone(&Local).naive_local());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&normalized, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parses the manual form's `YYYY-MM-DD` date and `HH:MM` time.
pub fn parse_date_and_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time))
}

/// RFC 3339 rendering (UTC, millisecond precision) of a local wall-clock time.
///
/// A wall-clock time skipped by a DST jump is read as UTC.
pub fn local_to_rfc3339(local: NaiveDateTime) -> String {
    let utc = match Local.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&local),
    };
    utc.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn normalize(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if let Some(first) = words.first() {
        let bare = first.trim_end_matches([',', '.']).to_ascii_lowercase();
        if words.len() > 1 && WEEKDAYS.contains(&bare.as_str()) {
            words.remove(0);
        }
    }
    words
        .iter()
        .map(|word| match word.strip_prefix("Sept") {
            // chrono's %b only knows three-letter abbreviations.
            Some(rest) if rest.is_empty() || rest.starts_with(['.', ',']) => {
                format!("Sep{}", rest.trim_start_matches('.'))
            }
            _ => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
