use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

const YEAR_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const YEAR_FIRST_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const TIME_OF_DAY_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

// %b also accepts full month names when parsing.
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %b, %Y",
    "%b %d, %Y",
    "%b %d %Y",
];

/// A canonical instant plus whether it came from the input or from the
/// "now" fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub timestamp: DateTime<Utc>,
    pub parsed: bool,
}

/// Normalize a free-form date cell against the current clock.
///
/// Never fails: unparseable or empty input resolves to the current instant
/// with `parsed == false`. Callers that sort or filter on the result must
/// check that flag, since a fallback instant looks like any other.
pub fn normalize_date(raw: &str) -> NormalizedDate {
    normalize_date_at(raw, Utc::now())
}

/// Same as [`normalize_date`] with an explicit fallback instant.
pub fn normalize_date_at(raw: &str, now: DateTime<Utc>) -> NormalizedDate {
    let value = raw.trim();

    let parsed = if value.is_empty() {
        None
    } else {
        parse_generic(value).or_else(|| parse_day_month_year(value))
    };

    match parsed {
        Some(timestamp) => NormalizedDate {
            timestamp,
            parsed: true,
        },
        None => NormalizedDate {
            timestamp: now,
            parsed: false,
        },
    }
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn at_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

fn starts_with_four_digit_year(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 4
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes.get(4).map_or(true, |b| !b.is_ascii_digit())
}

/// Unambiguous textual formats: RFC 3339, RFC 2822, year-first numeric
/// dates and dates with a month name.
fn parse_generic(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // Without this guard "01-02-03" would parse as the year 1.
    if starts_with_four_digit_year(value) {
        for format in YEAR_FIRST_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt.and_utc());
            }
        }
        for format in YEAR_FIRST_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return at_midnight(date);
            }
        }
    }

    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(at_midnight)
}

/// `DD-MM-YYYY`, `DD/MM/YY`, `DD.MM.YYYY` and friends, optionally followed
/// by a time of day. Two-digit years are read as 20YY. Each date part only
/// needs to start with digits; a time that cannot be read leaves the date at
/// midnight.
fn parse_day_month_year(value: &str) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = match value.split_once(char::is_whitespace) {
        Some((date, time)) => (date, time.trim()),
        None => (value, ""),
    };

    let parts: Vec<&str> = date_part.split(['-', '/', '.']).map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = leading_number(parts[0])?;
    let month: u32 = leading_number(parts[1])?;
    let year: i32 = leading_number(parts[2])?;
    let full_year = if year < 100 { 2000 + year } else { year };

    let date = NaiveDate::from_ymd_opt(full_year, month, day)?;
    let time = parse_time_of_day(time_part).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

fn leading_number<T: std::str::FromStr>(part: &str) -> Option<T> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    if value.is_empty() {
        return None;
    }
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}
