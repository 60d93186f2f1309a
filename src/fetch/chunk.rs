use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Day span the API accepts for a single date-bounded request.
pub const DEFAULT_MAX_DAYS: u32 = 29;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date window sent as `startDate`/`endDate`.
///
/// Either side may be absent for endpoints that accept open-ended ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.start.as_deref().unwrap_or("start"),
            self.end.as_deref().unwrap_or("end")
        )
    }
}

/// Split `[start, end]` into consecutive windows of at most `max_days` days.
///
/// Absent or unparseable bounds yield the input range untouched, as does any
/// range whose whole-day span already fits. The last window always ends at
/// `end` exactly as given, time of day included.
pub fn chunk_date_range(start: Option<&str>, end: Option<&str>, max_days: u32) -> Vec<DateRange> {
    let original = vec![DateRange::new(start, end)];

    let (Some(start_raw), Some(end_raw)) = (non_empty(start), non_empty(end)) else {
        return original;
    };
    let (Some(start_at), Some(end_at)) = (parse_date_time(start_raw), parse_date_time(end_raw))
    else {
        return original;
    };

    // num_days truncates toward zero, which is the floor for end >= start.
    let span = (end_at - start_at).num_days();
    if span <= i64::from(max_days) {
        return original;
    }

    split_days(start_at.date(), end_at.date(), end_raw, max_days)
}

/// Walk whole days from `start_day`; the window reaching `end_day` ends at `end_raw`.
fn split_days(
    start_day: NaiveDate,
    end_day: NaiveDate,
    end_raw: &str,
    max_days: u32,
) -> Vec<DateRange> {
    let window = Duration::days(i64::from(max_days));
    let mut chunks = Vec::new();
    let mut chunk_start = start_day;

    loop {
        let chunk_end = chunk_start
            .checked_add_signed(window)
            .filter(|chunk_end| *chunk_end < end_day);

        let Some(chunk_end) = chunk_end else {
            chunks.push(DateRange {
                start: Some(format_day(&chunk_start)),
                end: Some(end_raw.to_string()),
            });
            return chunks;
        };

        chunks.push(DateRange {
            start: Some(format_day(&chunk_start)),
            end: Some(format_day(&chunk_end)),
        });

        // chunk_end < end_day, so the successor always exists.
        match chunk_end.succ_opt() {
            Some(next) => chunk_start = next,
            None => return chunks,
        }
    }
}

/// Accepts plain dates, naive timestamps and RFC 3339 timestamps.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn format_day(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
