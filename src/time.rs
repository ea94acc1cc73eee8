use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Parses the `received_at` timestamp from an uplink envelope.
///
/// The gateway emits RFC 3339 with a trailing `Z` and a nanosecond-resolution
/// fractional part of varying width; anything beyond microseconds is
/// truncated before parsing.
pub fn parse_received_at(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("timestamp is empty".to_string());
    }

    let normalized = if let Some(stripped) = trimmed.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        trimmed.to_string()
    };

    let normalized = truncate_fractional_seconds(&normalized, 6);
    DateTime::parse_from_rfc3339(&normalized).map_err(|err| format!("{raw:?}: {err}"))
}

/// Caps the fractional-seconds part at `max_digits` digits. Leaves strings
/// without a fractional part untouched.
fn truncate_fractional_seconds(value: &str, max_digits: usize) -> String {
    let Some(dot) = value.find('.') else {
        return value.to_string();
    };
    let frac_start = dot + 1;
    let frac_end = value[frac_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|offset| frac_start + offset)
        .unwrap_or(value.len());

    if frac_end - frac_start <= max_digits {
        return value.to_string();
    }
    format!(
        "{}{}",
        &value[..frac_start + max_digits],
        &value[frac_end..]
    )
}

/// Resolves local midnight of `date` to a UTC instant. Around DST
/// transitions a midnight can be skipped or repeated; the earliest valid
/// instant wins in both cases.
pub fn local_day_start(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is in range");
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(a, b) => {
            let (a, b) = (a.with_timezone(&Utc), b.with_timezone(&Utc));
            a.min(b)
        }
        LocalResult::None => {
            // Spring-forward gap. Walk forward to the first valid minute.
            let mut candidate = midnight;
            loop {
                candidate += Duration::minutes(1);
                match tz.from_local_datetime(&candidate) {
                    LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                    LocalResult::Ambiguous(a, b) => {
                        let (a, b) = (a.with_timezone(&Utc), b.with_timezone(&Utc));
                        return a.min(b);
                    }
                    LocalResult::None => continue,
                }
            }
        }
    }
}

/// UTC window covering the local calendar days `[date, date + days)`.
/// The end bound is exclusive.
pub fn local_day_window(tz: Tz, date: NaiveDate, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_day_start(tz, date);
    let end = local_day_start(tz, date + Duration::days(days));
    (start, end)
}
