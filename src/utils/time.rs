//! Day and shift arithmetic. Shift times are wall-clock "HH:MM" values
//! evaluated on the UTC calendar day of the event.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::model::attendance::AttendanceStatus;

/// Whole minutes from `a` to `b`, rounded, never negative.
pub fn minutes_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let millis = (b - a).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis as f64 / 60_000.0).round() as i64
}

/// Sunday = 0 .. Saturday = 6.
pub fn day_of_week(at: DateTime<Utc>) -> u8 {
    at.weekday().num_days_from_sunday() as u8
}

pub fn attendance_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let (h, m) = value.split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Normalises "9:00" to "09:00"; None for anything that is not a time.
pub fn normalize_hhmm(value: &str) -> Option<String> {
    parse_hhmm(value.trim()).map(|t| t.format("%H:%M").to_string())
}

/// The instant `time` on the same UTC day as `base`.
pub fn at_time_on_day(base: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    base.date_naive().and_time(time).and_utc()
}

/// Clock-in status against the shift start. `None` shift start means no
/// shift is scheduled for that weekday.
pub fn classify_clock_in(
    at: DateTime<Utc>,
    shift_start: Option<NaiveTime>,
    grace_minutes: i64,
) -> AttendanceStatus {
    match shift_start {
        Some(start) => {
            let minutes_late = minutes_between(at_time_on_day(at, start), at);
            if minutes_late > grace_minutes {
                AttendanceStatus::Late
            } else {
                AttendanceStatus::OnTime
            }
        }
        None => AttendanceStatus::Unknown,
    }
}

/// Clock-out keeps the clock-in status unless the shift had not ended yet.
pub fn classify_clock_out(
    at: DateTime<Utc>,
    shift_end: Option<NaiveTime>,
    current: AttendanceStatus,
) -> AttendanceStatus {
    match shift_end {
        Some(end) if at < at_time_on_day(at, end) => AttendanceStatus::EarlyDeparture,
        _ => current,
    }
}

/// Worked minutes of a closed record.
pub fn worked_minutes(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>, break_minutes: i64) -> i64 {
    (minutes_between(clock_in, clock_out) - break_minutes).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn hhmm(v: &str) -> Option<NaiveTime> {
        parse_hhmm(v)
    }

    #[test]
    fn minutes_round_and_clamp() {
        let a = utc(2026, 3, 2, 9, 0);
        assert_eq!(minutes_between(a, a + chrono::Duration::seconds(89)), 1);
        assert_eq!(minutes_between(a, a + chrono::Duration::seconds(90)), 2);
        assert_eq!(minutes_between(a + chrono::Duration::hours(1), a), 0);
    }

    #[test]
    fn weekday_counts_from_sunday() {
        // 2026-03-01 is a Sunday.
        assert_eq!(day_of_week(utc(2026, 3, 1, 12, 0)), 0);
        assert_eq!(day_of_week(utc(2026, 3, 7, 12, 0)), 6);
    }

    #[test]
    fn parses_and_normalises_times() {
        assert_eq!(normalize_hhmm("9:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_hhmm("17:00").as_deref(), Some("17:00"));
        assert_eq!(normalize_hhmm("24:00"), None);
        assert_eq!(normalize_hhmm("12:5"), None);
        assert_eq!(normalize_hhmm("noon"), None);
    }

    #[test]
    fn late_only_after_grace() {
        let start = hhmm("09:00");
        assert_eq!(classify_clock_in(utc(2026, 3, 2, 8, 45), start, 5), AttendanceStatus::OnTime);
        assert_eq!(classify_clock_in(utc(2026, 3, 2, 9, 5), start, 5), AttendanceStatus::OnTime);
        assert_eq!(classify_clock_in(utc(2026, 3, 2, 9, 6), start, 5), AttendanceStatus::Late);
        assert_eq!(classify_clock_in(utc(2026, 3, 2, 9, 6), None, 5), AttendanceStatus::Unknown);
    }

    #[test]
    fn early_departure_before_shift_end() {
        let end = hhmm("17:00");
        assert_eq!(
            classify_clock_out(utc(2026, 3, 2, 16, 59), end, AttendanceStatus::OnTime),
            AttendanceStatus::EarlyDeparture
        );
        assert_eq!(
            classify_clock_out(utc(2026, 3, 2, 17, 0), end, AttendanceStatus::Late),
            AttendanceStatus::Late
        );
        assert_eq!(
            classify_clock_out(utc(2026, 3, 2, 12, 0), None, AttendanceStatus::OnTime),
            AttendanceStatus::OnTime
        );
    }

    #[test]
    fn worked_minutes_subtract_breaks() {
        let start = utc(2026, 3, 2, 9, 0);
        let end = utc(2026, 3, 2, 17, 30);
        assert_eq!(worked_minutes(start, end, 30), 480);
        assert_eq!(worked_minutes(start, start, 30), 0);
    }
}
