use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// add calendar months, day-of-month preserved where valid,
/// clamped to the last day of the target month otherwise
pub fn add_months(date: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let total = date.month0() as i64 + months as i64;
    let year = date.year() + (total / 12) as i32;
    let month = (total % 12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));

    Utc.with_ymd_and_hms(year, month, day, date.hour(), date.minute(), date.second())
        .single()
        .unwrap_or(date)
}

/// truncate a timestamp to midnight
pub fn start_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
        .single()
        .unwrap_or(date)
}

/// whole-day difference between two timestamps, computed from
/// midnight-aligned values so time of day never skews the bucket
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (start_of_day(later) - start_of_day(earlier)).num_days()
}

/// days late past a due date; never negative
pub fn days_late(due_date: DateTime<Utc>, paid_date: DateTime<Utc>) -> u32 {
    days_between(due_date, paid_date).max(0) as u32
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
