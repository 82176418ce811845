use crate::config::LocationConfig;
use anyhow::Context;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn local_now(
    location: &LocationConfig,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(location.utc_offset_hours * 3600).with_context(|| {
        format!(
            "invalid UTC offset for {}: {} hours",
            location.name, location.utc_offset_hours
        )
    })?;
    Ok(now_utc.with_timezone(&offset))
}

pub fn local_date(location: &LocationConfig, now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    Ok(local_now(location, now_utc)?.date_naive())
}

/// "Friday 24 Jan", with no zero padding on the day.
pub fn format_date(dt: &DateTime<FixedOffset>) -> String {
    let day_name = DAY_NAMES[dt.weekday().num_days_from_monday() as usize];
    let month = MONTH_ABBREVS[(dt.month0()) as usize];
    format!("{day_name} {} {month}", dt.day())
}

/// "7:30 AM", 12-hour clock with no leading zero on the hour.
pub fn format_time(dt: &DateTime<FixedOffset>) -> String {
    let (is_pm, hour) = dt.hour12();
    let meridiem = if is_pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {meridiem}", dt.minute())
}
