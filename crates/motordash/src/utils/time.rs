use anyhow::{Result, bail};
use time::{Date, Month, OffsetDateTime};

#[must_use]
pub fn utc_today() -> Date {
    OffsetDateTime::now_utc().date()
}

#[must_use]
pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses a calendar date in `YYYY-MM-DD` form. Stricter forms (offsets,
/// times) are rejected; sale dates are stored date-only.
pub fn parse_iso_date(raw: &str) -> Result<Date> {
    let candidate = raw.trim();
    let mut parts = candidate.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("expected YYYY-MM-DD date, got: {candidate}");
    };

    let year: i32 = year
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid year in date: {candidate}"))?;
    let month: u8 = month
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid month in date: {candidate}"))?;
    let day: u8 = day
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid day in date: {candidate}"))?;

    let month = Month::try_from(month)
        .map_err(|_| anyhow::anyhow!("month out of range in date: {candidate}"))?;
    Date::from_calendar_date(year, month, day)
        .map_err(|_| anyhow::anyhow!("day out of range in date: {candidate}"))
}
