//! Document information dictionary helpers.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

/// Well-known info dictionary keys.
pub mod tags {
    pub const TITLE: &str = "Title";
    pub const AUTHOR: &str = "Author";
    pub const SUBJECT: &str = "Subject";
    pub const KEYWORDS: &str = "Keywords";
    pub const CREATOR: &str = "Creator";
    pub const PRODUCER: &str = "Producer";
    pub const CREATION_DATE: &str = "CreationDate";
    pub const MOD_DATE: &str = "ModDate";
}

static PDF_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"D:(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})(?P<hour>\d{2})(?P<minute>\d{2})(?P<second>\d{2})(?P<tz>[+\-zZ])?(?P<tz_hour>\d{2})?'?(?P<tz_minute>\d{2})?'?",
    )
    .expect("date pattern is valid")
});

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS[Z|+HH'mm'|-HH'mm']`).
///
/// A missing zone, or `Z`, means UTC. Returns `None` for anything that does
/// not match the grammar or names an impossible date.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let caps = PDF_DATE.captures(value)?;
    let field = |name: &str| -> Option<u32> { caps.name(name)?.as_str().parse().ok() };

    let date = NaiveDate::from_ymd_opt(
        caps.name("year")?.as_str().parse().ok()?,
        field("month")?,
        field("day")?,
    )?;
    let naive = date.and_hms_opt(field("hour")?, field("minute")?, field("second")?)?;

    let offset_seconds = match caps.name("tz").map(|m| m.as_str()) {
        Some(sign @ ("+" | "-")) => {
            let hours = field("tz_hour").unwrap_or(0) as i32;
            let minutes = field("tz_minute").unwrap_or(0) as i32;
            let seconds = hours * 3600 + minutes * 60;
            if sign == "-" {
                -seconds
            } else {
                seconds
            }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_seconds)?;
    offset.from_local_datetime(&naive).single()
}

/// Decode a NUL-terminated UTF-16LE buffer as returned by the two-phase
/// string calls.
pub(crate) fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
