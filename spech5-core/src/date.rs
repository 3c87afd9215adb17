//! SPEC `#D` date normalization.

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveTime};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

struct SpecDate<'a> {
    date: NaiveDate,
    time: NaiveTime,
    zone: Option<&'a str>,
}

/// Converts a SPEC date to ISO 8601.
///
/// Two layouts are supported, with English day and month names:
///
/// * `DDD MMM dd hh:mm:ss YYYY` (e.g. `Thu Feb 11 09:54:35 2016`)
/// * `DDD YYYY/MM/dd hh:mm:ss` (e.g. `Sat 2015/03/14 03:53:50`)
///
/// A numeric zone (`+02:00`) written right after the seconds is kept;
/// otherwise `zone` is appended when given.
///
/// # Errors
/// Returns [`Error::DateFormat`] if neither layout matches or the date
/// does not exist.
pub fn spec_date_to_iso8601(date: &str, zone: Option<&str>) -> Result<String> {
    let fields: Vec<&str> = date.split_whitespace().collect();
    let parsed = parse_month_name_layout(&fields)
        .or_else(|| parse_numeric_layout(&fields))
        .ok_or_else(|| Error::DateFormat(date.to_string()))?;
    let zone = parsed.zone.or(zone).unwrap_or("");
    Ok(format!(
        "{}T{}{}",
        parsed.date.format("%Y-%m-%d"),
        parsed.time.format("%H:%M:%S"),
        zone
    ))
}

fn parse_month_name_layout<'a>(fields: &[&'a str]) -> Option<SpecDate<'a>> {
    let [weekday, month, day, time, year, ..] = fields else {
        return None;
    };
    if !WEEKDAYS.contains(weekday) {
        return None;
    }
    let month = MONTHS.iter().position(|m| m == month)? + 1;
    let (time, zone) = parse_time(time)?;
    let date = NaiveDate::from_ymd_opt(
        parse_year(year)?,
        u32::try_from(month).ok()?,
        parse_two_digits(day)?,
    )?;
    Some(SpecDate { date, time, zone })
}

fn parse_numeric_layout<'a>(fields: &[&'a str]) -> Option<SpecDate<'a>> {
    let [weekday, ymd, time, ..] = fields else {
        return None;
    };
    if !WEEKDAYS.contains(weekday) {
        return None;
    }
    let mut parts = ymd.split('/');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let (time, zone) = parse_time(time)?;
    let date = NaiveDate::from_ymd_opt(
        parse_year(year)?,
        parse_two_digits(month)?,
        parse_two_digits(day)?,
    )?;
    Some(SpecDate { date, time, zone })
}

fn parse_time(field: &str) -> Option<(NaiveTime, Option<&str>)> {
    let (clock, zone) = match field.find(['+', '-']) {
        Some(idx) => (&field[..idx], Some(&field[idx..])),
        None => (field, None),
    };
    if let Some(zone) = zone {
        if !is_numeric_zone(zone) {
            return None;
        }
    }
    let mut parts = clock.split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let time = NaiveTime::from_hms_opt(
        parse_two_digits(h)?,
        parse_two_digits(m)?,
        parse_two_digits(s)?,
    )?;
    Some((time, zone))
}

fn is_numeric_zone(zone: &str) -> bool {
    let bytes = zone.as_bytes();
    bytes.len() == 6
        && matches!(bytes[0], b'+' | b'-')
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
        && bytes[3] == b':'
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
}

fn parse_year(field: &str) -> Option<i32> {
    (field.len() == 4 && field.bytes().all(|b| b.is_ascii_digit()))
        .then(|| field.parse().ok())
        .flatten()
}

fn parse_two_digits(field: &str) -> Option<u32> {
    (field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit()))
        .then(|| field.parse().ok())
        .flatten()
}
