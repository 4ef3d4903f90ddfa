// src/extractor/date.rs
//! Loose publication-date parsing for the article's date line.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 2023.04.12, 2023-4-12, 2023/04/12, 2023年4月12日
    static ref YEAR_FIRST: Regex =
        Regex::new(r"(\d{4})\s*[./\-年]\s*(\d{1,2})\s*[./\-月]\s*(\d{1,2})").expect("valid date pattern");
    // 12.04.2023, 12/4/2023, 12-04-2023
    static ref DAY_FIRST: Regex =
        Regex::new(r"\b(\d{1,2})\s*[./\-]\s*(\d{1,2})\s*[./\-]\s*(\d{4})\b").expect("valid date pattern");
    // 12 April 2023, 12 Apr. 2023
    static ref DAY_MONTH_NAME: Regex =
        Regex::new(r"(?i)\b(\d{1,2})\s+([a-z]{3,9})\.?,?\s+(\d{4})\b").expect("valid date pattern");
    // April 12, 2023
    static ref MONTH_NAME_DAY: Regex =
        Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").expect("valid date pattern");
}

/// Parses the first recognizable date in `text` as midnight UTC.
pub fn parse_loose_date(text: &str) -> Option<DateTime<Utc>> {
    let date = year_first(text)
        .or_else(|| day_first(text))
        .or_else(|| day_month_name(text))
        .or_else(|| month_name_day(text))?;

    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

fn year_first(text: &str) -> Option<NaiveDate> {
    let caps = YEAR_FIRST.captures(text)?;
    ymd(&caps[1], &caps[2], &caps[3])
}

fn day_first(text: &str) -> Option<NaiveDate> {
    let caps = DAY_FIRST.captures(text)?;
    ymd(&caps[3], &caps[2], &caps[1])
}

fn day_month_name(text: &str) -> Option<NaiveDate> {
    let caps = DAY_MONTH_NAME.captures(text)?;
    let month = month_number(&caps[2])?;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[1].parse().ok()?)
}

fn month_name_day(text: &str) -> Option<NaiveDate> {
    let caps = MONTH_NAME_DAY.captures(text)?;
    let month = month_number(&caps[1])?;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[2].parse().ok()?)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let name = name.to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| month.starts_with(&name) || (name == "sept" && *month == "september"))
        .map(|index| index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd_of(text: &str) -> Option<(i32, u32, u32)> {
        parse_loose_date(text).map(|d| (d.year(), d.month(), d.day()))
    }

    #[test]
    fn day_month_year_forms() {
        assert_eq!(ymd_of("12.04.2023"), Some((2023, 4, 12)));
        assert_eq!(ymd_of("Posted 12/4/2023"), Some((2023, 4, 12)));
        assert_eq!(ymd_of("12 April 2023"), Some((2023, 4, 12)));
        assert_eq!(ymd_of("12 Apr. 2023"), Some((2023, 4, 12)));
    }

    #[test]
    fn year_month_day_forms() {
        assert_eq!(ymd_of("2023.04.12"), Some((2023, 4, 12)));
        assert_eq!(ymd_of("2023年4月12日"), Some((2023, 4, 12)));
    }

    #[test]
    fn month_name_first() {
        assert_eq!(ymd_of("April 12, 2023"), Some((2023, 4, 12)));
    }

    #[test]
    fn garbage_and_impossible_dates_are_none() {
        assert_eq!(ymd_of("no date here"), None);
        assert_eq!(ymd_of("31.02.2023"), None);
        assert_eq!(ymd_of("12 Foo 2023"), None);
    }

    #[test]
    fn parsed_dates_are_midnight_utc() {
        let date = parse_loose_date("2023.04.12").unwrap();
        assert_eq!(date.to_rfc3339(), "2023-04-12T00:00:00+00:00");
    }
}
