//! Display formatting for stored date ranges.
//!
//! Places store `dates` as free text, conventionally `DD.MM.YYYY – DD.MM.YYYY`.
//! [`format_date_range`] compacts that for display and returns anything it
//! cannot parse unchanged.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

const EN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const RU_MONTHS: [&str; 12] = [
    "янв", "фев", "мар", "апр", "май", "июн", "июл", "авг", "сен", "окт", "ноя", "дек",
];

/// Month abbreviation table used when rendering date ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLocale {
    #[default]
    En,
    Ru,
}

impl DateLocale {
    fn month(self, date: NaiveDate) -> &'static str {
        let idx = date.month0() as usize;
        match self {
            Self::En => EN_MONTHS[idx],
            Self::Ru => RU_MONTHS[idx],
        }
    }
}

fn parse_range(raw: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = raw.split_once('–')?;
    let start = NaiveDate::parse_from_str(start.trim(), "%d.%m.%Y").ok()?;
    let end = NaiveDate::parse_from_str(end.trim(), "%d.%m.%Y").ok()?;
    Some((start, end))
}

/// Render a stored `DD.MM.YYYY – DD.MM.YYYY` range for display.
///
/// - same month and year: `1–5 Jun 2024`
/// - same year: `28 Jun – 2 Jul 2024`
/// - otherwise: `30 Dec 2024 – 2 Jan 2025`
///
/// Input that does not parse is returned as-is.
pub fn format_date_range(raw: &str, locale: DateLocale) -> String {
    let Some((start, end)) = parse_range(raw) else {
        return raw.to_string();
    };

    if start.year() == end.year() && start.month() == end.month() {
        format!(
            "{}–{} {} {}",
            start.day(),
            end.day(),
            locale.month(start),
            start.year()
        )
    } else if start.year() == end.year() {
        format!(
            "{} {} – {} {} {}",
            start.day(),
            locale.month(start),
            end.day(),
            locale.month(end),
            end.year()
        )
    } else {
        format!(
            "{} {} {} – {} {} {}",
            start.day(),
            locale.month(start),
            start.year(),
            end.day(),
            locale.month(end),
            end.year()
        )
    }
}
