//! Natural-language date parsing for `/skip` and `/unskip`.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Turns free text such as "tomorrow" or "next friday" into a calendar date.
pub trait DateParser: Send + Sync {
    /// Parse `text` relative to `reference` (today). Ambiguous inputs resolve
    /// to the nearest date on or after `reference`.
    fn parse(&self, text: &str, reference: NaiveDate) -> Option<NaiveDate>;
}

/// The built-in English date parser.
///
/// Understands `today`, `tomorrow`, `yesterday`, weekday names (`friday`,
/// `next fri`), `in 3 days` / `in 2 weeks`, ISO dates (`2026-10-20`), month
/// and day in either order (`October 20`, `20 oct 2027`) and `m/d[/y]`.
/// The word "next" is ignored, so "next friday" is the coming Friday.
#[derive(Debug, Default, Clone, Copy)]
pub struct HumanDateParser;

impl DateParser for HumanDateParser {
    fn parse(&self, text: &str, reference: NaiveDate) -> Option<NaiveDate> {
        let cleaned = text.to_ascii_lowercase().replace("next", " ").replace(',', " ");
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        match words.as_slice() {
            [] => None,
            ["today"] | ["now"] => Some(reference),
            ["tomorrow"] => reference.checked_add_days(Days::new(1)),
            ["yesterday"] => reference.checked_sub_days(Days::new(1)),
            ["in", n, unit] => {
                let n: u64 = n.parse().ok()?;
                let days = match *unit {
                    "day" | "days" => n,
                    "week" | "weeks" => n.checked_mul(7)?,
                    _ => return None,
                };
                reference.checked_add_days(Days::new(days))
            }
            [word] => parse_weekday(word)
                .map(|day| upcoming(reference, day))
                .or_else(|| NaiveDate::parse_from_str(word, "%Y-%m-%d").ok())
                .or_else(|| parse_slashed(word, reference)),
            [a, b] => month_day(a, b, None, reference).or_else(|| month_day(b, a, None, reference)),
            [a, b, year] => {
                let year: i32 = year.parse().ok()?;
                month_day(a, b, Some(year), reference)
                    .or_else(|| month_day(b, a, Some(year), reference))
            }
            _ => None,
        }
    }
}

/// The first `day` on or after `reference`.
fn upcoming(reference: NaiveDate, day: Weekday) -> NaiveDate {
    let ahead = (7 + day.num_days_from_monday() - reference.weekday().num_days_from_monday()) % 7;
    reference + Days::new(ahead as u64)
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    const NAMES: [(&str, Weekday); 7] = [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ];
    if word.len() < 3 {
        return None;
    }
    NAMES
        .iter()
        .find(|(name, _)| name.starts_with(word))
        .map(|(_, day)| *day)
}

fn parse_month(word: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(word.trim_end_matches('.')))
        .map(|i| i as u32 + 1)
}

/// Strip an ordinal suffix: "20th" → 20.
fn parse_day(word: &str) -> Option<u32> {
    let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse().ok()
}

fn month_day(month: &str, day: &str, year: Option<i32>, reference: NaiveDate) -> Option<NaiveDate> {
    let month = parse_month(month)?;
    let day = parse_day(day)?;
    resolve(month, day, year, reference)
}

/// `10/20` or `10/20/2027` (month first).
fn parse_slashed(word: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let mut parts = word.split('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year = match parts.next() {
        Some(y) => Some(y.parse::<i32>().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    let year = year.map(|y| if y < 100 { 2000 + y } else { y });
    resolve(month, day, year, reference)
}

/// Without an explicit year, a month/day that already passed this year rolls
/// over to next year.
fn resolve(month: u32, day: u32, year: Option<i32>, reference: NaiveDate) -> Option<NaiveDate> {
    match year {
        Some(y) => NaiveDate::from_ymd_opt(y, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(reference.year(), month, day);
            match this_year {
                Some(d) if d >= reference => Some(d),
                _ => NaiveDate::from_ymd_opt(reference.year() + 1, month, day),
            }
        }
    }
}
