//! Timeblocks and the per-user availability bitset.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recurring slot that matching is keyed on.
///
/// The seven calendar days plus `Week`, a virtual weekly block evaluated only
/// on Mondays. `Week` is disjoint from the daily values: subscribing to it does
/// not imply Monday, and vice versa.
///
/// Declaration order is the canonical display order (`WEEK` first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeblock {
    #[serde(rename = "WEEK")]
    Week,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Number of bits in an [`Availability`] vector.
pub const TIMEBLOCK_COUNT: usize = 8;

impl Timeblock {
    /// Every timeblock in canonical order.
    pub const ALL: [Timeblock; TIMEBLOCK_COUNT] = [
        Timeblock::Week,
        Timeblock::Monday,
        Timeblock::Tuesday,
        Timeblock::Wednesday,
        Timeblock::Thursday,
        Timeblock::Friday,
        Timeblock::Saturday,
        Timeblock::Sunday,
    ];

    /// The seven calendar days, Monday first.
    pub const DAYS: [Timeblock; 7] = [
        Timeblock::Monday,
        Timeblock::Tuesday,
        Timeblock::Wednesday,
        Timeblock::Thursday,
        Timeblock::Friday,
        Timeblock::Saturday,
        Timeblock::Sunday,
    ];

    /// Canonical bit index: Monday = 0 … Sunday = 6, WEEK = 7.
    pub const fn bit(self) -> usize {
        match self {
            Timeblock::Monday => 0,
            Timeblock::Tuesday => 1,
            Timeblock::Wednesday => 2,
            Timeblock::Thursday => 3,
            Timeblock::Friday => 4,
            Timeblock::Saturday => 5,
            Timeblock::Sunday => 6,
            Timeblock::Week => 7,
        }
    }

    /// Inverse of [`Timeblock::bit`]. `None` when the index is out of range.
    pub fn from_bit(bit: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.bit() == bit)
    }

    /// The daily timeblock for a calendar weekday.
    pub fn from_weekday(day: Weekday) -> Self {
        Self::DAYS[day.num_days_from_monday() as usize]
    }

    /// The daily timeblock `date` falls on.
    pub fn of_date(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }

    pub fn is_week(self) -> bool {
        matches!(self, Timeblock::Week)
    }

    /// Whether this block is evaluated on `date`.
    ///
    /// Daily blocks cover their own weekday; `Week` covers Mondays.
    pub fn covers(self, date: NaiveDate) -> bool {
        match self {
            Timeblock::Week => date.weekday() == Weekday::Mon,
            day => day == Self::of_date(date),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Timeblock::Week => "WEEK",
            Timeblock::Monday => "Monday",
            Timeblock::Tuesday => "Tuesday",
            Timeblock::Wednesday => "Wednesday",
            Timeblock::Thursday => "Thursday",
            Timeblock::Friday => "Friday",
            Timeblock::Saturday => "Saturday",
            Timeblock::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Timeblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Timeblock {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| {
                let name = t.name().to_ascii_lowercase();
                name == lower || (lower.len() >= 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| format!("unknown timeblock: {s}"))
    }
}

/// What a subscribe/unsubscribe command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeblockSelection {
    One(Timeblock),
    /// Every calendar day (the seven daily blocks, not `WEEK`).
    EveryDay,
}

impl TimeblockSelection {
    pub fn blocks(self) -> Vec<Timeblock> {
        match self {
            TimeblockSelection::One(t) => vec![t],
            TimeblockSelection::EveryDay => Timeblock::DAYS.to_vec(),
        }
    }
}

impl From<Option<Timeblock>> for TimeblockSelection {
    fn from(t: Option<Timeblock>) -> Self {
        t.map_or(TimeblockSelection::EveryDay, TimeblockSelection::One)
    }
}

/// Fixed-size availability vector indexed by [`Timeblock::bit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Availability {
    bits: [bool; TIMEBLOCK_COUNT],
}

impl Availability {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, block: Timeblock) -> bool {
        self.bits[block.bit()]
    }

    pub fn set(&mut self, block: Timeblock, value: bool) {
        self.bits[block.bit()] = value;
    }

    /// Bounds-checked read by raw bit index.
    pub fn get_bit(&self, bit: usize) -> Option<bool> {
        self.bits.get(bit).copied()
    }

    /// Decode the persisted mask. Bits above the WEEK bit are ignored.
    pub fn from_mask(mask: u8) -> Self {
        let mut bits = [false; TIMEBLOCK_COUNT];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = mask & (1 << i) != 0;
        }
        Self { bits }
    }

    pub fn to_mask(&self) -> u8 {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |mask, (i, _)| mask | (1 << i))
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|b| !b)
    }

    /// All seven calendar days are set (WEEK is not considered).
    pub fn is_every_day(&self) -> bool {
        Timeblock::DAYS.iter().all(|d| self.get(*d))
    }

    /// Subscribed timeblocks in canonical order, independent of the order
    /// in which they were added.
    pub fn timeblocks(&self) -> Vec<Timeblock> {
        Timeblock::ALL
            .into_iter()
            .filter(|t| self.get(*t))
            .collect()
    }

    /// Whether any subscribed block is evaluated on `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.timeblocks().into_iter().any(|t| t.covers(date))
    }

    /// Human-readable schedule, e.g. `WEEK, Monday, Wednesday`.
    pub fn render(&self) -> String {
        if self.is_every_day() {
            let mut out = String::from("every day");
            if self.get(Timeblock::Week) {
                out.push_str(" and WEEK");
            }
            return out;
        }
        self.timeblocks()
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn canonical_order_regardless_of_insertion() {
        let mut a = Availability::none();
        a.set(Timeblock::Wednesday, true);
        a.set(Timeblock::Monday, true);
        a.set(Timeblock::Week, true);
        assert_eq!(
            a.timeblocks(),
            vec![Timeblock::Week, Timeblock::Monday, Timeblock::Wednesday]
        );
        assert_eq!(a.render(), "WEEK, Monday, Wednesday");
    }

    #[test]
    fn mask_round_trip_keeps_week_separate() {
        let mut a = Availability::none();
        a.set(Timeblock::Week, true);
        a.set(Timeblock::Sunday, true);
        let mask = a.to_mask();
        assert_eq!(mask, 0b1100_0000);
        assert_eq!(Availability::from_mask(mask), a);
        assert!(!Availability::from_mask(mask).get(Timeblock::Monday));
    }

    #[test]
    fn bit_lookup_is_bounds_checked() {
        assert_eq!(Timeblock::from_bit(7), Some(Timeblock::Week));
        assert_eq!(Timeblock::from_bit(8), None);
        assert_eq!(Availability::none().get_bit(8), None);
    }

    #[test]
    fn week_covers_mondays_only() {
        // 2026-10-19 is a Monday.
        assert!(Timeblock::Week.covers(date(2026, 10, 19)));
        assert!(!Timeblock::Week.covers(date(2026, 10, 20)));
        assert!(Timeblock::Tuesday.covers(date(2026, 10, 20)));
        assert_eq!(Timeblock::of_date(date(2026, 10, 18)), Timeblock::Sunday);
    }

    #[test]
    fn every_day_selection_excludes_week() {
        let blocks = TimeblockSelection::EveryDay.blocks();
        assert_eq!(blocks.len(), 7);
        assert!(!blocks.contains(&Timeblock::Week));
    }

    #[test]
    fn parses_names_and_prefixes() {
        assert_eq!("week".parse::<Timeblock>(), Ok(Timeblock::Week));
        assert_eq!("Wed".parse::<Timeblock>(), Ok(Timeblock::Wednesday));
        assert_eq!(" friday ".parse::<Timeblock>(), Ok(Timeblock::Friday));
        assert!("mo".parse::<Timeblock>().is_err());
        assert!("someday".parse::<Timeblock>().is_err());
    }

    #[test]
    fn serde_uses_display_names() {
        assert_eq!(serde_json::to_string(&Timeblock::Week).unwrap(), "\"WEEK\"");
        assert_eq!(serde_json::to_string(&Timeblock::Monday).unwrap(), "\"Monday\"");
    }
}
