//! Bank holidays for England & Wales, the calendar the ICE Brent contract
//! trades against.
//!
//! The table is generated from rules rather than shipped as data: fixed-date
//! holidays with substitute days, Easter-relative holidays, "n-th Monday"
//! holidays, and a short list of one-off proclamations.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Default year range of the generated table.
pub const DEFAULT_YEARS: RangeInclusive<i32> = 1970..=2025;

/// One-off bank holidays proclaimed for a single year.
const SPECIAL_DAYS: &[(i32, u32, u32, &str)] = &[
    (1973, 11, 14, "Wedding of Princess Anne"),
    (1977, 6, 7, "Silver Jubilee of Elizabeth II"),
    (1981, 7, 29, "Wedding of Charles and Diana"),
    (1999, 12, 31, "Millennium Celebrations"),
    (2002, 6, 3, "Golden Jubilee of Elizabeth II"),
    (2011, 4, 29, "Wedding of William and Catherine"),
    (2012, 6, 5, "Diamond Jubilee of Elizabeth II"),
    (2022, 6, 3, "Platinum Jubilee of Elizabeth II"),
    (2022, 9, 19, "State Funeral of Queen Elizabeth II"),
    (2023, 5, 8, "Coronation of Charles III"),
];

/// Read-only set of non-trading dates, each with a name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar {
    /// England & Wales bank holidays for every year in `years`.
    pub fn united_kingdom(years: RangeInclusive<i32>) -> Self {
        let mut calendar = Self::default();
        for year in years {
            calendar.add_uk_year(year);
        }
        tracing::debug!(
            holidays = calendar.len(),
            first = ?calendar.days.keys().next(),
            last = ?calendar.days.keys().next_back(),
            "built UK holiday calendar"
        );
        calendar
    }

    pub fn from_dates<I, S>(dates: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S)>,
        S: Into<String>,
    {
        Self {
            days: dates.into_iter().map(|(d, n)| (d, n.into())).collect(),
        }
    }

    /// Exact-date membership. Holiday effect windows play no part here.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn name(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }

    /// All dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.days.iter().map(|(d, n)| (*d, n.as_str()))
    }

    pub fn in_year(&self, year: i32) -> impl Iterator<Item = (NaiveDate, &str)> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
        self.days.range(start..=end).map(|(d, n)| (*d, n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn insert(&mut self, date: Option<NaiveDate>, name: &str) {
        if let Some(date) = date {
            self.days.entry(date).or_insert_with(|| name.to_string());
        }
    }

    /// Add `date` and, when it falls on a weekend, its substitute: the next
    /// weekday that is not already a holiday.
    fn insert_with_substitute(&mut self, date: Option<NaiveDate>, name: &str) {
        let Some(date) = date else { return };
        self.insert(Some(date), name);
        if !is_weekend(date) {
            return;
        }
        let mut observed = date + Duration::days(1);
        while is_weekend(observed) || self.contains(observed) {
            observed += Duration::days(1);
        }
        self.insert(Some(observed), &format!("{} (observed)", name));
    }

    fn add_uk_year(&mut self, year: i32) {
        let ymd = |m, d| NaiveDate::from_ymd_opt(year, m, d);

        if year >= 1974 {
            self.insert_with_substitute(ymd(1, 1), "New Year's Day");
        }

        if let Some(easter) = easter_sunday(year) {
            self.insert(Some(easter - Duration::days(2)), "Good Friday");
            self.insert(Some(easter + Duration::days(1)), "Easter Monday");
            if year < 1971 {
                self.insert(Some(easter + Duration::days(50)), "Whit Monday");
            }
        }

        if year >= 1978 {
            let may_day = match year {
                1995 | 2020 => ymd(5, 8),
                _ => nth_weekday(year, 5, Weekday::Mon, 1),
            };
            self.insert(may_day, "May Day");
        }

        if year >= 1971 {
            let spring = match year {
                1977 => ymd(6, 6),
                2002 | 2012 => ymd(6, 4),
                2022 => ymd(6, 2),
                _ => last_weekday(year, 5, Weekday::Mon),
            };
            self.insert(spring, "Spring Bank Holiday");
            self.insert(last_weekday(year, 8, Weekday::Mon), "Late Summer Bank Holiday");
        } else {
            self.insert(nth_weekday(year, 8, Weekday::Mon, 1), "Summer Bank Holiday");
        }

        for &(y, m, d, name) in SPECIAL_DAYS.iter().filter(|s| s.0 == year) {
            self.insert(NaiveDate::from_ymd_opt(y, m, d), name);
        }

        // Christmas first so Boxing Day's substitute skips past Christmas's
        self.insert(ymd(12, 25), "Christmas Day");
        self.insert(ymd(12, 26), "Boxing Day");
        for (m, d, name) in [(12, 25, "Christmas Day"), (12, 26, "Boxing Day")] {
            let date = ymd(m, d);
            if date.is_some_and(is_weekend) {
                self.insert_with_substitute(date, name);
            }
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Easter Sunday in the Gregorian calendar (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let mut date = NaiveDate::from_ymd_opt(next_year, next_month, 1)? - Duration::days(1);
    while date.weekday() != weekday {
        date -= Duration::days(1);
    }
    Some(date)
}
