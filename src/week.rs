use std::fmt;

use chrono::{Datelike, NaiveDate};

/// A calendar week as identified by the "YY/WW" keys used in the
/// utilization sheets, e.g. "24/37" for week 37 of 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekKey {
    pub year: i32,
    pub week_number: u32,
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.year % 100, self.week_number)
    }
}

/// Parses a "YY/WW" week key. The two-digit year is anchored to the
/// 2000s. Returns `None` for anything that does not split into exactly
/// two unsigned integer parts; callers skip such keys.
pub fn parse_week_key(key: &str) -> Option<WeekKey> {
    let (year_part, week_part) = key.split_once('/')?;
    let year_suffix: u32 = year_part.parse().ok()?;
    let week_number: u32 = week_part.parse().ok()?;
    Some(WeekKey {
        year: 2000 + year_suffix as i32,
        week_number,
    })
}

/// ISO-8601 week number for a date: weeks run Monday through Sunday and
/// week 1 is the week containing the year's first Thursday.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// The (year, week) pair that week keys are compared against for a
/// reference date. The year is the calendar year, not the ISO week
/// year, matching how the sheet columns are labeled.
pub fn current_year_week(reference: NaiveDate) -> (i32, u32) {
    (reference.year(), iso_week_number(reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_week_keys() {
        assert_eq!(
            parse_week_key("24/37"),
            Some(WeekKey {
                year: 2024,
                week_number: 37
            })
        );
        assert_eq!(
            parse_week_key("26/1"),
            Some(WeekKey {
                year: 2026,
                week_number: 1
            })
        );
    }

    #[test]
    fn rejects_malformed_week_keys() {
        assert_eq!(parse_week_key(""), None);
        assert_eq!(parse_week_key("2437"), None);
        assert_eq!(parse_week_key("24/"), None);
        assert_eq!(parse_week_key("/37"), None);
        assert_eq!(parse_week_key("24/37/1"), None);
        assert_eq!(parse_week_key("xx/37"), None);
        assert_eq!(parse_week_key("24/ 37"), None);
        assert_eq!(parse_week_key("-4/37"), None);
    }

    #[test]
    fn week_key_displays_as_sheet_label() {
        let key = WeekKey {
            year: 2024,
            week_number: 7,
        };
        assert_eq!(key.to_string(), "24/07");
    }

    #[test]
    fn iso_week_matches_reference_tables() {
        // Monday that opens week 1.
        assert_eq!(iso_week_number(date(2024, 1, 1)), 1);
        // Sunday belonging to week 52 of the previous ISO year.
        assert_eq!(iso_week_number(date(2023, 1, 1)), 52);
        // Friday in a 53-week year.
        assert_eq!(iso_week_number(date(2021, 1, 1)), 53);
        assert_eq!(iso_week_number(date(2020, 12, 31)), 53);
        // December days already counted into week 1 of the next year.
        assert_eq!(iso_week_number(date(2024, 12, 30)), 1);
        assert_eq!(iso_week_number(date(2024, 12, 9)), 50);
    }

    #[test]
    fn current_year_week_uses_calendar_year() {
        // 2024-12-30 sits in ISO week 1 of 2025 but the sheets label it
        // under the calendar year.
        assert_eq!(current_year_week(date(2024, 12, 30)), (2024, 1));
        assert_eq!(current_year_week(date(2024, 6, 5)), (2024, 23));
    }
}
