use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateArgError {
    #[error("date must be dd-MM-yyyy: {0}")]
    BadDate(String),
    #[error("month must be MM-yyyy: {0}")]
    BadMonth(String),
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DateArgError> {
    let t = s.trim();
    // chrono accepts single-digit fields; require the fixed width.
    if t.len() != 10 {
        return Err(DateArgError::BadDate(t.to_string()));
    }
    NaiveDate::parse_from_str(t, DATE_FORMAT).map_err(|_| DateArgError::BadDate(t.to_string()))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Human form used in ledger listings, e.g. `5 Jan 2025`.
pub fn format_date_long(d: NaiveDate) -> String {
    d.format("%-d %b %Y").to_string()
}

/// A calendar month, written `MM-yyyy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && NaiveDate::from_ymd_opt(year, month, 1).is_some() {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn parse(s: &str) -> Result<Self, DateArgError> {
        let t = s.trim();
        let bad = || DateArgError::BadMonth(t.to_string());
        let Some((m, y)) = t.split_once('-') else {
            return Err(bad());
        };
        if m.len() != 2 || y.len() != 4 {
            return Err(bad());
        }
        let month = m.parse::<u32>().map_err(|_| bad())?;
        let year = y.parse::<i32>().map_err(|_| bad())?;
        Self::new(year, month).ok_or_else(bad)
    }

    pub fn days_in_month(self) -> u32 {
        let leap = (self.year % 4 == 0 && self.year % 100 != 0) || self.year % 400 == 0;
        match self.month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if leap => 29,
            _ => 28,
        }
    }

    /// Every day from the 1st through the last day of the month.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let Self { year, month } = self;
        (1..=self.days_in_month()).filter_map(move |d| NaiveDate::from_ymd_opt(year, month, d))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_width_dates() {
        let d = parse_date("29-12-2025").expect("date");
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
        assert_eq!(format_date(d), "29-12-2025");
        assert!(parse_date("2025-12-29").is_err());
        assert!(parse_date("1-1-2025").is_err());
        assert!(parse_date("31-02-2025").is_err());
    }

    #[test]
    fn long_form_drops_leading_zero() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_date_long(d), "5 Jan 2025");
    }

    #[test]
    fn month_enumerates_whole_calendar_month() {
        let jan = Month::parse("01-2025").expect("month");
        assert_eq!(jan.to_string(), "01-2025");
        assert_eq!(jan.days().count(), 31);
        assert_eq!(Month::parse("02-2024").unwrap().days().count(), 29);
        assert_eq!(Month::parse("02-2100").unwrap().days().count(), 28);
        assert_eq!(Month::parse("04-2025").unwrap().days().last().map(format_date), Some("30-04-2025".to_string()));
    }

    #[test]
    fn rejects_bad_months() {
        assert!(Month::parse("13-2025").is_err());
        assert!(Month::parse("2025-01").is_err());
        assert!(Month::parse("1-2025").is_err());
    }
}
