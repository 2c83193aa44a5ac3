use crate::dates::{format_date, format_date_long};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const EMPTY_LEDGER_TEXT: &str = "No attendance recorded";

/// A recorded attendance status. "Unrecorded" is the absence of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Sick,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Sick => "SICK",
            AttendanceStatus::Absent => "ABSENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "late" => Some(Self::Late),
            "sick" => Some(Self::Sick),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of "today" for bounds checks.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("attendance can only be recorded for students")]
    NotAStudent,
    #[error(
        "date {} must be between birthday {} and today {}",
        dmy(.date),
        dmy(.birthdate),
        dmy(.today)
    )]
    DateOutOfBounds {
        date: NaiveDate,
        birthdate: NaiveDate,
        today: NaiveDate,
    },
}

fn dmy(d: &NaiveDate) -> String {
    format_date(*d)
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotAStudent => "not_a_student",
            LedgerError::DateOutOfBounds { .. } => "date_out_of_bounds",
        }
    }
}

/// Checks `birthdate <= date <= today`.
pub fn check_bounds(
    date: NaiveDate,
    birthdate: NaiveDate,
    clock: &dyn Clock,
) -> Result<(), LedgerError> {
    let today = clock.today();
    if date < birthdate || date > today {
        return Err(LedgerError::DateOutOfBounds {
            date,
            birthdate,
            today,
        });
    }
    Ok(())
}

/// Date to status records for one person. Mutation goes through the owning
/// `Person`, which enforces role and date bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceLedger {
    entries: BTreeMap<NaiveDate, AttendanceStatus>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, AttendanceStatus)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub(crate) fn put(&mut self, date: NaiveDate, status: AttendanceStatus) {
        self.entries.insert(date, status);
    }

    pub(crate) fn remove(&mut self, date: NaiveDate) {
        self.entries.remove(&date);
    }

    pub fn status_on(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.entries.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the records, ascending by date.
    pub fn snapshot(&self) -> BTreeMap<NaiveDate, AttendanceStatus> {
        self.entries.clone()
    }

    pub fn format_for_display(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_LEDGER_TEXT.to_string();
        }
        self.entries
            .iter()
            .map(|(d, s)| {
                format!(
                    "{} → {}",
                    format_date_long(*d),
                    s.as_str().to_ascii_lowercase()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn display_is_sorted_regardless_of_insert_order() {
        let mut ledger = AttendanceLedger::new();
        ledger.put(d(2025, 3, 2), AttendanceStatus::Late);
        ledger.put(d(2025, 1, 15), AttendanceStatus::Present);
        ledger.put(d(2025, 2, 1), AttendanceStatus::Sick);
        assert_eq!(
            ledger.format_for_display(),
            "15 Jan 2025 → present\n1 Feb 2025 → sick\n2 Mar 2025 → late"
        );
    }

    #[test]
    fn empty_ledger_uses_placeholder() {
        assert_eq!(AttendanceLedger::new().format_for_display(), EMPTY_LEDGER_TEXT);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut ledger = AttendanceLedger::new();
        ledger.put(d(2025, 1, 1), AttendanceStatus::Absent);
        let mut copy = ledger.snapshot();
        copy.clear();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.status_on(d(2025, 1, 1)), Some(AttendanceStatus::Absent));
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(AttendanceStatus::parse(" Present "), Some(AttendanceStatus::Present));
        assert_eq!(AttendanceStatus::parse("SICK"), Some(AttendanceStatus::Sick));
        assert_eq!(AttendanceStatus::parse("unrecorded"), None);
    }

    #[test]
    fn bounds_are_inclusive() {
        let clock = FixedClock(d(2025, 12, 29));
        let birth = d(2010, 5, 1);
        assert!(check_bounds(birth, birth, &clock).is_ok());
        assert!(check_bounds(d(2025, 12, 29), birth, &clock).is_ok());
        assert!(check_bounds(d(2010, 4, 30), birth, &clock).is_err());
        let err = check_bounds(d(2025, 12, 30), birth, &clock).unwrap_err();
        assert_eq!(err.code(), "date_out_of_bounds");
        assert_eq!(
            err.to_string(),
            "date 30-12-2025 must be between birthday 01-05-2010 and today 29-12-2025"
        );
    }
}
