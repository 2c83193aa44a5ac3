use crate::attendance::{AttendanceStatus, Clock, LedgerError};
use crate::dates::format_date;
use crate::roster::Person;
use crate::selection::Selection;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

pub const STUDENTS_ONLY_NOTE: &str = "Attendance can only be recorded for students.";
pub const DATE_RANGE_NOTE: &str = "The date must be between the person's birthday and today.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Mark(AttendanceStatus),
    Unmark,
}

impl BulkAction {
    fn verb(self) -> &'static str {
        match self {
            BulkAction::Mark(_) => "Marked",
            BulkAction::Unmark => "Unmarked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotAStudent,
    DateOutOfBounds,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NotAStudent => "not a student",
            SkipReason::DateOutOfBounds => "date before birthday or after today",
        }
    }
}

impl From<&LedgerError> for SkipReason {
    fn from(e: &LedgerError) -> Self {
        match e {
            LedgerError::NotAStudent => SkipReason::NotAStudent,
            LedgerError::DateOutOfBounds { .. } => SkipReason::DateOutOfBounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedEntry {
    pub position: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub position: usize,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub action: BulkAction,
    pub date: NaiveDate,
    pub requested: usize,
    pub marked: Vec<MarkedEntry>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    #[error("no contacts available")]
    EmptyRoster,
    #[error("the person index provided is invalid: {0}")]
    PositionOutOfRange(usize),
    #[error(
        "{verb} 0 out of {requested} contacts.\n{}\n{}",
        STUDENTS_ONLY_NOTE,
        DATE_RANGE_NOTE
    )]
    NothingMarked { verb: &'static str, requested: usize },
}

impl BulkError {
    pub fn code(&self) -> &'static str {
        match self {
            BulkError::EmptyRoster => "empty_roster",
            BulkError::PositionOutOfRange(_) => "position_out_of_range",
            BulkError::NothingMarked { .. } => "nothing_marked",
        }
    }
}

/// Applies `action` on `date` to every selected position of `roster`, in
/// ascending position order.
///
/// Not transactional: an out-of-range position aborts the call, but people
/// handled before it keep their new ledger state.
pub fn apply_bulk(
    selection: &Selection,
    date: NaiveDate,
    action: BulkAction,
    roster: &mut [Person],
    clock: &dyn Clock,
) -> Result<BulkOutcome, BulkError> {
    if roster.is_empty() {
        return Err(BulkError::EmptyRoster);
    }

    let mut marked = Vec::new();
    let mut skipped = Vec::new();
    for position in selection.iter() {
        let Some(person) = position.checked_sub(1).and_then(|i| roster.get_mut(i)) else {
            return Err(BulkError::PositionOutOfRange(position));
        };
        let result = match action {
            BulkAction::Mark(status) => person.mark_attendance(date, status, clock),
            BulkAction::Unmark => person.unmark_attendance(date, clock),
        };
        match result {
            Ok(()) => marked.push(MarkedEntry {
                position,
                name: person.name.clone(),
            }),
            Err(e) => {
                let reason = SkipReason::from(&e);
                tracing::warn!(position, name = %person.name, reason = reason.as_str(), "skipped");
                skipped.push(SkippedEntry {
                    position,
                    name: person.name.clone(),
                    reason,
                });
            }
        }
    }

    if marked.is_empty() {
        return Err(BulkError::NothingMarked {
            verb: action.verb(),
            requested: selection.len(),
        });
    }

    Ok(BulkOutcome {
        action,
        date,
        requested: selection.len(),
        marked,
        skipped,
    })
}

impl BulkOutcome {
    pub fn summary(&self) -> String {
        let mut out = match self.action {
            BulkAction::Mark(status) => format!(
                "Marked {}/{} contacts as {} on {}:",
                self.marked.len(),
                self.requested,
                status,
                format_date(self.date)
            ),
            BulkAction::Unmark => format!(
                "Unmarked {}/{} contacts on {}:",
                self.marked.len(),
                self.requested,
                format_date(self.date)
            ),
        };
        for m in &self.marked {
            out.push_str(&format!("\n{}. {}", m.position, m.name));
        }
        if !self.skipped.is_empty() {
            out.push_str("\n\nSkipped:");
            for s in &self.skipped {
                out.push_str(&format!("\n{}. {} ({})", s.position, s.name, s.reason.as_str()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::FixedClock;
    use crate::roster::Role;
    use crate::selection::parse_selection;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> FixedClock {
        FixedClock(d(2025, 12, 29))
    }

    fn student(name: &str, class_label: &str) -> Person {
        Person::new(name.to_lowercase(), name, Role::Student, d(2012, 1, 1), class_label)
    }

    fn colleague(name: &str) -> Person {
        Person::new(name.to_lowercase(), name, Role::Colleague, d(1985, 1, 1), "")
    }

    #[test]
    fn marks_two_students_today() {
        let mut roster = vec![student("Alex", "K1A"), student("Bernice", "")];
        let sel = parse_selection("1,2").unwrap();
        let outcome = apply_bulk(
            &sel,
            d(2025, 12, 29),
            BulkAction::Mark(AttendanceStatus::Present),
            &mut roster,
            &today(),
        )
        .expect("bulk mark");
        assert_eq!(outcome.marked.len(), 2);
        assert_eq!(outcome.requested, 2);
        assert!(outcome.skipped.is_empty());
        let summary = outcome.summary();
        assert!(summary.starts_with("Marked 2/2 contacts as PRESENT on 29-12-2025:"));
        assert!(summary.contains("\n1. Alex\n2. Bernice"));
        assert!(!summary.contains("Skipped"));
    }

    #[test]
    fn out_of_range_aborts_but_keeps_earlier_mutations() {
        let mut roster = vec![student("Alex", ""), student("Bernice", "")];
        let sel = parse_selection("1,2,999").unwrap();
        let err = apply_bulk(
            &sel,
            d(2025, 12, 1),
            BulkAction::Mark(AttendanceStatus::Late),
            &mut roster,
            &today(),
        )
        .unwrap_err();
        assert_eq!(err, BulkError::PositionOutOfRange(999));
        for p in &roster {
            assert_eq!(p.attendance().status_on(d(2025, 12, 1)), Some(AttendanceStatus::Late));
        }
    }

    #[test]
    fn only_colleagues_is_a_failure() {
        let mut roster = vec![colleague("Charlotte"), colleague("David")];
        let sel = parse_selection("1-2").unwrap();
        let err = apply_bulk(
            &sel,
            d(2025, 12, 1),
            BulkAction::Mark(AttendanceStatus::Present),
            &mut roster,
            &today(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "nothing_marked");
        let msg = err.to_string();
        assert!(msg.starts_with("Marked 0 out of 2 contacts."));
        assert!(msg.contains(STUDENTS_ONLY_NOTE));
        assert!(msg.contains(DATE_RANGE_NOTE));
    }

    #[test]
    fn skips_are_itemized_with_reasons() {
        let mut young = student("Irfan", "K1A");
        young.birth_date = d(2025, 12, 10);
        let mut roster = vec![colleague("Charlotte"), student("Alex", "K1A"), young];
        let sel = parse_selection("3,1,2").unwrap();
        let outcome = apply_bulk(
            &sel,
            d(2025, 12, 1),
            BulkAction::Mark(AttendanceStatus::Sick),
            &mut roster,
            &today(),
        )
        .expect("bulk mark");
        assert_eq!(outcome.marked, vec![MarkedEntry { position: 2, name: "Alex".into() }]);
        assert_eq!(
            outcome.skipped.iter().map(|s| (s.position, s.reason)).collect::<Vec<_>>(),
            vec![(1, SkipReason::NotAStudent), (3, SkipReason::DateOutOfBounds)]
        );
        let summary = outcome.summary();
        assert!(summary.contains("Marked 1/3 contacts as SICK on 01-12-2025:"));
        assert!(summary.contains("Skipped:\n1. Charlotte (not a student)\n3. Irfan (date before birthday or after today)"));
    }

    #[test]
    fn future_date_marks_nobody() {
        let mut roster = vec![student("Alex", "")];
        let sel = parse_selection("1").unwrap();
        let err = apply_bulk(
            &sel,
            d(2025, 12, 30),
            BulkAction::Mark(AttendanceStatus::Present),
            &mut roster,
            &today(),
        )
        .unwrap_err();
        assert_eq!(err, BulkError::NothingMarked { verb: "Marked", requested: 1 });
        assert!(roster[0].attendance().is_empty());
    }

    #[test]
    fn empty_roster_is_rejected() {
        let sel = parse_selection("1").unwrap();
        let err = apply_bulk(&sel, d(2025, 1, 1), BulkAction::Unmark, &mut [], &today()).unwrap_err();
        assert_eq!(err, BulkError::EmptyRoster);
        assert_eq!(err.to_string(), "no contacts available");
    }

    #[test]
    fn bulk_unmark_clears_entries() {
        let clock = today();
        let mut roster = vec![student("Alex", ""), student("Bernice", "")];
        for p in roster.iter_mut() {
            p.mark_attendance(d(2025, 12, 2), AttendanceStatus::Absent, &clock)
                .unwrap();
        }
        let sel: Selection = [1usize, 2].into_iter().collect();
        let outcome =
            apply_bulk(&sel, d(2025, 12, 2), BulkAction::Unmark, &mut roster, &clock).expect("unmark");
        assert_eq!(outcome.marked.len(), 2);
        assert!(outcome.summary().starts_with("Unmarked 2/2 contacts on 02-12-2025:"));
        assert!(roster.iter().all(|p| p.attendance().is_empty()));
    }
}
