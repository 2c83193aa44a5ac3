use crate::attendance::{check_bounds, AttendanceLedger, AttendanceStatus, Clock, LedgerError};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Colleague,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Colleague => "colleague",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "colleague" => Some(Role::Colleague),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub birth_date: NaiveDate,
    pub class_label: String,
    attendance: AttendanceLedger,
}

impl Person {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        birth_date: NaiveDate,
        class_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            birth_date,
            class_label: class_label.into(),
            attendance: AttendanceLedger::new(),
        }
    }

    pub fn with_attendance(mut self, ledger: AttendanceLedger) -> Self {
        self.attendance = ledger;
        self
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn attendance(&self) -> &AttendanceLedger {
        &self.attendance
    }

    pub fn mark_attendance(
        &mut self,
        date: NaiveDate,
        status: AttendanceStatus,
        clock: &dyn Clock,
    ) -> Result<(), LedgerError> {
        self.check_writable(date, clock)?;
        self.attendance.put(date, status);
        Ok(())
    }

    pub fn unmark_attendance(&mut self, date: NaiveDate, clock: &dyn Clock) -> Result<(), LedgerError> {
        self.check_writable(date, clock)?;
        self.attendance.remove(date);
        Ok(())
    }

    fn check_writable(&self, date: NaiveDate, clock: &dyn Clock) -> Result<(), LedgerError> {
        if !self.is_student() {
            return Err(LedgerError::NotAStudent);
        }
        check_bounds(date, self.birth_date, clock)
    }
}

/// Case-insensitive whole-word match of any keyword against the name.
pub fn name_matches(name: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let words: Vec<String> = name.split_whitespace().map(|w| w.to_lowercase()).collect();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| words.iter().any(|w| *w == k))
}
