use crate::dates::{format_date, Month};
use crate::roster::Person;
use crate::selection::Selection;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRequest {
    IndividualsMonthly { selection: Selection, month: Month },
    ClassDaily { class_label: String, date: NaiveDate },
    ClassMonthly { class_label: String, month: Month },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub file_name: String,
    pub csv: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("the person index provided is invalid: {0}")]
    PositionOutOfRange(usize),
}

impl ReportRequest {
    pub fn render(&self, roster: &[Person]) -> Result<RenderedReport, ReportError> {
        match self {
            ReportRequest::IndividualsMonthly { selection, month } => {
                individuals_monthly(selection, *month, roster)
            }
            ReportRequest::ClassDaily { class_label, date } => {
                Ok(class_daily(class_label, *date, roster))
            }
            ReportRequest::ClassMonthly { class_label, month } => {
                Ok(class_monthly(class_label, *month, roster))
            }
        }
    }

    pub fn class_label(&self) -> Option<&str> {
        match self {
            ReportRequest::IndividualsMonthly { .. } => None,
            ReportRequest::ClassDaily { class_label, .. }
            | ReportRequest::ClassMonthly { class_label, .. } => Some(class_label),
        }
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn status_cell(person: &Person, date: NaiveDate) -> &'static str {
    person
        .attendance()
        .status_on(date)
        .map(|s| s.as_str())
        .unwrap_or("")
}

fn monthly_header(month: Month) -> String {
    let mut header = String::from("Name,Class");
    for day in month.days() {
        header.push(',');
        header.push_str(&format_date(day));
    }
    header.push('\n');
    header
}

fn monthly_row(person: &Person, month: Month) -> String {
    let mut row = format!("{},{}", csv_quote(&person.name), csv_quote(&person.class_label));
    for day in month.days() {
        row.push(',');
        row.push_str(status_cell(person, day));
    }
    row.push('\n');
    row
}

fn class_members<'a>(class_label: &'a str, roster: &'a [Person]) -> impl Iterator<Item = &'a Person> {
    roster
        .iter()
        .filter(move |p| p.is_student() && p.class_label == class_label)
}

fn file_token(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// One row per selected student with a cell for every day of `month`.
/// Selected people who are not students are left out.
pub fn individuals_monthly(
    selection: &Selection,
    month: Month,
    roster: &[Person],
) -> Result<RenderedReport, ReportError> {
    let mut csv = monthly_header(month);
    let mut rows = 0usize;
    for position in selection.iter() {
        let person = position
            .checked_sub(1)
            .and_then(|i| roster.get(i))
            .ok_or(ReportError::PositionOutOfRange(position))?;
        if !person.is_student() {
            continue;
        }
        csv.push_str(&monthly_row(person, month));
        rows += 1;
    }
    Ok(RenderedReport {
        file_name: format!("attendance_{}.csv", month),
        csv,
        rows,
    })
}

pub fn class_daily(class_label: &str, date: NaiveDate, roster: &[Person]) -> RenderedReport {
    let mut csv = format!("Class attendance on: {}\nName,Status\n", format_date(date));
    let mut rows = 0usize;
    for person in class_members(class_label, roster) {
        csv.push_str(&format!("{},{}\n", csv_quote(&person.name), status_cell(person, date)));
        rows += 1;
    }
    RenderedReport {
        file_name: format!("class_{}_{}.csv", file_token(class_label), format_date(date)),
        csv,
        rows,
    }
}

pub fn class_monthly(class_label: &str, month: Month, roster: &[Person]) -> RenderedReport {
    let mut csv = monthly_header(month);
    let mut rows = 0usize;
    for person in class_members(class_label, roster) {
        csv.push_str(&monthly_row(person, month));
        rows += 1;
    }
    RenderedReport {
        file_name: format!("class_{}_{}.csv", file_token(class_label), month),
        csv,
        rows,
    }
}
