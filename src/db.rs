use crate::attendance::{AttendanceLedger, AttendanceStatus};
use crate::roster::{Person, Role};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

const DB_FILE: &str = "rollcall.sqlite3";
const ISO_DATE: &str = "%Y-%m-%d";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS persons(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            class_label TEXT NOT NULL DEFAULT '',
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_persons_sort ON persons(sort_order)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_persons_class ON persons(class_label)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_records(
            person_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            PRIMARY KEY(person_id, date),
            FOREIGN KEY(person_id) REFERENCES persons(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_records_date ON attendance_records(date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value_json FROM settings WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s).with_context(|| format!("settings {} is not valid json", key))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

fn parse_iso(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, ISO_DATE).with_context(|| format!("bad stored date {}", s))
}

fn load_ledgers(conn: &Connection) -> anyhow::Result<HashMap<String, Vec<(NaiveDate, AttendanceStatus)>>> {
    let mut stmt = conn.prepare("SELECT person_id, date, status FROM attendance_records")?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_person: HashMap<String, Vec<(NaiveDate, AttendanceStatus)>> = HashMap::new();
    for (person_id, date, status) in rows {
        let status = AttendanceStatus::parse(&status)
            .ok_or_else(|| anyhow!("bad stored status {} for {}", status, person_id))?;
        by_person
            .entry(person_id)
            .or_default()
            .push((parse_iso(&date)?, status));
    }
    Ok(by_person)
}

/// Every person with their ledger, in roster order.
pub fn load_persons(conn: &Connection) -> anyhow::Result<Vec<Person>> {
    let mut ledgers = load_ledgers(conn)?;
    let mut stmt = conn.prepare(
        "SELECT id, name, role, birth_date, class_label
         FROM persons
         ORDER BY sort_order, rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, name, role, birth_date, class_label) in rows {
        let role = Role::parse(&role).ok_or_else(|| anyhow!("bad stored role {} for {}", role, id))?;
        let ledger = AttendanceLedger::from_entries(ledgers.remove(&id).unwrap_or_default());
        out.push(
            Person::new(id, name, role, parse_iso(&birth_date)?, class_label).with_attendance(ledger),
        );
    }
    Ok(out)
}

pub fn insert_person(conn: &Connection, person: &Person) -> anyhow::Result<()> {
    let next_sort: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM persons",
        [],
        |r| r.get(0),
    )?;
    conn.execute(
        "INSERT INTO persons(id, name, role, birth_date, class_label, sort_order)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &person.id,
            &person.name,
            person.role.as_str(),
            person.birth_date.format(ISO_DATE).to_string(),
            &person.class_label,
            next_sort,
        ),
    )?;
    Ok(())
}

pub fn delete_person(conn: &Connection, person_id: &str) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance_records WHERE person_id = ?", [person_id])?;
    tx.execute("DELETE FROM persons WHERE id = ?", [person_id])?;
    tx.commit()?;
    Ok(())
}

/// Replaces the stored records of one person with the ledger's current state.
pub fn save_ledger(conn: &Connection, person: &Person) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance_records WHERE person_id = ?", [&person.id])?;
    for (date, status) in person.attendance().snapshot() {
        tx.execute(
            "INSERT INTO attendance_records(person_id, date, status) VALUES(?, ?, ?)",
            (&person.id, date.format(ISO_DATE).to_string(), status.as_str()),
        )?;
    }
    tx.commit()?;
    Ok(())
}
