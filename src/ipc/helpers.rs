use crate::db;
use crate::dates::format_date;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::roster::Person;
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;

pub fn db_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// A 1-based position, as a JSON number or a numeric string.
pub fn get_required_position(params: &serde_json::Value, key: &str) -> Result<usize, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    let n = match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n > 0 => Ok(n as usize),
        _ => Err(HandlerErr::new(
            "invalid_selection",
            format!("invalid index: {}", v),
        )),
    }
}

/// Persons in the currently displayed order, ledgers included.
pub fn load_view(conn: &Connection, view: Option<&[String]>) -> Result<Vec<Person>, HandlerErr> {
    let all = db::load_persons(conn).map_err(HandlerErr::db_query)?;
    let Some(ids) = view else {
        return Ok(all);
    };
    let mut by_id: HashMap<String, Person> = all.into_iter().map(|p| (p.id.clone(), p)).collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

pub fn resolve_position(roster: &[Person], position: usize) -> Result<&Person, HandlerErr> {
    position
        .checked_sub(1)
        .and_then(|i| roster.get(i))
        .ok_or_else(|| {
            HandlerErr::new(
                "position_out_of_range",
                format!("the person index provided is invalid: {}", position),
            )
            .with_details(json!({ "position": position }))
        })
}

pub fn person_json(position: usize, p: &Person) -> serde_json::Value {
    json!({
        "position": position,
        "id": p.id,
        "name": p.name,
        "role": p.role.as_str(),
        "birthDate": format_date(p.birth_date),
        "classLabel": p.class_label,
        "attendanceCount": p.attendance().len()
    })
}
