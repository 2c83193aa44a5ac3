use crate::attendance::AttendanceStatus;
use crate::bulk::{apply_bulk, BulkAction, BulkOutcome};
use crate::dates::{format_date, parse_date};
use crate::db;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, get_required_position, get_required_str, load_view, resolve_position};
use crate::ipc::types::{AppState, Request};
use crate::selection::parse_selection;
use serde_json::json;

fn parse_status(params: &serde_json::Value) -> Result<AttendanceStatus, HandlerErr> {
    let raw = get_required_str(params, "status")?;
    AttendanceStatus::parse(&raw).ok_or_else(|| {
        HandlerErr::new(
            "invalid_status",
            "status must be one of: present, late, sick, absent",
        )
        .with_details(json!({ "status": raw }))
    })
}

fn outcome_json(outcome: &BulkOutcome) -> serde_json::Value {
    let status = match outcome.action {
        BulkAction::Mark(s) => Some(s.as_str()),
        BulkAction::Unmark => None,
    };
    json!({
        "marked": outcome.marked.len(),
        "requested": outcome.requested,
        "date": format_date(outcome.date),
        "status": status,
        "markedEntries": outcome.marked,
        "skipped": outcome.skipped,
        "message": outcome.summary()
    })
}

/// Runs a bulk mark/unmark against the displayed roster and writes back every
/// ledger it changed, including when the operation aborted partway.
fn attendance_bulk(
    state: &AppState,
    params: &serde_json::Value,
    action_of: impl FnOnce(&serde_json::Value) -> Result<BulkAction, HandlerErr>,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let selection = parse_selection(&get_required_str(params, "indices")?)?;
    let date = parse_date(&get_required_str(params, "date")?)?;
    let action = action_of(params)?;

    let mut roster = load_view(conn, state.view.as_deref())?;
    let before: Vec<_> = roster.iter().map(|p| p.attendance().snapshot()).collect();
    let result = apply_bulk(&selection, date, action, &mut roster, state.clock.as_ref());

    for (person, prior) in roster.iter().zip(before.iter()) {
        if person.attendance().snapshot() != *prior {
            db::save_ledger(conn, person).map_err(|e| {
                HandlerErr::db_update(e).with_details(json!({ "table": "attendance_records" }))
            })?;
        }
    }

    let outcome = result?;
    tracing::info!(
        marked = outcome.marked.len(),
        skipped = outcome.skipped.len(),
        date = %format_date(date),
        "bulk attendance applied"
    );
    Ok(outcome_json(&outcome))
}

/// Writes or clears one person's status for one day. Unlike the bulk path, a
/// refused write is the request's error.
fn attendance_set_person_day(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let position = get_required_position(params, "index")?;
    let date = parse_date(&get_required_str(params, "date")?)?;
    let status = match params.get("status") {
        None | Some(serde_json::Value::Null) => None,
        Some(_) => Some(parse_status(params)?),
    };

    let mut roster = load_view(conn, state.view.as_deref())?;
    resolve_position(&roster, position)?;
    let person = &mut roster[position - 1];
    match status {
        Some(s) => person.mark_attendance(date, s, state.clock.as_ref())?,
        None => person.unmark_attendance(date, state.clock.as_ref())?,
    }
    db::save_ledger(conn, person).map_err(|e| {
        HandlerErr::db_update(e).with_details(json!({ "table": "attendance_records" }))
    })?;
    Ok(json!({
        "personId": person.id,
        "date": format_date(date),
        "status": status.map(AttendanceStatus::as_str)
    }))
}

fn attendance_view(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let position = get_required_position(params, "index")?;
    let roster = load_view(conn, state.view.as_deref())?;
    let person = resolve_position(&roster, position)?;
    let records: Vec<serde_json::Value> = person
        .attendance()
        .snapshot()
        .into_iter()
        .map(|(d, s)| json!({ "date": format_date(d), "status": s.as_str() }))
        .collect();
    Ok(json!({
        "personId": person.id,
        "name": person.name,
        "records": records,
        "display": person.attendance().format_for_display()
    }))
}

fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(respond(
            req,
            attendance_bulk(state, &req.params, |p| parse_status(p).map(BulkAction::Mark)),
        )),
        "attendance.unmark" => Some(respond(
            req,
            attendance_bulk(state, &req.params, |_| Ok(BulkAction::Unmark)),
        )),
        "attendance.setPersonDay" => Some(respond(req, attendance_set_person_day(state, &req.params))),
        "attendance.view" => Some(respond(req, attendance_view(state, &req.params))),
        _ => None,
    }
}
