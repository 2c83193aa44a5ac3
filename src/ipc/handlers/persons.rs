use crate::db;
use crate::dates::parse_date;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, get_required_position, get_required_str, load_view, person_json, resolve_position};
use crate::ipc::types::{AppState, Request};
use crate::roster::{name_matches, Person, Role};
use serde_json::json;
use uuid::Uuid;

fn parse_keywords(params: &serde_json::Value) -> Result<Vec<String>, HandlerErr> {
    let Some(v) = params.get("keywords") else {
        return Ok(Vec::new());
    };
    if v.is_null() {
        return Ok(Vec::new());
    }
    if let Some(s) = v.as_str() {
        return Ok(s.split_whitespace().map(|w| w.to_string()).collect());
    }
    let Some(arr) = v.as_array() else {
        return Err(HandlerErr::bad_params("keywords must be a string or an array of strings"));
    };
    Ok(arr
        .iter()
        .filter_map(|k| k.as_str().map(|s| s.to_string()))
        .collect())
}

/// Lists the roster, optionally narrowed, and makes the result the displayed
/// view that positions refer to.
fn persons_list(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let keywords = parse_keywords(params)?;
    let class_label = params.get("classLabel").and_then(|v| v.as_str());
    let conn = db_conn(state)?;
    let listed: Vec<Person> = load_view(conn, None)?
        .into_iter()
        .filter(|p| name_matches(&p.name, &keywords))
        .filter(|p| class_label.map(|c| p.class_label == c).unwrap_or(true))
        .collect();

    let persons_json: Vec<serde_json::Value> = listed
        .iter()
        .enumerate()
        .map(|(i, p)| person_json(i + 1, p))
        .collect();
    let filtered = !keywords.is_empty() || class_label.is_some();
    state.view = if filtered {
        Some(listed.iter().map(|p| p.id.clone()).collect())
    } else {
        None
    };
    Ok(json!({ "persons": persons_json, "filtered": filtered }))
}

fn persons_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let name = get_required_str(params, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    let role_raw = get_required_str(params, "role")?;
    let role = Role::parse(&role_raw)
        .ok_or_else(|| HandlerErr::bad_params("role must be one of: student, colleague"))?;
    let birth_date = parse_date(&get_required_str(params, "birthDate")?)?;
    let class_label = params
        .get("classLabel")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let person = Person::new(Uuid::new_v4().to_string(), name, role, birth_date, class_label);
    db::insert_person(conn, &person).map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string()).with_details(json!({ "table": "persons" }))
    })?;
    tracing::info!(person_id = %person.id, role = role.as_str(), "person created");
    state.view = None;
    Ok(json!({ "personId": person.id, "name": person.name }))
}

fn persons_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let position = get_required_position(params, "index")?;
    let conn = db_conn(state)?;
    let roster = load_view(conn, state.view.as_deref())?;
    let person = resolve_position(&roster, position)?;
    db::delete_person(conn, &person.id).map_err(HandlerErr::db_update)?;
    let (person_id, name) = (person.id.clone(), person.name.clone());
    if let Some(view) = state.view.as_mut() {
        view.retain(|id| *id != person_id);
    }
    Ok(json!({ "personId": person_id, "name": name }))
}

fn respond(
    req: &Request,
    result: Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "persons.list" => Some(respond(req, persons_list(state, &req.params))),
        "persons.create" => Some(respond(req, persons_create(state, &req.params))),
        "persons.delete" => Some(respond(req, persons_delete(state, &req.params))),
        _ => None,
    }
}
