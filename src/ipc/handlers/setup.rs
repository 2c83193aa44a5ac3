use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};
use std::path::{Component, Path};

#[derive(Clone, Copy)]
pub enum SetupSection {
    Reports,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Reports => "setup.reports",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Reports => json!({
            "outputDir": "reports",
            "includeEmptyClass": true
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool()
        .ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

/// Report folders must stay inside the workspace.
fn parse_relative_dir(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 120)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    let inside = Path::new(&s)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !inside {
        return Err(format!("{} must be a relative path inside the workspace", key));
    }
    Ok(s)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Reports => match k.as_str() {
                "outputDir" => {
                    obj.insert(k.clone(), Value::String(parse_relative_dir(v, k)?));
                }
                "includeEmptyClass" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                _ => return Err(format!("unknown reports field: {}", k)),
            },
        }
    }
    Ok(())
}

pub fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // A malformed stored section is ignored as a whole.
            let mut merged = current.clone();
            if merge_section_patch(section, &mut merged, saved_obj).is_ok() {
                current = merged;
            }
        }
    }
    Ok(current)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let reports = match load_section(conn, SetupSection::Reports) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "reports": reports }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(section = section_raw, "setup updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_must_stay_inside_workspace() {
        let mut current = default_section(SetupSection::Reports);
        let patch = json!({ "outputDir": "../elsewhere" });
        let err = merge_section_patch(SetupSection::Reports, &mut current, patch.as_object().unwrap())
            .unwrap_err();
        assert!(err.contains("inside the workspace"));

        let patch = json!({ "outputDir": "exports/attendance", "includeEmptyClass": false });
        merge_section_patch(SetupSection::Reports, &mut current, patch.as_object().unwrap())
            .expect("valid patch");
        assert_eq!(current["outputDir"], "exports/attendance");
        assert_eq!(current["includeEmptyClass"], false);
    }

    #[test]
    fn malformed_stored_section_loads_as_defaults() {
        let dir = std::env::temp_dir().join(format!(
            "rollcalld-setup-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let conn = db::open_db(&dir).expect("open");

        // includeEmptyClass sorts first and is valid; outputDir then fails.
        let saved = json!({ "includeEmptyClass": false, "outputDir": "../outside" });
        db::settings_set_json(&conn, SetupSection::Reports.key(), &saved).expect("save");
        let loaded = load_section(&conn, SetupSection::Reports).expect("load");
        assert_eq!(loaded, default_section(SetupSection::Reports));

        let saved = json!({ "includeEmptyClass": false, "outputDir": "out" });
        db::settings_set_json(&conn, SetupSection::Reports.key(), &saved).expect("save");
        let loaded = load_section(&conn, SetupSection::Reports).expect("load");
        assert_eq!(loaded["includeEmptyClass"], false);
        assert_eq!(loaded["outputDir"], "out");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut current = default_section(SetupSection::Reports);
        let patch = json!({ "fontScale": 3 });
        assert!(merge_section_patch(SetupSection::Reports, &mut current, patch.as_object().unwrap())
            .is_err());
    }
}
