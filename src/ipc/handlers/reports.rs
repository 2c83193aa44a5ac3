use crate::dates::{parse_date, Month};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, get_required_str, load_view};
use crate::ipc::types::{AppState, Request};
use crate::report::ReportRequest;
use crate::selection::parse_selection;
use crate::sink::{FsReportSink, ReportSink};
use serde_json::json;

use super::setup::{load_section, SetupSection};

fn parse_month(params: &serde_json::Value) -> Result<Month, HandlerErr> {
    Ok(Month::parse(&get_required_str(params, "month")?)?)
}

fn parse_class_label(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let label = get_required_str(params, "classLabel")?.trim().to_string();
    if label.is_empty() {
        return Err(HandlerErr::bad_params("classLabel must not be empty"));
    }
    Ok(label)
}

fn parse_report_request(method: &str, params: &serde_json::Value) -> Result<ReportRequest, HandlerErr> {
    match method {
        "reports.individualsMonthly" => Ok(ReportRequest::IndividualsMonthly {
            selection: parse_selection(&get_required_str(params, "indices")?)?,
            month: parse_month(params)?,
        }),
        "reports.classDaily" => Ok(ReportRequest::ClassDaily {
            class_label: parse_class_label(params)?,
            date: parse_date(&get_required_str(params, "date")?)?,
        }),
        "reports.classMonthly" => Ok(ReportRequest::ClassMonthly {
            class_label: parse_class_label(params)?,
            month: parse_month(params)?,
        }),
        other => Err(HandlerErr::bad_params(format!("unknown report: {}", other))),
    }
}

/// Renders the requested report against the displayed roster and stores it
/// under the workspace's configured report folder.
fn export_report(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let Some(workspace) = state.workspace.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let request = parse_report_request(&req.method, &req.params)?;

    let settings = load_section(conn, SetupSection::Reports).map_err(HandlerErr::db_query)?;
    let output_dir = settings
        .get("outputDir")
        .and_then(|v| v.as_str())
        .unwrap_or("reports")
        .to_string();
    let include_empty_class = settings
        .get("includeEmptyClass")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    // Class reports pick students from the whole roster; individual reports
    // resolve positions against what is displayed.
    let roster = match &request {
        ReportRequest::IndividualsMonthly { .. } => load_view(conn, state.view.as_deref())?,
        _ => load_view(conn, None)?,
    };
    let report = request.render(&roster)?;
    if report.rows == 0 && !include_empty_class {
        if let Some(label) = request.class_label() {
            return Err(HandlerErr::new("not_found", format!("no students in class {}", label))
                .with_details(json!({ "classLabel": label })));
        }
    }

    let sink = FsReportSink::new(workspace.join(output_dir));
    let path = sink.store(&report.csv, &report.file_name)?;
    Ok(json!({
        "path": path.to_string_lossy(),
        "fileName": report.file_name,
        "rows": report.rows
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.individualsMonthly" | "reports.classDaily" | "reports.classMonthly" => {
            Some(match export_report(state, req) {
                Ok(v) => ok(&req.id, v),
                Err(e) => e.response(&req.id),
            })
        }
        _ => None,
    }
}
