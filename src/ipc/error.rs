use crate::attendance::LedgerError;
use crate::bulk::BulkError;
use crate::dates::DateArgError;
use crate::report::ReportError;
use crate::selection::SelectionError;
use crate::sink::SinkError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// A failed request, before it is wrapped in the response envelope.
#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn db_query(e: impl std::fmt::Display) -> Self {
        Self::new("db_query_failed", e.to_string())
    }

    pub fn db_update(e: impl std::fmt::Display) -> Self {
        Self::new("db_update_failed", e.to_string())
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<SelectionError> for HandlerErr {
    fn from(e: SelectionError) -> Self {
        HandlerErr::new("invalid_selection", e.to_string())
    }
}

impl From<DateArgError> for HandlerErr {
    fn from(e: DateArgError) -> Self {
        HandlerErr::new("invalid_date", e.to_string())
    }
}

impl From<LedgerError> for HandlerErr {
    fn from(e: LedgerError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

impl From<BulkError> for HandlerErr {
    fn from(e: BulkError) -> Self {
        let details = match &e {
            BulkError::PositionOutOfRange(position) => Some(json!({ "position": position })),
            BulkError::NothingMarked { requested, .. } => {
                Some(json!({ "marked": 0, "requested": requested }))
            }
            BulkError::EmptyRoster => None,
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

impl From<ReportError> for HandlerErr {
    fn from(e: ReportError) -> Self {
        match &e {
            ReportError::PositionOutOfRange(position) => {
                HandlerErr::new("position_out_of_range", e.to_string())
                    .with_details(json!({ "position": position }))
            }
        }
    }
}

impl From<SinkError> for HandlerErr {
    fn from(e: SinkError) -> Self {
        match &e {
            SinkError::Io { path, .. } => HandlerErr::new("export_failed", e.to_string())
                .with_details(json!({ "path": path.to_string_lossy() })),
        }
    }
}
