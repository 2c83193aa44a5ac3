use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::attendance::Clock;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub clock: Box<dyn Clock>,
    /// Person ids in the order last listed; positions resolve against this.
    /// `None` means the full roster.
    pub view: Option<Vec<String>>,
}

impl AppState {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            workspace: None,
            db: None,
            clock,
            view: None,
        }
    }
}
