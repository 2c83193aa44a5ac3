use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write report {}: {source}", .path.to_string_lossy())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable destination for generated report text.
pub trait ReportSink {
    /// Stores `csv` under a name derived from `suggested_file_name` and
    /// returns the absolute path written. Existing files are never replaced.
    fn store(&self, csv: &str, suggested_file_name: &str) -> Result<PathBuf, SinkError>;
}

pub struct FsReportSink {
    dir: PathBuf,
}

impl FsReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// `report.csv` -> `report(2).csv`; names without an extension get the
/// suffix appended.
fn numbered_name(file_name: &str, n: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}({}).{}", stem, n, ext),
        _ => format!("{}({})", file_name, n),
    }
}

fn first_free_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 2usize;
    loop {
        let candidate = dir.join(numbered_name(file_name, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

impl ReportSink for FsReportSink {
    fn store(&self, csv: &str, suggested_file_name: &str) -> Result<PathBuf, SinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let dir = std::fs::canonicalize(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let out = first_free_path(&dir, suggested_file_name);
        // Fails rather than clobbering a file created after the scan.
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&out)
            .map_err(|source| SinkError::Io {
                path: out.clone(),
                source,
            })?;
        std::io::Write::write_all(&mut file, csv.as_bytes()).map_err(|source| SinkError::Io {
            path: out.clone(),
            source,
        })?;
        tracing::info!(path = %out.to_string_lossy(), bytes = csv.len(), "report stored");
        Ok(out)
    }
}
