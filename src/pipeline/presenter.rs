//! Result presentation contract: reveal and export of analysis text.
//!
//! The response text is opaque. It is never parsed or reformatted; it is only
//! split into chunks for progressive display and written out verbatim.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::analysis::{AnalysisReport, AnalysisResult};

/// Default name of the exported report file.
pub const DEFAULT_REPORT_FILENAME: &str = "clinical_analysis_report.txt";

/// Prefix shown in front of a failure description.
const FAILURE_PREFIX: &str = "Error analyzing medical record";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to export: the analysis failed")]
    FailedAnalysis,
}

/// Lazy chunked view over a response text.
///
/// Each item is the next `chunk_chars` characters (fewer for the last chunk),
/// always split on char boundaries. Concatenating every item reproduces the
/// text exactly. A clone resumes from the same position; call [`reveal`]
/// again to start from the beginning.
#[derive(Debug, Clone)]
pub struct RevealChunks<'a> {
    remaining: &'a str,
    chunk_chars: usize,
}

impl<'a> Iterator for RevealChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        let split = self
            .remaining
            .char_indices()
            .nth(self.chunk_chars)
            .map_or(self.remaining.len(), |(idx, _)| idx);
        let (chunk, rest) = self.remaining.split_at(split);
        self.remaining = rest;
        Some(chunk)
    }
}

/// Chunk `text` for progressive display. `chunk_chars` of 0 is treated as 1.
pub fn reveal(text: &str, chunk_chars: usize) -> RevealChunks<'_> {
    RevealChunks {
        remaining: text,
        chunk_chars: chunk_chars.max(1),
    }
}

/// What the review surface shows for one analysis outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation<'a> {
    Report(&'a AnalysisReport),
    Failure(String),
}

impl<'a> Presentation<'a> {
    pub fn from_result(result: &'a AnalysisResult) -> Self {
        match result {
            Ok(report) => Self::Report(report),
            Err(e) => Self::Failure(format!("{FAILURE_PREFIX}: {e}")),
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Report(_) => "Clinical Analysis Results",
            Self::Failure(_) => "Analysis Failed",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Report(report) => &report.text,
            Self::Failure(message) => message,
        }
    }

    pub fn is_exportable(&self) -> bool {
        matches!(self, Self::Report(_))
    }

    pub fn reveal(&self, chunk_chars: usize) -> RevealChunks<'_> {
        reveal(self.text(), chunk_chars)
    }

    /// Export the report verbatim. Failures are never written as reports.
    pub fn export(&self, target: &Path) -> Result<PathBuf, ExportError> {
        match self {
            Self::Report(report) => export_report(target, report),
            Self::Failure(_) => Err(ExportError::FailedAnalysis),
        }
    }
}

/// Resolve where a report goes: a directory, or a path ending in a separator
/// (which may not exist yet), gets the default filename appended. Anything
/// else is used as the file path.
pub fn resolve_export_path(target: &Path) -> PathBuf {
    let names_dir = target
        .to_string_lossy()
        .ends_with(std::path::is_separator);
    if names_dir || target.is_dir() {
        target.join(DEFAULT_REPORT_FILENAME)
    } else {
        target.to_path_buf()
    }
}

/// Write the report text verbatim as a flat text file.
///
/// Returns the path written. Parent directories are created as needed.
pub fn export_report(target: &Path, report: &AnalysisReport) -> Result<PathBuf, ExportError> {
    let path = resolve_export_path(target);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, report.text.as_bytes())?;

    tracing::info!(
        path = %path.display(),
        size = report.text.len(),
        model = %report.model,
        "Analysis report exported"
    );

    Ok(path)
}
