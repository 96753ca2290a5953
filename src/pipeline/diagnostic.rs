//! Pipeline diagnostic dump: writes intermediate artifacts to disk.
//!
//! Lets an operator inspect exactly what was extracted, what was sent and
//! what came back for one analysis run.
//!
//! **Activation**: disabled unless a dump directory is passed in (the binary
//! reads it from `CODA_DUMP_DIR`).
//!
//! **Output structure**:
//! ```text
//! {dump_dir}/{run_id}/
//!   00-facts.json
//!   01-request.json
//!   02-response.txt   (success)
//!   02-error.txt      (failure)
//! ```
//!
//! Dumps contain record text. Point the directory somewhere access-controlled.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Returns the dump directory for a run, creating it on first use.
///
/// Returns `None` (with a warning) if directory creation fails. Never
/// panics or blocks the pipeline.
pub fn dump_dir_for(base: &Path, run_id: &Uuid) -> Option<PathBuf> {
    let dir = base.join(run_id.to_string());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "Diagnostic dump: failed to create directory"
        );
        return None;
    }

    Some(dir)
}

/// Write a JSON artifact (any serde-serializable value).
///
/// Uses pretty-printing for human readability. Never panics.
pub fn dump_json<T: serde::Serialize>(dir: &Path, filename: &str, value: &T) {
    let path = dir.join(filename);
    match serde_json::to_string_pretty(value) {
        Ok(json) => match std::fs::write(&path, json.as_bytes()) {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                size = json.len(),
                "Diagnostic dump: JSON written"
            ),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Diagnostic dump: failed to write JSON"
            ),
        },
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to serialize JSON"
        ),
    }
}

/// Write a text artifact (raw response, error description).
///
/// Never panics.
pub fn dump_text(dir: &Path, filename: &str, text: &str) {
    let path = dir.join(filename);
    match std::fs::write(&path, text.as_bytes()) {
        Ok(()) => tracing::debug!(
            path = %path.display(),
            size = text.len(),
            "Diagnostic dump: text written"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to write text"
        ),
    }
}
