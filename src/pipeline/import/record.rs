use std::path::{Path, PathBuf};

use super::ImportError;

const MAX_RECORD_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// A narrative medical record as supplied by the reviewer.
///
/// Opaque text: no structure is assumed beyond optional section headings.
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalRecord {
    text: String,
    source: Option<PathBuf>,
}

impl MedicalRecord {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// Load a record from a plain-text file.
    ///
    /// Rejects files over 10MB, invalid UTF-8, and content that is mostly
    /// control characters. A leading byte-order mark is dropped.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_RECORD_SIZE {
            return Err(ImportError::FileTooLarge {
                size_mb: size as f64 / (1024.0 * 1024.0),
                max_mb: MAX_RECORD_SIZE / (1024 * 1024),
            });
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ImportError::NotText(format!("{}: {e}", path.display())))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text).to_string();

        if !is_likely_text(&text) {
            return Err(ImportError::NotText(path.display().to_string()));
        }

        tracing::info!(
            path = %path.display(),
            chars = text.chars().count(),
            "Medical record loaded"
        );

        Ok(Self {
            text,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the record was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// At least 80% printable characters (or whitespace). Empty text passes.
fn is_likely_text(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return true;
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    printable as f64 / total as f64 > 0.80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.txt");
        std::fs::write(&path, "Patient X died of sepsis.").unwrap();

        let record = MedicalRecord::load(&path).unwrap();
        assert_eq!(record.text(), "Patient X died of sepsis.");
        assert_eq!(record.source(), Some(path.as_path()));
        assert!(!record.is_blank());
    }

    #[test]
    fn load_strips_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        std::fs::write(&path, "\u{feff}Symptoms\n- fever").unwrap();

        let record = MedicalRecord::load(&path).unwrap();
        assert_eq!(record.text(), "Symptoms\n- fever");
    }

    #[test]
    fn load_accepts_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        let record = MedicalRecord::load(&path).unwrap();
        assert!(record.is_blank());
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [0xFF, 0xFE, 0x00, 0xC3, 0x28]).unwrap();

        let err = MedicalRecord::load(&path).unwrap_err();
        assert!(matches!(err, ImportError::NotText(_)));
    }

    #[test]
    fn load_rejects_control_heavy_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.txt");
        std::fs::write(&path, "\u{1}\u{2}\u{3}\u{4}\u{5}ab").unwrap();

        let err = MedicalRecord::load(&path).unwrap_err();
        assert!(matches!(err, ImportError::NotText(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = MedicalRecord::load(Path::new("/nonexistent/record.txt")).unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }

    #[test]
    fn from_text_has_no_source() {
        let record = MedicalRecord::from_text("  \n ");
        assert!(record.source().is_none());
        assert!(record.is_blank());
    }
}
