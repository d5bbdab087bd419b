//! Writers that persist a finished [`TranscriptDocument`].

use crate::error::Result;
use crate::pipeline::types::TranscriptDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence collaborator for job results.
pub trait DocumentWriter {
    fn write(&self, document: &TranscriptDocument) -> Result<()>;

    /// Where the document ends up, for user-facing messages.
    fn path(&self) -> &Path;
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Plain-text export: `full_text`, then the summary after a blank line when present.
pub struct TextWriter {
    path: PathBuf,
}

impl TextWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn render(document: &TranscriptDocument) -> String {
        match &document.summary {
            Some(summary) => format!("{}\n\n{}\n", document.full_text, summary),
            None => format!("{}\n", document.full_text),
        }
    }
}

impl DocumentWriter for TextWriter {
    fn write(&self, document: &TranscriptDocument) -> Result<()> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, Self::render(document))?;
        log::info!("Wrote text to {}", self.path.display());
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Pretty-printed JSON record with every field present (`null` when absent).
pub struct JsonWriter {
    path: PathBuf,
}

impl JsonWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentWriter for JsonWriter {
    fn write(&self, document: &TranscriptDocument) -> Result<()> {
        ensure_parent(&self.path)?;
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, json)?;
        log::info!("Wrote JSON result to {}", self.path.display());
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn full_document() -> TranscriptDocument {
        TranscriptDocument {
            full_text: "ذهب الطالب إلى المدرسة".to_string(),
            summary: Some("طالب في المدرسة".to_string()),
            lemmas: Some(vec!["ذهب".to_string(), "طالب".to_string()]),
            detected_words: Some(BTreeSet::from(["طالب".to_string()])),
        }
    }

    #[test]
    fn test_text_render_without_summary() {
        assert_eq!(TextWriter::render(&TranscriptDocument::new("hello")), "hello\n");
    }

    #[test]
    fn test_text_render_with_summary() {
        let mut doc = TranscriptDocument::new("body");
        doc.summary = Some("short".to_string());
        assert_eq!(TextWriter::render(&doc), "body\n\nshort\n");
    }

    #[test]
    fn test_json_writer_creates_parent_and_keeps_arabic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results").join("result.json");
        let writer = JsonWriter::new(&path);

        writer.write(&full_document()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("ذهب الطالب"), "non-ASCII must not be escaped");
        let back: TranscriptDocument = serde_json::from_str(&written).unwrap();
        assert_eq!(back, full_document());
        assert_eq!(writer.path(), path.as_path());
    }

    #[test]
    fn test_json_writer_writes_null_for_absent_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.json");

        JsonWriter::new(&path)
            .write(&TranscriptDocument::new("only text"))
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(object["summary"].is_null());
        assert!(object["lemmas"].is_null());
        assert!(object["detected_words"].is_null());
    }

    #[test]
    fn test_text_writer_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "stale content that is longer").unwrap();

        TextWriter::new(&path)
            .write(&TranscriptDocument::new("fresh"))
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
