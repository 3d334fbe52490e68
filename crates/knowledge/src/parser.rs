//! Source file parsing and text extraction.
//!
//! Only plain-text formats are understood here. Binary formats (PDF, office
//! documents, images, audio) belong to an external extractor plugged in
//! through [`TextExtractor`].

use consult_core::{AppError, AppResult};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
    Json,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") => Self::PlainText,
            Some("json") => Self::Json,
            _ => Self::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Turns a file into plain text for ingestion.
pub trait TextExtractor: Send + Sync {
    /// # Errors
    /// `InvalidArgument("unsupported format")` for formats the extractor does
    /// not handle; `Io` if the file cannot be read.
    fn extract_text(&self, path: &Path) -> AppResult<String>;

    /// Whether `path` has a format this extractor handles.
    fn supports(&self, path: &Path) -> bool;
}

/// Built-in extractor for `.txt`, `.md` and `.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> AppResult<String> {
        match ContentType::from_path(path) {
            ContentType::Markdown => Ok(clean_markdown(&fs::read_to_string(path)?)),
            ContentType::PlainText => Ok(fs::read_to_string(path)?),
            ContentType::Json => json_to_text(&fs::read_to_string(path)?).map_err(|e| {
                AppError::InvalidArgument(format!("Malformed JSON in {}: {}", path.display(), e))
            }),
            ContentType::Unsupported => Err(AppError::InvalidArgument(format!(
                "unsupported format: {}",
                path.display()
            ))),
        }
    }

    fn supports(&self, path: &Path) -> bool {
        ContentType::from_path(path).is_supported()
    }
}

/// Flatten a JSON array of objects into text.
///
/// Each object's string values are joined with a space; objects are
/// separated by a blank line. Non-object entries and non-string values are
/// ignored.
pub fn json_to_text(raw: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;

    let entries = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let texts: Vec<String> = entries
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            object
                .values()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(texts.join("\n\n"))
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("file.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("FAQ.TXT")),
            ContentType::PlainText
        );
        assert_eq!(
            ContentType::from_path(Path::new("data.json")),
            ContentType::Json
        );
        assert_eq!(
            ContentType::from_path(Path::new("report.pdf")),
            ContentType::Unsupported
        );
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_json_to_text() {
        let raw = r#"[
            {"title": "Royalties", "body": "Paid monthly", "rate": 6},
            "not an object",
            {"count": 3},
            {"title": "Territory"}
        ]"#;
        let text = json_to_text(raw).unwrap();
        assert_eq!(text, "Royalties Paid monthly\n\nTerritory");
    }

    #[test]
    fn test_extract_plain_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("faq.txt");
        fs::write(&path, "What is a franchise?").unwrap();

        let text = PlainTextExtractor.extract_text(&path).unwrap();
        assert_eq!(text, "What is a franchise?");
    }

    #[test]
    fn test_unsupported_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();

        let result = PlainTextExtractor.extract_text(&path);
        assert!(matches!(result, Err(AppError::InvalidArgument(msg)) if msg.contains("unsupported format")));
        assert!(!PlainTextExtractor.supports(&path));
    }

    #[test]
    fn test_malformed_json_is_invalid_argument() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "[{").unwrap();

        let result = PlainTextExtractor.extract_text(&path);
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }
}
