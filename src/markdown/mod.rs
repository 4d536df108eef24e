//! Document-to-markdown conversion.
//!
//! Stand-in for the MarkItDown library the Python knowledge base calls
//! (`MarkItDown().convert(file_path).text_content`). Dispatches on file
//! extension: PDFs go through `pdf-extract`, spreadsheets through `calamine`,
//! JSON is flattened to `key: value` lines, HTML is tag-stripped, and
//! everything else is read as UTF-8 text.

use std::path::Path;

use calamine::{open_workbook_auto, DataType, Reader};
use serde_json::Value;

use crate::utilities::errors::KnowledgeBaseError;

/// Trait for file-to-text converters.
///
/// The knowledge base renders and ingests sources through this seam so tests
/// and alternative converters can substitute their own implementation.
pub trait DocumentConverter: Send + Sync {
    /// Convert the file at `path` to markdown-ish plain text.
    fn convert(&self, path: &str) -> Result<String, KnowledgeBaseError>;
}

/// Default converter covering text, JSON, CSV, HTML, PDF, and Excel files.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    /// Create a new converter.
    pub fn new() -> Self {
        Self
    }

    fn convert_json(path: &str) -> Result<String, KnowledgeBaseError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeBaseError::conversion(path, e))?;
        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|e| KnowledgeBaseError::conversion(path, e))?;
        Ok(json_to_text(&parsed))
    }

    fn convert_pdf(path: &str) -> Result<String, KnowledgeBaseError> {
        pdf_extract::extract_text(path).map_err(|e| KnowledgeBaseError::conversion(path, e))
    }

    fn convert_spreadsheet(path: &str) -> Result<String, KnowledgeBaseError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| KnowledgeBaseError::conversion(path, e))?;
        let mut out = String::new();
        let sheet_names = workbook.sheet_names().to_vec();
        for name in sheet_names {
            let range = match workbook.worksheet_range(&name) {
                Some(result) => result.map_err(|e| KnowledgeBaseError::conversion(path, e))?,
                None => continue,
            };
            out.push_str(&format!("## {}\n", name));
            for row in range.rows() {
                let cells: Vec<String> = row.iter().map(cell_to_string).collect();
                out.push_str(&cells.join(" | "));
                out.push('\n');
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn convert_html(path: &str) -> Result<String, KnowledgeBaseError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeBaseError::conversion(path, e))?;
        Ok(strip_html_tags(&raw))
    }

    fn convert_text(path: &str) -> Result<String, KnowledgeBaseError> {
        std::fs::read_to_string(path).map_err(|e| KnowledgeBaseError::conversion(path, e))
    }
}

impl DocumentConverter for MarkdownConverter {
    fn convert(&self, path: &str) -> Result<String, KnowledgeBaseError> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        log::debug!("MarkdownConverter: converting '{}' ({})", path, extension);
        match extension.as_str() {
            "pdf" => Self::convert_pdf(path),
            "xlsx" | "xls" | "xlsb" | "ods" => Self::convert_spreadsheet(path),
            "json" => Self::convert_json(path),
            "html" | "htm" => Self::convert_html(path),
            // Markdown, CSV, and plain text pass through unchanged.
            _ => Self::convert_text(path),
        }
    }
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Recursively flatten a JSON value into readable `key: value` lines.
fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(json_to_text).collect::<Vec<_>>().join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, json_to_text(v)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Drop HTML tags and decode the common entities, keeping text content.
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    in_tag = false;
                    out.push(' ');
                } else {
                    out.push('>');
                }
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    decoded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_convert_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "notes.txt", "plain notes");
        let converter = MarkdownConverter::new();
        assert_eq!(converter.convert(&path).unwrap(), "plain notes");
    }

    #[test]
    fn test_convert_markdown_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "doc.md", "# Title\nBody");
        let converter = MarkdownConverter::new();
        assert_eq!(converter.convert(&path).unwrap(), "# Title\nBody");
    }

    #[test]
    fn test_convert_json_flattens() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.json", r#"{"name": "Alice", "age": 30}"#);
        let converter = MarkdownConverter::new();
        let text = converter.convert(&path).unwrap();
        assert!(text.contains("name: Alice"));
        assert!(text.contains("age: 30"));
    }

    #[test]
    fn test_convert_html_strips_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "page.html",
            "<html><body><h1>Hello</h1><p>World &amp; more</p></body></html>",
        );
        let converter = MarkdownConverter::new();
        let text = converter.convert(&path).unwrap();
        assert_eq!(text, "Hello World & more");
    }

    #[test]
    fn test_convert_missing_file_errors() {
        let converter = MarkdownConverter::new();
        let err = converter.convert("/nonexistent/source.txt").unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::Conversion { .. }));
        assert!(err.to_string().contains("/nonexistent/source.txt"));
    }

    #[test]
    fn test_convert_invalid_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "broken.json", "{not json");
        let converter = MarkdownConverter::new();
        assert!(converter.convert(&path).is_err());
    }

    #[test]
    fn test_json_to_text_nested() {
        let json = serde_json::json!({"user": {"name": "Bob"}, "tags": ["x", "y"]});
        let text = json_to_text(&json);
        assert!(text.contains("user: name: Bob"));
        assert!(text.contains("x\ny"));
    }
}
