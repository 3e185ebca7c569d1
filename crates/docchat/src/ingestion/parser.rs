//! Multi-format file content extraction

use calamine::Reader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Outcome of extracting a file's content.
///
/// "No content" is an ordinary result, not an error: unsupported and empty
/// files are skipped by the caller while the rest of a batch proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Normalized plain-text content
    Content(String),
    /// Unsupported format or nothing extractable
    Empty,
}

impl Extracted {
    /// Get the extracted text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Content(text) => Some(text),
            Self::Empty => None,
        }
    }
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Extract normalized plain text from a file.
    ///
    /// Unsupported extensions yield `Extracted::Empty`. Read or parse
    /// failures are returned as errors for the caller to report; they are
    /// recoverable at the batch level.
    pub fn extract(path: &Path) -> Result<Extracted> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let file_type = FileType::from_path(path);
        if !file_type.is_supported() {
            return Ok(Extracted::Empty);
        }

        let data = std::fs::read(path)?;

        let text = match file_type {
            FileType::Txt => Self::parse_text(&data),
            FileType::Pdf => Self::parse_pdf(&filename, &data)?,
            FileType::Docx => Self::parse_docx(&filename, &data)?,
            FileType::Json => Self::parse_json(&filename, &data)?,
            FileType::Xlsx => Self::parse_xlsx(&filename, &data)?,
            FileType::Unknown => String::new(),
        };

        if text.trim().is_empty() {
            Ok(Extracted::Empty)
        } else {
            Ok(Extracted::Content(text))
        }
    }

    /// Plain text, read verbatim as UTF-8
    fn parse_text(data: &[u8]) -> String {
        String::from_utf8_lossy(data).to_string()
    }

    /// PDF: page texts in page order, newline-separated
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))
    }

    /// DOCX: paragraph texts in document order, newline-separated
    fn parse_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();

        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// JSON: parse and re-serialize with stable indentation, so chunking
    /// sees the same layout regardless of input compactness
    fn parse_json(filename: &str, data: &[u8]) -> Result<String> {
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;
        serde_json::to_string_pretty(&value)
            .map_err(|e| Error::file_parse(filename, e.to_string()))
    }

    /// XLSX: per sheet, a header line then one line per row with cells
    /// joined by " | "; empty cells render as empty strings
    fn parse_xlsx(filename: &str, data: &[u8]) -> Result<String> {
        let cursor = std::io::Cursor::new(data);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();

        for sheet_name in workbook.sheet_names().to_vec() {
            if let Ok(range) = workbook.worksheet_range(&sheet_name) {
                content.push_str(&format!("--- Sheet: {} ---\n", sheet_name));

                for row in range.rows() {
                    let row_text: Vec<String> = row
                        .iter()
                        .map(|cell| match cell {
                            calamine::Data::Empty => String::new(),
                            calamine::Data::String(s) => s.clone(),
                            calamine::Data::Float(f) => f.to_string(),
                            calamine::Data::Int(i) => i.to_string(),
                            calamine::Data::Bool(b) => b.to_string(),
                            calamine::Data::DateTime(dt) => dt.to_string(),
                            _ => String::new(),
                        })
                        .collect();

                    content.push_str(&row_text.join(" | "));
                    content.push('\n');
                }
            }
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn txt_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeting.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "Hello world. Second sentence.").unwrap();

        let extracted = FileParser::extract(&path).unwrap();
        assert_eq!(extracted.text(), Some("Hello world. Second sentence."));
    }

    #[test]
    fn json_is_normalized_to_pretty_print() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"b":1,"a":[1,2]}"#).unwrap();

        let extracted = FileParser::extract(&path).unwrap();
        let text = extracted.text().unwrap();
        assert!(text.contains("\n"));
        assert!(text.contains("  \"a\": ["));

        // same document, different input formatting, same output
        let path2 = dir.path().join("data2.json");
        std::fs::write(&path2, "{\n  \"b\": 1,\n  \"a\": [1, 2]\n}").unwrap();
        let extracted2 = FileParser::extract(&path2).unwrap();
        assert_eq!(extracted.text(), extracted2.text());
    }

    #[test]
    fn unsupported_extension_yields_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.exe");
        std::fs::write(&path, b"\x4d\x5a binary").unwrap();

        assert_eq!(FileParser::extract(&path).unwrap(), Extracted::Empty);
    }

    #[test]
    fn empty_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "").unwrap();

        assert_eq!(FileParser::extract(&path).unwrap(), Extracted::Empty);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = Path::new("/nonexistent/nowhere.txt");
        assert!(FileParser::extract(path).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(FileParser::extract(&path).is_err());
    }
}
