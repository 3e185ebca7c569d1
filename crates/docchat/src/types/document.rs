//! Document, chunk, and upload types

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// JSON document
    Json,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::Txt,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "json" => Self::Json,
            "xlsx" => Self::Xlsx,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Txt => "Text File",
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Json => "JSON",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
            Self::Unknown => "Unknown",
        }
    }
}

/// A bounded, sentence-aligned text segment plus metadata; the atomic unit
/// of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique chunk ID
    pub id: String,
    /// Owning user (namespace key)
    pub user_id: String,
    /// Path of the source file
    pub source_path: String,
    /// Source filename
    pub filename: String,
    /// File extension including the leading dot (e.g. ".pdf")
    pub file_type: String,
    /// Position within the source file
    pub chunk_index: u32,
    /// Text content
    pub content: String,
}

impl Chunk {
    /// Create a new chunk for a source file.
    ///
    /// The id carries a random suffix so re-ingesting a same-named file
    /// never collides with chunks already stored.
    pub fn new(user_id: &str, source_path: &Path, chunk_index: u32, content: String) -> Self {
        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_type = source_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();

        Self {
            id: format!("{}_{}_{}_{}", user_id, filename, chunk_index, suffix),
            user_id: user_id.to_string(),
            source_path: source_path.to_string_lossy().to_string(),
            filename,
            file_type,
            chunk_index,
            content,
        }
    }
}

/// A file physically stored in a user's uploads directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Full path on disk
    pub path: std::path::PathBuf,
    /// Filename (unique within the user's directory)
    pub filename: String,
    /// Size in bytes
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_extension() {
        assert_eq!(FileType::from_extension("txt"), FileType::Txt);
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("docx"), FileType::Docx);
        assert_eq!(FileType::from_extension("exe"), FileType::Unknown);
        assert!(!FileType::Unknown.is_supported());
    }

    #[test]
    fn chunk_ids_are_unique_per_ingestion() {
        let path = Path::new("uploads/user_USR0001/notes.txt");
        let a = Chunk::new("USR0001", path, 0, "hello".to_string());
        let b = Chunk::new("USR0001", path, 0, "hello".to_string());

        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("USR0001_notes.txt_0_"));
        assert_eq!(a.file_type, ".txt");
        assert_eq!(a.filename, "notes.txt");
    }
}
