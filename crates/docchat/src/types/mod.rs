//! Core data types

pub mod chat;
pub mod document;

pub use chat::{ChatMessage, ChatMode, ChatRecord, ChatRole, UserRecord};
pub use document::{Chunk, FileType, UploadedFile};
