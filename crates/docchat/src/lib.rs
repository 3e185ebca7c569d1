//! docchat: retrieval-augmented chat with per-user document grounding
//!
//! Users converse with an LLM backend in global (no context) mode or local
//! mode, where answers are grounded in documents they uploaded. Uploaded
//! files are normalized to plain text, chunked on sentence boundaries, and
//! indexed per user; questions retrieve the most similar chunks and wrap
//! them in a constrained grounding prompt.

pub mod accounts;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod retrieval;
pub mod session;
pub mod storage;
pub mod types;
pub mod uploads;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use index::{DocumentIndex, NamespaceHandle, SearchResult};
pub use ingestion::{IngestPipeline, IngestReport};
pub use retrieval::{Retrieval, RetrievalComposer};
pub use session::{ChatSession, ChatTurn};
pub use types::{ChatMessage, ChatMode, Chunk, FileType, UserRecord};
