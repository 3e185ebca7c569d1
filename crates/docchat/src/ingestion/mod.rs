//! Document ingestion pipeline: extraction, chunking, orchestration

mod chunker;
mod parser;
mod pipeline;

pub use chunker::SentenceChunker;
pub use parser::{Extracted, FileParser};
pub use pipeline::{IngestPipeline, IngestReport, SkippedFile};
