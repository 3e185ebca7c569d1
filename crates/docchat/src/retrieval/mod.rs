//! Retrieval-augmented context assembly

mod composer;

pub use composer::{Retrieval, RetrievalComposer};
