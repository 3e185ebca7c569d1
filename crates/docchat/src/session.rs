//! Per-user chat session state and turn handling
//!
//! All conversational state lives in an explicit session object owned by
//! the caller; the library keeps no process-wide state.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AppConfig, LlmConfig};
use crate::error::Result;
use crate::generation::{ChatBackend, GenerationParams, PromptBuilder};
use crate::index::{DocumentIndex, NamespaceHandle};
use crate::ingestion::{IngestPipeline, IngestReport};
use crate::retrieval::{Retrieval, RetrievalComposer};
use crate::storage::ChatDb;
use crate::types::{ChatMessage, ChatMode, ChatRecord, UserRecord};
use crate::uploads::UploadStore;

/// Length cap on the excerpt shown when generation fails but retrieval
/// already produced grounded content
const FALLBACK_EXCERPT_CHARS: usize = 1000;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid pattern"));

/// Derive a chat title from the first user message: punctuation stripped,
/// at most five words, capped at 40 characters.
pub fn chat_title(first_message: &str) -> String {
    let clean = NON_WORD.replace_all(first_message, "");
    let words: Vec<&str> = clean.split_whitespace().collect();

    if words.is_empty() {
        return "New Chat".to_string();
    }

    let title = if words.len() <= 5 {
        words.join(" ")
    } else {
        format!("{}...", words[..5].join(" "))
    };

    title.chars().take(40).collect()
}

/// One completed chat turn
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// The assistant's answer
    pub answer: String,
    /// Whether the answer was grounded in retrieved document content
    pub grounded: bool,
    /// Whether the answer is the retrieval fallback after a generation failure
    pub fallback: bool,
}

/// A single user's interactive chat session
pub struct ChatSession {
    user: UserRecord,
    mode: ChatMode,
    transcript: Vec<ChatMessage>,
    title: String,
    chat_id: Option<String>,
    namespace: Option<NamespaceHandle>,
    index: Arc<DocumentIndex>,
    backend: Arc<dyn ChatBackend>,
    db: Arc<ChatDb>,
    composer: RetrievalComposer,
    pipeline: IngestPipeline,
    llm: LlmConfig,
}

impl ChatSession {
    /// Start a session for a logged-in user
    pub fn new(
        user: UserRecord,
        config: &AppConfig,
        index: Arc<DocumentIndex>,
        backend: Arc<dyn ChatBackend>,
        db: Arc<ChatDb>,
    ) -> Self {
        Self {
            user,
            mode: ChatMode::Global,
            transcript: Vec::new(),
            title: "New Chat".to_string(),
            chat_id: None,
            namespace: None,
            index,
            backend,
            db,
            composer: RetrievalComposer::new(config.retrieval.top_k),
            pipeline: IngestPipeline::new(&config.chunking),
            llm: config.llm.clone(),
        }
    }

    /// The logged-in user
    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    /// Current chat mode
    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Current chat title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current transcript
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Switch chat mode. Entering local mode creates the user's document
    /// collection on first entry.
    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
        if mode == ChatMode::Local && self.namespace.is_none() {
            self.namespace = Some(self.index.ensure_namespace(&self.user.user_id));
        }
    }

    /// Start a fresh chat, leaving documents and mode untouched
    pub fn new_chat(&mut self) {
        self.transcript.clear();
        self.title = "New Chat".to_string();
        self.chat_id = None;
    }

    /// Resume a stored chat
    pub fn load_chat(&mut self, record: ChatRecord) {
        self.transcript = record.chat;
        self.title = record.title;
        self.chat_id = Some(record.id);
        self.set_mode(record.mode);
    }

    /// Ingest files into the user's document collection
    pub async fn ingest_files(&mut self, paths: &[PathBuf]) -> Result<IngestReport> {
        let handle = self.ensure_namespace();
        self.pipeline
            .ingest(paths, &self.index, &handle, &self.user.user_id)
            .await
    }

    /// Delete every document the user has: the entire index collection and
    /// all uploaded files. Returns the number of files removed.
    pub async fn clear_documents(&mut self, uploads: &UploadStore) -> Result<usize> {
        let handle = self.ensure_namespace();
        self.index.clear(&handle);
        uploads.clear(&self.user.user_id)
    }

    /// Process one chat turn: retrieve grounding in local mode, call the
    /// generation backend, update and persist the transcript.
    pub async fn send(&mut self, input: &str) -> Result<ChatTurn> {
        self.transcript.push(ChatMessage::user(input));
        if self.transcript.len() == 1 {
            self.title = chat_title(input);
        }

        let grounding = match (self.mode, &self.namespace) {
            (ChatMode::Local, Some(handle)) => {
                match self.composer.compose(&self.index, handle, input).await {
                    Ok(Retrieval::Grounded { context }) => Some(context),
                    Ok(Retrieval::NoRelevantInformation) => None,
                    Err(e) => {
                        // degraded retrieval: answer without documents
                        tracing::warn!(error = %e, "document search failed");
                        None
                    }
                }
            }
            _ => None,
        };

        // Local mode sends one constrained message; global mode sends the
        // whole transcript as conversational context.
        let messages: Vec<ChatMessage> = match (&grounding, self.mode) {
            (Some(context), _) => vec![ChatMessage::user(PromptBuilder::grounded(input, context))],
            (None, ChatMode::Local) => vec![ChatMessage::user(input)],
            (None, ChatMode::Global) => self.transcript.clone(),
        };

        let params = GenerationParams {
            max_tokens: self.llm.max_tokens,
            temperature: match self.mode {
                ChatMode::Local => self.llm.temperature_local,
                ChatMode::Global => self.llm.temperature_global,
            },
            top_p: self.llm.top_p,
        };

        match self.backend.complete(&messages, &params).await {
            Ok(answer) => {
                self.transcript.push(ChatMessage::assistant(answer.clone()));
                self.persist()?;
                Ok(ChatTurn {
                    answer,
                    grounded: grounding.is_some(),
                    fallback: false,
                })
            }
            Err(e) => {
                if let Some(context) = grounding {
                    // the documents already answered; show them instead of
                    // failing the turn
                    tracing::warn!(error = %e, "generation failed, presenting retrieved content");
                    let answer = format!(
                        "Here's what I found in your documents:\n\n{}",
                        excerpt(&context, FALLBACK_EXCERPT_CHARS)
                    );
                    self.transcript.push(ChatMessage::assistant(answer.clone()));
                    self.persist()?;
                    Ok(ChatTurn {
                        answer,
                        grounded: true,
                        fallback: true,
                    })
                } else {
                    Err(e)
                }
            }
        }
    }

    fn ensure_namespace(&mut self) -> NamespaceHandle {
        match &self.namespace {
            Some(handle) => handle.clone(),
            None => {
                let handle = self.index.ensure_namespace(&self.user.user_id);
                self.namespace = Some(handle.clone());
                handle
            }
        }
    }

    /// Write the transcript through to the store: inserted on the first
    /// completed exchange, updated in place afterwards.
    fn persist(&mut self) -> Result<()> {
        match &self.chat_id {
            None => {
                let record = ChatRecord::new(
                    &self.user.user_id,
                    &self.title,
                    self.transcript.clone(),
                    self.mode,
                );
                self.db.insert_chat(&record)?;
                self.chat_id = Some(record.id);
            }
            Some(id) => {
                let record = ChatRecord {
                    id: id.clone(),
                    user_id: self.user.user_id.clone(),
                    title: self.title.clone(),
                    chat: self.transcript.clone(),
                    timestamp: Utc::now(),
                    mode: self.mode,
                };
                self.db.update_chat(&record)?;
            }
        }
        Ok(())
    }
}

/// Truncate to at most `max` bytes on a char boundary, marking the cut
fn excerpt(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
