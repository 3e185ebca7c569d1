//! docchat CLI
//!
//! Run with: cargo run -p docchat -- chat

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use docchat::accounts::AccountManager;
use docchat::config::AppConfig;
use docchat::embeddings::{EmbeddingProvider, HashingEmbedder, OllamaEmbedder};
use docchat::generation::{ChatBackend, GenerationParams, OllamaChat, PromptBuilder};
use docchat::index::DocumentIndex;
use docchat::ingestion::{IngestPipeline, IngestReport};
use docchat::retrieval::{Retrieval, RetrievalComposer};
use docchat::session::ChatSession;
use docchat::storage::ChatDb;
use docchat::types::{ChatMessage, ChatMode, ChatRole};
use docchat::uploads::UploadStore;

#[derive(Parser)]
#[command(name = "docchat", about = "Retrieval-augmented chat over your own documents")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session
    Chat,
    /// Ingest files into a user's document collection, optionally asking
    /// one grounded question afterwards
    Ingest {
        /// User id (e.g. USR0001)
        #[arg(long)]
        user: String,
        /// Question to answer from the ingested documents
        #[arg(long)]
        ask: Option<String>,
        /// Files to ingest
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    let db = Arc::new(ChatDb::new(&config.storage.database_path)?);
    let uploads = Arc::new(UploadStore::new(&config.storage.uploads_dir));

    // Prefer Ollama embeddings; fall back to local hashing so retrieval
    // keeps working offline.
    let ollama_up = probe_ollama(&config.llm.base_url).await;
    let embedder: Arc<dyn EmbeddingProvider> = if ollama_up {
        Arc::new(OllamaEmbedder::new(&config.llm)?)
    } else {
        tracing::warn!(
            "Ollama not available at {}; using local hashing embeddings",
            config.llm.base_url
        );
        tracing::warn!("To use model embeddings and generation:");
        tracing::warn!("  1. Install: https://ollama.com/download");
        tracing::warn!("  2. Start: ollama serve");
        tracing::warn!(
            "  3. Pull models: ollama pull {} && ollama pull {}",
            config.llm.embed_model,
            config.llm.generate_model
        );
        Arc::new(HashingEmbedder::default())
    };

    let index = Arc::new(DocumentIndex::new(embedder));
    let backend: Arc<dyn ChatBackend> = Arc::new(OllamaChat::new(&config.llm)?);

    match cli.command {
        Command::Chat => run_chat(&config, db, uploads, index, backend).await,
        Command::Ingest { user, ask, files } => {
            run_ingest(&config, index, backend, &user, ask.as_deref(), &files).await
        }
    }
}

async fn probe_ollama(base_url: &str) -> bool {
    match reqwest::Client::new()
        .get(format!("{}/api/tags", base_url))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

async fn run_chat(
    config: &AppConfig,
    db: Arc<ChatDb>,
    uploads: Arc<UploadStore>,
    index: Arc<DocumentIndex>,
    backend: Arc<dyn ChatBackend>,
) -> anyhow::Result<()> {
    let accounts = AccountManager::new(db.clone(), uploads.clone());

    println!("docchat - chat with your documents");
    println!("----------------------------------");

    let user = loop {
        let choice = prompt("Login or register? (l/r): ")?;
        let result = match choice.trim() {
            "l" => {
                let email = prompt("Email: ")?;
                let user_id = prompt("User ID: ")?;
                accounts.login(&email, &user_id)
            }
            "r" => {
                let username = prompt("Name: ")?;
                let email = prompt("Email: ")?;
                accounts.register(&username, &email)
            }
            _ => continue,
        };

        match result {
            Ok(user) => break user,
            Err(e) => println!("{}", e),
        }
    };

    println!("Welcome, {}! Your user ID is {}.", user.username, user.user_id);
    print_help();

    let mut session = ChatSession::new(user, config, index, backend, db.clone());

    loop {
        let line = prompt(&format!("[{}] you> ", session.mode().as_str()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().next() {
            Some("/exit") | Some("/quit") => break,
            Some("/help") => print_help(),
            Some("/global") => {
                session.set_mode(ChatMode::Global);
                println!("Switched to global mode.");
            }
            Some("/local") => {
                session.set_mode(ChatMode::Local);
                println!("Switched to local mode. Answers come from your documents.");
            }
            Some("/new") => {
                session.new_chat();
                println!("Started a new chat.");
            }
            Some("/upload") => {
                let path = line.trim_start_matches("/upload").trim();
                if path.is_empty() {
                    println!("Usage: /upload <path>");
                    continue;
                }
                upload_and_ingest(&mut session, &uploads, PathBuf::from(path)).await;
            }
            Some("/files") => match uploads.list(&session.user().user_id) {
                Ok(files) if files.is_empty() => println!("No uploaded files."),
                Ok(files) => {
                    for file in files {
                        println!("  {} ({:.1} KB)", file.filename, file.size as f64 / 1024.0);
                    }
                }
                Err(e) => println!("Could not list files: {}", e),
            },
            Some("/clear-docs") => {
                let confirm = prompt("Delete ALL your documents and uploads? (y/n): ")?;
                if confirm.trim().eq_ignore_ascii_case("y") {
                    match session.clear_documents(&uploads).await {
                        Ok(removed) => println!("Cleared documents ({} files removed).", removed),
                        Err(e) => println!("Could not clear documents: {}", e),
                    }
                }
            }
            Some("/history") => match db.list_chats(&session.user().user_id) {
                Ok(chats) if chats.is_empty() => println!("No chat history yet."),
                Ok(chats) => {
                    for (i, chat) in chats.iter().enumerate() {
                        println!(
                            "  {}. [{}] {} - {}",
                            i + 1,
                            chat.mode.as_str(),
                            chat.title,
                            chat.timestamp.format("%d %b %H:%M")
                        );
                    }
                    let pick = prompt("Load chat number (or Enter to skip): ")?;
                    if let Ok(n) = pick.trim().parse::<usize>() {
                        if n >= 1 && n <= chats.len() {
                            session.load_chat(chats[n - 1].clone());
                            println!("Loaded '{}'.", session.title());
                            for message in session.transcript() {
                                print_message(message.role, &message.content);
                            }
                        }
                    }
                }
                Err(e) => println!("Could not list chats: {}", e),
            },
            _ => match session.send(line).await {
                Ok(turn) => {
                    if turn.fallback {
                        println!("(generation unavailable, showing document content)");
                    }
                    print_message(ChatRole::Assistant, &turn.answer);
                }
                Err(e) => println!("Error: {}", e),
            },
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn upload_and_ingest(
    session: &mut ChatSession,
    uploads: &UploadStore,
    path: PathBuf,
) {
    let filename = match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => {
            println!("Not a file path: {}", path.display());
            return;
        }
    };

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            println!("Could not read {}: {}", path.display(), e);
            return;
        }
    };

    let stored = match uploads.save(&session.user().user_id, &filename, &data) {
        Ok(stored) => stored,
        Err(e) => {
            println!("Could not store upload: {}", e);
            return;
        }
    };

    match session.ingest_files(&[stored]).await {
        Ok(report) => print_report(&report),
        Err(e) => println!("Ingestion failed: {}", e),
    }
}

async fn run_ingest(
    config: &AppConfig,
    index: Arc<DocumentIndex>,
    backend: Arc<dyn ChatBackend>,
    user_id: &str,
    ask: Option<&str>,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    if files.is_empty() {
        anyhow::bail!("no files given; usage: docchat ingest --user USR0001 <files...>");
    }

    let handle = index.ensure_namespace(user_id);
    let pipeline = IngestPipeline::new(&config.chunking);

    let report = pipeline.ingest(files, &index, &handle, user_id).await?;
    print_report(&report);

    if let Some(question) = ask {
        let composer = RetrievalComposer::new(config.retrieval.top_k);
        match composer.compose(&index, &handle, question).await? {
            Retrieval::Grounded { context } => {
                let messages = vec![ChatMessage::user(PromptBuilder::grounded(question, &context))];
                let params = GenerationParams {
                    max_tokens: config.llm.max_tokens,
                    temperature: config.llm.temperature_local,
                    top_p: config.llm.top_p,
                };
                match backend.complete(&messages, &params).await {
                    Ok(answer) => println!("\n{}", answer),
                    Err(e) => {
                        println!("(generation unavailable: {})", e);
                        println!("\n{}", context);
                    }
                }
            }
            Retrieval::NoRelevantInformation => {
                println!("No relevant information found in the ingested documents.");
            }
        }
    }

    Ok(())
}

fn print_report(report: &IngestReport) {
    if report.no_valid_content() {
        println!("No valid content found in provided files.");
    } else {
        println!(
            "Added {} document chunks from {} files.",
            report.chunks_added, report.files_indexed
        );
    }
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.filename, skipped.reason);
    }
}

fn print_message(role: ChatRole, content: &str) {
    match role {
        ChatRole::User => println!("you> {}", content),
        ChatRole::Assistant => println!("bot> {}", content),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /global        answer from the model alone");
    println!("  /local         answer only from your documents");
    println!("  /upload <path> upload and index a document");
    println!("  /files         list your uploaded files");
    println!("  /clear-docs    delete all your documents");
    println!("  /history       list and load past chats");
    println!("  /new           start a new chat");
    println!("  /exit          quit");
    println!("Anything else is sent as a chat message.");
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}
