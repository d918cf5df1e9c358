//! deskpilot - CLI entry point
//!
//! Wires configuration, corpus loading, index construction and the
//! orchestrator together, then dispatches to a subcommand or the
//! interactive menu.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use deskpilot::agent::{Orchestrator, OrchestratorConfig};
use deskpilot::cli::{self, Args, Commands};
use deskpilot::config::{Config, EmbeddingBackend};
use deskpilot::corpus::{DirectorySource, DocumentSource};
use deskpilot::providers::{Embedder, GeminiClient, LocalEmbedder};
use deskpilot::rag::{AnswerComposer, Chunker, IndexHandle, PolicyIndex};
use deskpilot::triage::GeminiClassifier;

/// Whole-run timeout for one message
const RUN_TIMEOUT: Duration = Duration::from_secs(120);

struct App {
    orchestrator: Orchestrator,
    index: Arc<IndexHandle>,
    document_count: usize,
    embedder_name: String,
    completion_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_target(false)
        .init();

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(corpus) = &args.corpus {
        config.corpus.folder = corpus.clone();
    }

    let app = bootstrap(&config).await?;

    match args.command {
        Some(Commands::Ask { message }) => {
            let state = app
                .orchestrator
                .process_with_timeout(&message, RUN_TIMEOUT)
                .await;
            cli::print_state(&state);
        }
        Some(Commands::Triage { message }) => {
            let verdict = app.orchestrator.classify_only(&message).await?;
            cli::print_verdict(&verdict);
        }
        Some(Commands::Query { question }) => {
            let grounded = app.orchestrator.answer_only(&question).await?;
            cli::print_answer(&grounded);
        }
        Some(Commands::Info) => print_info(&app),
        None => interactive_menu(&app).await?,
    }

    Ok(())
}

/// Check credentials, load the corpus and build the index once
async fn bootstrap(config: &Config) -> Result<App> {
    // Credentials are required before any orchestration starts.
    let api_key = Config::require_gemini_api_key()?;

    let gemini = Arc::new(GeminiClient::with_models(
        api_key,
        config.models.completion_model.as_str(),
        config.models.gemini_embedding_model.as_str(),
        config.models.temperature,
    ));

    let spinner = progress_spinner("Loading embedding model");
    let embedder: Arc<dyn Embedder> = match config.models.embedding_backend {
        EmbeddingBackend::Local => {
            Arc::new(LocalEmbedder::new().context("failed to load local embedding model")?)
        }
        EmbeddingBackend::Gemini => gemini.clone(),
    };
    spinner.finish_and_clear();

    let documents = DirectorySource::new(&config.corpus.folder)
        .load_all()
        .context("failed to load policy corpus")?;

    let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;

    let spinner = progress_spinner(&format!(
        "Indexing {} policy documents",
        documents.len()
    ));
    let index = PolicyIndex::build(&documents, &chunker, embedder.as_ref())
        .await
        .context("failed to build policy index")?;
    spinner.finish_and_clear();
    println!(
        "{} {} documents, {} chunks indexed",
        "ready:".bold().green(),
        documents.len(),
        index.len()
    );

    let handle = Arc::new(IndexHandle::new(Arc::new(index)));
    let composer = Arc::new(AnswerComposer::new(
        embedder.clone(),
        gemini.clone(),
        handle.clone(),
        config.retrieval.top_k,
    ));
    let classifier = Arc::new(GeminiClassifier::new(gemini.clone()));

    let orchestrator = Orchestrator::new(
        classifier,
        composer,
        OrchestratorConfig {
            max_attempts: config.agent.max_attempts,
            ..OrchestratorConfig::default()
        },
    );

    Ok(App {
        orchestrator,
        index: handle,
        document_count: documents.len(),
        embedder_name: embedder.name().to_string(),
        completion_name: config.models.completion_model.clone(),
    })
}

fn progress_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_info(app: &App) {
    let index = app.index.current();
    println!("{}", "SYSTEM".bold().cyan());
    println!("  documents:  {}", app.document_count);
    println!("  chunks:     {}", index.len());
    println!("  dimensions: {}", index.dimensions());
    println!("  embedder:   {}", app.embedder_name);
    println!("  completion: {}", app.completion_name);
}

async fn interactive_menu(app: &App) -> Result<()> {
    let mut editor = DefaultEditor::new()?;

    loop {
        println!();
        println!("{}", "=".repeat(50).dimmed());
        println!("{}", "DESKPILOT - POLICY SERVICE DESK".bold());
        println!("{}", "=".repeat(50).dimmed());
        println!("1. Ask (triage + grounded answer)");
        println!("2. Triage only");
        println!("3. Policy query only");
        println!("4. System info");
        println!("0. Exit");

        let choice = match editor.readline("> ") {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match choice.as_str() {
            "1" => {
                if let Some(message) = prompt(&mut editor, "Message: ")? {
                    let state = app
                        .orchestrator
                        .process_with_timeout(&message, RUN_TIMEOUT)
                        .await;
                    cli::print_state(&state);
                }
            }
            "2" => {
                if let Some(message) = prompt(&mut editor, "Message: ")? {
                    match app.orchestrator.classify_only(&message).await {
                        Ok(verdict) => cli::print_verdict(&verdict),
                        Err(e) => println!("{} {}", "error:".bold().red(), e),
                    }
                }
            }
            "3" => {
                if let Some(question) = prompt(&mut editor, "Question: ")? {
                    match app.orchestrator.answer_only(&question).await {
                        Ok(grounded) => cli::print_answer(&grounded),
                        Err(e) => println!("{} {}", "error:".bold().red(), e),
                    }
                }
            }
            "4" => print_info(app),
            "0" | "exit" | "quit" => break,
            "" => {}
            other => println!("{} unknown option {:?}", "error:".bold().red(), other),
        }
    }

    println!("bye");
    Ok(())
}

fn prompt(editor: &mut DefaultEditor, label: &str) -> Result<Option<String>> {
    match editor.readline(label) {
        Ok(line) => {
            let line = line.trim().to_string();
            if line.is_empty() {
                println!("{} message cannot be empty", "error:".bold().red());
                Ok(None)
            } else {
                editor.add_history_entry(&line).ok();
                Ok(Some(line))
            }
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
