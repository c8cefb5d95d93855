use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::corpus::Corpus;
use crate::embeddings::OllamaClient;
use crate::engine::{EngineMode, RetrievalEngine};
use crate::server::{self, AppState};

/// Command-line overrides applied on top of the configuration file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub corpus: Option<PathBuf>,
    pub port: Option<u16>,
    pub top_k: Option<usize>,
}

impl Overrides {
    #[inline]
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(corpus) = &self.corpus {
            config.corpus.path.clone_from(corpus);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        config
            .validate()
            .context("Invalid command-line overrides")?;
        Ok(())
    }
}

fn load_config(overrides: &Overrides) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;
    overrides.apply(&mut config)?;
    Ok(config)
}

async fn build_engine(config: &Config) -> Result<RetrievalEngine> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || RetrievalEngine::connect(&config))
        .await
        .context("Engine initialization task failed")
}

fn describe_mode(mode: EngineMode) -> &'static str {
    match mode {
        EngineMode::SemanticActive => "semantic search (Ollama embeddings)",
        EngineMode::LexicalActive => "keyword search (TF-IDF fallback)",
        EngineMode::Degraded => "degraded (knowledge base unavailable)",
        EngineMode::Uninitialized => "not initialized",
    }
}

/// Build the engine once and serve it over HTTP
#[inline]
pub async fn serve_http(overrides: Overrides) -> Result<()> {
    let config = load_config(&overrides)?;

    info!(
        "Starting recommendation server with knowledge base {}",
        config.corpus_path().display()
    );

    let engine = build_engine(&config).await?;
    println!("🧠 Knowledge engine ready: {}", describe_mode(engine.mode()));
    if engine.mode() == EngineMode::Degraded {
        warn!("Serving without a knowledge base; every ticket will get an explanatory message");
    }

    let state = AppState {
        engine: Arc::new(engine),
        model: Arc::from(config.ollama.model.as_str()),
    };

    println!(
        "🌐 Listening on http://{} (POST /recommend, GET /)",
        config.server.bind_address()
    );
    println!("Press Ctrl+C to stop the server");

    server::serve(state, &config.server.bind_address()).await?;

    println!("✅ Shutdown complete");
    Ok(())
}

/// Answer a single ticket from the command line
#[inline]
pub async fn recommend_once(ticket: String, overrides: Overrides) -> Result<()> {
    let config = load_config(&overrides)?;
    let engine = build_engine(&config).await?;

    eprintln!("Mode: {}", describe_mode(engine.mode()));

    let recommendations = tokio::task::spawn_blocking(move || engine.recommend(&ticket))
        .await
        .context("Recommendation task failed")?;

    if recommendations.is_empty() {
        println!("Empty ticket; nothing to recommend.");
        return Ok(());
    }

    for (rank, article) in recommendations.iter().enumerate() {
        println!("{}. {}", rank + 1, article);
    }

    Ok(())
}

/// Report backend reachability and dataset health without building an index
#[inline]
pub async fn show_status(overrides: Overrides) -> Result<()> {
    let config = load_config(&overrides)?;

    println!("📊 Knowledge Base Status");
    println!();

    let ollama_config = config.ollama.clone();
    let backend = tokio::task::spawn_blocking(move || {
        OllamaClient::new(&ollama_config).and_then(|client| client.health_check())
    })
    .await
    .context("Health check task failed")?;

    let backend_ok = match backend {
        Ok(()) => {
            println!(
                "✅ Ollama reachable at {}:{} with model {}",
                config.ollama.host, config.ollama.port, config.ollama.model
            );
            true
        }
        Err(e) => {
            println!(
                "⚠️  Ollama unavailable at {}:{}: {:#}",
                config.ollama.host, config.ollama.port, e
            );
            false
        }
    };

    let corpus_path = config.corpus_path();
    let corpus_ok = match Corpus::load(&corpus_path, &config.corpus.text_column) {
        Ok(corpus) if corpus.is_empty() => {
            println!("⚠️  Knowledge base {} has no articles", corpus_path.display());
            false
        }
        Ok(corpus) => {
            println!(
                "✅ Knowledge base {} ({} articles)",
                corpus_path.display(),
                corpus.len()
            );
            true
        }
        Err(e) => {
            println!("❌ {}", e);
            false
        }
    };

    let expected = match (backend_ok, corpus_ok) {
        (_, false) => EngineMode::Degraded,
        (true, true) => EngineMode::SemanticActive,
        (false, true) => EngineMode::LexicalActive,
    };

    println!();
    println!("Expected mode: {}", describe_mode(expected));
    println!("Results per ticket: {}", config.retrieval.top_k);
    println!("Config file: {}", config.config_file_path().display());

    Ok(())
}
