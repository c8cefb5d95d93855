//! Retrieval engine: picks the semantic or lexical index at startup and
//! degrades to lexical whenever the semantic path fails.
//!
//! `recommend` never returns an error. Every failure ends in either a
//! best-effort lexical answer or a one-line explanatory message.

#[cfg(test)]
mod tests;

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

use crate::config::{Config, MAX_TOP_K};
use crate::corpus::Corpus;
use crate::embeddings::{Embedder, OllamaClient};
use crate::index::{ActiveIndex, Hit, LexicalIndex, SemanticIndex};
use crate::{KbError, Result};

pub const NO_MATCH_MESSAGE: &str = "No relevant articles found in the knowledge base.";
pub const NOT_INITIALIZED_MESSAGE: &str = "Knowledge base not initialized.";

const PROBE_TEXT: &str = "test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Uninitialized,
    SemanticActive,
    LexicalActive,
    /// The corpus could not be loaded or indexed at all
    Degraded,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::SemanticActive => "semantic_active",
            Self::LexicalActive => "lexical_active",
            Self::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

pub struct RetrievalEngine {
    mode: EngineMode,
    corpus: Option<Arc<Corpus>>,
    active: Option<ActiveIndex>,
    /// Built on the first semantic failure and reused afterwards
    fallback: OnceLock<Option<LexicalIndex>>,
    top_k: usize,
}

impl fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("mode", &self.mode)
            .field("documents", &self.corpus_len())
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl RetrievalEngine {
    /// An engine with no index; every query answers with the not-initialized message.
    ///
    /// `top_k` is clamped to `1..=MAX_TOP_K`.
    #[inline]
    pub fn uninitialized(top_k: usize) -> Self {
        Self {
            mode: EngineMode::Uninitialized,
            corpus: None,
            active: None,
            fallback: OnceLock::new(),
            top_k: top_k.clamp(1, MAX_TOP_K),
        }
    }

    /// Build the engine from configuration: Ollama settings, dataset path and `top_k`
    #[inline]
    pub fn connect(config: &Config) -> Self {
        let embedder: Option<Arc<dyn Embedder>> = match OllamaClient::new(&config.ollama) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("Could not create Ollama client: {:#}", e);
                None
            }
        };

        let corpus_path = config.corpus_path();
        let text_column = config.corpus.text_column.clone();

        Self::initialize(
            move || Corpus::load(&corpus_path, &text_column),
            embedder,
            config.retrieval.top_k,
        )
    }

    /// Probe the embedder, load the corpus and build whichever index is usable.
    ///
    /// Any failure on the semantic side selects the lexical index; a corpus
    /// that cannot be loaded or indexed leaves the engine degraded.
    #[inline]
    pub fn initialize<F>(load_corpus: F, embedder: Option<Arc<dyn Embedder>>, top_k: usize) -> Self
    where
        F: FnOnce() -> Result<Corpus>,
    {
        info!("Initializing knowledge base engine");
        let mut engine = Self::uninitialized(top_k);

        let embedder = embedder.and_then(|embedder| match embedder.embed(PROBE_TEXT) {
            Ok(vector) => {
                info!(
                    "Embedding backend reachable ({} dimensions), using semantic search",
                    vector.len()
                );
                Some(embedder)
            }
            Err(e) => {
                warn!("Embedding backend unavailable ({}), using TF-IDF fallback", e);
                None
            }
        });

        let corpus = match load_corpus() {
            Ok(corpus) => Arc::new(corpus),
            Err(e) => {
                error!("Could not load knowledge base: {}", e);
                engine.mode = EngineMode::Degraded;
                return engine;
            }
        };
        engine.corpus = Some(Arc::clone(&corpus));

        if let Some(embedder) = embedder {
            match SemanticIndex::build(&corpus, embedder) {
                Ok(index) => {
                    engine.active = Some(ActiveIndex::Semantic(index));
                    engine.mode = EngineMode::SemanticActive;
                    info!("Semantic knowledge base initialized");
                    return engine;
                }
                Err(e) => warn!("Error building semantic index ({}), using TF-IDF fallback", e),
            }
        }

        match LexicalIndex::build(&corpus) {
            Ok(index) => {
                engine.active = Some(ActiveIndex::Lexical(index));
                engine.mode = EngineMode::LexicalActive;
                info!("TF-IDF knowledge base initialized");
            }
            Err(e) => {
                error!("Could not build TF-IDF index: {}", e);
                engine.mode = EngineMode::Degraded;
            }
        }

        engine
    }

    /// Articles for a ticket, most relevant first, at most `top_k` of them
    #[inline]
    pub fn recommend(&self, ticket_text: &str) -> Vec<String> {
        if ticket_text.trim().is_empty() {
            return Vec::new();
        }

        let Some(active) = self.active.as_ref() else {
            return vec![NOT_INITIALIZED_MESSAGE.to_string()];
        };

        match active.query(ticket_text, self.top_k) {
            Ok(hits) => self.answer(&hits),
            // Every query retries the semantic path first; a failure only
            // affects that query. There is no sticky demotion to lexical mode.
            Err(e) if matches!(active, ActiveIndex::Semantic(_)) => {
                if let KbError::EmbeddingService(detail) = &e {
                    warn!(
                        "Embedding service failed during query ({}), using TF-IDF fallback",
                        detail
                    );
                } else {
                    error!("Semantic retrieval failed ({}), using TF-IDF fallback", e);
                }
                self.recommend_with_fallback(ticket_text)
            }
            Err(e) => lexical_failure(&e),
        }
    }

    #[inline]
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn corpus_len(&self) -> usize {
        self.corpus.as_ref().map_or(0, |corpus| corpus.len())
    }

    #[inline]
    pub fn corpus(&self) -> Option<&Corpus> {
        self.corpus.as_deref()
    }

    fn recommend_with_fallback(&self, text: &str) -> Vec<String> {
        match self.fallback_index() {
            Some(index) => self.recommend_lexical(index, text),
            None => vec![NOT_INITIALIZED_MESSAGE.to_string()],
        }
    }

    fn fallback_index(&self) -> Option<&LexicalIndex> {
        self.fallback
            .get_or_init(|| {
                let corpus = self.corpus.as_ref()?;
                debug!("Building TF-IDF fallback index");
                LexicalIndex::build(corpus)
                    .inspect_err(|e| error!("Could not build TF-IDF fallback index: {}", e))
                    .ok()
            })
            .as_ref()
    }

    fn recommend_lexical(&self, index: &LexicalIndex, text: &str) -> Vec<String> {
        match index.query(text, self.top_k) {
            Ok(hits) => self.answer(&hits),
            Err(e) => lexical_failure(&e),
        }
    }

    fn answer(&self, hits: &[Hit]) -> Vec<String> {
        if hits.is_empty() {
            return vec![NO_MATCH_MESSAGE.to_string()];
        }
        self.documents_for(hits)
    }

    fn documents_for(&self, hits: &[Hit]) -> Vec<String> {
        let Some(corpus) = self.corpus.as_ref() else {
            return vec![NOT_INITIALIZED_MESSAGE.to_string()];
        };

        hits.iter()
            .filter_map(|hit| corpus.get(hit.document_id))
            .map(str::to_string)
            .collect()
    }
}

fn lexical_failure(e: &KbError) -> Vec<String> {
    error!("TF-IDF retrieval failed: {}", e);
    vec![format!("Error in recommendation: {}", e)]
}
