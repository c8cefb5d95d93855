
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::embeddings::Embedder;
use crate::index::Hit;
use crate::{KbError, Result};

/// Exact nearest-neighbour store over dense vectors.
///
/// Vectors are addressed by insertion position, which is the corpus document
/// id. Distances are squared L2; smaller is more relevant.
#[derive(Debug, Clone, Default)]
pub struct FlatVectorStore {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatVectorStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vector, returning its id. The first insert fixes the dimensionality.
    #[inline]
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<usize> {
        if vector.is_empty() {
            return Err(KbError::IndexBuild(
                "Cannot store a zero-dimensional vector".to_string(),
            ));
        }

        if self.vectors.is_empty() {
            self.dimension = vector.len();
        } else if vector.len() != self.dimension {
            return Err(KbError::IndexBuild(format!(
                "Vector dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// The `k` stored vectors closest to `query`, nearest first; ties keep insertion order
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(KbError::Query(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut hits: Vec<Hit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(document_id, vector)| Hit {
                document_id,
                score: squared_l2(query, vector),
            })
            .collect();

        if hits.iter().any(|hit| hit.score.is_nan()) {
            return Err(KbError::Query(
                "Distance computation produced NaN".to_string(),
            ));
        }

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(k);
        Ok(hits)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Embedding-backed index. Holds the embedder so queries are embedded the
/// same way the corpus was.
pub struct SemanticIndex {
    store: FlatVectorStore,
    embedder: Arc<dyn Embedder>,
}

impl fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SemanticIndex {
    #[inline]
    pub fn build(corpus: &Corpus, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if corpus.is_empty() {
            return Err(KbError::IndexBuild(
                "Cannot build a semantic index over an empty corpus".to_string(),
            ));
        }

        debug!("Embedding {} documents", corpus.len());
        let embeddings = embedder.embed_batch(corpus.documents())?;

        if embeddings.len() != corpus.len() {
            return Err(KbError::IndexBuild(format!(
                "Embedder returned {} vectors for {} documents",
                embeddings.len(),
                corpus.len()
            )));
        }

        let mut store = FlatVectorStore::new();
        for embedding in embeddings {
            store.insert(embedding)?;
        }

        info!(
            "Built semantic index over {} documents ({} dimensions)",
            store.len(),
            store.dimension()
        );

        Ok(Self { store, embedder })
    }

    /// Embed `text` and return the `k` nearest documents.
    ///
    /// Embedder failures come back as [`KbError::EmbeddingService`] untouched;
    /// falling back is the caller's decision.
    #[inline]
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<Hit>> {
        let query_vector = self.embedder.embed(text)?;
        let hits = self.store.search(&query_vector, k)?;
        debug!("Semantic query returned {} documents", hits.len());
        Ok(hits)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        self.store.len()
    }
}
