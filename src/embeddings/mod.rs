// Embeddings module
// Dense text embeddings for the semantic index, served by Ollama

pub mod ollama;
#[cfg(test)]
pub(crate) mod testing;

pub use ollama::{EmbeddingResult, OllamaClient};

use crate::Result;

/// Source of dense text embeddings.
///
/// Implementations must return vectors of one fixed dimensionality for the
/// lifetime of the process, and report any transport or backend failure as
/// [`crate::KbError::EmbeddingService`] so callers can fall back.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
