//! Retrieval indices over the knowledge-base corpus.
//!
//! Two implementations share one query surface: [`LexicalIndex`] scores by
//! TF-IDF cosine similarity, [`SemanticIndex`] by embedding distance.
//! [`ActiveIndex`] is the tagged variant the engine dispatches on.

pub mod lexical;
pub mod semantic;

pub use lexical::LexicalIndex;
pub use semantic::{FlatVectorStore, SemanticIndex};

use crate::Result;

/// A ranked reference to a corpus document.
///
/// `score` is index-specific: cosine similarity for lexical hits (higher is
/// better), squared L2 distance for semantic hits (lower is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub document_id: usize,
    pub score: f32,
}

#[derive(Debug)]
pub enum ActiveIndex {
    Lexical(LexicalIndex),
    Semantic(SemanticIndex),
}

impl ActiveIndex {
    /// Best `k` documents for `text`, most relevant first
    #[inline]
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<Hit>> {
        match self {
            Self::Lexical(index) => index.query(text, k),
            Self::Semantic(index) => index.query(text, k),
        }
    }
}
