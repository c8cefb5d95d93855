use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::Embedder;
use crate::{KbError, Result};

/// Deterministic embedder for tests: one dimension per keyword, counting
/// case-insensitive occurrences, plus a bias dimension so no vector is zero.
pub(crate) struct KeywordEmbedder {
    keywords: Vec<&'static str>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub(crate) fn new(keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.to_vec(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(KbError::EmbeddingService(
                "connection refused".to_string(),
            ));
        }

        let lowered = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|keyword| lowered.matches(keyword).count() as f32)
            .collect();
        vector.push(1.0);
        Ok(vector)
    }
}
