//! TF-IDF index used when no embedding backend is available.
//!
//! Weighting follows the common smoothed scheme: raw term counts multiplied
//! by `ln((1 + n) / (1 + df)) + 1`, then each vector L2-normalised. Because
//! both sides are unit length, cosine similarity reduces to a sparse dot
//! product.

mod stop_words;

pub use stop_words::ENGLISH_STOP_WORDS;

use fancy_regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::index::Hit;
use crate::{KbError, Result};

/// Runs of two or more word characters
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

type SparseVector = Vec<(usize, f32)>;

#[derive(Debug)]
pub struct LexicalIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    document_vectors: Vec<SparseVector>,
    tokenizer: Tokenizer,
}

#[derive(Debug)]
struct Tokenizer {
    pattern: Regex,
    stop_words: HashSet<&'static str>,
}

impl Tokenizer {
    fn new() -> Result<Self> {
        let pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| KbError::IndexBuild(format!("Invalid token pattern: {}", e)))?;

        Ok(Self {
            pattern,
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
        })
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let lowered = text.to_lowercase();
        let mut tokens = Vec::new();

        for found in self.pattern.find_iter(&lowered) {
            let token = found
                .map_err(|e| KbError::Query(format!("Tokenization failed: {}", e)))?
                .as_str();
            if !self.stop_words.contains(token) {
                tokens.push(token.to_string());
            }
        }

        Ok(tokens)
    }
}

impl LexicalIndex {
    /// Fit the vocabulary and weights on `corpus`
    #[inline]
    pub fn build(corpus: &Corpus) -> Result<Self> {
        if corpus.is_empty() {
            return Err(KbError::IndexBuild(
                "Cannot build a TF-IDF index over an empty corpus".to_string(),
            ));
        }

        let tokenizer = Tokenizer::new()?;
        let tokenized = corpus
            .documents()
            .iter()
            .map(|document| tokenizer.tokenize(document))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| KbError::IndexBuild(e.to_string()))?;

        // Sorted terms give a deterministic dimension order
        let mut terms: Vec<&str> = tokenized
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        terms.sort_unstable();

        if terms.is_empty() {
            return Err(KbError::IndexBuild(
                "Empty vocabulary; the corpus only contains stop words".to_string(),
            ));
        }

        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(dimension, term)| (term.to_string(), dimension))
            .collect();

        let mut document_frequency = vec![0_usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: HashSet<usize> = tokens.iter().map(|t| vocabulary[t.as_str()]).collect();
            for dimension in unique {
                document_frequency[dimension] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf: Vec<f32> = document_frequency
            .iter()
            .map(|&df| (((1.0 + n) / (1.0 + df as f64)).ln() + 1.0) as f32)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            document_vectors: Vec::with_capacity(corpus.len()),
            tokenizer,
        };
        let document_vectors: Vec<SparseVector> =
            tokenized.iter().map(|tokens| index.weigh(tokens)).collect();
        index.document_vectors = document_vectors;

        info!(
            "Built TF-IDF index over {} documents with {} terms",
            index.document_vectors.len(),
            index.vocabulary.len()
        );

        Ok(index)
    }

    /// Up to `k` documents with positive cosine similarity to `text`.
    ///
    /// Results are ordered by descending score; equal scores keep corpus order.
    #[inline]
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<Hit>> {
        let query_vector = self.vectorize(text)?;
        if query_vector.is_empty() || k == 0 {
            debug!("Query shares no vocabulary with the corpus");
            return Ok(Vec::new());
        }

        let query_weights: HashMap<usize, f32> = query_vector.into_iter().collect();

        let mut hits: Vec<Hit> = self
            .document_vectors
            .iter()
            .enumerate()
            .map(|(document_id, vector)| Hit {
                document_id,
                score: vector
                    .iter()
                    .filter_map(|(dimension, weight)| {
                        query_weights.get(dimension).map(|q| q * weight)
                    })
                    .sum(),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        // Stable sort keeps insertion order among ties
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        debug!("Lexical query matched {} documents", hits.len());
        Ok(hits)
    }

    /// Project `text` into the frozen vocabulary; unknown terms are dropped
    #[inline]
    pub fn vectorize(&self, text: &str) -> Result<Vec<(usize, f32)>> {
        let tokens = self.tokenizer.tokenize(text)?;
        Ok(self.weigh(&tokens))
    }

    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        self.document_vectors.len()
    }

    #[inline]
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&dimension| self.idf[dimension])
    }

    fn weigh<S: AsRef<str>>(&self, tokens: &[S]) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(&dimension) = self.vocabulary.get(token.as_ref()) {
                *counts.entry(dimension).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(dimension, count)| (dimension, count * self.idf[dimension]))
            .collect();
        vector.sort_unstable_by_key(|&(dimension, _)| dimension);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut vector {
                *weight /= norm;
            }
        }

        vector
    }
}
