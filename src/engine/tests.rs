use super::*;
use crate::embeddings::testing::KeywordEmbedder;
use std::sync::atomic::{AtomicBool, Ordering};

fn support_documents() -> Vec<&'static str> {
    vec![
        "Reset your password via the settings menu.",
        "Contact support for billing issues.",
        "Check your internet connection.",
    ]
}

fn support_corpus() -> Result<Corpus> {
    Ok(Corpus::from_documents(support_documents()))
}

fn keyword_embedder() -> Arc<KeywordEmbedder> {
    Arc::new(KeywordEmbedder::new(&["password", "billing", "internet"]))
}

fn semantic_engine(embedder: &Arc<KeywordEmbedder>) -> RetrievalEngine {
    let embedder: Arc<dyn Embedder> = embedder.clone();
    RetrievalEngine::initialize(support_corpus, Some(embedder), 3)
}

fn lexical_engine() -> RetrievalEngine {
    RetrievalEngine::initialize(support_corpus, None, 3)
}

#[test]
fn empty_ticket_returns_empty_list_in_every_mode() {
    let embedder = keyword_embedder();
    let engines = [
        semantic_engine(&embedder),
        lexical_engine(),
        RetrievalEngine::initialize(
            || Err(KbError::DataLoad("missing".to_string())),
            None,
            3,
        ),
        RetrievalEngine::uninitialized(3),
    ];

    for engine in &engines {
        assert!(engine.recommend("").is_empty());
        assert!(engine.recommend("   \n").is_empty());
    }
}

#[test]
fn reachable_backend_activates_semantic_mode() {
    let embedder = keyword_embedder();
    let engine = semantic_engine(&embedder);

    assert_eq!(engine.mode(), EngineMode::SemanticActive);
    assert_eq!(engine.corpus_len(), 3);

    let results = engine.recommend("my internet keeps dropping");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], "Check your internet connection.");
}

#[test]
fn unreachable_backend_activates_lexical_mode() {
    let embedder = keyword_embedder();
    embedder.set_failing(true);
    let engine = semantic_engine(&embedder);

    assert_eq!(engine.mode(), EngineMode::LexicalActive);
    // Probe only; the corpus is never sent to a failing backend
    assert_eq!(embedder.calls(), 1);

    embedder.set_failing(false);
    let results = engine.recommend("I forgot my password");
    assert_eq!(results, vec![support_documents()[0].to_string()]);
    assert_eq!(embedder.calls(), 1);
}

#[test]
fn no_embedder_activates_lexical_mode() {
    let engine = lexical_engine();
    assert_eq!(engine.mode(), EngineMode::LexicalActive);
}

#[test]
fn query_time_failure_matches_lexical_result_and_keeps_mode() {
    let embedder = keyword_embedder();
    let engine = semantic_engine(&embedder);
    let lexical = lexical_engine();

    let ticket = "billing support needed for my invoice";

    embedder.set_failing(true);
    let degraded = engine.recommend(ticket);
    assert_eq!(degraded, lexical.recommend(ticket));
    assert_eq!(engine.mode(), EngineMode::SemanticActive);

    // The next query goes back to the semantic path
    embedder.set_failing(false);
    let calls_before = embedder.calls();
    let recovered = engine.recommend("internet");
    assert_eq!(embedder.calls(), calls_before + 1);
    assert_eq!(recovered[0], "Check your internet connection.");
}

#[test]
fn fallback_without_overlap_returns_no_match_message() {
    let embedder = keyword_embedder();
    let engine = semantic_engine(&embedder);

    embedder.set_failing(true);
    assert_eq!(
        engine.recommend("zxqv blorptang"),
        vec![NO_MATCH_MESSAGE.to_string()]
    );
}

#[test]
fn semantic_build_failure_falls_back_to_lexical() {
    struct ProbeOnly;

    impl Embedder for ProbeOnly {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(KbError::EmbeddingService("batch endpoint missing".to_string()))
        }
    }

    let engine = RetrievalEngine::initialize(support_corpus, Some(Arc::new(ProbeOnly)), 3);
    assert_eq!(engine.mode(), EngineMode::LexicalActive);
    assert_eq!(
        engine.recommend("password reset"),
        vec![support_documents()[0].to_string()]
    );
}

#[test]
fn corpus_load_failure_degrades() {
    let embedder: Arc<dyn Embedder> = keyword_embedder();
    let engine = RetrievalEngine::initialize(
        || Err(KbError::DataLoad("knowledge_base.csv not found".to_string())),
        Some(embedder),
        3,
    );

    assert_eq!(engine.mode(), EngineMode::Degraded);
    assert_eq!(engine.corpus_len(), 0);
    assert_eq!(
        engine.recommend("password"),
        vec![NOT_INITIALIZED_MESSAGE.to_string()]
    );
}

#[test]
fn empty_corpus_degrades() {
    let engine = RetrievalEngine::initialize(
        || Ok(Corpus::from_documents(Vec::<String>::new())),
        None,
        3,
    );

    assert_eq!(engine.mode(), EngineMode::Degraded);
    assert_eq!(
        engine.recommend("password"),
        vec![NOT_INITIALIZED_MESSAGE.to_string()]
    );
}

#[test]
fn uninitialized_engine_explains_itself() {
    let engine = RetrievalEngine::uninitialized(3);
    assert_eq!(engine.mode(), EngineMode::Uninitialized);
    assert_eq!(
        engine.recommend("anything"),
        vec![NOT_INITIALIZED_MESSAGE.to_string()]
    );
}

#[test]
fn results_never_exceed_top_k() {
    let corpus = || {
        Ok(Corpus::from_documents([
            "printer offline",
            "printer jam",
            "printer toner low",
            "printer driver",
            "printer queue stuck",
        ]))
    };

    let lexical = RetrievalEngine::initialize(corpus, None, 3);
    assert_eq!(lexical.recommend("printer").len(), 3);

    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new(&["printer"]));
    let semantic = RetrievalEngine::initialize(corpus, Some(embedder), 3);
    assert_eq!(semantic.mode(), EngineMode::SemanticActive);
    assert_eq!(semantic.recommend("printer").len(), 3);
}

#[test]
fn oversized_top_k_is_capped() {
    let corpus = || {
        Ok(Corpus::from_documents(
            (0..5).map(|i| format!("printer {i}")).collect::<Vec<_>>(),
        ))
    };

    let engine = RetrievalEngine::initialize(corpus, None, 5);
    assert_eq!(engine.top_k(), MAX_TOP_K);
    assert_eq!(engine.recommend("printer").len(), MAX_TOP_K);

    assert_eq!(RetrievalEngine::uninitialized(0).top_k(), 1);
}

#[test]
fn dimension_change_after_build_falls_back_to_lexical() {
    /// Three dimensions while the index is built, seven once `drift` is set
    struct DriftingEmbedder {
        drift: AtomicBool,
    }

    impl Embedder for DriftingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let dimensions = if self.drift.load(Ordering::SeqCst) { 7 } else { 3 };
            Ok(vec![1.0; dimensions])
        }
    }

    let embedder = Arc::new(DriftingEmbedder {
        drift: AtomicBool::new(false),
    });
    let shared: Arc<dyn Embedder> = embedder.clone();
    let engine = RetrievalEngine::initialize(support_corpus, Some(shared), 3);
    assert_eq!(engine.mode(), EngineMode::SemanticActive);

    embedder.drift.store(true, Ordering::SeqCst);
    let ticket = "I forgot my password";
    assert_eq!(engine.recommend(ticket), lexical_engine().recommend(ticket));
    assert_eq!(
        engine.recommend(ticket),
        vec![support_documents()[0].to_string()]
    );
    assert_eq!(engine.mode(), EngineMode::SemanticActive);
}

#[test]
fn repeated_queries_are_identical() {
    let embedder = keyword_embedder();
    let semantic = semantic_engine(&embedder);
    let lexical = lexical_engine();

    for engine in [&semantic, &lexical] {
        let first = engine.recommend("password billing internet");
        let second = engine.recommend("password billing internet");
        assert_eq!(first, second);
    }
}

#[test]
fn mode_display_matches_serialization() {
    for mode in [
        EngineMode::Uninitialized,
        EngineMode::SemanticActive,
        EngineMode::LexicalActive,
        EngineMode::Degraded,
    ] {
        let json = serde_json::to_value(mode).expect("mode serializes");
        assert_eq!(json, serde_json::Value::String(mode.to_string()));
    }
}
