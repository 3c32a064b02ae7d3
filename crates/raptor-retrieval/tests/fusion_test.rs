use std::sync::Arc;
use std::time::Duration;

use raptor_core::cancellation::CancellationToken;
use raptor_core::config::{RaptorConfig, RerankConfig, RetrievalConfig};
use raptor_core::constants::{COMPONENT_RERANK, FALLBACK_RECALL_ORDER};
use raptor_core::errors::RaptorError;
use raptor_core::models::{NodeId, RerankDecision, RetrievalOutcome};
use raptor_core::traits::{IRerankModel, ITreeIndex};
use raptor_index::InMemoryTree;
use raptor_rerank::{PassageKey, RerankGateway, RerankKey};
use raptor_retrieval::{FusionController, TreeRecallEngine};
use raptor_tokens::TokenCounter;
use test_fixtures::{
    CountingModel, FailingModel, ReverseRecallModel, ScriptedTree, SlowModel, TermHashEmbedder,
};

fn counter() -> Arc<TokenCounter> {
    Arc::new(TokenCounter::with_default_capacity().unwrap())
}

fn gateway(model: Arc<dyn IRerankModel>) -> Arc<RerankGateway> {
    Arc::new(RerankGateway::new(model, &RerankConfig::default()).unwrap())
}

fn controller(tree: Arc<dyn ITreeIndex>, model: Option<Arc<dyn IRerankModel>>) -> FusionController {
    let fusion = FusionController::new(TreeRecallEngine::new(tree, counter()));
    match model {
        Some(model) => fusion.with_gateway(gateway(model)),
        None => fusion,
    }
}

fn ten_leaves() -> Arc<dyn ITreeIndex> {
    Arc::new(ScriptedTree::descending_leaves(10, 0.01))
}

/// top_k 3, F 3, rerank on, spread threshold wide enough to always rerank.
fn scenario() -> RetrievalConfig {
    RetrievalConfig {
        top_k: 3,
        over_fetch_factor: 3,
        rerank_enabled: true,
        rerank_score_spread_threshold: 1.0,
        ..Default::default()
    }
}

fn ids(outcome: &RetrievalOutcome) -> Vec<NodeId> {
    outcome.passages.node_ids()
}

#[tokio::test]
async fn reverse_model_returns_lowest_recall_nodes_reversed() {
    let fusion = controller(ten_leaves(), Some(Arc::new(ReverseRecallModel)));
    let outcome = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.candidates_recalled, 9);
    assert_eq!(outcome.decision, RerankDecision::Reranked);
    assert!(outcome.passages.is_reranked());
    assert_eq!(ids(&outcome), vec![8, 7, 6]);
    assert!(outcome.degradation.is_none());
}

#[tokio::test]
async fn disabled_rerank_returns_recall_top_k_without_model_calls() {
    let counting = Arc::new(CountingModel::new(Arc::new(ReverseRecallModel)));
    let fusion = controller(ten_leaves(), Some(counting.clone()));
    let config = RetrievalConfig {
        rerank_enabled: false,
        ..scenario()
    };
    let outcome = fusion
        .retrieve("q", &config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
    assert_eq!(outcome.decision, RerankDecision::Disabled);
    assert!(!outcome.passages.is_reranked());
    assert_eq!(counting.batches(), 0);
}

#[tokio::test]
async fn missing_gateway_counts_as_disabled() {
    let fusion = controller(ten_leaves(), None);
    let outcome = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.decision, RerankDecision::Disabled);
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
}

#[tokio::test]
async fn pool_no_larger_than_top_k_skips_rerank() {
    let tree: Arc<dyn ITreeIndex> = Arc::new(ScriptedTree::descending_leaves(3, 0.01));
    let fusion = controller(tree, Some(Arc::new(ReverseRecallModel)));
    let outcome = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.decision, RerankDecision::PoolTooSmall { pool: 3 });
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
}

#[tokio::test]
async fn wide_spread_skips_rerank() {
    let tree: Arc<dyn ITreeIndex> = Arc::new(ScriptedTree::descending_leaves(10, 0.05));
    let fusion = controller(tree, Some(Arc::new(ReverseRecallModel)));
    let config = RetrievalConfig {
        rerank_score_spread_threshold: 0.1,
        ..scenario()
    };
    let outcome = fusion
        .retrieve("q", &config, &CancellationToken::new())
        .await
        .unwrap();
    match outcome.decision {
        RerankDecision::SpreadTooWide { spread } => assert!((spread - 0.4).abs() < 1e-9),
        other => panic!("expected SpreadTooWide, got {other:?}"),
    }
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
}

#[tokio::test]
async fn timed_out_model_degrades_to_recall_order() {
    let fusion = controller(
        ten_leaves(),
        Some(Arc::new(SlowModel::new(Duration::from_millis(300)))),
    );
    let config = RetrievalConfig {
        rerank_timeout_ms: 30,
        ..scenario()
    };
    let outcome = fusion
        .retrieve("q", &config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.decision, RerankDecision::FellBack);
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
    assert!(outcome.passages.total_tokens() <= config.max_tokens);
    let event = outcome.degradation.expect("degradation event");
    assert_eq!(event.component, COMPONENT_RERANK);
    assert_eq!(event.fallback_used, FALLBACK_RECALL_ORDER);
    assert!(event.failure.contains("timed out"));
}

#[tokio::test]
async fn faulting_model_degrades_to_recall_order() {
    let fusion = controller(ten_leaves(), Some(Arc::new(FailingModel)));
    let outcome = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.decision, RerankDecision::FellBack);
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
}

/// Reverse-order scores from a backend that reports itself offline.
struct OfflineModel;

impl IRerankModel for OfflineModel {
    fn name(&self) -> &str {
        "offline"
    }
    fn score(&self, query: &str, passage: &str) -> raptor_core::errors::RaptorResult<f64> {
        ReverseRecallModel.score(query, passage)
    }
    fn is_available(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn offline_model_degrades_to_recall_order() {
    let fusion = controller(ten_leaves(), Some(Arc::new(OfflineModel)));
    let outcome = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.decision, RerankDecision::FellBack);
    assert_eq!(ids(&outcome), vec![0, 1, 2]);
    assert!(outcome.degradation.unwrap().failure.contains("unavailable"));
}

#[tokio::test]
async fn retrieve_is_idempotent() {
    let fusion = controller(ten_leaves(), Some(Arc::new(ReverseRecallModel)));
    let cancel = CancellationToken::new();
    let first = fusion.retrieve("q", &scenario(), &cancel).await.unwrap();
    let second = fusion.retrieve("q", &scenario(), &cancel).await.unwrap();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.decision, second.decision);
    assert_eq!(first.passages.context(), second.passages.context());
}

#[tokio::test]
async fn second_query_is_served_from_cache() {
    let counting = Arc::new(CountingModel::new(Arc::new(ReverseRecallModel)));
    let fusion = controller(ten_leaves(), Some(counting.clone()));
    let cancel = CancellationToken::new();
    fusion.retrieve("q", &scenario(), &cancel).await.unwrap();
    let scored = counting.passages();
    fusion.retrieve("q", &scenario(), &cancel).await.unwrap();
    assert_eq!(scored, 9);
    assert_eq!(counting.passages(), scored);
}

#[tokio::test]
async fn cache_corruption_is_not_swallowed() {
    let gw = gateway(Arc::new(ReverseRecallModel));
    gw.cache().insert(
        RerankKey {
            model: Arc::from(gw.model_name()),
            query: Arc::from("q"),
            passage: PassageKey::Node(0),
        },
        f64::NAN,
    );
    let fusion = FusionController::new(TreeRecallEngine::new(ten_leaves(), counter())).with_gateway(gw);
    let err = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RaptorError::CacheCorruption { .. }));
}

#[tokio::test]
async fn recall_failure_propagates() {
    let fusion = controller(Arc::new(ScriptedTree::empty()), Some(Arc::new(ReverseRecallModel)));
    let err = fusion
        .retrieve("q", &scenario(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RaptorError::EmptyIndex));
}

#[tokio::test]
async fn invalid_config_propagates() {
    let fusion = controller(ten_leaves(), None);
    let config = RetrievalConfig {
        over_fetch_factor: 0,
        ..scenario()
    };
    let err = fusion
        .retrieve("q", &config, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RaptorError::InvalidConfig { .. }));
}

#[tokio::test]
async fn slow_recall_times_out() {
    let tree: Arc<dyn ITreeIndex> =
        Arc::new(ScriptedTree::descending_leaves(10, 0.01).with_delay(Duration::from_millis(30)));
    let fusion = controller(tree, None);
    let config = RetrievalConfig {
        recall_timeout_ms: 20,
        ..scenario()
    };
    let err = fusion
        .retrieve("q", &config, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RaptorError::RecallTimeout { timeout_ms: 20 }));
}

#[tokio::test]
async fn rerank_only_reorders_the_budgeted_pool() {
    let tree = ten_leaves();
    let counter = counter();
    let per_leaf = counter.count("leaf 0");
    let fusion = FusionController::new(TreeRecallEngine::new(tree, counter))
        .with_gateway(gateway(Arc::new(ReverseRecallModel)));
    let config = RetrievalConfig {
        max_tokens: per_leaf * 5,
        ..scenario()
    };
    let outcome = fusion
        .retrieve("q", &config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.candidates_recalled, 5);
    assert_eq!(ids(&outcome), vec![4, 3, 2]);
    assert!(outcome.passages.total_tokens() <= config.max_tokens);
}

#[tokio::test]
async fn cancelled_query_surfaces_cancelled() {
    let counting = Arc::new(CountingModel::new(Arc::new(ReverseRecallModel)));
    let fusion = controller(ten_leaves(), Some(counting.clone()));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fusion.retrieve("q", &scenario(), &cancel).await.unwrap_err();
    assert!(matches!(err, RaptorError::Cancelled { .. }));
    assert_eq!(counting.batches(), 0);
}

#[tokio::test]
async fn concurrent_queries_keep_their_own_config() {
    let fusion = Arc::new(controller(ten_leaves(), Some(Arc::new(ReverseRecallModel))));
    let reranked = scenario();
    let plain = RetrievalConfig {
        rerank_enabled: false,
        top_k: 2,
        ..scenario()
    };
    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(
        fusion.retrieve("q", &reranked, &cancel),
        fusion.retrieve("q", &plain, &cancel)
    );
    assert_eq!(ids(&a.unwrap()), vec![8, 7, 6]);
    assert_eq!(ids(&b.unwrap()), vec![0, 1]);
}

#[tokio::test]
async fn configured_lexical_pipeline_reranks_fairy_tree() {
    let tree: Arc<dyn ITreeIndex> = Arc::new(
        InMemoryTree::build(
            test_fixtures::fairy_tale_nodes(),
            Arc::new(TermHashEmbedder::default()),
        )
        .unwrap(),
    );
    let mut config = RaptorConfig::default();
    config.retrieval.top_k = 3;
    config.retrieval.rerank_enabled = true;
    config.retrieval.rerank_score_spread_threshold = 1.0;
    let fusion = FusionController::from_config(tree, &config).unwrap();

    let outcome = fusion
        .retrieve("glass slipper", &config.retrieval, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.decision, RerankDecision::Reranked);
    assert_eq!(ids(&outcome), vec![0, 6, 8]);
    let layers: Vec<usize> = outcome
        .passages
        .layer_information()
        .iter()
        .map(|l| l.layer_number)
        .collect();
    assert_eq!(layers, vec![0, 1, 2]);
    assert!(outcome
        .passages
        .context()
        .starts_with("Cinderella lost her glass slipper at the royal ball.\n\n"));
}
