use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use raptor_core::cancellation::CancellationToken;
use raptor_core::config::{RerankConfig, RetrievalConfig};
use raptor_core::models::{NodeId, TreeNode};
use raptor_core::traits::ITreeIndex;
use raptor_rerank::RerankGateway;
use raptor_retrieval::{FusionController, TreeRecallEngine};
use raptor_tokens::TokenCounter;
use test_fixtures::{ReverseRecallModel, ScriptedTree};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn scripted(scores: &[f64]) -> Arc<dyn ITreeIndex> {
    let nodes: Vec<TreeNode> = (0..scores.len())
        .map(|i| TreeNode::leaf(i, format!("leaf {i}")))
        .collect();
    Arc::new(ScriptedTree::new(nodes, scores.iter().copied().enumerate()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn retrieve_respects_bounds(
        scores in proptest::collection::vec(0.0f64..1.0, 1..30),
        top_k in 1usize..6,
        over_fetch_factor in 1usize..4,
        max_tokens in 0usize..40,
        rerank_enabled in any::<bool>(),
        spread in 0.0f64..2.0,
    ) {
        let tree = scripted(&scores);
        let counter = Arc::new(TokenCounter::with_default_capacity().unwrap());
        let gateway = Arc::new(
            RerankGateway::new(Arc::new(ReverseRecallModel), &RerankConfig::default()).unwrap(),
        );
        let fusion = FusionController::new(TreeRecallEngine::new(tree.clone(), counter.clone()))
            .with_gateway(gateway);
        let config = RetrievalConfig {
            top_k,
            over_fetch_factor,
            max_tokens,
            rerank_enabled,
            rerank_score_spread_threshold: spread,
            ..Default::default()
        };

        let pool: HashSet<NodeId> = TreeRecallEngine::new(tree, counter)
            .recall("q", &config)
            .unwrap()
            .iter()
            .map(|c| c.id())
            .collect();

        let rt = runtime();
        let cancel = CancellationToken::new();
        let first = rt.block_on(fusion.retrieve("q", &config, &cancel)).unwrap();
        let second = rt.block_on(fusion.retrieve("q", &config, &cancel)).unwrap();

        prop_assert!(first.passages.len() <= top_k);
        prop_assert!(first.passages.total_tokens() <= max_tokens);
        prop_assert!(first.candidates_recalled <= top_k * over_fetch_factor);
        for id in first.passages.node_ids() {
            prop_assert!(pool.contains(&id), "node {} not in recall pool", id);
        }
        prop_assert_eq!(first.passages.node_ids(), second.passages.node_ids());
        prop_assert_eq!(first.decision, second.decision);
    }
}
