use proptest::prelude::*;
use raptor_core::config::{RaptorConfig, RetrievalConfig, SelectionMode};
use raptor_core::RaptorError;

fn retrieval_config() -> impl Strategy<Value = RetrievalConfig> {
    (
        (0usize..20, 0usize..6, 0usize..5_000),
        (proptest::option::of(0usize..8), proptest::option::of(0usize..4)),
        (0usize..64, -1.0f64..2.0, 0u64..3_000, 0u64..3_000),
        proptest::option::of(-1.0f64..1.0),
    )
        .prop_map(|(sizes, layers, rerank, threshold)| RetrievalConfig {
            top_k: sizes.0,
            over_fetch_factor: sizes.1,
            max_tokens: sizes.2,
            layer_fan_out: layers.0,
            num_layers: layers.1,
            rerank_batch_size: rerank.0,
            rerank_score_spread_threshold: rerank.1,
            rerank_timeout_ms: rerank.2,
            recall_timeout_ms: rerank.3,
            selection: threshold
                .map(|threshold| SelectionMode::Threshold { threshold })
                .unwrap_or_default(),
            ..Default::default()
        })
}

fn in_range(c: &RetrievalConfig) -> bool {
    c.top_k >= 1
        && c.over_fetch_factor >= 1
        && c.rerank_batch_size >= 1
        && c.rerank_score_spread_threshold >= 0.0
        && c.rerank_timeout_ms > 0
        && c.recall_timeout_ms > 0
        && c.layer_fan_out != Some(0)
        && c.num_layers != Some(0)
}

proptest! {
    #[test]
    fn validate_accepts_exactly_the_valid_ranges(config in retrieval_config()) {
        let before = config.clone();
        let result = config.validate();
        prop_assert_eq!(result.is_ok(), in_range(&config));
        if let Err(e) = result {
            let is_invalid_config = matches!(e, RaptorError::InvalidConfig { .. });
            prop_assert!(is_invalid_config);
        }
        // Rejection never rewrites a value.
        prop_assert_eq!(config, before);
    }

    #[test]
    fn valid_configs_survive_a_toml_roundtrip(config in retrieval_config()) {
        prop_assume!(in_range(&config));
        let full = RaptorConfig {
            retrieval: config.clone(),
            ..Default::default()
        };
        let parsed = RaptorConfig::from_toml(&full.to_toml().unwrap()).unwrap();
        prop_assert_eq!(parsed.retrieval, config);
    }
}
