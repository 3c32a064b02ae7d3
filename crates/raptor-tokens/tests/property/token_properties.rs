use proptest::prelude::*;
use raptor_core::models::TokenWeighted;
use raptor_tokens::{TokenBudget, TokenCounter};

#[derive(Debug, Clone)]
struct Weighted(usize);

impl TokenWeighted for Weighted {
    fn token_count(&self) -> usize {
        self.0
    }
}

proptest! {
    #[test]
    fn cached_equals_uncached(s in ".{0,200}") {
        let counter = TokenCounter::with_default_capacity().unwrap();
        prop_assert_eq!(counter.count(&s), counter.count_cached(&s));
    }

    #[test]
    fn subadditivity(a in ".{0,100}", b in ".{0,100}") {
        let counter = TokenCounter::with_default_capacity().unwrap();
        let combined = format!("{}{}", a, b);
        let count_a = counter.count(&a);
        let count_b = counter.count(&b);
        let count_combined = counter.count(&combined);
        prop_assert!(
            count_combined <= count_a + count_b + 1,
            "subadditivity: {} <= {} + {} + 1",
            count_combined, count_a, count_b
        );
    }

    #[test]
    fn admitted_total_never_exceeds_budget(
        weights in proptest::collection::vec(0usize..500, 0..40),
        budget in 0usize..3_000,
    ) {
        let items: Vec<Weighted> = weights.iter().copied().map(Weighted).collect();
        let admitted = TokenBudget::admit_prefix(items, budget);
        let total: usize = admitted.iter().map(|w| w.0).sum();
        prop_assert!(total <= budget);
    }

    #[test]
    fn admission_is_a_prefix(
        weights in proptest::collection::vec(0usize..500, 0..40),
        budget in 0usize..3_000,
    ) {
        let items: Vec<Weighted> = weights.iter().copied().map(Weighted).collect();
        let admitted = TokenBudget::admit_prefix(items, budget);
        let kept: Vec<usize> = admitted.iter().map(|w| w.0).collect();
        prop_assert_eq!(&kept[..], &weights[..kept.len()]);
        // The next item, if any, is the one that overflowed.
        if let Some(&next) = weights.get(kept.len()) {
            prop_assert!(kept.iter().sum::<usize>() + next > budget);
        }
    }
}
