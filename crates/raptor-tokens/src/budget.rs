use raptor_core::models::TokenWeighted;

/// Score-order admission into a fixed token budget.
pub struct TokenBudget;

impl TokenBudget {
    /// Admit items in their given order until the next one would push the
    /// running total past `budget`. That item is dropped whole and nothing
    /// after it is admitted, so the result is always a prefix of `items`.
    pub fn admit_prefix<T: TokenWeighted>(items: Vec<T>, budget: usize) -> Vec<T> {
        let mut used = 0usize;
        let mut admitted = Vec::with_capacity(items.len());
        for item in items {
            let next = used.saturating_add(item.token_count());
            if next > budget {
                break;
            }
            used = next;
            admitted.push(item);
        }
        admitted
    }
}
