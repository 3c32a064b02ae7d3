use raptor_observability::events;

/// Lifecycle of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Recalling,
    DecidingRerank,
    Reranking,
    SkippingRerank,
    Merging,
    Done,
    Failed,
}

impl QueryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recalling => "recalling",
            Self::DecidingRerank => "deciding_rerank",
            Self::Reranking => "reranking",
            Self::SkippingRerank => "skipping_rerank",
            Self::Merging => "merging",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Current state of a query; every change is logged at debug level.
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: QueryState,
}

impl StateMachine {
    pub(crate) fn start() -> Self {
        Self {
            state: QueryState::Recalling,
        }
    }

    pub(crate) fn advance(&mut self, next: QueryState) {
        events::query_state(self.state.as_str(), next.as_str());
        self.state = next;
    }
}
