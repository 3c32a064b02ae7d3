mod candidate;
mod degradation_event;
mod node;
mod outcome;
mod tree_summary;

pub use candidate::{CandidateNode, RerankedCandidate, TokenWeighted};
pub use degradation_event::DegradationEvent;
pub use node::{NodeId, TreeNode};
pub use outcome::{LayerInfo, RerankDecision, RetrievalOutcome, RetrievedPassages};
pub use tree_summary::{LeafInfo, SummaryInfo, TreeSummary};
