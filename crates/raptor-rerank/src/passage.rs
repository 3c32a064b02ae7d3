use raptor_core::models::{CandidateNode, NodeId};

/// Identity of a passage for caching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PassageKey {
    /// A tree node; node text is immutable, so the id is enough.
    Node(NodeId),
    /// Free-standing text, identified by its blake3 hex digest.
    TextHash(String),
}

/// A passage to score.
#[derive(Debug, Clone)]
pub struct Passage {
    pub key: PassageKey,
    pub text: String,
}

impl Passage {
    pub fn node(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            key: PassageKey::Node(id),
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            key: PassageKey::TextHash(blake3::hash(text.as_bytes()).to_hex().to_string()),
            text,
        }
    }
}

impl From<&CandidateNode> for Passage {
    fn from(candidate: &CandidateNode) -> Self {
        Self::node(candidate.id(), candidate.node.text.clone())
    }
}
