use crate::models::NodeId;

/// Tree construction and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("duplicate node id {id}")]
    DuplicateNode { id: NodeId },

    #[error("node {parent} lists missing child {child}")]
    DanglingChild { parent: NodeId, child: NodeId },

    #[error("node {child} at level {child_level} cannot be a child of node {parent} at level {parent_level}")]
    LevelMismatch {
        parent: NodeId,
        parent_level: usize,
        child: NodeId,
        child_level: usize,
    },

    #[error("node {child} names parent {claimed:?}, but node {actual} lists it as a child")]
    ParentMismatch {
        child: NodeId,
        claimed: Option<NodeId>,
        actual: NodeId,
    },

    #[error("node {child} names parent {parent}, which does not list it as a child")]
    UnknownParent { child: NodeId, parent: NodeId },

    #[error("node {id} at level {level} has no parent below top level {top_level}")]
    OrphanNode {
        id: NodeId,
        level: usize,
        top_level: usize,
    },

    #[error("node {id} has children but sits at leaf level 0")]
    LeafWithChildren { id: NodeId },

    #[error("node {id} embedding has {actual} dimensions, expected {expected}")]
    EmbeddingDimension {
        id: NodeId,
        expected: usize,
        actual: usize,
    },
}
