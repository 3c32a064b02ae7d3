use std::collections::BTreeMap;

use raptor_core::errors::{IndexError, RaptorResult};
use raptor_core::models::{NodeId, TreeNode};

/// Check structural consistency and fill in missing parent pointers.
///
/// Returns the nodes keyed by id plus the top level.
pub(crate) fn validate(nodes: Vec<TreeNode>) -> RaptorResult<(BTreeMap<NodeId, TreeNode>, usize)> {
    let mut by_id = BTreeMap::new();
    for node in nodes {
        let id = node.id;
        if by_id.insert(id, node).is_some() {
            return Err(IndexError::DuplicateNode { id }.into());
        }
    }

    // child -> parent as declared by child lists
    let mut owner: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    for parent in by_id.values() {
        if parent.is_leaf() && !parent.children.is_empty() {
            return Err(IndexError::LeafWithChildren { id: parent.id }.into());
        }
        for &child_id in &parent.children {
            let child = by_id.get(&child_id).ok_or(IndexError::DanglingChild {
                parent: parent.id,
                child: child_id,
            })?;
            if child.level + 1 != parent.level {
                return Err(IndexError::LevelMismatch {
                    parent: parent.id,
                    parent_level: parent.level,
                    child: child_id,
                    child_level: child.level,
                }
                .into());
            }
            if let Some(&first) = owner.get(&child_id) {
                return Err(IndexError::ParentMismatch {
                    child: child_id,
                    claimed: Some(first),
                    actual: parent.id,
                }
                .into());
            }
            if child.parent.is_some_and(|p| p != parent.id) {
                return Err(IndexError::ParentMismatch {
                    child: child_id,
                    claimed: child.parent,
                    actual: parent.id,
                }
                .into());
            }
            owner.insert(child_id, parent.id);
        }
    }

    let top_level = by_id.values().map(|n| n.level).max().unwrap_or(0);
    for node in by_id.values_mut() {
        match (owner.get(&node.id), node.parent) {
            (Some(&p), _) => node.parent = Some(p),
            (None, Some(parent)) => {
                return Err(IndexError::UnknownParent {
                    child: node.id,
                    parent,
                }
                .into())
            }
            (None, None) if node.level < top_level => {
                return Err(IndexError::OrphanNode {
                    id: node.id,
                    level: node.level,
                    top_level,
                }
                .into())
            }
            (None, None) => {}
        }
    }

    Ok((by_id, top_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raptor_core::RaptorError;

    fn two_layer() -> Vec<TreeNode> {
        vec![
            TreeNode::leaf(0, "a"),
            TreeNode::leaf(1, "b"),
            TreeNode::summary(2, "ab", 1, [0, 1]),
        ]
    }

    fn index_err(nodes: Vec<TreeNode>) -> IndexError {
        match validate(nodes) {
            Err(RaptorError::IndexError(e)) => e,
            other => panic!("expected IndexError, got {other:?}"),
        }
    }

    #[test]
    fn parents_are_inferred_from_child_lists() {
        let (nodes, top) = validate(two_layer()).unwrap();
        assert_eq!(top, 1);
        assert_eq!(nodes[&0].parent, Some(2));
        assert_eq!(nodes[&1].parent, Some(2));
        assert_eq!(nodes[&2].parent, None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut nodes = two_layer();
        nodes.push(TreeNode::leaf(1, "again"));
        assert!(matches!(index_err(nodes), IndexError::DuplicateNode { id: 1 }));
    }

    #[test]
    fn dangling_child_is_rejected() {
        let nodes = vec![TreeNode::leaf(0, "a"), TreeNode::summary(2, "s", 1, [0, 9])];
        assert!(matches!(
            index_err(nodes),
            IndexError::DanglingChild { parent: 2, child: 9 }
        ));
    }

    #[test]
    fn skipped_level_is_rejected() {
        let nodes = vec![TreeNode::leaf(0, "a"), TreeNode::summary(1, "s", 2, [0])];
        assert!(matches!(index_err(nodes), IndexError::LevelMismatch { .. }));
    }

    #[test]
    fn leaf_with_children_is_rejected() {
        let nodes = vec![TreeNode::leaf(0, "a"), TreeNode::summary(1, "s", 0, [0])];
        assert!(matches!(
            index_err(nodes),
            IndexError::LeafWithChildren { id: 1 }
        ));
    }

    #[test]
    fn shared_child_is_rejected() {
        let mut nodes = two_layer();
        nodes.push(TreeNode::summary(3, "b again", 1, [1]));
        nodes.push(TreeNode::summary(4, "root", 2, [2, 3]));
        assert!(matches!(
            index_err(nodes),
            IndexError::ParentMismatch { child: 1, .. }
        ));
    }

    #[test]
    fn contradicting_parent_pointer_is_rejected() {
        let nodes = vec![
            TreeNode::leaf(0, "a").with_parent(7),
            TreeNode::summary(2, "s", 1, [0]),
        ];
        assert!(matches!(
            index_err(nodes),
            IndexError::ParentMismatch {
                child: 0,
                claimed: Some(7),
                actual: 2
            }
        ));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let nodes = vec![
            TreeNode::leaf(0, "a"),
            TreeNode::leaf(1, "b").with_parent(2),
            TreeNode::summary(2, "s", 1, [0]),
        ];
        assert!(matches!(
            index_err(nodes),
            IndexError::UnknownParent { child: 1, parent: 2 }
        ));
    }

    #[test]
    fn orphan_below_top_is_rejected() {
        let mut nodes = two_layer();
        nodes.push(TreeNode::leaf(5, "stray"));
        assert!(matches!(
            index_err(nodes),
            IndexError::OrphanNode {
                id: 5,
                level: 0,
                top_level: 1
            }
        ));
    }

    #[test]
    fn flat_forest_of_leaves_is_valid() {
        let nodes = vec![TreeNode::leaf(0, "a"), TreeNode::leaf(1, "b")];
        let (nodes, top) = validate(nodes).unwrap();
        assert_eq!(top, 0);
        assert_eq!(nodes.len(), 2);
    }
}
