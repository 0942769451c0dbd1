//! Dendrogram reconstruction from a merge log
//!
//! Leaves are original vertex indices `0..vertex_count`; every applied merge
//! creates an internal node with synthetic index `vertex_count + position`.
//! Nodes are stored in an arena addressed by their cluster index, so trees of
//! any depth can be walked and dropped without recursion.

use std::collections::BTreeSet;

use clustermesh_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::merge_log::MergeLog;

/// A node of a cluster tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterNode {
    index: usize,
    children: Option<[usize; 2]>,
}

impl ClusterNode {
    fn leaf(index: usize) -> Self {
        Self {
            index,
            children: None,
        }
    }

    fn merge(index: usize, left: usize, right: usize) -> Self {
        Self {
            index,
            children: Some([left, right]),
        }
    }

    /// Original vertex index for a leaf, synthetic merge index otherwise.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cluster indices of the two merged children, `None` for leaves.
    pub fn children(&self) -> Option<[usize; 2]> {
        self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Forest of cluster trees produced by [`build_forest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterForest {
    vertex_count: usize,
    nodes: Vec<ClusterNode>,
    roots: Vec<usize>,
}

impl ClusterForest {
    /// Forest in which every vertex is its own root.
    pub fn singletons(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            nodes: (0..vertex_count).map(ClusterNode::leaf).collect(),
            roots: (0..vertex_count).collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of merges that were applied.
    pub fn merge_count(&self) -> usize {
        self.nodes.len() - self.vertex_count
    }

    /// Total number of nodes (leaves plus internal nodes).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Root cluster indices in ascending order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn root_nodes(&self) -> impl Iterator<Item = &ClusterNode> + '_ {
        self.roots.iter().map(move |&r| &self.nodes[r])
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn node(&self, index: usize) -> Option<&ClusterNode> {
        self.nodes.get(index)
    }

    /// Original vertex indices under `root`, left to right.
    pub fn leaves(&self, root: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            match node.children {
                Some([left, right]) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => leaves.push(index),
            }
        }
        leaves
    }

    /// Cluster indices under `root` in post-order: left subtree, right
    /// subtree, then the node itself.
    pub fn post_order(&self, root: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((index, expanded)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            match node.children {
                Some([left, right]) if !expanded => {
                    stack.push((index, true));
                    stack.push((right, false));
                    stack.push((left, false));
                }
                _ => order.push(index),
            }
        }
        order
    }

    /// Height of the tree under `root`; a leaf has depth 0.
    pub fn depth(&self, root: usize) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some([left, right]) = self.nodes.get(index).and_then(|n| n.children) {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }
}

/// Reconstruct the cluster forest for `vertex_count` leaves from a merge log.
///
/// Merges are applied in log order until the number of live clusters drops to
/// the log's target count; the remaining records are ignored. A target larger
/// than `vertex_count` is already satisfied and leaves every vertex as its own
/// root. A log that runs out first yields more roots than the target.
pub fn build_forest(vertex_count: usize, log: &MergeLog) -> Result<ClusterForest> {
    if vertex_count == 0 {
        return Err(Error::Configuration(
            "vertex count must be positive".to_string(),
        ));
    }
    let target = log.target_cluster_count();
    if target == 0 {
        return Err(Error::Configuration(
            "target cluster count must be positive".to_string(),
        ));
    }

    let mut forest = ClusterForest::singletons(vertex_count);
    let mut live: BTreeSet<usize> = (0..vertex_count).collect();

    for record in log.records() {
        if live.len() <= target {
            break;
        }

        let index = record.new_index(vertex_count);
        for child in [record.left, record.right] {
            if !live.remove(&child) {
                return Err(Error::parse(
                    record.line,
                    unresolved_reason(child, index, record.left == record.right),
                ));
            }
        }

        forest
            .nodes
            .push(ClusterNode::merge(index, record.left, record.right));
        live.insert(index);
    }

    let applied = forest.merge_count();
    if live.len() > target {
        warn!(
            "Merge log exhausted after {} merges: {} clusters remain, target was {}",
            applied,
            live.len(),
            target
        );
    }

    forest.roots = live.into_iter().collect();

    info!(
        "Rebuilt cluster forest: {} roots from {} vertices ({} merges applied, {} ignored)",
        forest.root_count(),
        vertex_count,
        applied,
        log.len() - applied
    );
    debug!(
        "Deepest tree: {}",
        forest.roots.iter().map(|&r| forest.depth(r)).max().unwrap_or(0)
    );

    Ok(forest)
}

/// Parse `text` as a merge log and reconstruct its forest.
pub fn build_forest_from_str(vertex_count: usize, text: &str) -> Result<ClusterForest> {
    let log = MergeLog::parse(text)?;
    build_forest(vertex_count, &log)
}

fn unresolved_reason(child: usize, new_index: usize, self_merge: bool) -> String {
    if self_merge {
        format!("cluster {} cannot be merged with itself", child)
    } else if child >= new_index {
        format!(
            "cluster {} does not exist yet (this merge creates {})",
            child, new_index
        )
    } else {
        format!("cluster {} was already consumed by an earlier merge", child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(vertex_count: usize, text: &str) -> ClusterForest {
        build_forest_from_str(vertex_count, text).unwrap()
    }

    #[test]
    fn test_single_merge() {
        let f = forest(3, "2\n0,1");
        assert_eq!(f.roots(), &[2, 3]);
        assert_eq!(f.merge_count(), 1);
        let root = f.node(3).unwrap();
        assert_eq!(root.children(), Some([0, 1]));
        assert!(f.node(2).unwrap().is_leaf());
    }

    #[test]
    fn test_nested_merges() {
        // 0+1 -> 4, 2+3 -> 5, 4+5 -> 6
        let f = forest(4, "1\n0,1\n2,3\n4,5");
        assert_eq!(f.roots(), &[6]);
        assert_eq!(f.leaves(6), vec![0, 1, 2, 3]);
        assert_eq!(f.post_order(6), vec![0, 1, 4, 2, 3, 5, 6]);
        assert_eq!(f.depth(6), 2);
    }

    #[test]
    fn test_remaining_records_ignored() {
        let f = forest(4, "3\n0,1\n2,3\n4,5");
        assert_eq!(f.merge_count(), 1);
        assert_eq!(f.roots(), &[2, 3, 4]);
    }

    #[test]
    fn test_ignored_records_are_not_resolved() {
        // Record on line 3 references a consumed index but is never processed
        let f = forest(3, "2\n0,1\n0,1");
        assert_eq!(f.root_count(), 2);
    }

    #[test]
    fn test_target_equal_to_vertex_count() {
        let f = forest(3, "3\n0,1\n2,3");
        assert_eq!(f.merge_count(), 0);
        assert_eq!(f.roots(), &[0, 1, 2]);
    }

    #[test]
    fn test_target_above_vertex_count_is_satisfied() {
        let f = forest(3, "10\n0,1\n2,3");
        assert_eq!(f.merge_count(), 0);
        assert_eq!(f, ClusterForest::singletons(3));
    }

    #[test]
    fn test_exhausted_log_returns_extra_roots() {
        let f = forest(4, "1\n0,1");
        assert_eq!(f.roots(), &[2, 3, 4]);
    }

    #[test]
    fn test_consumed_index_is_parse_error() {
        match build_forest_from_str(3, "1\n0,1\n0,2") {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("already consumed"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_future_index_is_parse_error() {
        match build_forest_from_str(3, "1\n0,3") {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("does not exist"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_merge_is_parse_error() {
        assert!(matches!(
            build_forest_from_str(3, "1\n1,1"),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            build_forest_from_str(0, "1"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            build_forest_from_str(3, "0\n0,1"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_line_beyond_target_fails_whole_build() {
        assert!(matches!(
            build_forest_from_str(3, "2\n0,1\nnot,a-number"),
            Err(Error::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_synthetic_indices_increase() {
        let f = forest(5, "1\n0,1\n2,3\n5,4\n6,7");
        let internal: Vec<usize> = (0..f.node_count())
            .filter_map(|i| f.node(i))
            .filter(|n| !n.is_leaf())
            .map(|n| n.index())
            .collect();
        assert_eq!(internal, vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let n = 200_000;
        let mut text = String::from("1\n0,1");
        for i in 2..n {
            text.push_str(&format!("\n{},{}", n + i - 2, i));
        }
        let f = forest(n, &text);
        assert_eq!(f.root_count(), 1);
        let root = f.roots()[0];
        assert_eq!(f.depth(root), n - 1);
        assert_eq!(f.leaves(root).len(), n);
    }
}
