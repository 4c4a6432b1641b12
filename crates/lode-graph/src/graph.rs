//! The lineage graph structure and traversal algorithms.
//!
//! [`LineageGraph`] stores nodes in an append-only arena ([`Vec`]) with a
//! [`HashMap`] id index. Origin edges are arena indices strictly less than
//! the referencing node's own index, so the graph is acyclic by
//! construction: no entry can reference a later one. A forward-edge index
//! (`children`) supports efficient descendant queries, and root revisions
//! (those with no origins) are tracked separately for fast enumeration.
//!
//! # Invariants
//!
//! - Every origin edge points at a strictly smaller arena index.
//! - Every origin reference resolves to an existing node.
//! - Revision ids are unique within the graph.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use lode_types::{BoxId, Revision, RevisionId};

use crate::error::{GraphError, GraphResult};
use crate::node::LineageNode;

/// Append-only arena of origin relationships between revisions.
///
/// The graph is a *derived* structure: it can always be rebuilt from the
/// origin lists in persisted revision manifests. It supports incremental
/// construction via [`add`].
///
/// [`add`]: LineageGraph::add
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LineageGraph {
    /// The arena: all nodes, in insertion order.
    nodes: Vec<LineageNode>,
    /// Revision id -> arena index.
    index: HashMap<RevisionId, usize>,
    /// Forward-edge index, parallel to `nodes`: origin -> derived revisions.
    children: Vec<Vec<usize>>,
    /// Arena indices of revisions with no origins (source artifacts).
    roots: Vec<usize>,
}

impl LineageGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of revisions in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no revisions.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if the graph contains the given revision.
    pub fn contains(&self, id: &RevisionId) -> bool {
        self.index.contains_key(id)
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Append a revision manifest to the arena.
    ///
    /// All origins must already be present in the graph (or the origin list
    /// must be empty for source revisions). Returns the new arena index, or
    /// an error if the revision id already exists or an origin reference
    /// dangles. Because every origin resolves to an earlier arena entry,
    /// the graph stays acyclic by construction.
    pub fn add(&mut self, manifest: &Revision) -> GraphResult<usize> {
        let id = manifest.revision_id;
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        let own = self.nodes.len();
        let mut origins = Vec::with_capacity(manifest.origins.len());
        for origin in &manifest.origins {
            if origin.revision_id == id {
                return Err(GraphError::CycleDetected(id));
            }
            let idx = *self
                .index
                .get(&origin.revision_id)
                .ok_or(GraphError::DanglingOrigin {
                    node: id,
                    origin: origin.revision_id,
                })?;
            if !origins.contains(&idx) {
                origins.push(idx);
            }
        }

        for &idx in &origins {
            self.children[idx].push(own);
        }
        if origins.is_empty() {
            self.roots.push(own);
        }

        debug!(
            revision = %id.short_hex(),
            box_id = %manifest.box_id,
            index = own,
            origins = origins.len(),
            "added lineage node"
        );
        self.nodes.push(LineageNode::new(
            manifest.to_ref(),
            manifest.run_id,
            manifest.created_at,
            origins,
        ));
        self.children.push(Vec::new());
        self.index.insert(id, own);

        Ok(own)
    }

    /// Retrieve a node by revision id.
    pub fn get(&self, id: &RevisionId) -> Option<&LineageNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// The arena index of a revision, if present.
    pub fn index_of(&self, id: &RevisionId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All root revisions (revisions with no origins).
    pub fn roots(&self) -> Vec<&LineageNode> {
        self.roots.iter().map(|&idx| &self.nodes[idx]).collect()
    }

    // ---------------------------------------------------------------
    // Ancestor / Descendant queries
    // ---------------------------------------------------------------

    /// All ancestors of a revision up to `max_depth` levels (BFS upward
    /// through origin edges).
    ///
    /// Returns an empty vec if the revision is not found. The revision
    /// itself is **not** included in the result.
    pub fn ancestors(&self, id: &RevisionId, max_depth: usize) -> Vec<&LineageNode> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        visited.insert(start);
        let mut result = Vec::new();
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

        for &origin in &self.nodes[start].origins {
            if visited.insert(origin) {
                queue.push_back((origin, 1));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth {
                continue;
            }
            result.push(&self.nodes[current]);
            if depth < max_depth {
                for &origin in &self.nodes[current].origins {
                    if visited.insert(origin) {
                        queue.push_back((origin, depth + 1));
                    }
                }
            }
        }

        result
    }

    /// All descendants of a revision up to `max_depth` levels (BFS downward
    /// through the forward-edge index).
    ///
    /// Returns an empty vec if the revision is not found. The revision
    /// itself is **not** included in the result.
    pub fn descendants(&self, id: &RevisionId, max_depth: usize) -> Vec<&LineageNode> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        visited.insert(start);
        let mut result = Vec::new();
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

        for &child in &self.children[start] {
            if visited.insert(child) {
                queue.push_back((child, 1));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth {
                continue;
            }
            result.push(&self.nodes[current]);
            if depth < max_depth {
                for &child in &self.children[current] {
                    if visited.insert(child) {
                        queue.push_back((child, depth + 1));
                    }
                }
            }
        }

        result
    }

    /// The full transitive origin closure of a revision, as a set of ids.
    ///
    /// The revision itself is not included. Returns an empty set if the
    /// revision is unknown.
    pub fn lineage_set(&self, id: &RevisionId) -> HashSet<RevisionId> {
        self.ancestors(id, usize::MAX)
            .into_iter()
            .map(|n| n.revision.revision_id)
            .collect()
    }

    // ---------------------------------------------------------------
    // Box queries
    // ---------------------------------------------------------------

    /// All revisions recorded for a box, ordered by creation time.
    pub fn box_history(&self, box_id: &BoxId) -> Vec<&LineageNode> {
        let mut nodes: Vec<&LineageNode> = self
            .nodes
            .iter()
            .filter(|n| &n.revision.box_id == box_id)
            .collect();
        nodes.sort_by_key(|n| n.created_at);
        nodes
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Validate the graph's structural integrity.
    ///
    /// Checks that every origin edge points at a strictly smaller arena
    /// index and that the id index covers every node.
    pub fn validate(&self) -> GraphResult<()> {
        for (own, node) in self.nodes.iter().enumerate() {
            for &origin in &node.origins {
                if origin >= own {
                    return Err(GraphError::CycleDetected(node.revision.revision_id));
                }
            }
            match self.index.get(&node.revision.revision_id) {
                Some(&idx) if idx == own => {}
                _ => {
                    return Err(GraphError::NodeNotFound(node.revision.revision_id));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lode_types::{Metadata, Revision, RevisionRef, RunId};

    fn rid(byte: u8) -> RevisionId {
        RevisionId::from_hash([byte; 32])
    }

    fn rref(box_name: &str, byte: u8) -> RevisionRef {
        RevisionRef {
            box_id: BoxId::new(box_name).unwrap(),
            revision_id: rid(byte),
        }
    }

    fn manifest(box_name: &str, id_byte: u8, seq: u64, origins: Vec<RevisionRef>) -> Revision {
        Revision {
            box_id: BoxId::new(box_name).unwrap(),
            revision_id: rid(id_byte),
            value_type: "bytes".to_string(),
            meta: Metadata::new(),
            origins,
            run_id: RunId::new(),
            created_at: Utc.timestamp_opt(1_700_000_000 + seq as i64, 0).unwrap(),
        }
    }

    /// Build a simple linear chain: raw -> clean -> features
    fn build_linear_graph() -> LineageGraph {
        let mut graph = LineageGraph::new();
        graph.add(&manifest("raw", 1, 0, vec![])).unwrap();
        graph
            .add(&manifest("clean", 2, 1, vec![rref("raw", 1)]))
            .unwrap();
        graph
            .add(&manifest("features", 3, 2, vec![rref("clean", 2)]))
            .unwrap();
        graph
    }

    /// Build a diamond:
    ///   raw
    ///  /   \
    /// train  test
    ///  \   /
    ///  report
    fn build_diamond_graph() -> LineageGraph {
        let mut graph = LineageGraph::new();
        graph.add(&manifest("raw", 1, 0, vec![])).unwrap();
        graph
            .add(&manifest("train", 2, 1, vec![rref("raw", 1)]))
            .unwrap();
        graph
            .add(&manifest("test", 3, 2, vec![rref("raw", 1)]))
            .unwrap();
        graph
            .add(&manifest(
                "report",
                4,
                3,
                vec![rref("train", 2), rref("test", 3)],
            ))
            .unwrap();
        graph
    }

    // ----------------------------------------------------------
    // Basic construction tests
    // ----------------------------------------------------------

    #[test]
    fn empty_graph() {
        let graph = LineageGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.roots().is_empty());
    }

    #[test]
    fn add_returns_increasing_indices() {
        let mut graph = LineageGraph::new();
        assert_eq!(graph.add(&manifest("raw", 1, 0, vec![])).unwrap(), 0);
        assert_eq!(
            graph
                .add(&manifest("clean", 2, 1, vec![rref("raw", 1)]))
                .unwrap(),
            1
        );
        assert!(graph.contains(&rid(1)));
        assert_eq!(graph.index_of(&rid(2)), Some(1));
    }

    #[test]
    fn origin_indices_are_strictly_smaller() {
        let graph = build_diamond_graph();
        let report = graph.get(&rid(4)).unwrap();
        assert!(report.origin_indices().iter().all(|&idx| idx < 3));
        graph.validate().unwrap();
    }

    #[test]
    fn duplicate_revision_is_rejected() {
        let mut graph = LineageGraph::new();
        graph.add(&manifest("raw", 1, 0, vec![])).unwrap();
        let result = graph.add(&manifest("raw", 1, 0, vec![]));
        assert!(matches!(result, Err(GraphError::DuplicateNode(_))));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn dangling_origin_is_rejected() {
        let mut graph = LineageGraph::new();
        let result = graph.add(&manifest("clean", 2, 1, vec![rref("raw", 99)]));
        assert!(matches!(result, Err(GraphError::DanglingOrigin { .. })));
    }

    #[test]
    fn self_origin_is_a_cycle() {
        let mut graph = LineageGraph::new();
        let result = graph.add(&manifest("raw", 1, 0, vec![rref("raw", 1)]));
        assert!(matches!(result, Err(GraphError::CycleDetected(_))));
    }

    #[test]
    fn repeated_origin_is_collapsed() {
        let mut graph = LineageGraph::new();
        graph.add(&manifest("raw", 1, 0, vec![])).unwrap();
        graph
            .add(&manifest(
                "clean",
                2,
                1,
                vec![rref("raw", 1), rref("raw", 1)],
            ))
            .unwrap();
        assert_eq!(graph.get(&rid(2)).unwrap().origin_indices(), &[0]);
    }

    #[test]
    fn roots_track_source_revisions() {
        let graph = build_diamond_graph();
        let roots = graph.roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].revision.revision_id, rid(1));
    }

    // ----------------------------------------------------------
    // Ancestor tests
    // ----------------------------------------------------------

    #[test]
    fn ancestors_of_root_is_empty() {
        let graph = build_linear_graph();
        assert!(graph.ancestors(&rid(1), 10).is_empty());
    }

    #[test]
    fn ancestors_of_leaf_in_linear_chain() {
        let graph = build_linear_graph();
        let ancestors = graph.ancestors(&rid(3), 10);
        let ids: HashSet<RevisionId> = ancestors.iter().map(|n| n.revision.revision_id).collect();
        assert_eq!(ids, HashSet::from([rid(1), rid(2)]));
    }

    #[test]
    fn ancestors_respects_max_depth() {
        let graph = build_linear_graph();
        let ancestors = graph.ancestors(&rid(3), 1);
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].revision.revision_id, rid(2));
    }

    #[test]
    fn diamond_ancestors_are_deduplicated() {
        let graph = build_diamond_graph();
        assert_eq!(graph.ancestors(&rid(4), 10).len(), 3);
    }

    // ----------------------------------------------------------
    // Descendant tests
    // ----------------------------------------------------------

    #[test]
    fn descendants_of_leaf_is_empty() {
        let graph = build_linear_graph();
        assert!(graph.descendants(&rid(3), 10).is_empty());
    }

    #[test]
    fn descendants_of_root_in_linear_chain() {
        let graph = build_linear_graph();
        let descendants = graph.descendants(&rid(1), 10);
        let ids: HashSet<RevisionId> =
            descendants.iter().map(|n| n.revision.revision_id).collect();
        assert_eq!(ids, HashSet::from([rid(2), rid(3)]));
    }

    #[test]
    fn descendants_respects_max_depth() {
        let graph = build_linear_graph();
        let descendants = graph.descendants(&rid(1), 1);
        assert_eq!(descendants.len(), 1);
        assert_eq!(descendants[0].revision.revision_id, rid(2));
    }

    // ----------------------------------------------------------
    // Lineage closure tests
    // ----------------------------------------------------------

    #[test]
    fn lineage_set_is_transitive() {
        let graph = build_linear_graph();
        assert_eq!(graph.lineage_set(&rid(3)), HashSet::from([rid(1), rid(2)]));
        assert_eq!(graph.lineage_set(&rid(2)), HashSet::from([rid(1)]));
        assert!(graph.lineage_set(&rid(1)).is_empty());
    }

    #[test]
    fn lineage_set_of_unknown_revision_is_empty() {
        let graph = build_linear_graph();
        assert!(graph.lineage_set(&rid(99)).is_empty());
    }

    #[test]
    fn diamond_lineage_counts_shared_origin_once() {
        let graph = build_diamond_graph();
        assert_eq!(
            graph.lineage_set(&rid(4)),
            HashSet::from([rid(1), rid(2), rid(3)])
        );
    }

    // ----------------------------------------------------------
    // Box history tests
    // ----------------------------------------------------------

    #[test]
    fn box_history_filters_and_sorts() {
        let mut graph = LineageGraph::new();
        graph.add(&manifest("raw", 1, 0, vec![])).unwrap();
        graph
            .add(&manifest("raw", 2, 5, vec![rref("raw", 1)]))
            .unwrap();
        graph
            .add(&manifest("clean", 3, 2, vec![rref("raw", 1)]))
            .unwrap();

        let history = graph.box_history(&BoxId::new("raw").unwrap());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].revision.revision_id, rid(1));
        assert_eq!(history[1].revision.revision_id, rid(2));
    }

    // ----------------------------------------------------------
    // Validation & serialization tests
    // ----------------------------------------------------------

    #[test]
    fn valid_graph_passes_validation() {
        build_diamond_graph().validate().unwrap();
    }

    #[test]
    fn serde_roundtrip() {
        let graph = build_diamond_graph();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: LineageGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), graph.len());
        assert_eq!(restored.roots().len(), graph.roots().len());
        restored.validate().unwrap();
    }
}
