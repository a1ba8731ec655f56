//! Directed weighted multigraph with stable vertex identity.
//!
//! [`Graph`] wraps a petgraph [`StableDiGraph`] behind an identity-keyed
//! facade: vertices are addressed by the key returned from
//! [`GraphVertex::key`], and inserting a vertex whose key is already
//! present returns the existing vertex (the two are fused). Edge
//! direction reads as "depends on" -- an edge from `a` to `b` says
//! `a` requires `b` to be available.
//!
//! Reversal is not a separate structure: every traversal takes a
//! [`Direction`], so walking `Direction::Incoming` is the reverse view.
//! Cloning the graph copies the adjacency structure; vertex payloads are
//! cloned with their own `Clone`, which is expected to be shallow.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

pub use petgraph::Direction;

/// A vertex that can live in a [`Graph`].
///
/// Two vertices with equal keys are semantically the same vertex, even
/// if their payloads differ; [`Graph::add`] fuses them.
pub trait GraphVertex: Clone {
    type Key: Clone + Eq + Hash + Ord + fmt::Debug;

    /// Stable identity of this vertex.
    fn key(&self) -> Self::Key;

    /// Human-readable label used by the deterministic printer.
    fn label(&self) -> String;
}

/// Distance and predecessor maps produced by [`Graph::shortest_path`],
/// keyed by vertex identity.
#[derive(Debug, Clone)]
pub struct PathMap<K> {
    /// Total distance from the source to each reachable vertex.
    pub dist: HashMap<K, i64>,
    /// Previous vertex on the selected path to each reachable vertex.
    pub pred: HashMap<K, K>,
}

/// Directed weighted multigraph addressed by vertex identity.
#[derive(Clone, Debug)]
pub struct Graph<V: GraphVertex> {
    inner: StableDiGraph<V, i32>,
    index: IndexMap<V::Key, NodeIndex>,
}

impl<V: GraphVertex> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: GraphVertex> Graph<V> {
    pub fn new() -> Self {
        Graph {
            inner: StableDiGraph::new(),
            index: IndexMap::new(),
        }
    }

    /// Adds a vertex, fusing it with any existing vertex of the same key.
    ///
    /// When the key is already present the existing payload is kept.
    /// Returns the vertex key.
    pub fn add(&mut self, vertex: V) -> V::Key {
        let key = vertex.key();
        if !self.index.contains_key(&key) {
            let ix = self.inner.add_node(vertex);
            self.index.insert(key.clone(), ix);
        }
        key
    }

    /// Adds a vertex, replacing the payload of any existing vertex of the
    /// same key. Incident edges are preserved.
    pub fn add_overwrite(&mut self, vertex: V) -> V::Key {
        let key = vertex.key();
        match self.index.get(&key) {
            Some(&ix) => self.inner[ix] = vertex,
            None => {
                let ix = self.inner.add_node(vertex);
                self.index.insert(key.clone(), ix);
            }
        }
        key
    }

    /// Removes a vertex and all its incident edges.
    pub fn remove(&mut self, key: &V::Key) {
        if let Some(ix) = self.index.shift_remove(key) {
            self.inner.remove_node(ix);
        }
    }

    pub fn contains(&self, key: &V::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn vertex(&self, key: &V::Key) -> Option<&V> {
        self.index.get(key).map(|&ix| &self.inner[ix])
    }

    pub fn vertex_mut(&mut self, key: &V::Key) -> Option<&mut V> {
        self.index.get(key).map(|&ix| &mut self.inner[ix])
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.index.values().map(|&ix| &self.inner[ix])
    }

    /// Vertex keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &V::Key> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Adds a directed edge from `a` to `b`. Idempotent by endpoint pair:
    /// if the edge already exists, the first writer's weight wins.
    /// Both endpoints must already be in the graph or this does nothing.
    pub fn add_edge(&mut self, a: &V::Key, b: &V::Key, weight: i32) {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return;
        };
        if self.inner.find_edge(ia, ib).is_none() {
            self.inner.add_edge(ia, ib, weight);
        }
    }

    /// Sets the weight of the edge from `a` to `b`, inserting it if absent.
    /// This is the overwrite counterpart of [`Graph::add_edge`], used for
    /// reweighting passes on graph copies.
    pub fn set_edge_weight(&mut self, a: &V::Key, b: &V::Key, weight: i32) {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return;
        };
        match self.inner.find_edge(ia, ib) {
            Some(e) => self.inner[e] = weight,
            None => {
                self.inner.add_edge(ia, ib, weight);
            }
        }
    }

    pub fn remove_edge(&mut self, a: &V::Key, b: &V::Key) {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return;
        };
        if let Some(e) = self.inner.find_edge(ia, ib) {
            self.inner.remove_edge(e);
        }
    }

    pub fn edge_weight(&self, a: &V::Key, b: &V::Key) -> Option<i32> {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return None;
        };
        self.inner.find_edge(ia, ib).map(|e| self.inner[e])
    }

    /// Neighboring vertices along edges in the given direction.
    /// `Outgoing` follows out-edges (dependencies), `Incoming` follows
    /// in-edges (dependents).
    pub fn neighbors(&self, key: &V::Key, dir: Direction) -> Vec<&V> {
        let Some(&ix) = self.index.get(key) else {
            return Vec::new();
        };
        let mut ns: Vec<NodeIndex> = self.inner.neighbors_directed(ix, dir).collect();
        ns.sort_unstable();
        ns.dedup();
        ns.into_iter().map(|n| &self.inner[n]).collect()
    }

    /// Keys of neighboring vertices along edges in the given direction.
    pub fn neighbor_keys(&self, key: &V::Key, dir: Direction) -> Vec<V::Key> {
        self.neighbors(key, dir).into_iter().map(V::key).collect()
    }

    /// Depth-first traversal from `start` along the given direction.
    ///
    /// The visitor is called once per reachable vertex, in deterministic
    /// order; returning `false` stops descent below that vertex. Cycles
    /// are tolerated: each vertex is visited at most once.
    pub fn dfs<F>(&self, start: &V::Key, dir: Direction, visit: &mut F)
    where
        F: FnMut(&V) -> bool,
    {
        let Some(&start_ix) = self.index.get(start) else {
            return;
        };
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack = vec![start_ix];
        while let Some(ix) = stack.pop() {
            if !visited.insert(ix) {
                continue;
            }
            if !visit(&self.inner[ix]) {
                continue;
            }
            let mut ns: Vec<NodeIndex> = self.inner.neighbors_directed(ix, dir).collect();
            ns.sort_unstable();
            ns.dedup();
            for n in ns.into_iter().rev() {
                if !visited.contains(&n) {
                    stack.push(n);
                }
            }
        }
    }

    /// Single-source shortest paths from `start`, walking edges in the
    /// given direction.
    ///
    /// Dijkstra over a non-negative projection of the weights: if any
    /// edge weight is negative, all weights are shifted up uniformly
    /// before relaxation. The shift preserves the preference ordering the
    /// resolver relies on (discounted edges stay cheapest) without
    /// requiring a negative-weight algorithm. Ties are broken by vertex
    /// insertion index, so results are deterministic for the same graph
    /// construction order.
    pub fn shortest_path(&self, start: &V::Key, dir: Direction) -> PathMap<V::Key> {
        let mut out = PathMap {
            dist: HashMap::new(),
            pred: HashMap::new(),
        };
        let Some(&start_ix) = self.index.get(start) else {
            return out;
        };

        let offset = self
            .inner
            .edge_references()
            .map(|e| *e.weight())
            .min()
            .map_or(0i64, |m| if m < 0 { -(m as i64) } else { 0 });

        let mut dist: HashMap<NodeIndex, i64> = HashMap::new();
        let mut pred: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::new();

        dist.insert(start_ix, 0);
        heap.push(Reverse((0, start_ix.index())));

        while let Some(Reverse((cost, ix))) = heap.pop() {
            let ix = NodeIndex::new(ix);
            if dist.get(&ix).map_or(false, |&d| cost > d) {
                continue;
            }
            for edge in self.inner.edges_directed(ix, dir) {
                let next = match dir {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                let next_cost = cost + *edge.weight() as i64 + offset;
                if dist.get(&next).map_or(true, |&d| next_cost < d) {
                    dist.insert(next, next_cost);
                    pred.insert(next, ix);
                    heap.push(Reverse((next_cost, next.index())));
                }
            }
        }

        for (ix, d) in dist {
            out.dist.insert(self.inner[ix].key(), d);
        }
        for (ix, p) in pred {
            out.pred.insert(self.inner[ix].key(), self.inner[p].key());
        }
        out
    }

    /// Extracts the selected path ending at `target` from a [`PathMap`],
    /// ordered source-first. Returns `None` if `target` was unreachable.
    pub fn path_to(&self, paths: &PathMap<V::Key>, target: &V::Key) -> Option<Vec<V::Key>> {
        if !paths.dist.contains_key(target) {
            return None;
        }
        let mut path = vec![target.clone()];
        let mut current = target.clone();
        while let Some(prev) = paths.pred.get(&current) {
            current = prev.clone();
            path.push(current.clone());
        }
        path.reverse();
        Some(path)
    }
}

impl<V: GraphVertex> fmt::Display for Graph<V> {
    /// Deterministic printer: vertices and their dependencies ordered by
    /// label so diagnostics are stable across runs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels: Vec<(String, &V::Key)> = self
            .index
            .iter()
            .map(|(k, &ix)| (self.inner[ix].label(), k))
            .collect();
        labels.sort();

        for (label, key) in labels {
            writeln!(f, "{}", label)?;
            let mut deps: Vec<String> = self
                .neighbors(key, Direction::Outgoing)
                .into_iter()
                .map(|v| v.label())
                .collect();
            deps.sort();
            for dep in deps {
                writeln!(f, "  {}", dep)?;
            }
        }
        Ok(())
    }
}
