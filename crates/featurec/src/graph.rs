//! A small dependency graph over feature names.
//!
//! Nodes are numbered in declaration order, which doubles as the tie-breaker
//! for the topological sort so the output never depends on hash ordering.

use crate::model::FeatureName;
use fxhash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub(crate) struct DependencyGraph<'a> {
    names: Vec<&'a FeatureName>,
    index: FxHashMap<&'a str, usize>,
    edges: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds a graph with one node per distinct name, numbered in iteration order.
    pub(crate) fn new(nodes: impl IntoIterator<Item = &'a FeatureName>) -> Self {
        let mut graph = Self { names: Vec::new(), index: FxHashMap::default(), edges: Vec::new() };
        for name in nodes {
            if !graph.index.contains_key(name.as_str()) {
                graph.index.insert(name.as_str(), graph.names.len());
                graph.names.push(name);
                graph.edges.push(Vec::new());
            }
        }
        graph
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn name(&self, node: usize) -> &'a FeatureName {
        self.names[node]
    }

    /// Adds `from -> to` ("`to` must be evaluated after `from`").
    ///
    /// Returns `false` and leaves the graph untouched if either end is unknown.
    pub(crate) fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(from), Some(to)) = (self.position(from), self.position(to)) else {
            return false;
        };
        if !self.edges[from].contains(&to) {
            self.edges[from].push(to);
        }
        true
    }

    /// Kahn's algorithm; among ready nodes the earliest declared goes first.
    ///
    /// # Errors
    /// Returns every cycle (as node lists in declaration order) if the graph is not a DAG.
    pub(crate) fn topological_order(&self) -> Result<Vec<usize>, Vec<Vec<usize>>> {
        let mut in_degree = vec![0usize; self.names.len()];
        for targets in &self.edges {
            for &to in targets {
                in_degree[to] += 1;
            }
        }

        let mut queue: BinaryHeap<Ready> =
            (0..self.names.len()).filter(|&n| in_degree[n] == 0).map(Ready).collect();

        let mut sorted = Vec::with_capacity(self.names.len());
        while let Some(Ready(node)) = queue.pop() {
            sorted.push(node);
            for &next in &self.edges[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push(Ready(next));
                }
            }
        }

        if sorted.len() == self.names.len() { Ok(sorted) } else { Err(self.cycles()) }
    }

    /// Strongly connected components that contain a cycle, via Tarjan's algorithm.
    fn cycles(&self) -> Vec<Vec<usize>> {
        let mut tarjan = Tarjan::new(&self.edges);
        for node in 0..self.names.len() {
            if tarjan.index[node].is_none() {
                tarjan.visit(node);
            }
        }

        let mut cycles: Vec<Vec<usize>> = tarjan
            .components
            .into_iter()
            .filter(|c| c.len() > 1 || self.edges[c[0]].contains(&c[0]))
            .map(|mut c| {
                c.sort_unstable();
                c
            })
            .collect();
        cycles.sort_unstable();
        cycles
    }
}

/// Min-heap entry keyed by declaration index.
#[derive(Debug, Eq, PartialEq)]
struct Ready(usize);

impl Ord for Ready {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

impl PartialOrd for Ready {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Tarjan<'g> {
    edges: &'g [Vec<usize>],
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next: usize,
    components: Vec<Vec<usize>>,
}

impl<'g> Tarjan<'g> {
    fn new(edges: &'g [Vec<usize>]) -> Self {
        let n = edges.len();
        Self {
            edges,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next: 0,
            components: Vec::new(),
        }
    }

    /// Iterative DFS; each frame is a node and the index of its next outgoing edge.
    fn visit(&mut self, root: usize) {
        let edges = self.edges;
        let mut work: Vec<(usize, usize)> = Vec::new();
        self.enter(root);
        work.push((root, 0));

        while let Some(frame) = work.last_mut() {
            let (node, edge) = *frame;
            if let Some(&next) = edges[node].get(edge) {
                frame.1 += 1;
                match self.index[next] {
                    None => {
                        self.enter(next);
                        work.push((next, 0));
                    },
                    Some(index) if self.on_stack[next] => {
                        self.low[node] = self.low[node].min(index);
                    },
                    Some(_) => {},
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                self.low[parent] = self.low[parent].min(self.low[node]);
            }
            if self.index[node] == Some(self.low[node]) {
                self.close_component(node);
            }
        }
    }

    fn enter(&mut self, node: usize) {
        self.index[node] = Some(self.next);
        self.low[node] = self.next;
        self.next += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    fn close_component(&mut self, root: usize) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack[member] = false;
            component.push(member);
            if member == root {
                break;
            }
        }
        self.components.push(component);
    }
}
