use std::fmt;
use std::hash::Hash;

use fnv::FnvBuildHasher;
use indexmap::IndexMap;

use crate::entity::{Cost, Edge, EdgeId, Vertex, VertexId};

/// Key of one entry in a vertex's adjacency map.
///
/// Parallel edges between the same pair of vertices coexist as long as their
/// labels differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdjKey<L> {
    pub neighbor: VertexId,
    pub label: Option<L>,
}

type Adjacency<L> = IndexMap<AdjKey<L>, EdgeId, FnvBuildHasher>;

/// Adjacency-map graph holding directed and undirected edges side by side.
///
/// An undirected edge is stored under both endpoints and both entries refer to
/// the same [`EdgeId`]. A one-way edge is stored only under its start.
#[derive(Debug, Clone)]
pub struct Graph<T, L = String> {
    vertices: Vec<Vertex<T>>,
    edges: Vec<Edge<L>>,
    structure: Vec<Adjacency<L>>,
}

impl<T, L> Default for Graph<T, L> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            structure: Vec::new(),
        }
    }
}

impl<T, L> Graph<T, L>
where
    L: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct edges, counting an undirected edge once.
    pub fn num_edges(&self) -> usize {
        self.all_edges().count()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        v.0 < self.vertices.len()
    }

    pub fn vertex(&self, v: VertexId) -> Option<&Vertex<T>> {
        self.vertices.get(v.0)
    }

    pub fn element(&self, v: VertexId) -> Option<&T> {
        self.vertex(v).map(Vertex::element)
    }

    /// All vertex ids in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId)
    }

    pub fn edge(&self, e: EdgeId) -> Option<&Edge<L>> {
        self.edges.get(e.0)
    }

    /// Every edge exactly once, reported by the vertex that is its `start()`.
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge<L>> + '_ {
        self.vertices().flat_map(move |v| {
            self.edges_of(v).filter(move |edge| edge.start() == v)
        })
    }

    /// Edges incident on `v` in the order their keys were first inserted.
    pub fn edges_of(&self, v: VertexId) -> impl Iterator<Item = &Edge<L>> + '_ {
        self.structure
            .get(v.0)
            .into_iter()
            .flat_map(|adjacency| adjacency.values())
            .map(move |&e| &self.edges[e.0])
    }

    /// First edge out of `v` whose neighbor is `w`, whatever its label.
    pub fn get_edge(&self, v: VertexId, w: VertexId) -> Option<&Edge<L>> {
        self.structure
            .get(v.0)?
            .iter()
            .find(|(key, _)| key.neighbor == w)
            .map(|(_, &e)| &self.edges[e.0])
    }

    /// Number of adjacency entries under `v`.
    pub fn degree(&self, v: VertexId) -> usize {
        self.structure.get(v.0).map_or(0, IndexMap::len)
    }

    /// Always creates a new vertex, even when an equal element is present.
    pub fn add_vertex(&mut self, element: T) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex::new(element));
        self.structure.push(Adjacency::default());
        id
    }

    /// Add an edge between `v` and `w`.
    ///
    /// Returns `None` without touching the graph if either endpoint is absent.
    /// An existing entry with the same neighbor and label is replaced.
    pub fn add_edge(
        &mut self,
        v: VertexId,
        w: VertexId,
        cost: Cost,
        label: Option<L>,
        one_way: bool,
    ) -> Option<EdgeId> {
        if !self.contains(v) || !self.contains(w) {
            tracing::debug!(?v, ?w, "edge endpoint not in graph; edge skipped");
            return None;
        }
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge::new(v, w, cost, label.clone()));

        self.structure[v.0].insert(
            AdjKey {
                neighbor: w,
                label: label.clone(),
            },
            id,
        );
        if !one_way {
            self.structure[w.0].insert(AdjKey { neighbor: v, label }, id);
        }
        Some(id)
    }
}

impl<T, L> Graph<T, L>
where
    T: PartialEq,
    L: Clone + Eq + Hash,
{
    /// First vertex, in insertion order, whose element equals `element`.
    pub fn vertex_by_label(&self, element: &T) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|vertex| vertex.element() == element)
            .map(VertexId)
    }

    /// Return the vertex holding an equal element, creating it if none exists.
    pub fn add_vertex_if_new(&mut self, element: T) -> VertexId {
        match self.vertex_by_label(&element) {
            Some(v) => v,
            None => self.add_vertex(element),
        }
    }
}

impl<T, L> Graph<T, L>
where
    T: fmt::Display,
    L: Clone + Eq + Hash + fmt::Display,
{
    /// `(a--b costs c)`, with `, elem: l` when the edge is labelled.
    pub(crate) fn fmt_edge(&self, f: &mut fmt::Formatter<'_>, edge: &Edge<L>) -> fmt::Result {
        let (start, end) = edge.vertices();
        write!(
            f,
            "({}--{} costs {}",
            self.vertices[start.0],
            self.vertices[end.0],
            edge.cost()
        )?;
        if let Some(label) = edge.label() {
            write!(f, ", elem: {label}")?;
        }
        write!(f, ")")
    }

    pub(crate) fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|V| = {}; |E| = {}", self.num_vertices(), self.num_edges())
    }

    pub(crate) fn fmt_edges(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\nEdges: ")?;
        for edge in self.all_edges() {
            self.fmt_edge(f, edge)?;
            write!(f, " ")?;
        }
        Ok(())
    }
}

impl<T, L> fmt::Display for Graph<T, L>
where
    T: fmt::Display,
    L: Clone + Eq + Hash + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_header(f)?;
        write!(f, "\nVertices: ")?;
        for vertex in &self.vertices {
            write!(f, "{vertex}-")?;
        }
        self.fmt_edges(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (Graph<&'static str>, [VertexId; 4]) {
        let mut g = Graph::new();
        let a = g.add_vertex("A");
        let b = g.add_vertex("B");
        let c = g.add_vertex("C");
        let d = g.add_vertex("D");
        g.add_edge(a, b, 1.0, None, false);
        g.add_edge(b, c, 2.0, None, false);
        g.add_edge(a, c, 4.0, None, false);
        g.add_edge(c, d, 1.0, None, true);
        (g, [a, b, c, d])
    }

    #[test]
    fn undirected_edge_is_shared() {
        let (g, [a, b, ..]) = square();
        let forward = g.get_edge(a, b).unwrap();
        let backward = g.get_edge(b, a).unwrap();
        assert!(std::ptr::eq(forward, backward));
        assert_eq!(forward.cost(), backward.cost());
    }

    #[test]
    fn one_way_edge_has_single_direction() {
        let (g, [_, _, c, d]) = square();
        assert!(g.get_edge(c, d).is_some());
        assert!(g.get_edge(d, c).is_none());
        assert_eq!(g.degree(d), 0);
        assert_eq!(g.degree(c), 3);
    }

    #[test]
    fn counts() {
        let (g, [a, ..]) = square();
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.degree(a), 2);
    }

    #[test]
    fn edges_of_keeps_insertion_order() {
        let (g, [a, b, c, _]) = square();
        let neighbors: Vec<VertexId> = g.edges_of(a).filter_map(|e| e.opposite(a)).collect();
        assert_eq!(neighbors, vec![b, c]);
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let (mut g, [a, ..]) = square();
        let stranger = VertexId(17);
        assert_eq!(g.add_edge(a, stranger, 1.0, None, false), None);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.edges_of(stranger).count(), 0);
    }

    #[test]
    fn same_key_replaces_previous_edge() {
        let (mut g, [a, b, ..]) = square();
        g.add_edge(a, b, 9.0, None, false);
        assert_eq!(g.get_edge(a, b).map(Edge::cost), Some(9.0));
        assert_eq!(g.get_edge(b, a).map(Edge::cost), Some(9.0));
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.degree(a), 2);
    }

    #[test]
    fn labelled_parallel_edges_coexist() {
        let mut g: Graph<u32, String> = Graph::new();
        let a = g.add_vertex(1);
        let b = g.add_vertex(2);
        g.add_edge(a, b, 5.0, Some("road".into()), false);
        g.add_edge(a, b, 3.0, Some("rail".into()), false);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.degree(a), 2);
        // first match wins regardless of label
        assert_eq!(g.get_edge(a, b).map(Edge::cost), Some(5.0));
    }

    #[test]
    fn vertex_dedup() {
        let mut g: Graph<u64> = Graph::new();
        let first = g.add_vertex_if_new(42);
        let second = g.add_vertex_if_new(42);
        assert_eq!(first, second);

        let x = g.add_vertex(7);
        let y = g.add_vertex(7);
        assert_ne!(x, y);
        assert_eq!(g.vertex(x), g.vertex(y));
        assert_eq!(g.vertex_by_label(&7), Some(x));
        assert_eq!(g.vertex_by_label(&8), None);
        assert_eq!(g.num_vertices(), 3);
    }

    #[test]
    fn display() {
        let mut g: Graph<&str> = Graph::new();
        let a = g.add_vertex("a");
        let b = g.add_vertex("b");
        g.add_edge(a, b, 2.0, Some("x".to_string()), false);
        assert_eq!(
            g.to_string(),
            "|V| = 2; |E| = 1\nVertices: a-b-\nEdges: (a--b costs 2, elem: x) "
        );
    }
}
