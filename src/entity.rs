use std::cmp::Ordering;
use std::fmt;

pub type Cost = f64;

/// Stable identity of a vertex inside the graph that created it.
///
/// Two vertices carrying equal elements still get distinct ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) usize);

impl VertexId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable identity of an edge inside the graph that created it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) usize);

/// A vertex wrapping one opaque element.
///
/// Comparison delegates to the element, so `==` answers "same label", not
/// "same vertex". Use [`VertexId`] for identity.
#[derive(Clone, Debug)]
pub struct Vertex<T> {
    element: T,
}

impl<T> Vertex<T> {
    pub fn new(element: T) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &T {
        &self.element
    }
}

impl<T: PartialEq> PartialEq for Vertex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
    }
}

impl<T: PartialOrd> PartialOrd for Vertex<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.element.partial_cmp(&other.element)
    }
}

impl<T: fmt::Display> fmt::Display for Vertex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.element.fmt(f)
    }
}

/// An edge between two vertices with a cost and an optional label.
///
/// The endpoint order records insertion direction, also for edges the graph
/// treats as undirected. Edges are immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge<L> {
    start: VertexId,
    end: VertexId,
    cost: Cost,
    label: Option<L>,
}

impl<L> Edge<L> {
    pub fn new(start: VertexId, end: VertexId, cost: Cost, label: Option<L>) -> Self {
        Self {
            start,
            end,
            cost,
            label,
        }
    }

    pub fn vertices(&self) -> (VertexId, VertexId) {
        (self.start, self.end)
    }

    pub fn start(&self) -> VertexId {
        self.start
    }

    pub fn end(&self) -> VertexId {
        self.end
    }

    /// The endpoint that is not `v`, or `None` when `v` is not an endpoint.
    pub fn opposite(&self, v: VertexId) -> Option<VertexId> {
        if self.start == v {
            Some(self.end)
        } else if self.end == v {
            Some(self.start)
        } else {
            None
        }
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn label(&self) -> Option<&L> {
        self.label.as_ref()
    }
}
