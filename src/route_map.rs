use std::fmt;
use std::hash::Hash;
use std::io;

use csv::WriterBuilder;
use fnv::FnvHashMap;
use hashbrown::HashMap;

use crate::dijkstra::{dijkstra, ShortestPaths};
use crate::entity::{Cost, Edge, EdgeId, VertexId};
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::graph::Graph;

/// Vertex and edge counts above which `Display` prints only the header line.
const DISPLAY_LIMIT: usize = 100;

/// A graph whose vertices carry coordinates and are indexed by label.
///
/// Loaded once, then only read while routing.
#[derive(Debug, Clone)]
pub struct RouteMap<T, L = String> {
    graph: Graph<T, L>,
    coords: FnvHashMap<VertexId, Coordinates>,
    search: HashMap<T, VertexId>,
}

impl<T, L> Default for RouteMap<T, L> {
    fn default() -> Self {
        Self {
            graph: Graph::default(),
            coords: FnvHashMap::default(),
            search: HashMap::new(),
        }
    }
}

impl<T, L> RouteMap<T, L>
where
    T: Clone + Eq + Hash,
    L: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &Graph<T, L> {
        &self.graph
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }

    /// Add a new vertex at `coords`. A later vertex with the same label takes
    /// over the label index entry.
    pub fn add_vertex(&mut self, element: T, coords: Coordinates) -> VertexId {
        let v = self.graph.add_vertex(element.clone());
        self.search.insert(element, v);
        self.coords.insert(v, coords);
        v
    }

    /// Like [`Graph::add_vertex_if_new`], but resolved through the label index.
    pub fn add_vertex_if_new(&mut self, element: T, coords: Coordinates) -> VertexId {
        match self.search.get(&element) {
            Some(&v) => v,
            None => self.add_vertex(element, coords),
        }
    }

    pub fn vertex_by_label(&self, element: &T) -> Option<VertexId> {
        self.search.get(element).copied()
    }

    pub fn coordinates(&self, v: VertexId) -> Option<Coordinates> {
        self.coords.get(&v).copied()
    }

    pub fn add_edge(
        &mut self,
        v: VertexId,
        w: VertexId,
        cost: Cost,
        label: Option<L>,
        one_way: bool,
    ) -> Option<EdgeId> {
        self.graph.add_edge(v, w, cost, label, one_way)
    }

    pub fn get_edge(&self, v: VertexId, w: VertexId) -> Option<&Edge<L>> {
        self.graph.get_edge(v, w)
    }

    pub fn dijkstra(&self, source: VertexId) -> ShortestPaths {
        dijkstra(&self.graph, source)
    }

    /// Straight-line distance between two vertices in meters.
    pub fn straight_line_meters(&self, v: VertexId, w: VertexId) -> Option<f64> {
        Some(self.coordinates(v)?.distance_meters(&self.coordinates(w)?))
    }
}

impl<T, L> RouteMap<T, L>
where
    T: Clone + Eq + Hash + fmt::Display,
    L: Clone + Eq + Hash,
{
    fn label_of(&self, v: VertexId) -> String {
        self.graph
            .element(v)
            .map_or_else(|| format!("{v:?}"), ToString::to_string)
    }

    /// Cheapest path from `source` to `dest`, both ends included.
    pub fn shortest_path(&self, source: VertexId, dest: VertexId) -> Result<Vec<VertexId>> {
        self.dijkstra(source)
            .path_to(dest)
            .ok_or_else(|| Error::NoPath {
                from: self.label_of(source),
                to: self.label_of(dest),
            })
    }

    /// One row per traversed edge: the vertex the edge leaves from, and the
    /// running cost once that edge is crossed.
    pub fn report(&self, path: &[VertexId]) -> Result<Vec<ReportRow>> {
        let mut cost = 0.0;
        let mut rows = Vec::with_capacity(path.len().saturating_sub(1));
        for step in path.windows(2) {
            let (from, to) = (step[0], step[1]);
            let edge = self.get_edge(from, to).ok_or_else(|| Error::MissingEdge {
                from: self.label_of(from),
                to: self.label_of(to),
            })?;
            cost += edge.cost();
            let coordinates = self
                .coordinates(from)
                .ok_or_else(|| Error::MissingCoordinates {
                    label: self.label_of(from),
                })?;
            rows.push(ReportRow {
                kind: RowKind::Waypoint,
                coordinates,
                label: self.label_of(from),
                cost,
            });
        }
        Ok(rows)
    }
}

impl<T, L> fmt::Display for RouteMap<T, L>
where
    T: Clone + Eq + Hash + fmt::Display,
    L: Clone + Eq + Hash + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.graph.fmt_header(f)?;
        if self.num_vertices() >= DISPLAY_LIMIT || self.num_edges() >= DISPLAY_LIMIT {
            return Ok(());
        }
        write!(f, "\nVertices: ")?;
        for v in self.graph.vertices() {
            write!(f, "{}", self.label_of(v))?;
            if let Some(coords) = self.coordinates(v) {
                write!(f, "{coords}")?;
            }
            write!(f, "--")?;
        }
        self.graph.fmt_edges(f)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowKind {
    Waypoint,
}

impl RowKind {
    pub fn tag(self) -> &'static str {
        match self {
            RowKind::Waypoint => "W",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub kind: RowKind,
    pub coordinates: Coordinates,
    pub label: String,
    pub cost: Cost,
}

/// Write report rows as tab-separated values under a
/// `type latitude longitude element cost` header.
pub fn write_report<W: io::Write>(rows: &[ReportRow], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    wtr.write_record(["type", "latitude", "longitude", "element", "cost"])?;
    for row in rows {
        wtr.write_record(&[
            row.kind.tag().to_string(),
            row.coordinates.latitude.to_string(),
            row.coordinates.longitude.to_string(),
            row.label.clone(),
            row.cost.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one row per settled vertex (`vertex`, `cost`, `predecessor`) in the
/// order the vertices were finalized. With `include_unreachable` the remaining
/// vertices follow with an `inf` cost.
pub fn write_cost_table<T, L, W>(
    graph: &Graph<T, L>,
    paths: &ShortestPaths,
    include_unreachable: bool,
    delimiter: u8,
    writer: W,
) -> Result<()>
where
    T: fmt::Display,
    L: Clone + Eq + Hash,
    W: io::Write,
{
    let label = |v: VertexId| graph.element(v).map(ToString::to_string).unwrap_or_default();
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    wtr.write_record(["vertex", "cost", "predecessor"])?;
    for (v, settled) in paths.iter() {
        let pred = settled.predecessor.map(label).unwrap_or_default();
        wtr.write_record(&[label(v), settled.cost.to_string(), pred])?;
    }
    if include_unreachable {
        for v in graph.vertices().filter(|&v| !paths.contains(v)) {
            wtr.write_record(&[label(v), String::from("inf"), String::new()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
