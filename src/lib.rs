//! Adjacency-map graphs, an adaptable priority queue with decrease-key, and
//! Dijkstra's algorithm on top of them, plus route reconstruction over maps
//! whose vertices carry coordinates.

pub mod apq;
mod dijkstra;
mod entity;
mod error;
pub mod geo;
mod graph;
mod logging;
pub mod reader;
mod route_map;

pub use apq::{Apq, Handle};
pub use dijkstra::{dijkstra, Settled, ShortestPaths};
pub use entity::{Cost, Edge, EdgeId, Vertex, VertexId};
pub use error::{Error, Result};
pub use geo::Coordinates;
pub use graph::{AdjKey, Graph};
pub use logging::init_tracing;
pub use route_map::{write_cost_table, write_report, ReportRow, RouteMap, RowKind};
