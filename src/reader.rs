/*
Readers for the two on-disk graph descriptions.

Node/Edge text format: blocks that start with a `Node` or `Edge` line, each followed by
one field per line. A field line is whitespace separated and its value starts at the
second token, so `id: 7`, `id 7` and `gps 51.89 -8.47` all work.

    Node            Edge
    id: 1           source: 1
    gps: 51.9 -8.4  target: 2
                    length: 120.5
                    time: 9.3
                    oneway: 0

Fields are positional: a node's id comes first, then (for route maps) its coordinates;
an edge's source, target and length come first, followed by an optional `time` field
and a one-way flag.

CSV edge lists: a header row, then `source,target,cost[,oneway]` rows.
*/

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use hashbrown::HashMap;

use crate::entity::{Cost, VertexId};
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::graph::Graph;
use crate::route_map::RouteMap;

pub type Label = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BlockKind {
    Node,
    Edge,
}

#[derive(Debug)]
struct Field {
    line: usize,
    tokens: Vec<String>,
}

impl Field {
    fn name(&self) -> &str {
        self.tokens
            .first()
            .map(|t| t.trim_end_matches(':'))
            .unwrap_or("")
    }

    fn value<V: FromStr>(&self, pos: usize, what: &str) -> Result<V> {
        let raw = self.tokens.get(pos).ok_or_else(|| Error::Parse {
            line: self.line,
            message: format!("missing {what}"),
        })?;
        raw.parse().map_err(|_| Error::Parse {
            line: self.line,
            message: format!("invalid {what}: {raw:?}"),
        })
    }
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    line: usize,
    fields: Vec<Field>,
}

impl Block {
    fn field(&self, pos: usize, what: &str) -> Result<&Field> {
        self.fields.get(pos).ok_or_else(|| Error::Parse {
            line: self.line,
            message: format!("{:?} block is missing its {what}", self.kind),
        })
    }
}

/// Which ways an edge may be travelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Direction {
    Both,
    Forward,
    Backward,
}

impl Direction {
    /// Endpoints in travel order and whether the edge is one-way.
    fn orient(self, source: VertexId, target: VertexId) -> (VertexId, VertexId, bool) {
        match self {
            Direction::Both => (source, target, false),
            Direction::Forward => (source, target, true),
            Direction::Backward => (target, source, true),
        }
    }
}

fn parse_oneway(raw: &str) -> Direction {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Direction::Forward,
        "-1" => Direction::Backward,
        _ => Direction::Both,
    }
}

#[derive(Debug)]
struct NodeRecord {
    id: Label,
    coords: Option<Coordinates>,
}

#[derive(Debug)]
struct EdgeRecord {
    line: usize,
    source: Label,
    target: Label,
    length: Cost,
    time: Option<Cost>,
    direction: Direction,
}

impl NodeRecord {
    fn from_block(block: &Block) -> Result<Self> {
        let id = block.field(0, "id")?.value(1, "node id")?;
        let coords = match block.fields.get(1) {
            Some(field) => Some(Coordinates::new(
                field.value(1, "latitude")?,
                field.value(2, "longitude")?,
            )),
            None => None,
        };
        Ok(Self { id, coords })
    }
}

impl EdgeRecord {
    fn from_block(block: &Block) -> Result<Self> {
        let source = block.field(0, "source")?.value(1, "source id")?;
        let target = block.field(1, "target")?.value(1, "target id")?;
        let length = block.field(2, "length")?.value(1, "length")?;
        let mut time = None;
        let mut direction = Direction::Both;
        for field in &block.fields[3..] {
            if field.name().eq_ignore_ascii_case("time") {
                time = Some(field.value(1, "time")?);
            } else if let Some(raw) = field.tokens.get(1) {
                direction = parse_oneway(raw);
            }
        }
        Ok(Self {
            line: block.line,
            source,
            target,
            length,
            time,
            direction,
        })
    }

    fn oriented(&self, source: VertexId, target: VertexId) -> (VertexId, VertexId, bool) {
        self.direction.orient(source, target)
    }
}

fn read_blocks<R: BufRead>(reader: R) -> Result<Vec<Block>> {
    let mut blocks: Vec<Block> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let number = i + 1;
        let trimmed = line.trim();
        let kind = match trimmed {
            "" => continue,
            "Node" => Some(BlockKind::Node),
            "Edge" => Some(BlockKind::Edge),
            _ => None,
        };
        if let Some(kind) = kind {
            blocks.push(Block {
                kind,
                line: number,
                fields: Vec::new(),
            });
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            return Err(Error::Parse {
                line: number,
                message: format!("expected Node or Edge, found {trimmed:?}"),
            });
        };
        block.fields.push(Field {
            line: number,
            tokens: trimmed.split_whitespace().map(String::from).collect(),
        });
    }
    Ok(blocks)
}

fn resolve(index: &HashMap<Label, VertexId>, id: Label, line: usize) -> Result<VertexId> {
    index.get(&id).copied().ok_or_else(|| Error::Parse {
        line,
        message: format!("edge refers to unknown vertex {id}"),
    })
}

/// Read a plain graph costed by edge length.
pub fn read_graph<R: BufRead>(reader: R) -> Result<Graph<Label>> {
    let mut graph = Graph::new();
    let mut index: HashMap<Label, VertexId> = HashMap::new();
    let mut num_edges = 0;

    for block in read_blocks(reader)? {
        match block.kind {
            BlockKind::Node => {
                let node = NodeRecord::from_block(&block)?;
                let v = graph.add_vertex(node.id);
                index.entry(node.id).or_insert(v);
            }
            BlockKind::Edge => {
                let edge = EdgeRecord::from_block(&block)?;
                let source = resolve(&index, edge.source, edge.line)?;
                let target = resolve(&index, edge.target, edge.line)?;
                let (v, w, one_way) = edge.oriented(source, target);
                graph.add_edge(v, w, edge.length, None, one_way);
                num_edges += 1;
            }
        }
    }

    tracing::info!(vertices = graph.num_vertices(), edges = num_edges, "read graph");
    Ok(graph)
}

/// Read a route map costed by travel time, falling back to length.
pub fn read_route_map<R: BufRead>(reader: R) -> Result<RouteMap<Label>> {
    let mut map = RouteMap::new();
    let mut num_edges = 0;

    for block in read_blocks(reader)? {
        match block.kind {
            BlockKind::Node => {
                let node = NodeRecord::from_block(&block)?;
                let coords = node.coords.ok_or_else(|| Error::Parse {
                    line: block.line,
                    message: format!("node {} has no coordinates", node.id),
                })?;
                map.add_vertex(node.id, coords);
            }
            BlockKind::Edge => {
                let edge = EdgeRecord::from_block(&block)?;
                let lookup = |id| {
                    map.vertex_by_label(&id).ok_or_else(|| Error::Parse {
                        line: edge.line,
                        message: format!("edge refers to unknown vertex {id}"),
                    })
                };
                let source = lookup(edge.source)?;
                let target = lookup(edge.target)?;
                let (v, w, one_way) = edge.oriented(source, target);
                map.add_edge(v, w, edge.time.unwrap_or(edge.length), None, one_way);
                num_edges += 1;
            }
        }
    }

    tracing::info!(vertices = map.num_vertices(), edges = num_edges, "read route map");
    Ok(map)
}

fn parse_column<V: FromStr>(record: &StringRecord, i: usize, what: &str, line: usize) -> Result<V> {
    let raw = record.get(i).map(str::trim).ok_or_else(|| Error::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    raw.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {what}: {raw:?}"),
    })
}

/// Read a `source,target,cost[,oneway]` edge list. With `directed` every row
/// is one-way regardless of its own flag.
pub fn read_csv_edges<R: io::Read>(reader: R, directed: bool) -> Result<Graph<Label>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut graph = Graph::new();
    let mut index: HashMap<Label, VertexId> = HashMap::new();
    let mut num_edges = 0;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let source: Label = parse_column(&record, 0, "source", line)?;
        let target: Label = parse_column(&record, 1, "target", line)?;
        let cost: Cost = parse_column(&record, 2, "cost", line)?;
        let direction = match record.get(3) {
            Some(raw) if !directed => parse_oneway(raw.trim()),
            _ if directed => Direction::Forward,
            _ => Direction::Both,
        };

        let source = *index
            .entry(source)
            .or_insert_with(|| graph.add_vertex(source));
        let target = *index
            .entry(target)
            .or_insert_with(|| graph.add_vertex(target));
        let (v, w, one_way) = direction.orient(source, target);
        graph.add_edge(v, w, cost, None, one_way);
        num_edges += 1;
    }

    tracing::info!(vertices = graph.num_vertices(), edges = num_edges, "read csv edge list");
    Ok(graph)
}

pub fn load_graph(path: impl AsRef<Path>) -> Result<Graph<Label>> {
    read_graph(BufReader::new(File::open(path)?))
}

pub fn load_route_map(path: impl AsRef<Path>) -> Result<RouteMap<Label>> {
    read_route_map(BufReader::new(File::open(path)?))
}

pub fn load_csv_edges(path: impl AsRef<Path>, directed: bool) -> Result<Graph<Label>> {
    read_csv_edges(File::open(path)?, directed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dijkstra::dijkstra;

    const SIMPLE_GRAPH: &str = "\
Node
id: 1
Node
id: 2
Node
id: 3
Edge
source: 1
target: 2
length: 4.0
oneway: 0
Edge
source: 2
target: 3
length: 1.5
oneway: 0
Edge
source: 1
target: 3
length: 7.0
oneway: 0
";

    #[test]
    fn reads_plain_graph() {
        let graph = read_graph(SIMPLE_GRAPH.as_bytes()).unwrap();
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_edges(), 3);

        let one = graph.vertex_by_label(&1).unwrap();
        let three = graph.vertex_by_label(&3).unwrap();
        let paths = dijkstra(&graph, one);
        assert_eq!(paths.cost(three), Some(5.5));
        assert!(graph.get_edge(three, one).is_some());
    }

    #[test]
    fn reads_route_fixture() {
        let map = read_route_map(include_str!("../data/simpleroute.txt").as_bytes()).unwrap();
        assert_eq!(map.num_vertices(), 4);
        assert_eq!(map.num_edges(), 4);

        let one = map.vertex_by_label(&1).unwrap();
        let four = map.vertex_by_label(&4).unwrap();
        assert_eq!(map.coordinates(one), Some(Coordinates::new(51.8979, -8.4706)));

        let path = map.shortest_path(one, four).unwrap();
        let labels: Vec<Label> = path.iter().map(|&v| *map.graph().element(v).unwrap()).collect();
        assert_eq!(labels, vec![1, 3, 4]);
        // costed by time rather than length
        assert_eq!(map.dijkstra(one).cost(four), Some(50.0));
        // the 4 -> 2 edge is one-way
        let two = map.vertex_by_label(&2).unwrap();
        assert!(map.get_edge(two, four).is_none());
        assert!(map.get_edge(four, two).is_some());
    }

    #[test]
    fn time_field_wins_over_length() {
        let text = "Node\nid 1\ngps 0 0\nNode\nid 2\ngps 0 1\n\nEdge\nsource 1\ntarget 2\nlength 100\ntime 8\noneway 0\n";
        let map = read_route_map(text.as_bytes()).unwrap();
        let a = map.vertex_by_label(&1).unwrap();
        let b = map.vertex_by_label(&2).unwrap();
        assert_eq!(map.get_edge(a, b).unwrap().cost(), 8.0);
    }

    #[test]
    fn backward_oneway_reverses_edge() {
        let text = "Node\nid 1\nNode\nid 2\nEdge\nsource 1\ntarget 2\nlength 3\noneway -1\n";
        let graph = read_graph(text.as_bytes()).unwrap();
        let a = graph.vertex_by_label(&1).unwrap();
        let b = graph.vertex_by_label(&2).unwrap();
        assert!(graph.get_edge(a, b).is_none());
        assert_eq!(graph.get_edge(b, a).unwrap().start(), b);
    }

    #[test]
    fn unknown_vertex_is_an_error() {
        let text = "Node\nid: 1\nEdge\nsource: 1\ntarget: 9\nlength: 2\noneway: 0\n";
        match read_graph(text.as_bytes()) {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains('9'), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn stray_text_is_an_error() {
        assert!(matches!(
            read_graph("Vertex\nid: 1\n".as_bytes()),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_graph("Node\nid: one\n".as_bytes()),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn route_node_without_coordinates() {
        assert!(matches!(
            read_route_map("Node\nid: 1\n".as_bytes()),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn reads_csv_edges() {
        let csv = "source,target,cost,oneway\n0,1,2.0,0\n1,2,0.5,1\n0,2,5.0\n";
        let graph = read_csv_edges(csv.as_bytes(), false).unwrap();
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_edges(), 3);
        let zero = graph.vertex_by_label(&0).unwrap();
        let two = graph.vertex_by_label(&2).unwrap();
        assert_eq!(dijkstra(&graph, zero).cost(two), Some(2.5));
        assert_eq!(dijkstra(&graph, two).cost(zero), Some(5.0));

        let directed = read_csv_edges(csv.as_bytes(), true).unwrap();
        let zero = directed.vertex_by_label(&0).unwrap();
        let two = directed.vertex_by_label(&2).unwrap();
        assert!(!dijkstra(&directed, two).contains(zero));
    }

    #[test]
    fn bad_csv_cost() {
        let csv = "source,target,cost\n0,1,far\n";
        assert!(matches!(
            read_csv_edges(csv.as_bytes(), false),
            Err(Error::Parse { line: 2, .. })
        ));
    }
}
