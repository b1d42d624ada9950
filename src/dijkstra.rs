use std::hash::Hash;

use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::apq::{Apq, Handle};
use crate::entity::{Cost, VertexId};
use crate::graph::Graph;

/// Final distance of a vertex and the vertex it was reached from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settled {
    pub cost: Cost,
    /// `None` only for the source.
    pub predecessor: Option<VertexId>,
}

/// Result of one Dijkstra run: every vertex reachable from the source, in the
/// order it was finalized.
#[derive(Clone, Debug)]
pub struct ShortestPaths {
    source: VertexId,
    settled: IndexMap<VertexId, Settled, FnvBuildHasher>,
}

impl ShortestPaths {
    pub fn source(&self) -> VertexId {
        self.source
    }

    pub fn len(&self) -> usize {
        self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.settled.contains_key(&v)
    }

    pub fn get(&self, v: VertexId) -> Option<Settled> {
        self.settled.get(&v).copied()
    }

    pub fn cost(&self, v: VertexId) -> Option<Cost> {
        self.get(v).map(|s| s.cost)
    }

    pub fn predecessor(&self, v: VertexId) -> Option<VertexId> {
        self.get(v)?.predecessor
    }

    /// Settled vertices in the order they left the open set.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Settled)> + '_ {
        self.settled.iter().map(|(&v, &s)| (v, s))
    }

    /// Walk predecessor links back from `dest` and return the source-to-`dest` path.
    ///
    /// Returns `None` when `dest` was never settled.
    pub fn path_to(&self, dest: VertexId) -> Option<Vec<VertexId>> {
        let mut path = vec![dest];
        let mut current = self.get(dest)?;
        while let Some(pred) = current.predecessor {
            path.push(pred);
            current = self.get(pred)?;
        }
        path.reverse();
        Some(path)
    }
}

/// Single-source shortest paths from `source` to every reachable vertex.
///
/// Edge costs must be non-negative. Negative costs are not detected and give
/// wrong distances.
pub fn dijkstra<T, L>(graph: &Graph<T, L>, source: VertexId) -> ShortestPaths
where
    L: Clone + Eq + Hash,
{
    let mut closed: IndexMap<VertexId, Settled, FnvBuildHasher> = IndexMap::default();
    if !graph.contains(source) {
        return ShortestPaths {
            source,
            settled: closed,
        };
    }

    let mut open: Apq<Cost, VertexId> = Apq::with_capacity(graph.num_vertices());
    let mut locs: HashMap<VertexId, Handle> = HashMap::new();
    let mut preds: HashMap<VertexId, Option<VertexId>> = HashMap::new();

    locs.insert(source, open.insert(0.0, source));
    preds.insert(source, None);

    while let Some((cost, v)) = open.extract_min() {
        locs.remove(&v);
        let predecessor = preds.remove(&v).flatten();
        closed.insert(v, Settled { cost, predecessor });

        for edge in graph.edges_of(v) {
            let Some(w) = edge.opposite(v) else {
                continue;
            };
            if closed.contains_key(&w) {
                continue;
            }
            let candidate = cost + edge.cost();
            match locs.get(&w) {
                None => {
                    locs.insert(w, open.insert(candidate, w));
                    preds.insert(w, Some(v));
                }
                Some(&handle) => {
                    if open.key_of(handle).is_some_and(|current| candidate < current) {
                        tracing::trace!(?w, ?v, candidate, "relaxed");
                        open.update_key(handle, candidate);
                        preds.insert(w, Some(v));
                    }
                }
            }
        }
    }

    tracing::debug!(?source, settled = closed.len(), "dijkstra finished");
    ShortestPaths {
        source,
        settled: closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Graph<&'static str>, [VertexId; 5]) {
        let mut g = Graph::new();
        let a = g.add_vertex("A");
        let b = g.add_vertex("B");
        let c = g.add_vertex("C");
        let d = g.add_vertex("D");
        let lonely = g.add_vertex("E");
        g.add_edge(a, b, 1.0, None, false);
        g.add_edge(b, c, 2.0, None, false);
        g.add_edge(a, c, 4.0, None, false);
        g.add_edge(c, d, 1.0, None, false);
        (g, [a, b, c, d, lonely])
    }

    #[test]
    fn sample_graph() {
        let (g, [a, b, c, d, _]) = sample();
        let paths = dijkstra(&g, a);

        assert_eq!(paths.get(a), Some(Settled { cost: 0.0, predecessor: None }));
        assert_eq!(paths.cost(b), Some(1.0));
        assert_eq!(paths.cost(c), Some(3.0));
        assert_eq!(paths.cost(d), Some(4.0));
        assert_eq!(paths.predecessor(d), Some(c));
        assert_eq!(paths.predecessor(c), Some(b));
        assert_eq!(paths.predecessor(b), Some(a));
        assert_eq!(paths.path_to(d), Some(vec![a, b, c, d]));
    }

    #[test]
    fn unreachable_vertex_is_absent() {
        let (g, [a, .., lonely]) = sample();
        let paths = dijkstra(&g, a);
        assert_eq!(paths.len(), 4);
        assert!(!paths.contains(lonely));
        assert_eq!(paths.path_to(lonely), None);
    }

    #[test]
    fn settles_in_cost_order() {
        let (g, [a, b, c, d, _]) = sample();
        let order: Vec<VertexId> = dijkstra(&g, a).iter().map(|(v, _)| v).collect();
        assert_eq!(order, vec![a, b, c, d]);
    }

    #[test]
    fn one_way_edges_are_respected() {
        let mut g: Graph<u32> = Graph::new();
        let x = g.add_vertex(1);
        let y = g.add_vertex(2);
        let z = g.add_vertex(3);
        g.add_edge(x, y, 2.0, None, true);
        g.add_edge(z, y, 1.0, None, true);
        g.add_edge(x, z, 5.0, None, false);

        let from_x = dijkstra(&g, x);
        assert_eq!(from_x.cost(y), Some(2.0));
        assert_eq!(from_x.cost(z), Some(5.0));

        let from_y = dijkstra(&g, y);
        assert_eq!(from_y.len(), 1);
        assert!(!from_y.contains(x));
    }

    #[test]
    fn cheaper_parallel_route_wins() {
        let mut g: Graph<u32> = Graph::new();
        let v: Vec<VertexId> = (0..6).map(|i| g.add_vertex(i)).collect();
        g.add_edge(v[0], v[5], 100.0, None, false);
        for pair in v.windows(2) {
            g.add_edge(pair[0], pair[1], 1.0, None, false);
        }
        let paths = dijkstra(&g, v[0]);
        assert_eq!(paths.cost(v[5]), Some(5.0));
        assert_eq!(paths.path_to(v[5]), Some(v.clone()));
    }

    #[test]
    fn path_cost_matches_distance() {
        let mut g: Graph<u32> = Graph::new();
        let v: Vec<VertexId> = (0..8).map(|i| g.add_vertex(i)).collect();
        let edges = [
            (0, 1, 4.0),
            (0, 2, 1.0),
            (2, 1, 2.0),
            (1, 3, 5.0),
            (2, 3, 8.0),
            (3, 4, 3.0),
            (4, 5, 1.0),
            (2, 5, 10.0),
            (5, 6, 2.5),
            (6, 7, 0.5),
            (3, 7, 9.0),
        ];
        for (s, t, cost) in edges {
            g.add_edge(v[s], v[t], cost, None, false);
        }
        let paths = dijkstra(&g, v[0]);
        for &dest in &v {
            let path = paths.path_to(dest).unwrap();
            assert_eq!(path.first(), Some(&v[0]));
            let total: Cost = path
                .windows(2)
                .map(|step| g.get_edge(step[0], step[1]).unwrap().cost())
                .sum();
            assert_eq!(Some(total), paths.cost(dest));
        }
    }

    #[test]
    fn unknown_source_settles_nothing() {
        let (g, _) = sample();
        let paths = dijkstra(&g, VertexId(99));
        assert!(paths.is_empty());
    }
}
