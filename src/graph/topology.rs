//! Immutable topology snapshot in CSR form.

/// Undirected graph topology, frozen for the duration of one layout run.
///
/// Vertices are dense indices `0..n`. Edges are stored once in canonical
/// `(min, max)` order plus a CSR adjacency where every neighbor slot carries
/// the edge weight and the canonical edge id, so per-edge flags (e.g. the
/// cut-edge set) can live in plain `Vec`s indexed by edge id.
pub struct Topology {
    /// CSR row starts, length `n + 1`.
    offsets: Vec<u32>,
    /// Neighbor vertex per CSR slot, sorted ascending within each row.
    csr_neighbors: Vec<u32>,
    /// Edge weight per CSR slot.
    csr_weights: Vec<f32>,
    /// Canonical edge id per CSR slot.
    csr_edges: Vec<u32>,
    /// Canonical edge list, `u < v`, sorted.
    edges: Vec<(u32, u32)>,
    /// Weight per canonical edge.
    weights: Vec<f32>,
    /// Display radius per vertex (read-only layout input).
    radii: Vec<f32>,
}

impl Topology {
    /// Build a snapshot from an edge list with unit weights.
    ///
    /// Self-loops are dropped, duplicate edges are merged (first weight wins),
    /// endpoint order is irrelevant.
    pub fn from_edges(num_vertices: usize, edges: &[(u32, u32)]) -> Self {
        let weights = vec![1.0; edges.len()];
        Self::from_weighted_edges(num_vertices, edges, &weights)
    }

    /// Build a snapshot from an edge list with explicit per-edge weights.
    pub fn from_weighted_edges(num_vertices: usize, edges: &[(u32, u32)], weights: &[f32]) -> Self {
        assert_eq!(edges.len(), weights.len());

        // Canonicalize, drop self-loops, dedup keeping the first weight.
        let mut canonical: Vec<((u32, u32), f32)> = edges
            .iter()
            .zip(weights)
            .filter(|(&(a, b), _)| a != b)
            .map(|(&(a, b), &w)| ((a.min(b), a.max(b)), w))
            .collect();
        canonical.sort_by_key(|&(e, _)| e);
        canonical.dedup_by_key(|&mut (e, _)| e);

        let edges: Vec<(u32, u32)> = canonical.iter().map(|&(e, _)| e).collect();
        let weights: Vec<f32> = canonical.iter().map(|&(_, w)| w).collect();

        // Adjacency rows, then flatten to CSR with ascending neighbors.
        let mut rows: Vec<Vec<(u32, u32)>> = vec![Vec::new(); num_vertices];
        for (edge_id, &(u, v)) in edges.iter().enumerate() {
            assert!(
                (v as usize) < num_vertices,
                "edge ({}, {}) out of range for {} vertices",
                u,
                v,
                num_vertices
            );
            rows[u as usize].push((v, edge_id as u32));
            rows[v as usize].push((u, edge_id as u32));
        }

        let mut offsets = Vec::with_capacity(num_vertices + 1);
        let mut csr_neighbors = Vec::with_capacity(edges.len() * 2);
        let mut csr_weights = Vec::with_capacity(edges.len() * 2);
        let mut csr_edges = Vec::with_capacity(edges.len() * 2);
        offsets.push(0);
        for row in &mut rows {
            row.sort_unstable_by_key(|&(nbr, _)| nbr);
            for &(nbr, edge_id) in row.iter() {
                csr_neighbors.push(nbr);
                csr_weights.push(weights[edge_id as usize]);
                csr_edges.push(edge_id);
            }
            offsets.push(csr_neighbors.len() as u32);
        }

        Self {
            offsets,
            csr_neighbors,
            csr_weights,
            csr_edges,
            edges,
            weights,
            radii: vec![1.0; num_vertices],
        }
    }

    /// Replace the per-vertex display radii (defaults to 1.0 everywhere).
    pub fn set_radii(&mut self, radii: Vec<f32>) {
        assert_eq!(radii.len(), self.num_vertices());
        self.radii = radii;
    }

    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        (self.offsets[v + 1] - self.offsets[v]) as usize
    }

    /// Neighbors of `v`, ascending.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[u32] {
        let (a, b) = (self.offsets[v] as usize, self.offsets[v + 1] as usize);
        &self.csr_neighbors[a..b]
    }

    /// Edge weights aligned with [`Self::neighbors`].
    #[inline]
    pub fn neighbor_weights(&self, v: usize) -> &[f32] {
        let (a, b) = (self.offsets[v] as usize, self.offsets[v + 1] as usize);
        &self.csr_weights[a..b]
    }

    /// Canonical edge ids aligned with [`Self::neighbors`].
    #[inline]
    pub fn neighbor_edges(&self, v: usize) -> &[u32] {
        let (a, b) = (self.offsets[v] as usize, self.offsets[v + 1] as usize);
        &self.csr_edges[a..b]
    }

    /// Endpoints of canonical edge `e`, `u < v`.
    #[inline]
    pub fn edge(&self, e: usize) -> (u32, u32) {
        self.edges[e]
    }

    #[inline]
    pub fn weight(&self, e: usize) -> f32 {
        self.weights[e]
    }

    #[inline]
    pub fn radius(&self, v: usize) -> f32 {
        self.radii[v]
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    /// True if `u` and `v` are adjacent. Neighbor rows are sorted.
    #[inline]
    pub fn has_edge(&self, u: usize, v: u32) -> bool {
        self.neighbors(u).binary_search(&v).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_basic() {
        // Path 0-1-2-3 plus chord 0-2.
        let topo = Topology::from_edges(4, &[(0, 1), (1, 2), (2, 3), (2, 0)]);
        assert_eq!(topo.num_vertices(), 4);
        assert_eq!(topo.num_edges(), 4);
        assert_eq!(topo.neighbors(0), &[1, 2]);
        assert_eq!(topo.neighbors(2), &[0, 1, 3]);
        assert_eq!(topo.degree(1), 2);
        assert!(topo.has_edge(0, 2));
        assert!(!topo.has_edge(0, 3));
    }

    #[test]
    fn test_self_loops_and_duplicates_dropped() {
        let topo = Topology::from_edges(3, &[(0, 1), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(topo.num_edges(), 2);
        assert_eq!(topo.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_edge_ids_consistent_both_directions() {
        let topo = Topology::from_edges(3, &[(0, 1), (1, 2)]);
        let slot_u = topo.neighbors(0).iter().position(|&n| n == 1).unwrap();
        let slot_v = topo.neighbors(1).iter().position(|&n| n == 0).unwrap();
        assert_eq!(topo.neighbor_edges(0)[slot_u], topo.neighbor_edges(1)[slot_v]);
    }

    #[test]
    fn test_weights_follow_edges() {
        let topo = Topology::from_weighted_edges(3, &[(2, 1), (0, 1)], &[4.0, 2.5]);
        // Canonical order sorts (0,1) before (1,2).
        assert_eq!(topo.edge(0), (0, 1));
        assert_eq!(topo.weight(0), 2.5);
        assert_eq!(topo.edge(1), (1, 2));
        assert_eq!(topo.weight(1), 4.0);
        let slot = topo.neighbors(1).iter().position(|&n| n == 2).unwrap();
        assert_eq!(topo.neighbor_weights(1)[slot], 4.0);
    }

    #[test]
    fn test_empty_graph() {
        let topo = Topology::from_edges(0, &[]);
        assert_eq!(topo.num_vertices(), 0);
        assert_eq!(topo.num_edges(), 0);
    }
}
