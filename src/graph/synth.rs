//! Synthetic graph generation for the CLI, benches, and tests.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::Topology;

/// Generate a community-structured random graph.
///
/// Vertices are split into `num_clusters` contiguous blocks; each vertex
/// draws roughly `avg_degree / 2` edges to random members of its own block,
/// and a sparse set of bridge edges ties neighboring blocks together. Radii
/// are drawn from a clamped normal so the overlap resolver has real work.
pub fn clustered<R: Rng>(
    num_vertices: usize,
    num_clusters: usize,
    avg_degree: f32,
    rng: &mut R,
) -> Topology {
    if num_vertices == 0 {
        return Topology::from_edges(0, &[]);
    }
    let num_clusters = num_clusters.clamp(1, num_vertices);
    let block = num_vertices.div_ceil(num_clusters);
    let cluster_of = |v: usize| (v / block).min(num_clusters - 1);
    let cluster_range = |c: usize| {
        let start = c * block;
        let end = ((c + 1) * block).min(num_vertices);
        start..end
    };

    let mut edges = Vec::new();
    let per_vertex = (avg_degree * 0.5).max(1.0) as usize;

    // Intra-cluster edges
    for v in 0..num_vertices {
        let range = cluster_range(cluster_of(v));
        if range.len() < 2 {
            continue;
        }
        for _ in 0..per_vertex {
            let u = rng.gen_range(range.clone());
            if u != v {
                edges.push((v as u32, u as u32));
            }
        }
    }

    // Bridges between consecutive clusters
    for c in 0..num_clusters.saturating_sub(1) {
        let a = cluster_range(c);
        let b = cluster_range(c + 1);
        if a.is_empty() || b.is_empty() {
            continue;
        }
        for _ in 0..2 {
            let u = rng.gen_range(a.clone()) as u32;
            let v = rng.gen_range(b.clone()) as u32;
            edges.push((u, v));
        }
    }

    let mut topo = Topology::from_edges(num_vertices, &edges);

    let normal = Normal::new(1.0f32, 0.2).expect("valid normal params");
    let radii = (0..num_vertices)
        .map(|_| normal.sample(rng).clamp(0.4, 2.0))
        .collect();
    topo.set_radii(radii);
    topo
}
