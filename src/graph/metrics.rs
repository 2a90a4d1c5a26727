//! Structural metrics consumed by the sphere-partition layout.
//!
//! All four vectors are computed once per topology snapshot, in parallel
//! where the per-source work is independent (betweenness, eccentricity,
//! clustering).

use std::collections::VecDeque;

use rayon::prelude::*;

use super::Topology;

/// Per-vertex structural metrics.
pub struct Metrics {
    /// k-core number (Batagelj-Zaversnik bucket decomposition).
    pub coreness: Vec<f32>,
    /// Brandes betweenness centrality, undirected (halved).
    pub betweenness: Vec<f32>,
    /// BFS eccentricity; `f32::INFINITY` when some vertex is unreachable.
    pub eccentricity: Vec<f32>,
    /// Local clustering coefficient in [0, 1].
    pub clustering: Vec<f32>,
}

impl Metrics {
    pub fn compute(topo: &Topology) -> Self {
        Self {
            coreness: coreness(topo),
            betweenness: betweenness(topo),
            eccentricity: eccentricity(topo),
            clustering: clustering(topo),
        }
    }
}

/// k-core decomposition via bucket sort over degrees. O(V + E).
fn coreness(topo: &Topology) -> Vec<f32> {
    let n = topo.num_vertices();
    if n == 0 {
        return Vec::new();
    }

    let mut deg: Vec<usize> = (0..n).map(|v| topo.degree(v)).collect();
    let max_deg = deg.iter().copied().max().unwrap_or(0);

    // Vertices bucketed by current degree: bin_start[d] is where degree-d
    // vertices begin in `vert`; `pos` maps vertex -> index in `vert`.
    let mut bin_start = vec![0usize; max_deg + 2];
    for &d in &deg {
        bin_start[d + 1] += 1;
    }
    for d in 1..bin_start.len() {
        bin_start[d] += bin_start[d - 1];
    }
    let mut next = bin_start.clone();
    let mut vert = vec![0usize; n];
    let mut pos = vec![0usize; n];
    for v in 0..n {
        let p = next[deg[v]];
        vert[p] = v;
        pos[v] = p;
        next[deg[v]] += 1;
    }

    let mut core = deg.clone();
    for i in 0..n {
        let v = vert[i];
        core[v] = deg[v];
        for &u in topo.neighbors(v) {
            let u = u as usize;
            if deg[u] > deg[v] {
                // Move u to the front of its current bucket, then shrink it.
                let du = deg[u];
                let pu = pos[u];
                let pw = bin_start[du];
                let w = vert[pw];
                if u != w {
                    vert.swap(pu, pw);
                    pos[u] = pw;
                    pos[w] = pu;
                }
                bin_start[du] += 1;
                deg[u] -= 1;
            }
        }
    }

    core.into_iter().map(|c| c as f32).collect()
}

/// Brandes betweenness centrality, unweighted, parallel over sources.
fn betweenness(topo: &Topology) -> Vec<f32> {
    let n = topo.num_vertices();
    if n == 0 {
        return Vec::new();
    }

    let partials = (0..n)
        .into_par_iter()
        .map(|s| brandes_from_source(topo, s))
        .reduce(
            || vec![0.0f32; n],
            |mut acc, part| {
                for (a, p) in acc.iter_mut().zip(&part) {
                    *a += p;
                }
                acc
            },
        );

    // Each unordered pair is counted from both endpoints.
    partials.into_iter().map(|b| b * 0.5).collect()
}

/// One source's dependency accumulation (the inner loop of Brandes).
fn brandes_from_source(topo: &Topology, s: usize) -> Vec<f32> {
    let n = topo.num_vertices();
    let mut sigma = vec![0.0f32; n];
    let mut dist = vec![-1i32; n];
    let mut preds: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut order: Vec<u32> = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    sigma[s] = 1.0;
    dist[s] = 0;
    queue.push_back(s as u32);
    while let Some(v) = queue.pop_front() {
        order.push(v);
        let v = v as usize;
        for &w in topo.neighbors(v) {
            let wi = w as usize;
            if dist[wi] < 0 {
                dist[wi] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[wi] == dist[v] + 1 {
                sigma[wi] += sigma[v];
                preds[wi].push(v as u32);
            }
        }
    }

    let mut delta = vec![0.0f32; n];
    let mut partial = vec![0.0f32; n];
    for &w in order.iter().rev() {
        let w = w as usize;
        for &v in &preds[w] {
            let v = v as usize;
            delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
        }
        if w != s {
            partial[w] = delta[w];
        }
    }
    partial
}

/// BFS eccentricity per vertex; infinity when the graph is disconnected.
fn eccentricity(topo: &Topology) -> Vec<f32> {
    let n = topo.num_vertices();
    (0..n)
        .into_par_iter()
        .map(|s| {
            let mut dist = vec![-1i32; n];
            let mut queue = VecDeque::new();
            dist[s] = 0;
            queue.push_back(s as u32);
            let mut reached = 1usize;
            let mut max_dist = 0i32;
            while let Some(v) = queue.pop_front() {
                let v = v as usize;
                for &w in topo.neighbors(v) {
                    let wi = w as usize;
                    if dist[wi] < 0 {
                        dist[wi] = dist[v] + 1;
                        max_dist = max_dist.max(dist[wi]);
                        reached += 1;
                        queue.push_back(w);
                    }
                }
            }
            if reached < n {
                f32::INFINITY
            } else {
                max_dist as f32
            }
        })
        .collect()
}

/// Local clustering coefficient: closed neighbor pairs over possible pairs.
fn clustering(topo: &Topology) -> Vec<f32> {
    let n = topo.num_vertices();
    (0..n)
        .into_par_iter()
        .map(|v| {
            let nbrs = topo.neighbors(v);
            let d = nbrs.len();
            if d < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for (i, &u) in nbrs.iter().enumerate() {
                for &w in &nbrs[i + 1..] {
                    if topo.has_edge(u as usize, w) {
                        links += 1;
                    }
                }
            }
            (2 * links) as f32 / (d * (d - 1)) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> Topology {
        Topology::from_edges(4, &[(0, 1), (1, 2), (2, 3)])
    }

    #[test]
    fn test_coreness_path_and_triangle() {
        let m = Metrics::compute(&path4());
        assert_eq!(m.coreness, vec![1.0, 1.0, 1.0, 1.0]);

        // Triangle with a pendant vertex.
        let topo = Topology::from_edges(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        let m = Metrics::compute(&topo);
        assert_eq!(m.coreness, vec![2.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_betweenness_path() {
        // On a 4-path the interior vertices each sit on 2 shortest paths.
        let m = Metrics::compute(&path4());
        assert!(m.betweenness[0].abs() < 1e-5);
        assert!(m.betweenness[3].abs() < 1e-5);
        assert!((m.betweenness[1] - 2.0).abs() < 1e-4);
        assert!((m.betweenness[2] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_eccentricity_path_and_disconnected() {
        let m = Metrics::compute(&path4());
        assert_eq!(m.eccentricity, vec![3.0, 2.0, 2.0, 3.0]);

        let topo = Topology::from_edges(3, &[(0, 1)]);
        let m = Metrics::compute(&topo);
        assert!(m.eccentricity.iter().all(|e| e.is_infinite()));
    }

    #[test]
    fn test_clustering_triangle_with_pendant() {
        let topo = Topology::from_edges(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        let m = Metrics::compute(&topo);
        assert!((m.clustering[0] - 1.0).abs() < 1e-6);
        assert!((m.clustering[1] - 1.0).abs() < 1e-6);
        // Vertex 2 has 3 neighbors, 1 closed pair of 3.
        assert!((m.clustering[2] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(m.clustering[3], 0.0);
    }

    #[test]
    fn test_empty_graph_metrics() {
        let m = Metrics::compute(&Topology::from_edges(0, &[]));
        assert!(m.coreness.is_empty());
        assert!(m.betweenness.is_empty());
        assert!(m.eccentricity.is_empty());
        assert!(m.clustering.is_empty());
    }
}
