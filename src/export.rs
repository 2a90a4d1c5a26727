//! Layout export for external analysis.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use graph3::layout::LayoutSession;

/// Export the session's graph and positions to a JSON file (optionally
/// gzipped, by extension).
pub fn export_layout(session: &LayoutSession, seed: u64, path: &Path) {
    print!("Exporting to {}... ", path.display());
    let start = Instant::now();

    let data = LayoutExport::from_session(session, seed);

    let file = File::create(path).expect("Failed to create export file");
    let is_gzip = path.extension().map(|ext| ext == "gz").unwrap_or(false);

    if is_gzip {
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(encoder, &data).expect("Failed to write JSON");
    } else {
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &data).expect("Failed to write JSON");
    }

    println!("{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
}

#[derive(Serialize)]
struct LayoutExport {
    metadata: Metadata,
    positions: Vec<[f32; 3]>,
    radii: Vec<f32>,
    edges: Vec<[u32; 2]>,
}

#[derive(Serialize)]
struct Metadata {
    seed: u64,
    num_vertices: usize,
    num_edges: usize,
    layout: &'static str,
    steps: u64,
    stage: String,
}

impl LayoutExport {
    fn from_session(session: &LayoutSession, seed: u64) -> Self {
        use graph3::layout::LayoutKind;

        let topo = session.topology();
        let positions = session
            .positions()
            .iter()
            .map(|p| [p.x, p.y, p.z])
            .collect();
        let edges = (0..topo.num_edges())
            .map(|e| {
                let (u, v) = topo.edge(e);
                [u, v]
            })
            .collect();

        Self {
            metadata: Metadata {
                seed,
                num_vertices: topo.num_vertices(),
                num_edges: topo.num_edges(),
                layout: match session.kind() {
                    LayoutKind::DensityField => "density-field",
                    LayoutKind::SpherePartition => "sphere-partition",
                },
                steps: session.steps_taken(),
                stage: session.stage_name(),
            },
            positions,
            radii: topo.radii().to_vec(),
            edges,
        }
    }
}
