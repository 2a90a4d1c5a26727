mod export;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use graph3::graph::synth;
use graph3::layout::{LayoutKind, LayoutSession};
use graph3::util::Timed;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLayout {
    #[value(name = "density")]
    Density,
    #[value(name = "shells")]
    Shells,
}

impl From<CliLayout> for LayoutKind {
    fn from(value: CliLayout) -> Self {
        match value {
            CliLayout::Density => LayoutKind::DensityField,
            CliLayout::Shells => LayoutKind::SpherePartition,
        }
    }
}

/// Graph3 - incremental 3D graph layout, headless driver
#[derive(Parser, Debug)]
#[command(name = "graph3", version, about)]
struct Cli {
    /// Number of vertices in the generated graph
    #[arg(long, default_value_t = 2000)]
    vertices: usize,

    /// Number of communities in the generated graph
    #[arg(long, default_value_t = 8)]
    clusters: usize,

    /// Average vertex degree of the generated graph
    #[arg(long, default_value_t = 6.0)]
    degree: f32,

    /// Random seed for graph generation and layout
    #[arg(long)]
    seed: Option<u64>,

    /// Layout engine to run (density or shells)
    #[arg(long, value_enum, default_value_t = CliLayout::Shells)]
    layout: CliLayout,

    /// Stop after this many steps even if the engine is not done
    #[arg(long, default_value_t = 100_000)]
    max_steps: u64,

    /// Density grid resolution override
    #[arg(long)]
    grid_res: Option<usize>,

    /// Run one overlap-resolver pass after the layout finishes
    #[arg(long)]
    de_overlap: bool,

    /// Export positions to file (supports .json and .json.gz)
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random);
    println!("Laying out with seed: {}", seed);

    let topology = {
        let _t = Timed::info("Graph generation");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Arc::new(synth::clustered(
            cli.vertices,
            cli.clusters,
            cli.degree,
            &mut rng,
        ))
    };
    println!(
        "Graph: {} vertices, {} edges",
        topology.num_vertices(),
        topology.num_edges()
    );

    let mut session =
        LayoutSession::with_grid_res(topology, cli.layout.into(), seed, cli.grid_res)
            .unwrap_or_else(|e| {
                eprintln!("Failed to initialize layout: {}", e);
                std::process::exit(1);
            });

    {
        let _t = Timed::info("Layout");
        let mut last_stage = String::new();
        let mut steps = 0u64;
        // One micro-step per "frame", as a host application would drive it.
        while steps < cli.max_steps && session.step(1) {
            steps += 1;
            let stage = session.stage_name();
            if stage != last_stage {
                log::info!("[step {:>6}] {}", steps, stage);
                last_stage = stage;
            }
        }
        println!("Finished after {} steps ({})", steps, session.stage_name());
    }

    if cli.de_overlap {
        let _t = Timed::info("Overlap resolution");
        session.resolve_overlaps(1.0);
    }

    if let Some(path) = &cli.export {
        export::export_layout(&session, seed, path);
    }
}
