// Benchmark both layout engines across graph sizes - wall time per stage
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use graph3::graph::synth;
use graph3::layout::{LayoutKind, LayoutSession};

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

fn run_engine(kind: LayoutKind, label: &str, n: usize, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let topo = Arc::new(synth::clustered(n, (n / 200).max(4), 6.0, &mut rng));

    let start = Instant::now();
    let mut session =
        LayoutSession::new(Arc::clone(&topo), kind, seed).expect("engine init failed");
    let init = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    let mut steps = 0u64;
    let mut last_stage = session.stage_name();
    let mut stage_start = Instant::now();
    while session.step(1) && steps < 50_000 {
        steps += 1;
        let stage = session.stage_name();
        if stage != last_stage {
            println!(
                "    {:<32} {:>8.1}ms",
                last_stage,
                stage_start.elapsed().as_secs_f64() * 1000.0
            );
            last_stage = stage;
            stage_start = Instant::now();
        }
    }
    let total = start.elapsed().as_secs_f64() * 1000.0;
    println!(
        "  {}: init={:.1}ms  {} steps in {:.1}ms  ({:.3}ms/step)",
        label,
        init,
        steps,
        total,
        total / steps.max(1) as f64
    );
}

fn main() {
    let sizes: Vec<usize> = std::env::args()
        .skip(1)
        .map(|a| parse_count(&a).expect("invalid size argument"))
        .collect();
    let sizes = if sizes.is_empty() {
        vec![1_000, 5_000, 20_000]
    } else {
        sizes
    };

    for n in sizes {
        println!("n={}:", n);
        run_engine(LayoutKind::DensityField, "density", n, 12345);
        run_engine(LayoutKind::SpherePartition, "shells", n, 12345);
        println!();
    }
}
