//! Performance benchmark: generation time on random soups, one worker
//! against every available core.

use std::time::Instant;

use anyhow::{Context, Result};

use gol_engine::application::GenerationEngine;
use gol_engine::domain::{FixedGrid, RuleSet};

/// Average milliseconds per generation, plus the extent reached.
fn benchmark_soup(size: usize, workers: usize, iterations: u32) -> Result<(f64, (usize, usize))> {
    let rules = RuleSet::new().into_shared();
    let mut engine = GenerationEngine::with_rules(size, size, rules, workers)
        .with_context(|| format!("building a {size}x{size} engine"))?;
    engine.randomize();

    let start = Instant::now();
    for generation in 0..iterations {
        engine
            .next_generation()
            .with_context(|| format!("generation {generation} of the {size}x{size} soup"))?;
    }
    let ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;
    Ok((ms, (engine.width(), engine.height())))
}

fn main() -> Result<()> {
    println!("=== Game of Life Performance Benchmark ===\n");

    let sizes = [100, 500, 1000, 2000, 4000];
    let iterations = 20;
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());

    println!(
        "{:>10} {:>12} {:>12} {:>10} {:>14}",
        "Size", "1 worker", format!("{cores} workers"), "Speedup", "Final extent"
    );
    println!("{:-<64}", "");

    for size in sizes {
        let (serial_ms, _) = benchmark_soup(size, 1, iterations)?;
        let (parallel_ms, (width, height)) = benchmark_soup(size, cores, iterations)?;

        let speedup_str = if parallel_ms > 0.0 {
            format!("{:>9.1}x", serial_ms / parallel_ms)
        } else {
            format!("{:>10}", "-")
        };

        println!(
            "{:>10} {:>12.2} {:>12.2} {} {:>14}",
            format!("{}x{}", size, size),
            serial_ms,
            parallel_ms,
            speedup_str,
            format!("{}x{}", width, height)
        );
    }

    println!("\n=== Memory Usage (10000x10000) ===\n");

    let size = 10000;
    let byte_per_cell = size * size;
    let bit_grid = FixedGrid::new(size, size).context("building the memory grid")?;
    let bit_mem = bit_grid.memory_bytes();

    println!(
        "Byte per cell: {:>10} bytes ({:.1} MB)",
        byte_per_cell,
        byte_per_cell as f64 / 1_000_000.0
    );
    println!("Bit grid:      {:>10} bytes ({:.1} MB)", bit_mem, bit_mem as f64 / 1_000_000.0);
    println!("Reduction:     {:>10.1}x", byte_per_cell as f64 / bit_mem as f64);
    Ok(())
}
