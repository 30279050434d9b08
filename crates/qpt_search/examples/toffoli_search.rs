//! Toffoli decomposition search for one rank
//!
//! ```text
//! cargo run --release -p qpt_search --example toffoli_search [rank] [out_dir] [config.json]
//! ```

use anyhow::Context;
use qpt_search::prelude::*;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let rank: usize = match args.next() {
        Some(arg) => arg.parse().context("rank must be an integer")?,
        None => 0,
    };
    let out_dir = args.next().unwrap_or_else(|| "out".to_string());
    let config = match args.next() {
        Some(path) => SearchConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => SearchConfig::toffoli().with_seed(2024),
    }
    .with_output_dir(&out_dir);

    println!("=== Toffoli Search: rank {} ===", rank);
    println!("{}", config);

    let driver = SearchDriver::toffoli(config)?;
    if rank >= driver.num_ranks() {
        anyhow::bail!("rank {} out of range (0..{})", rank, driver.num_ranks());
    }

    let artifacts = driver.run_rank(rank)?;
    for artifact in &artifacts {
        let mark = if artifact.is_accepted() { "✓" } else { " " };
        println!(
            "{} {:?}  distance {:.6}",
            mark, artifact.structure, artifact.distance
        );
    }
    println!(
        "\n{} of {} structures written to {}",
        artifacts.iter().filter(|a| a.is_accepted()).count(),
        artifacts.len(),
        out_dir
    );
    Ok(())
}
