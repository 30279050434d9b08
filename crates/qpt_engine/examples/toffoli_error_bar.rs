//! Toffoli fidelity with a Monte Carlo error bar
//!
//! Runs process tomography of the nearest-neighbour Toffoli decomposition
//! on a noisy local simulator, mitigates readout error and prints the
//! estimate in every report format.
//!
//! ```text
//! cargo run -p qpt_engine --example toffoli_error_bar [trials] [config.json]
//! ```

use anyhow::Context;
use qpt_backend::{LocalJobRunner, NoiseModel, SimulatorBackend};
use qpt_core::CircuitBuilder;
use qpt_engine::prelude::*;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let trials: usize = match args.next() {
        Some(arg) => arg.parse().context("trials must be an integer")?,
        None => 30,
    };

    let config = match args.next() {
        Some(path) => FidelityConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => FidelityConfig::default_toffoli()
            .with_seed(2024)
            .with_mitigation(true)
            .with_poll_ms(5),
    }
    .with_trials(trials);
    config.validate()?;

    println!("=== Toffoli QPT Error Bar ===");
    println!("{}", config);

    let noise = NoiseModel::ibm_typical();
    let backend = SimulatorBackend::new(3, noise).with_seed(7);
    let runner =
        LocalJobRunner::new(backend).with_max_circuits_per_job(config.max_circuits_per_job);

    let circuit = CircuitBuilder::new(3)
        .canonical_linear_toffoli([0, 1, 2])
        .try_build()?;

    let mut pipeline = Pipeline::toffoli(config, runner, circuit);
    let run = pipeline.run()?;

    println!("\n{}", Reporter::report(&run, ReportFormat::Text));
    println!("{}", Reporter::report(&run, ReportFormat::Markdown));
    println!("{}", Reporter::report(&run, ReportFormat::Json));

    Ok(())
}
