//! Thin runnable demo for the N-body core (§1: CLI argument parsing
//! frameworks are out of scope, so this reads a single positional scenario
//! name with `std::env::args()` rather than a parsing crate).

use nbody_core::driver::NullSink;
use nbody_core::tasks::scenarios;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let scenario = std::env::args().nth(1).unwrap_or_else(|| "kepler".to_string());
    let mut sink = NullSink;

    match scenario.as_str() {
        "kepler" => {
            let (_, period) = scenarios::two_body_kepler(&mut sink)?;
            tracing::info!(period, "two-body Kepler orbit integrated for one period");
        }
        "figure-eight" => {
            scenarios::three_body_figure_eight(&mut sink)?;
            tracing::info!("three-body figure-eight choreography integrated for one period");
        }
        "cold-collapse" => {
            scenarios::equal_mass_cold_collapse(128, &mut sink)?;
            tracing::info!("equal-mass cold collapse integrated for 100 steps");
        }
        other => {
            anyhow::bail!("unknown scenario \"{other}\"; expected one of kepler, figure-eight, cold-collapse");
        }
    }
    Ok(())
}
