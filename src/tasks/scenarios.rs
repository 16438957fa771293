//! Concrete end-to-end scenario runners (§8): thin wrappers around
//! [`super::run_scenario`] for the fixtures [`crate::data`] constructs,
//! used both by the demo binary and by the integration tests that assert
//! the bounds §8 specifies.

use anyhow::Result;

use crate::config::ParamMap;
use crate::data::{self, NBodyData};
use crate::driver::SnapshotSink;
use crate::types::Coord;

/// Two-body Kepler orbit (§8): `m1 = m2 = 1`, `G = 1`, run for one
/// analytic period under RK4 with `dt = 1e-3`.
pub fn two_body_kepler(sink: &mut dyn SnapshotSink) -> Result<(NBodyData, Coord)> {
    let data = data::two_body_kepler();
    let period = data::two_body_kepler_period();
    let params = ParamMap::new().set("engine", "simple").set("solver", "rk4");
    super::run_scenario(&data, &params, 1e-3, period, period / 100.0, period / 10.0, sink)?;
    Ok((data, period))
}

/// Three-body figure-eight choreography (§8), integrated under RKDP for
/// one period.
pub fn three_body_figure_eight(sink: &mut dyn SnapshotSink) -> Result<NBodyData> {
    let data = data::three_body_figure_eight();
    let params = ParamMap::new().set("engine", "simple").set("solver", "rkdp");
    super::run_scenario(
        &data,
        &params,
        1e-3,
        data::FIGURE_EIGHT_PERIOD,
        data::FIGURE_EIGHT_PERIOD / 100.0,
        data::FIGURE_EIGHT_PERIOD / 10.0,
        sink,
    )?;
    Ok(data)
}

/// Equal-mass cold collapse (§8), `N = 128`, 100 RK4 steps of `dt = 1e-3`:
/// checks total momentum stays invariant.
pub fn equal_mass_cold_collapse(count: usize, sink: &mut dyn SnapshotSink) -> Result<NBodyData> {
    let data = data::equal_mass_cold_collapse(count, 1.0, 42);
    let params = ParamMap::new().set("engine", "openmp").set("solver", "rk4");
    let dt = 1e-3;
    super::run_scenario(&data, &params, dt, 100.0 * dt, 10.0 * dt, 10.0 * dt, sink)?;
    Ok(data)
}

/// Barnes-Hut accuracy sweep fixture (§8): a Plummer sphere, for the
/// caller to evaluate at several `theta` values via the Barnes-Hut engine
/// directly (this runner only builds the fixture; the sweep itself
/// compares instantaneous forces, not a trajectory).
pub fn plummer_sphere(count: usize) -> NBodyData {
    data::plummer_sphere(count, 1.0, 7)
}
