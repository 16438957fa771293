//! Scenario orchestration (§2 ambient addition): thin runners that build a
//! dataset, an engine, and a solver from a [`ParamMap`](crate::config::ParamMap),
//! drive the [`Driver`](crate::driver::Driver) to completion, and report
//! progress via `indicatif`.

pub mod scenarios;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::ParamMap;
use crate::data::NBodyData;
use crate::driver::{Driver, SnapshotSink};
use crate::engine::factory::create_engine;
use crate::solver::factory::create_solver;
use crate::types::Coord;

/// Wraps a caller-supplied sink, ticking a progress bar once per emitted
/// frame rather than replacing the sink outright.
struct ProgressSink<'a> {
    inner: &'a mut dyn SnapshotSink,
    bar: ProgressBar,
}

impl SnapshotSink for ProgressSink<'_> {
    fn append(&mut self, frame_no: u64, t: Coord, state: &[Coord]) {
        self.inner.append(frame_no, t, state);
        self.bar.inc(1);
    }
}

/// Builds `(engine, solver)` from a config map and runs the driver for the
/// full `max_time`, reporting progress on a bar sized to the number of
/// `dump_dt` frames expected.
pub fn run_scenario(
    data: &NBodyData,
    params: &ParamMap,
    dt: Coord,
    max_time: Coord,
    dump_dt: Coord,
    check_dt: Coord,
    sink: &mut dyn SnapshotSink,
) -> Result<()> {
    let mut engine = create_engine(params).context("unknown or unsupported \"engine\" key")?;
    engine.init(data);
    let mut solver = create_solver(engine.as_ref(), params).context("unknown or unsupported \"solver\" key")?;

    let frames = (max_time / dump_dt.max(1e-12)).ceil().max(1.0) as u64 + 1;
    let bar = ProgressBar::new(frames);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} frames ({elapsed_precise})")
            .expect("valid progress template"),
    );

    let mut driver = Driver::new();
    let mut progress_sink = ProgressSink { inner: sink, bar: bar.clone() };
    driver.run(data, engine.as_ref(), solver.as_mut(), dt, max_time, dump_dt, check_dt, &mut progress_sink)?;
    bar.finish_and_clear();
    Ok(())
}
