//! Variable-rank explicit Adams-Bashforth (§4.5): a ring buffer of the last
//! `rank` right-hand-side evaluations, combined with the classical
//! Adams-Bashforth coefficients for whatever rank is currently filled.
//! Bootstrapped with RK4 until the ring holds `rank` entries, so the first
//! `rank - 1` steps must coincide exactly with RK4-only integration (§8,
//! "Adams bootstrap").

use super::rk4::Rk4Solver;
use super::Solver;
use crate::engine::{BufferId, Engine};
use crate::error::SolverResult;
use crate::types::Coord;

/// Adams-Bashforth coefficients for ranks 1..=4, indexed `[rank - 1]`,
/// ordered newest-first (coefficient for `f_n`, then `f_{n-1}`, ...).
const AB_COEFFS: [&[Coord]; 4] = [
    &[1.0],
    &[1.5, -0.5],
    &[23.0 / 12.0, -16.0 / 12.0, 5.0 / 12.0],
    &[55.0 / 24.0, -59.0 / 24.0, 37.0 / 24.0, -9.0 / 24.0],
];

pub struct AdamsSolver {
    rank: usize,
    bootstrap: Rk4Solver,
    /// Ring of the last `rank` `f` evaluations, newest at `history[0]`.
    history: Vec<BufferId>,
    filled: usize,
    scratch: BufferId,
}

impl AdamsSolver {
    pub fn new(engine: &dyn Engine, rank: usize) -> Self {
        let rank = rank.clamp(1, AB_COEFFS.len());
        let n = engine.problem_size();
        Self {
            rank,
            bootstrap: Rk4Solver::new(engine),
            history: engine.create_buffers(n, rank),
            filled: 0,
            scratch: engine.create_buffer(n),
        }
    }

    fn push_history(&mut self, engine: &dyn Engine, t: Coord, y: BufferId) -> SolverResult<()> {
        // Shift the ring: history[k] <- history[k-1] for k = rank-1..1,
        // then recompute history[0] = F(t, y) from the just-advanced state.
        for k in (1..self.rank).rev() {
            engine.copy_buffer(self.history[k], self.history[k - 1])?;
        }
        engine.fcompute(t, y, self.history[0])?;
        self.filled = (self.filled + 1).min(self.rank);
        Ok(())
    }
}

impl Solver for AdamsSolver {
    fn type_name(&self) -> &'static str {
        "adams"
    }

    fn step(&mut self, engine: &dyn Engine, t: Coord, dt: Coord) -> SolverResult<()> {
        let y = engine.get_y();

        if self.filled < self.rank {
            // Bootstrap region: advance with RK4 and seed the ring from
            // the post-step derivative, so the trajectory through this
            // region is byte-for-byte what a pure RK4 run would produce.
            self.bootstrap.step(engine, t, dt)?;
            return self.push_history(engine, t + dt, y);
        }

        let coeffs = AB_COEFFS[self.rank - 1];
        let scaled: Vec<Coord> = coeffs.iter().map(|&c| c * dt).collect();
        engine.fmaddn(self.scratch, Some(y), &self.history[..self.rank], &scaled)?;
        engine.copy_buffer(y, self.scratch)?;
        self.push_history(engine, t + dt, y)
    }
}
