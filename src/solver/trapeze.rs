//! Implicit trapezoidal rule (§4.5): `y_{n+1} = y_n + (dt/2)(F(t_n, y_n) +
//! F(t_{n+1}, y_{n+1}))`, solved by `refine_steps_count` fixed-point
//! (Picard) iterations seeded from one explicit Euler half-step.

use super::Solver;
use crate::config::ParamMap;
use crate::engine::{BufferId, Engine};
use crate::error::SolverResult;
use crate::types::Coord;

pub struct TrapezeSolver {
    k_start: BufferId,
    k_end: BufferId,
    tmp: BufferId,
    refine_steps_count: u32,
}

impl TrapezeSolver {
    pub fn new(engine: &dyn Engine, params: &ParamMap) -> Self {
        let n = engine.problem_size();
        let bufs = engine.create_buffers(n, 3);
        Self {
            k_start: bufs[0],
            k_end: bufs[1],
            tmp: bufs[2],
            refine_steps_count: params.get::<u32>("refine_steps_count", 1).max(1),
        }
    }
}

impl Solver for TrapezeSolver {
    fn type_name(&self) -> &'static str {
        "trapeze"
    }

    fn step(&mut self, engine: &dyn Engine, t: Coord, dt: Coord) -> SolverResult<()> {
        let y = engine.get_y();
        let half_dt = 0.5 * dt;

        // k_start = F(t, y); initial guess tmp = y + dt*k_start (explicit
        // Euler step), seeding the fixed-point iteration.
        engine.fcompute(t, y, self.k_start)?;
        engine.fmadd(self.tmp, Some(y), self.k_start, dt)?;

        for _ in 0..self.refine_steps_count {
            engine.fcompute(t + dt, self.tmp, self.k_end)?;
            engine.fmaddn(
                self.tmp,
                Some(y),
                &[self.k_start, self.k_end],
                &[half_dt, half_dt],
            )?;
        }

        engine.copy_buffer(y, self.tmp)?;
        Ok(())
    }
}
