//! Explicit (forward) Euler: `y <- y + dt * F(t, y)`. The simplest solver,
//! used mostly as a baseline against which RK4's better energy conservation
//! is checked (§8 property 9).

use super::Solver;
use crate::engine::{BufferId, Engine};
use crate::error::SolverResult;
use crate::types::Coord;

pub struct EulerSolver {
    k: BufferId,
}

impl EulerSolver {
    pub fn new(engine: &dyn Engine) -> Self {
        let n = engine.problem_size();
        Self { k: engine.create_buffer(n) }
    }
}

impl Solver for EulerSolver {
    fn type_name(&self) -> &'static str {
        "euler"
    }

    fn step(&mut self, engine: &dyn Engine, t: Coord, dt: Coord) -> SolverResult<()> {
        let y = engine.get_y();
        engine.fcompute(t, y, self.k)?;
        engine.fmadd_inplace(y, self.k, dt)?;
        Ok(())
    }
}
