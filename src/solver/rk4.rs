//! Classical 4-stage Runge-Kutta, expressed purely through engine
//! primitives. The stage-buffer scratch struct follows the same shape as
//! the teacher's non-spatial `Rk4Scratch` (k1..k4 plus one `tmp`
//! intermediate), just backed by engine buffer handles instead of
//! `ndarray::Array1`.

use super::Solver;
use crate::engine::{BufferId, Engine};
use crate::error::SolverResult;
use crate::types::Coord;

pub struct Rk4Solver {
    k1: BufferId,
    k2: BufferId,
    k3: BufferId,
    k4: BufferId,
    tmp: BufferId,
}

impl Rk4Solver {
    pub fn new(engine: &dyn Engine) -> Self {
        let n = engine.problem_size();
        let bufs = engine.create_buffers(n, 5);
        Self { k1: bufs[0], k2: bufs[1], k3: bufs[2], k4: bufs[3], tmp: bufs[4] }
    }
}

impl Solver for Rk4Solver {
    fn type_name(&self) -> &'static str {
        "rk4"
    }

    fn step(&mut self, engine: &dyn Engine, t: Coord, dt: Coord) -> SolverResult<()> {
        let y = engine.get_y();
        let half_dt = 0.5 * dt;

        // k1 = F(t, y)
        engine.fcompute(t, y, self.k1)?;

        // tmp = y + (dt/2)*k1; k2 = F(t + dt/2, tmp)
        engine.fmadd(self.tmp, Some(y), self.k1, half_dt)?;
        engine.fcompute(t + half_dt, self.tmp, self.k2)?;

        // tmp = y + (dt/2)*k2; k3 = F(t + dt/2, tmp)
        engine.fmadd(self.tmp, Some(y), self.k2, half_dt)?;
        engine.fcompute(t + half_dt, self.tmp, self.k3)?;

        // tmp = y + dt*k3; k4 = F(t + dt, tmp)
        engine.fmadd(self.tmp, Some(y), self.k3, dt)?;
        engine.fcompute(t + dt, self.tmp, self.k4)?;

        // y += (dt/6)*(k1 + 2*k2 + 2*k3 + k4)
        let sixth = dt / 6.0;
        let third = dt / 3.0;
        engine.fmaddn_inplace(
            y,
            &[self.k1, self.k2, self.k3, self.k4],
            &[sixth, third, third, sixth],
        )?;
        Ok(())
    }
}
