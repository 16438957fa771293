//! Stormer-Verlet (velocity leapfrog), §4.5: a second-order symplectic
//! integrator that exploits the fixed `[position(3N) | velocity(3N)]`
//! block structure of `y` (§3) directly, rather than treating it as an
//! opaque 6N vector the way the RK family does.
//!
//! Kick-drift-kick: half a velocity kick from the acceleration at the
//! current position, a full position drift using the half-kicked
//! velocity, then another half kick from the acceleration at the new
//! position. Splitting `F(t, y) = [velocity | acceleration]` into its two
//! block-restricted halves (so the kick touches only the velocity block
//! and the drift only the position block) is a block copy via
//! `read_buffer`/`write_buffer` (both §4.1 primitives); the drift and
//! kick updates themselves are still applied through `fmadd_inplace`, so
//! no linear combination is ever formed by a host-side loop.

use super::Solver;
use crate::engine::{BufferId, Engine};
use crate::error::SolverResult;
use crate::types::Coord;

pub struct StormerSolver {
    f_eval: BufferId,
    vel_only: BufferId,
    accel_only: BufferId,
    host_scratch: Vec<Coord>,
    n: usize,
}

impl StormerSolver {
    pub fn new(engine: &dyn Engine) -> Self {
        let problem = engine.problem_size();
        let n = problem / 6;
        let bufs = engine.create_buffers(problem, 3);
        Self {
            f_eval: bufs[0],
            vel_only: bufs[1],
            accel_only: bufs[2],
            host_scratch: vec![0.0; problem],
            n,
        }
    }

    /// Reads `F(t, y)` from `self.f_eval` and splits it into `vel_only`
    /// (F's position block, i.e. the velocity, with the velocity block
    /// zeroed) and `accel_only` (F's velocity block, i.e. the
    /// acceleration, with the position block zeroed).
    fn split_force(&mut self, engine: &dyn Engine) -> SolverResult<()> {
        engine.read_buffer(&mut self.host_scratch, self.f_eval)?;
        let n3 = 3 * self.n;
        let len = self.host_scratch.len();

        let mut vel_host = vec![0.0; len];
        vel_host[..n3].copy_from_slice(&self.host_scratch[..n3]);
        engine.write_buffer(self.vel_only, &vel_host)?;

        let mut accel_host = vec![0.0; len];
        accel_host[n3..].copy_from_slice(&self.host_scratch[n3..]);
        engine.write_buffer(self.accel_only, &accel_host)?;
        Ok(())
    }

    /// Reads `y` itself and moves its velocity block into `vel_only`'s
    /// *position* block (velocity block zeroed), so that
    /// `fmadd_inplace(y, vel_only, dt)` drifts position by `dt * v`
    /// without perturbing velocity.
    fn split_state_velocity(&mut self, engine: &dyn Engine, y: BufferId) -> SolverResult<()> {
        engine.read_buffer(&mut self.host_scratch, y)?;
        let n3 = 3 * self.n;
        let len = self.host_scratch.len();
        let mut vel_host = vec![0.0; len];
        vel_host[..n3].copy_from_slice(&self.host_scratch[n3..]);
        Ok(engine.write_buffer(self.vel_only, &vel_host)?)
    }
}

impl Solver for StormerSolver {
    fn type_name(&self) -> &'static str {
        "stormer"
    }

    fn step(&mut self, engine: &dyn Engine, t: Coord, dt: Coord) -> SolverResult<()> {
        let y = engine.get_y();
        let half_dt = 0.5 * dt;

        // Kick: v <- v + (dt/2) * a(t, x0).
        engine.fcompute(t, y, self.f_eval)?;
        self.split_force(engine)?;
        engine.fmadd_inplace(y, self.accel_only, half_dt)?;

        // Drift: x <- x + dt * v_{1/2}.
        self.split_state_velocity(engine, y)?;
        engine.fmadd_inplace(y, self.vel_only, dt)?;

        // Kick: v <- v + (dt/2) * a(t + dt, x1).
        engine.fcompute(t + dt, y, self.f_eval)?;
        self.split_force(engine)?;
        engine.fmadd_inplace(y, self.accel_only, half_dt)?;

        Ok(())
    }
}
