//! Solver factory (§6): `create_solver` keyed by the config map's
//! `"solver"` string, mirroring `engine::factory::create_engine`.

use super::adams::AdamsSolver;
use super::euler::EulerSolver;
use super::rk4::Rk4Solver;
use super::rk_butcher::{AdaptiveButcherSolver, RKCK, RKDP, RKF, RKGL, RKLC};
use super::stormer::StormerSolver;
use super::trapeze::TrapezeSolver;
use super::Solver;
use crate::config::ParamMap;
use crate::engine::Engine;

pub fn create_solver(engine: &dyn Engine, params: &ParamMap) -> Option<Box<dyn Solver>> {
    match params.get_str("solver") {
        Some("euler") => Some(Box::new(EulerSolver::new(engine))),
        Some("rk4") => Some(Box::new(Rk4Solver::new(engine))),
        Some("rkck") => Some(Box::new(AdaptiveButcherSolver::new(engine, &RKCK, params))),
        Some("rkdp") => Some(Box::new(AdaptiveButcherSolver::new(engine, &RKDP, params))),
        Some("rkf") => Some(Box::new(AdaptiveButcherSolver::new(engine, &RKF, params))),
        Some("rkgl") => Some(Box::new(AdaptiveButcherSolver::new(engine, &RKGL, params))),
        Some("rklc") => Some(Box::new(AdaptiveButcherSolver::new(engine, &RKLC, params))),
        Some("adams") => {
            let rank = params.get::<usize>("rank", 1);
            Some(Box::new(AdamsSolver::new(engine, rank)))
        }
        Some("trapeze") => Some(Box::new(TrapezeSolver::new(engine, params))),
        Some("stormer") => Some(Box::new(StormerSolver::new(engine))),
        Some(other) => {
            tracing::warn!(solver = other, "unknown solver key");
            None
        }
        None => {
            tracing::warn!("create_solver: missing \"solver\" key");
            None
        }
    }
}
