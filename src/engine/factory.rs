//! Engine factory (§6): `create_engine` keyed by the config map's
//! `"engine"` string, mirroring the original's `engine_factory::create`.
//! Accelerator back-ends (`opencl`, `opencl_bh`) and the undocumented `ah`
//! engine are recognized keys that fall through to `None` rather than a
//! runtime panic — see DESIGN.md for why `ah` has no implementation here.

use super::barnes_hut::BarnesHutEngine;
use super::simple::{ParallelStrategy, SimpleEngine};
use super::Engine;
use crate::config::ParamMap;

pub fn create_engine(params: &ParamMap) -> Option<Box<dyn Engine>> {
    match params.get_str("engine") {
        Some("simple") => Some(Box::new(SimpleEngine::new(ParallelStrategy::Sequential))),
        Some("openmp") => Some(Box::new(SimpleEngine::new(ParallelStrategy::DataParallel))),
        Some("block") => Some(Box::new(SimpleEngine::new(ParallelStrategy::Blocked))),
        Some("simple_bh") => Some(Box::new(BarnesHutEngine::from_params(params))),
        Some(key @ ("opencl" | "opencl_bh" | "ah")) => {
            tracing::warn!(engine = key, "engine recognized but not implemented in this build");
            None
        }
        Some(other) => {
            tracing::warn!(engine = other, "unknown engine key");
            None
        }
        None => {
            tracing::warn!("create_engine: missing \"engine\" key");
            None
        }
    }
}
