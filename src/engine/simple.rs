//! The Simple engine (§4.2): direct O(N²) pairwise summation, the
//! reference force kernel every other engine is checked against.

use rayon::prelude::*;

use super::core::EngineCore;
use super::{BufferId, Engine};
use crate::config::ParamMap;
use crate::data::NBodyData;
use crate::error::EngineResult;
use crate::types::Coord;

/// How the O(N²) double loop is spread across CPU cores, keyed by the
/// `"engine"` config string (§6): `simple` -> Sequential, `openmp` ->
/// DataParallel, `block` -> Blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelStrategy {
    /// Single thread, outer loop over `i` in order.
    Sequential,
    /// `rayon::par_iter` over `i`, one task per body.
    DataParallel,
    /// `rayon::par_chunks`, grouping several bodies' outer loops per task
    /// to amortize task-dispatch overhead on large `N` (§5: "dynamic
    /// chunking" in the concurrency model).
    Blocked,
}

impl ParallelStrategy {
    fn type_name(self) -> &'static str {
        match self {
            ParallelStrategy::Sequential => "simple",
            ParallelStrategy::DataParallel => "openmp",
            ParallelStrategy::Blocked => "block",
        }
    }
}

pub struct SimpleEngine {
    core: EngineCore,
    strategy: ParallelStrategy,
}

impl SimpleEngine {
    pub fn new(strategy: ParallelStrategy) -> Self {
        Self { core: EngineCore::new(), strategy }
    }

    pub fn from_params(params: &ParamMap) -> Self {
        let strategy = match params.get_str("engine") {
            Some("openmp") => ParallelStrategy::DataParallel,
            Some("block") => ParallelStrategy::Blocked,
            _ => ParallelStrategy::Sequential,
        };
        Self::new(strategy)
    }

    /// `accel[i] = G * sum_{j != i} m_j (r_j - r_i) / (|r_j - r_i|^2 + eps^2)^{3/2}`
    /// (§4: the softened Newtonian pairwise force law every engine computes).
    fn accelerations(&self, y: &[Coord]) -> Vec<Coord> {
        let n = self.core.count();
        let mass = self.core.mass();
        let g = self.core.g();
        let eps2 = self.core.softening() * self.core.softening();

        let body_accel = |i: usize| -> (Coord, Coord, Coord) {
            let xi = y[i];
            let yi = y[n + i];
            let zi = y[2 * n + i];
            let mut ax = 0.0;
            let mut ay = 0.0;
            let mut az = 0.0;
            for j in 0..n {
                if j == i {
                    continue;
                }
                let dx = y[j] - xi;
                let dy = y[n + j] - yi;
                let dz = y[2 * n + j] - zi;
                let d2 = dx * dx + dy * dy + dz * dz + eps2;
                let inv_d3 = d2.powf(-1.5);
                let coeff = g * mass[j] * inv_d3;
                ax += coeff * dx;
                ay += coeff * dy;
                az += coeff * dz;
            }
            (ax, ay, az)
        };

        let mut accel = vec![0.0; 3 * n];
        match self.strategy {
            ParallelStrategy::Sequential => {
                for i in 0..n {
                    let (ax, ay, az) = body_accel(i);
                    accel[i] = ax;
                    accel[n + i] = ay;
                    accel[2 * n + i] = az;
                }
            }
            ParallelStrategy::DataParallel => {
                let results: Vec<(Coord, Coord, Coord)> = (0..n).into_par_iter().map(body_accel).collect();
                for (i, (ax, ay, az)) in results.into_iter().enumerate() {
                    accel[i] = ax;
                    accel[n + i] = ay;
                    accel[2 * n + i] = az;
                }
            }
            ParallelStrategy::Blocked => {
                let threads = rayon::current_num_threads().max(1);
                let chunk = (n / (threads * 4)).max(1);
                let results: Vec<(usize, Coord, Coord, Coord)> = (0..n)
                    .collect::<Vec<_>>()
                    .par_chunks(chunk)
                    .flat_map(|block| {
                        block
                            .iter()
                            .map(|&i| {
                                let (ax, ay, az) = body_accel(i);
                                (i, ax, ay, az)
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect();
                for (i, ax, ay, az) in results {
                    accel[i] = ax;
                    accel[n + i] = ay;
                    accel[2 * n + i] = az;
                }
            }
        }
        accel
    }
}

impl Engine for SimpleEngine {
    fn type_name(&self) -> &'static str {
        self.strategy.type_name()
    }

    fn problem_size(&self) -> usize {
        self.core.problem_size()
    }

    fn init(&mut self, data: &NBodyData) {
        self.core.init(data);
    }

    fn get_y(&self) -> BufferId {
        self.core.get_y().expect("engine not initialized")
    }

    fn create_buffer(&self, len: usize) -> BufferId {
        self.core.create_buffer(len)
    }

    fn free_buffer(&self, buf: BufferId) {
        self.core.free_buffer(buf)
    }

    fn create_buffers(&self, len: usize, k: usize) -> Vec<BufferId> {
        self.core.create_buffers(len, k)
    }

    fn free_buffers(&self, bufs: &[BufferId]) {
        self.core.free_buffers(bufs)
    }

    fn write_buffer(&self, dst: BufferId, host_src: &[Coord]) -> EngineResult<()> {
        self.core.write_buffer(dst, host_src)
    }

    fn read_buffer(&self, host_dst: &mut [Coord], src: BufferId) -> EngineResult<()> {
        self.core.read_buffer(host_dst, src)
    }

    fn copy_buffer(&self, dst: BufferId, src: BufferId) -> EngineResult<()> {
        self.core.copy_buffer(dst, src)
    }

    fn fill_buffer(&self, dst: BufferId, value: Coord) -> EngineResult<()> {
        self.core.fill_buffer(dst, value)
    }

    fn fmadd_inplace(&self, a: BufferId, b: BufferId, c: Coord) -> EngineResult<()> {
        self.core.fmadd_inplace(a, b, c)
    }

    fn fmadd(&self, a: BufferId, b: Option<BufferId>, c: BufferId, d: Coord) -> EngineResult<()> {
        self.core.fmadd(a, b, c, d)
    }

    fn fmaddn_inplace(&self, a: BufferId, b: &[BufferId], c: &[Coord]) -> EngineResult<()> {
        self.core.fmaddn_inplace(a, b, c)
    }

    fn fmaddn(
        &self,
        a: BufferId,
        b: Option<BufferId>,
        c: &[BufferId],
        d: &[Coord],
    ) -> EngineResult<()> {
        self.core.fmaddn(a, b, c, d)
    }

    fn fmaxabs(&self, a: BufferId) -> EngineResult<Coord> {
        self.core.fmaxabs(a)
    }

    fn fcompute(&self, _t: Coord, y: BufferId, f: BufferId) -> EngineResult<()> {
        let y_data = self.core.copy_velocity_block(y, f)?;
        let accel = self.accelerations(&y_data);
        self.core.write_acceleration_block(f, &accel)
    }

    fn print_info(&self) {
        tracing::info!(
            engine = self.type_name(),
            n = self.core.count(),
            g = self.core.g(),
            softening = self.core.softening(),
            "simple engine configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Body;

    /// §8 property 4: the Simple engine's force kernel agrees with a
    /// reference pairwise sum to within 1e-13 per component. Both sides
    /// use `f64` (this crate fixes `Coord = f64`), so the comparison
    /// exercises the same softened-Newtonian formula written independently
    /// rather than a different precision.
    fn reference_accelerations(positions: &[(f64, f64, f64)], mass: &[f64], eps2: f64) -> Vec<(f64, f64, f64)> {
        let n = positions.len();
        let mut accel = vec![(0.0, 0.0, 0.0); n];
        for i in 0..n {
            let (xi, yi, zi) = positions[i];
            let mut sum = (0.0, 0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (xj, yj, zj) = positions[j];
                let dx = xj - xi;
                let dy = yj - yi;
                let dz = zj - zi;
                let d2 = dx * dx + dy * dy + dz * dz + eps2;
                let inv_d3 = d2.powf(-1.5);
                sum.0 += mass[j] * inv_d3 * dx;
                sum.1 += mass[j] * inv_d3 * dy;
                sum.2 += mass[j] * inv_d3 * dz;
            }
            accel[i] = sum;
        }
        accel
    }

    #[test]
    fn matches_reference_pairwise_sum() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(7);
        let n = 32;
        let positions: Vec<(f64, f64, f64)> = (0..n)
            .map(|_| (rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
            .collect();
        let mass: Vec<f64> = (0..n).map(|_| rng.random_range(0.5..2.0)).collect();
        let eps2: f64 = 1e-6;

        let bodies: Vec<Body> = positions
            .iter()
            .zip(&mass)
            .map(|(&(x, y, z), &m)| Body {
                mass: m,
                position: crate::types::Vec3::new(x, y, z),
                velocity: crate::types::Vec3::ZERO,
                meta: Default::default(),
            })
            .collect();
        let data = crate::data::NBodyData::from_bodies(&bodies, 1.0, eps2.sqrt());

        let mut engine = SimpleEngine::new(ParallelStrategy::Sequential);
        engine.init(&data);
        let y = engine.get_y();
        let f = engine.create_buffer(engine.problem_size());
        engine.fcompute(0.0, y, f).unwrap();

        let mut host_f = vec![0.0; engine.problem_size()];
        engine.read_buffer(&mut host_f, f).unwrap();

        let reference = reference_accelerations(&positions, &mass, eps2);
        for i in 0..n {
            let got = (host_f[3 * n + i], host_f[4 * n + i], host_f[5 * n + i]);
            let want = reference[i];
            assert!((got.0 - want.0).abs() < 1e-13, "ax mismatch at {i}");
            assert!((got.1 - want.1).abs() < 1e-13, "ay mismatch at {i}");
            assert!((got.2 - want.2).abs() < 1e-13, "az mismatch at {i}");
        }
    }
}
