//! The force-evaluation engine (§4.1-§4.4): a capability trait (`Engine`)
//! implemented by the Simple engine and the Barnes-Hut engine, exposing
//! only the vector primitive contract of §4.1 to the solver layer.

pub mod barnes_hut;
pub mod buffer;
pub mod core;
pub mod factory;
pub mod simple;
pub mod spatial_index;

pub use buffer::BufferId;

use crate::data::NBodyData;
use crate::error::EngineResult;
use crate::types::Coord;

/// The vector primitive contract every back-end implements. Solvers
/// (`crate::solver`) are written only against this trait (§4.5: "every
/// solver ... does not know how forces are produced").
pub trait Engine: Send + Sync {
    /// Human-readable back-end name, e.g. `"simple_bh"` (matches the
    /// distilled spec's `type_name()` / §6 engine-factory keys).
    fn type_name(&self) -> &'static str;

    /// `6N`, the fixed size of the state and right-hand-side vectors.
    fn problem_size(&self) -> usize;

    /// Bind a dataset: copy its mass vector and initial state into the
    /// engine's own buffers. Must be called before any other primitive.
    fn init(&mut self, data: &NBodyData);

    /// Handle to the engine's current state buffer (bound by `init`,
    /// advanced in place by the driver/solver across steps).
    fn get_y(&self) -> BufferId;

    fn create_buffer(&self, len: usize) -> BufferId;
    fn free_buffer(&self, buf: BufferId);
    fn create_buffers(&self, len: usize, k: usize) -> Vec<BufferId>;
    fn free_buffers(&self, bufs: &[BufferId]);

    fn write_buffer(&self, dst: BufferId, host_src: &[Coord]) -> EngineResult<()>;
    fn read_buffer(&self, host_dst: &mut [Coord], src: BufferId) -> EngineResult<()>;
    fn copy_buffer(&self, dst: BufferId, src: BufferId) -> EngineResult<()>;
    fn fill_buffer(&self, dst: BufferId, value: Coord) -> EngineResult<()>;

    /// `a[i] += b[i] * c`
    fn fmadd_inplace(&self, a: BufferId, b: BufferId, c: Coord) -> EngineResult<()>;
    /// `a[i] = b[i] + c[i] * d`; `b = None` means "treat b as zero".
    fn fmadd(&self, a: BufferId, b: Option<BufferId>, c: BufferId, d: Coord) -> EngineResult<()>;
    /// `a[i] += sum_k b[k][i] * c[k]`
    fn fmaddn_inplace(&self, a: BufferId, b: &[BufferId], c: &[Coord]) -> EngineResult<()>;
    /// `a[i] = b[i] + sum_k c[k][i] * d[k]`; `b = None` means "treat b as zero".
    fn fmaddn(
        &self,
        a: BufferId,
        b: Option<BufferId>,
        c: &[BufferId],
        d: &[Coord],
    ) -> EngineResult<()>;
    /// `max_i |a[i]|`
    fn fmaxabs(&self, a: BufferId) -> EngineResult<Coord>;

    /// `f = F(t, y)`: the force kernel. `y` and `f` must be distinct
    /// buffers (§9 open question (c): aliasing is forbidden, by
    /// convention rather than a runtime check, same as the original).
    fn fcompute(&self, t: Coord, y: BufferId, f: BufferId) -> EngineResult<()>;

    /// Logs the engine's configuration at `info` level, mirroring the
    /// original's `print_info()` diagnostic dump.
    fn print_info(&self);
}
