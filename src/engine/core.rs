//! Shared plumbing behind every [`Engine`](super::Engine) implementation:
//! buffer-arena bookkeeping, the bound dataset (mass, G, softening), and
//! the velocity-copy half of `fcompute` that every back-end shares
//! (§4.4: "composes ... the velocity-copy half of f").

use ndarray::Array1;

use super::buffer::{BufferArena, BufferId, require_len};
use crate::data::NBodyData;
use crate::error::{EngineError, EngineResult};
use crate::types::Coord;

/// Composed, never exposed directly as `dyn Engine` — each back-end embeds
/// one and forwards the shared `Engine` methods to it.
pub struct EngineCore {
    arena: BufferArena,
    count: usize,
    mass: Array1<Coord>,
    g: Coord,
    softening: Coord,
    y: Option<BufferId>,
}

impl EngineCore {
    pub fn new() -> Self {
        Self {
            arena: BufferArena::new(),
            count: 0,
            mass: Array1::zeros(0),
            g: 1.0,
            softening: 0.0,
            y: None,
        }
    }

    pub fn init(&mut self, data: &NBodyData) {
        self.count = data.count();
        self.mass = data.mass().clone();
        self.g = data.g();
        self.softening = data.softening();
        let y = self.arena.create(data.problem_size());
        self.arena
            .overwrite(y, data.y0().to_vec())
            .expect("freshly created buffer");
        self.y = Some(y);
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn problem_size(&self) -> usize {
        6 * self.count
    }

    #[inline]
    pub fn mass(&self) -> &Array1<Coord> {
        &self.mass
    }

    #[inline]
    pub fn g(&self) -> Coord {
        self.g
    }

    #[inline]
    pub fn softening(&self) -> Coord {
        self.softening
    }

    pub fn get_y(&self) -> EngineResult<BufferId> {
        self.y.ok_or(EngineError::Uninitialized)
    }

    pub fn create_buffer(&self, len: usize) -> BufferId {
        self.arena.create(len)
    }

    pub fn free_buffer(&self, buf: BufferId) {
        self.arena.free(buf)
    }

    pub fn create_buffers(&self, len: usize, k: usize) -> Vec<BufferId> {
        (0..k).map(|_| self.arena.create(len)).collect()
    }

    pub fn free_buffers(&self, bufs: &[BufferId]) {
        for &b in bufs {
            self.arena.free(b);
        }
    }

    pub fn write_buffer(&self, dst: BufferId, host_src: &[Coord]) -> EngineResult<()> {
        let len = self.arena.len_of(dst)?;
        if host_src.len() < len {
            tracing::warn!(expected = len, actual = host_src.len(), "write_buffer: host slice too small");
            return Err(EngineError::HostLengthMismatch { expected: len, actual: host_src.len() });
        }
        self.arena.overwrite(dst, host_src[..len].to_vec())
    }

    pub fn read_buffer(&self, host_dst: &mut [Coord], src: BufferId) -> EngineResult<()> {
        let data = self.arena.snapshot(src)?;
        if host_dst.len() < data.len() {
            tracing::warn!(expected = data.len(), actual = host_dst.len(), "read_buffer: host slice too small");
            return Err(EngineError::HostLengthMismatch { expected: data.len(), actual: host_dst.len() });
        }
        host_dst[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    pub fn copy_buffer(&self, dst: BufferId, src: BufferId) -> EngineResult<()> {
        let data = self.arena.snapshot(src)?;
        let dst_len = self.arena.len_of(dst)?;
        if dst_len < data.len() {
            tracing::warn!(expected = data.len(), actual = dst_len, "copy_buffer: dst too small, no-op");
            return Err(EngineError::SizeMismatch { expected: data.len(), actual: dst_len });
        }
        self.arena.overwrite(dst, data)
    }

    pub fn fill_buffer(&self, dst: BufferId, value: Coord) -> EngineResult<()> {
        self.arena.with_write(dst, |buf| buf.iter_mut().for_each(|x| *x = value))
    }

    pub fn fmadd_inplace(&self, a: BufferId, b: BufferId, c: Coord) -> EngineResult<()> {
        let problem = self.problem_size();
        require_len(&self.arena, a, problem)?;
        require_len(&self.arena, b, problem)?;
        let b_data = self.arena.snapshot(b)?;
        self.arena
            .with_write(a, |av| {
                for i in 0..problem {
                    av[i] += b_data[i] * c;
                }
            })
    }

    pub fn fmadd(
        &self,
        a: BufferId,
        b: Option<BufferId>,
        c: BufferId,
        d: Coord,
    ) -> EngineResult<()> {
        let problem = self.problem_size();
        require_len(&self.arena, a, problem)?;
        require_len(&self.arena, c, problem)?;
        if let Some(b) = b {
            require_len(&self.arena, b, problem)?;
        }
        let b_data = b.map(|b| self.arena.snapshot(b)).transpose()?;
        let c_data = self.arena.snapshot(c)?;
        let mut out = vec![0.0; problem];
        for i in 0..problem {
            let base = b_data.as_ref().map(|v| v[i]).unwrap_or(0.0);
            out[i] = base + c_data[i] * d;
        }
        self.arena.overwrite(a, out)
    }

    pub fn fmaddn_inplace(&self, a: BufferId, b: &[BufferId], c: &[Coord]) -> EngineResult<()> {
        let problem = self.problem_size();
        require_len(&self.arena, a, problem)?;
        for &bk in b {
            require_len(&self.arena, bk, problem)?;
        }
        let b_data: Vec<Vec<Coord>> = b
            .iter()
            .map(|&bk| self.arena.snapshot(bk))
            .collect::<EngineResult<_>>()?;
        self.arena.with_write(a, |av| {
            for i in 0..problem {
                let mut sum = 0.0;
                for (bk, &ck) in b_data.iter().zip(c) {
                    sum += bk[i] * ck;
                }
                av[i] += sum;
            }
        })
    }

    pub fn fmaddn(
        &self,
        a: BufferId,
        b: Option<BufferId>,
        c: &[BufferId],
        d: &[Coord],
    ) -> EngineResult<()> {
        let problem = self.problem_size();
        require_len(&self.arena, a, problem)?;
        if let Some(b) = b {
            require_len(&self.arena, b, problem)?;
        }
        for &ck in c {
            require_len(&self.arena, ck, problem)?;
        }
        let b_data = b.map(|b| self.arena.snapshot(b)).transpose()?;
        let c_data: Vec<Vec<Coord>> = c
            .iter()
            .map(|&ck| self.arena.snapshot(ck))
            .collect::<EngineResult<_>>()?;
        let mut out = vec![0.0; problem];
        for i in 0..problem {
            let base = b_data.as_ref().map(|v| v[i]).unwrap_or(0.0);
            let mut sum = 0.0;
            for (ck, &dk) in c_data.iter().zip(d) {
                sum += ck[i] * dk;
            }
            out[i] = base + sum;
        }
        self.arena.overwrite(a, out)
    }

    pub fn fmaxabs(&self, a: BufferId) -> EngineResult<Coord> {
        self.arena.with_read(a, |av| {
            av.iter().fold(0.0_f64, |acc, &x| acc.max(x.abs()))
        })
    }

    /// Writes the velocity block of `f` (the first 3N entries) from the
    /// velocity block of `y` (the last 3N entries of the state layout),
    /// per §3: "f ... first 3N entries equal to the velocity block of y."
    /// Returns the snapshotted `y` buffer so callers can reuse it for the
    /// acceleration half without a second lock round-trip.
    pub fn copy_velocity_block(&self, y: BufferId, f: BufferId) -> EngineResult<Vec<Coord>> {
        let n = self.count;
        let problem = self.problem_size();
        require_len(&self.arena, y, problem)?;
        require_len(&self.arena, f, problem)?;
        let y_data = self.arena.snapshot(y)?;
        self.arena.with_write(f, |fv| {
            fv[..3 * n].copy_from_slice(&y_data[3 * n..6 * n]);
        })?;
        Ok(y_data)
    }

    pub fn write_acceleration_block(
        &self,
        f: BufferId,
        accel: &[Coord],
    ) -> EngineResult<()> {
        let n = self.count;
        self.arena.with_write(f, |fv| {
            fv[3 * n..6 * n].copy_from_slice(accel);
        })
    }
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Body, BodyMeta, NBodyData};
    use crate::types::Vec3;

    fn one_body_core() -> EngineCore {
        let mut core = EngineCore::new();
        let body = Body { mass: 1.0, position: Vec3::ZERO, velocity: Vec3::ZERO, meta: BodyMeta::default() };
        let data = NBodyData::from_bodies(&[body], 1.0, 0.0);
        core.init(&data);
        core
    }

    /// §8 property 1: `fmadd_inplace(a,b,c)` is `a[i] += c*b[i]` to within
    /// machine epsilon.
    #[test]
    fn fmadd_inplace_matches_definition() {
        let core = one_body_core();
        let n = core.problem_size();
        let a = core.create_buffer(n);
        let b = core.create_buffer(n);
        core.write_buffer(a, &vec![1.0; n]).unwrap();
        core.write_buffer(b, &vec![2.0; n]).unwrap();
        core.fmadd_inplace(a, b, 3.0).unwrap();
        let mut out = vec![0.0; n];
        core.read_buffer(&mut out, a).unwrap();
        for x in out {
            assert!((x - 7.0).abs() < 1e-15);
        }
    }

    /// §8 property 2: `fmadd(a,b,c,d)` with `b = None` agrees with
    /// `fmaddn(a, None, [c], [d], 1)` and with
    /// `fill_buffer(a, 0); fmadd_inplace(a, c, d)`.
    #[test]
    fn fmadd_null_b_matches_alternate_forms() {
        let core = one_body_core();
        let n = core.problem_size();
        let c = core.create_buffer(n);
        core.write_buffer(c, &vec![5.0; n]).unwrap();

        let a1 = core.create_buffer(n);
        core.fmadd(a1, None, c, 2.0).unwrap();

        let a2 = core.create_buffer(n);
        core.fmaddn(a2, None, &[c], &[2.0]).unwrap();

        let a3 = core.create_buffer(n);
        core.fill_buffer(a3, 0.0).unwrap();
        core.fmadd_inplace(a3, c, 2.0).unwrap();

        let mut v1 = vec![0.0; n];
        let mut v2 = vec![0.0; n];
        let mut v3 = vec![0.0; n];
        core.read_buffer(&mut v1, a1).unwrap();
        core.read_buffer(&mut v2, a2).unwrap();
        core.read_buffer(&mut v3, a3).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v2, v3);
    }

    /// §8 property 3: `fmaxabs` equals the host-computed maximum absolute
    /// value.
    #[test]
    fn fmaxabs_matches_host_max() {
        let core = one_body_core();
        let n = core.problem_size();
        let a = core.create_buffer(n);
        let mut host = vec![0.0; n];
        host[0] = -3.5;
        host[n - 1] = 2.0;
        core.write_buffer(a, &host).unwrap();
        let result = core.fmaxabs(a).unwrap();
        assert!((result - 3.5).abs() < 1e-15);
    }

    /// §8 property 7: round-trip `write_buffer` then `read_buffer` is the
    /// identity.
    #[test]
    fn write_then_read_is_identity() {
        let core = one_body_core();
        let n = core.problem_size();
        let a = core.create_buffer(n);
        let host: Vec<f64> = (0..n).map(|i| i as f64 * 1.5).collect();
        core.write_buffer(a, &host).unwrap();
        let mut out = vec![0.0; n];
        core.read_buffer(&mut out, a).unwrap();
        assert_eq!(host, out);
    }

    /// §8 property 8: negative branches. A zero-sized handle leaves
    /// observable outputs unchanged and does not crash.
    #[test]
    fn undersized_buffer_is_a_no_op() {
        let core = one_body_core();
        let n = core.problem_size();
        let a = core.create_buffer(n);
        let host: Vec<f64> = vec![9.0; n];
        core.write_buffer(a, &host).unwrap();

        let zero = core.create_buffer(0);
        assert!(core.fmadd_inplace(a, zero, 1.0).is_err());

        let mut out = vec![0.0; n];
        core.read_buffer(&mut out, a).unwrap();
        assert_eq!(out, host, "a must be untouched after the failed primitive");
    }

    #[test]
    fn fmaddn_matches_definition() {
        let core = one_body_core();
        let n = core.problem_size();
        let b1 = core.create_buffer(n);
        let b2 = core.create_buffer(n);
        core.write_buffer(b1, &vec![1.0; n]).unwrap();
        core.write_buffer(b2, &vec![2.0; n]).unwrap();

        let base = core.create_buffer(n);
        core.write_buffer(base, &vec![10.0; n]).unwrap();

        let out = core.create_buffer(n);
        core.fmaddn(out, Some(base), &[b1, b2], &[3.0, 4.0]).unwrap();
        let mut host = vec![0.0; n];
        core.read_buffer(&mut host, out).unwrap();
        for x in host {
            assert!((x - (10.0 + 3.0 + 8.0)).abs() < 1e-15);
        }
    }
}
