//! The engine's buffer arena: explicit alloc/free over opaque handles
//! (§3 "Engine memory handle", §4.1 `create_buffer`/`free_buffer`).
//!
//! Every primitive that needs to read one buffer while writing a different
//! one clones the source buffer's contents out from under the arena lock
//! first, then takes a fresh lock to write the destination. This keeps the
//! arena itself a single `Mutex<Vec<Option<Vec<Coord>>>>` with no unsafe
//! aliased-borrow tricks, at the cost of one `Vec` clone per primitive call
//! — negligible next to the O(N) or O(N log N) cost of `fcompute` itself,
//! which never goes through this API (it reads/writes whole buffers once
//! per call via [`BufferArena::get`]/[`BufferArena::get_mut`]).

use std::sync::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::types::Coord;

pub type BufferId = usize;

#[derive(Default)]
pub struct BufferArena {
    inner: Mutex<Vec<Option<Vec<Coord>>>>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a buffer of `len` elements, zero-initialized. `len == 0` is
    /// legal — it is exactly the "zero-sized handle" construction used by
    /// the negative-branch tests (§8 property 8).
    pub fn create(&self, len: usize) -> BufferId {
        let mut slots = self.inner.lock().expect("buffer arena poisoned");
        slots.push(Some(vec![0.0; len]));
        slots.len() - 1
    }

    pub fn free(&self, id: BufferId) {
        let mut slots = self.inner.lock().expect("buffer arena poisoned");
        if let Some(slot) = slots.get_mut(id) {
            *slot = None;
        }
    }

    pub fn len_of(&self, id: BufferId) -> EngineResult<usize> {
        let slots = self.inner.lock().expect("buffer arena poisoned");
        slots
            .get(id)
            .and_then(|s| s.as_ref())
            .map(|v| v.len())
            .ok_or(EngineError::UnknownBuffer(id))
    }

    pub fn snapshot(&self, id: BufferId) -> EngineResult<Vec<Coord>> {
        let slots = self.inner.lock().expect("buffer arena poisoned");
        slots
            .get(id)
            .and_then(|s| s.as_ref())
            .cloned()
            .ok_or(EngineError::UnknownBuffer(id))
    }

    pub fn with_read<R>(&self, id: BufferId, f: impl FnOnce(&[Coord]) -> R) -> EngineResult<R> {
        let slots = self.inner.lock().expect("buffer arena poisoned");
        let buf = slots
            .get(id)
            .and_then(|s| s.as_ref())
            .ok_or(EngineError::UnknownBuffer(id))?;
        Ok(f(buf))
    }

    pub fn with_write<R>(
        &self,
        id: BufferId,
        f: impl FnOnce(&mut [Coord]) -> R,
    ) -> EngineResult<R> {
        let mut slots = self.inner.lock().expect("buffer arena poisoned");
        let buf = slots
            .get_mut(id)
            .and_then(|s| s.as_mut())
            .ok_or(EngineError::UnknownBuffer(id))?;
        Ok(f(buf))
    }

    /// Replace a buffer's contents wholesale, e.g. after computing a
    /// primitive's result into a fresh local `Vec` (used by the `fmadd*`
    /// family, which reads its sources via [`Self::snapshot`] first).
    pub fn overwrite(&self, id: BufferId, data: Vec<Coord>) -> EngineResult<()> {
        let mut slots = self.inner.lock().expect("buffer arena poisoned");
        let buf = slots
            .get_mut(id)
            .and_then(|s| s.as_mut())
            .ok_or(EngineError::UnknownBuffer(id))?;
        *buf = data;
        Ok(())
    }
}

/// Checks a buffer's length against the minimum the caller requires,
/// returning the §7 size-mismatch error (and letting the caller log and
/// no-op) rather than panicking or writing past the end of the buffer.
pub fn require_len(arena: &BufferArena, id: BufferId, expected: usize) -> EngineResult<()> {
    let actual = arena.len_of(id)?;
    if actual < expected {
        tracing::warn!(expected, actual, buffer = id, "engine primitive: buffer too small, no-op");
        return Err(EngineError::SizeMismatch { expected, actual });
    }
    Ok(())
}
