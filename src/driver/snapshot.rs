//! The snapshot stream (§6): "an opaque writer/reader pair outside this
//! core; the core invokes only `append(frame_no, t, state)`." This module
//! supplies the trait plus one concrete default -- a JSON-lines file sink
//! modeled on the teacher's `SystemStateTimeSeries::save` -- without
//! elevating it to a format the core depends on.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::types::Coord;

/// The one method the driver ever calls on a snapshot stream (§6).
/// Implementations are free to buffer, drop, or forward frames however
/// they like; the core never reads them back.
pub trait SnapshotSink {
    fn append(&mut self, frame_no: u64, t: Coord, state: &[Coord]);
}

/// A sink that discards every frame -- useful for contract tests that
/// only care about the engine/solver's final state, not the recorded
/// trajectory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn append(&mut self, _frame_no: u64, _t: Coord, _state: &[Coord]) {}
}

/// Accumulates every frame in memory. Used by tests and short scenario
/// runs; not suitable for long simulations (§4.6's snapshot stream is
/// explicitly "outside this core" precisely so that callers can choose a
/// sink with bounded memory use instead, such as [`JsonLinesSink`]).
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    pub frames: Vec<(u64, Coord, Vec<Coord>)>,
}

impl SnapshotSink for InMemorySink {
    fn append(&mut self, frame_no: u64, t: Coord, state: &[Coord]) {
        self.frames.push((frame_no, t, state.to_vec()));
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    frame_no: u64,
    t: Coord,
    state: &'a [Coord],
}

/// Appends one JSON object per line to a file, flushing after every frame
/// so a killed process loses at most the in-flight write -- the same
/// crash-safety trade-off the teacher's `SystemStateTimeSeries::save`
/// makes for its own per-epoch snapshot files.
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: BufWriter::new(file) })
    }
}

impl SnapshotSink for JsonLinesSink {
    fn append(&mut self, frame_no: u64, t: Coord, state: &[Coord]) {
        let frame = Frame { frame_no, t, state };
        let line = match serde_json::to_string(&frame) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(frame_no, error = %err, "failed to serialize snapshot frame");
                return;
            }
        };
        if let Err(err) = writeln!(self.writer, "{line}") {
            tracing::warn!(frame_no, error = %err, "failed to write snapshot frame");
            return;
        }
        if let Err(err) = self.writer.flush() {
            tracing::warn!(frame_no, error = %err, "failed to flush snapshot sink");
        }
    }
}
