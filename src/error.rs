//! Error taxonomy for the engine/solver core (§7 of the spec).
//!
//! Configuration errors (unknown enum value, missing parameter) are not
//! modeled as `Err` at all: factories return `Option::None`, matching the
//! distilled spec's "construction returns a null handle; the caller must
//! check." The two error enums below cover the failures that *do* need a
//! return value: a primitive called on an undersized buffer, and a solver
//! step that could not meet its error threshold.

use thiserror::Error;

/// Failure returned by an [`Engine`](crate::engine::Engine) primitive.
///
/// Every variant corresponds to the primitive detecting the problem itself
/// and declining to write past the end of any buffer ("negative branches",
/// §8 property 8) rather than unwinding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("buffer too small: expected at least {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("unknown buffer handle {0}")]
    UnknownBuffer(usize),

    #[error("host slice length {actual} does not match buffer length {expected}")]
    HostLengthMismatch { expected: usize, actual: usize },

    #[error("engine has not been initialized with a dataset")]
    Uninitialized,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Failure surfaced by the solver layer.
///
/// Non-convergence is recovered from locally (the distilled spec: "the
/// solver accepts the last computed ŷ and logs a warning"); it is modeled
/// here purely so that tests can observe that the warning path was taken,
/// not because callers are expected to propagate it as a hard failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("adaptive step did not meet error_threshold after max_recursion={max_recursion} retries (last error={last_error:e})")]
    NonConvergence { max_recursion: u32, last_error: f64 },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type SolverResult<T> = Result<T, SolverError>;
