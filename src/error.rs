//! Error types for the gravity solvers.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("no particles to evaluate")]
    NoParticles,

    #[error("particle {index} has invalid mass {mass} (must be finite and positive)")]
    InvalidMass { index: usize, mass: f64 },

    #[error("particle {index} has a non-finite position")]
    InvalidPosition { index: usize },

    #[error("particle index {index} out of range for {len} particles")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid box size {0} (must be finite and positive)")]
    InvalidBoxSize(f64),

    #[error("particle {index} lies outside the root cell of size {box_size}")]
    OutsideRootCell { index: usize, box_size: f64 },

    #[error("invalid opening angle {0} (must be finite and non-negative)")]
    InvalidOpenAngle(f64),

    #[error("invalid softening: eps0 = {eps0}, r0 = {r0} (both must be finite and positive)")]
    InvalidSoftening { eps0: f64, r0: f64 },

    #[error("number of threads must be at least 1")]
    InvalidThreadCount,

    #[error("invalid {name} {value} (must be finite and positive)")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid time step {0} (must be finite and positive)")]
    InvalidTimeStep(f64),

    #[error(
        "inserting particle {index} exceeded the maximum tree depth of {max_depth} \
         (coincident or nearly coincident particles)"
    )]
    MaxDepthExceeded { index: usize, max_depth: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
