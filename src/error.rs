//! Error types for the pendulum simulation.

use thiserror::Error;

/// Errors that can occur while configuring or running the simulation.
#[derive(Debug, Error)]
pub enum PendulumError {
    /// Two vectors of different length were combined.
    #[error("Dimension mismatch: left has {left} components, right has {right}")]
    DimensionMismatch {
        /// Length of the left operand
        left: usize,
        /// Length of the right operand
        right: usize,
    },

    /// A physical or render parameter would produce non-finite motion.
    #[error("Degenerate parameters: {0}")]
    DegenerateParameters(String),

    /// An integration step size that is zero, negative or non-finite.
    #[error("Invalid step size: {0} (must be positive and finite)")]
    InvalidStep(f64),

    /// The terminal could not be driven.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Result type for pendulum operations.
pub type Result<T> = std::result::Result<T, PendulumError>;
