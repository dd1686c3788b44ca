//! Structured error types for numerical operations.
//!
//! This module provides:
//! - `SolverError`: Errors from root-finding routines
//! - `TableError`: Errors from lookup-table construction and interpolation
//!
//! All errors propagate synchronously to the immediate caller; nothing in
//! this layer retries or substitutes default values, since a silently
//! defaulted scale would poison every profile sharing the cached result.

use thiserror::Error;

/// Errors from root-finding operations.
///
/// # Variants
/// - `NoBracket`: The supplied interval does not bracket a sign change
/// - `MaxIterationsExceeded`: Convergence budget exhausted before tolerance
/// - `NumericalInstability`: Computation produced a non-finite intermediate
///
/// # Examples
/// ```
/// use profile_core::types::SolverError;
///
/// let err = SolverError::NoBracket { a: 1.0, b: 2.0 };
/// assert!(format!("{}", err).contains("bracket"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// The function has the same sign at both bracket endpoints.
    #[error("No root bracketed in [{a}, {b}]: f(a) and f(b) have the same sign")]
    NoBracket {
        /// Lower bracket endpoint
        a: f64,
        /// Upper bracket endpoint
        b: f64,
    },

    /// Maximum iteration count reached without convergence.
    #[error("Maximum iterations ({iterations}) exceeded without convergence")]
    MaxIterationsExceeded {
        /// The iteration budget that was exhausted
        iterations: usize,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Errors from lookup-table operations.
///
/// # Variants
/// - `InsufficientData`: Too few points for the requested interpolation policy
/// - `OutOfBounds`: Query point outside the tabulated domain
/// - `NonMonotonic`: Abscissae not strictly increasing after sorting
/// - `InvalidInput`: Malformed input (mismatched lengths, non-finite values)
///
/// # Examples
/// ```
/// use profile_core::types::TableError;
///
/// let err = TableError::InsufficientData { got: 1, need: 2 };
/// assert_eq!(format!("{}", err), "Insufficient data points: got 1, need at least 2");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableError {
    /// Too few data points for the interpolation policy.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points supplied
        got: usize,
        /// Minimum number required
        need: usize,
    },

    /// Query point outside the tabulated domain.
    #[error("Value {x} outside table domain [{min}, {max}]")]
    OutOfBounds {
        /// The out-of-range query point
        x: f64,
        /// Domain lower bound
        min: f64,
        /// Domain upper bound
        max: f64,
    },

    /// Duplicate or decreasing abscissa detected.
    #[error("Table abscissae not strictly increasing at index {index}")]
    NonMonotonic {
        /// Index of the offending abscissa
        index: usize,
    },

    /// Malformed input data.
    #[error("Invalid table input: {0}")]
    InvalidInput(String),
}
