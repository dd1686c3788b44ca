//! Unified error type for profile construction and evaluation.
//!
//! Construction of a profile family touches every layer below it: the
//! parameter set is validated, enclosed-flux equations are inverted with
//! a root solver, tabulated kernels are built into lookup tables, and a
//! photon sampler is assembled on top. Each layer reports failures in
//! its own vocabulary; this module folds them into a single
//! [`ProfileError`] so callers match on one type.

use profile_core::types::{ParamsError, SolverError, TableError};
use profile_shooting::error::SamplerError;
use thiserror::Error;

/// Errors raised while building or evaluating a light profile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A profile parameter lies outside its supported range.
    #[error("Parameter {name} = {value} outside valid range [{min}, {max}]")]
    ParameterRange {
        /// Name of the offending parameter.
        name: &'static str,
        /// Value supplied by the caller.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// The accuracy parameter set failed validation.
    #[error("Parameter error: {0}")]
    Params(#[from] ParamsError),

    /// A root solve failed while inverting an enclosed-flux relation.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// A tabulated kernel could not be built or evaluated.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// The photon sampler could not be assembled over the profile.
    #[error("Sampler error: {0}")]
    Sampler(#[from] SamplerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_range_display_names_the_parameter() {
        let err = ProfileError::ParameterRange {
            name: "nu",
            value: 7.3,
            min: -0.85,
            max: 4.0,
        };
        let text = err.to_string();
        assert!(text.contains("nu"));
        assert!(text.contains("7.3"));
        assert!(text.contains("-0.85"));
    }

    #[test]
    fn solver_errors_convert() {
        let err: ProfileError = SolverError::NoBracket { a: 0.0, b: 1.0 }.into();
        assert!(matches!(err, ProfileError::Solver(_)));
        assert!(err.to_string().starts_with("Solver error:"));
    }

    #[test]
    fn table_errors_convert() {
        let err: ProfileError = TableError::InsufficientData { got: 1, need: 3 }.into();
        assert!(matches!(err, ProfileError::Table(_)));
    }

    #[test]
    fn errors_compare_equal() {
        let a = ProfileError::ParameterRange {
            name: "kcrit",
            value: -1.0,
            min: 0.0,
            max: f64::INFINITY,
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
