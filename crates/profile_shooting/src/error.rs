//! Errors raised while constructing a photon sampler.

use thiserror::Error;

/// Errors from sampler construction.
///
/// Construction either yields a sampler whose draws are trustworthy within
/// the configured accuracy, or fails with one of these; there is no partial
/// success state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SamplerError {
    /// The radial support is empty, inverted, or non-finite.
    #[error("Degenerate radial support [{lower}, {upper}]")]
    DegenerateSupport {
        /// Requested lower radius
        lower: f64,
        /// Requested upper radius
        upper: f64,
    },

    /// The density does not integrate to a positive finite flux.
    #[error("Radial density is not integrable: total flux = {total}")]
    NonIntegrable {
        /// The offending integral value
        total: f64,
    },

    /// Interval refinement failed to converge within its budget.
    #[error("Interval subdivision exceeded the budget of {max_intervals} intervals")]
    SubdivisionLimit {
        /// The interval budget that was exhausted
        max_intervals: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_support_display() {
        let err = SamplerError::DegenerateSupport {
            lower: 2.0,
            upper: 1.0,
        };
        assert_eq!(format!("{}", err), "Degenerate radial support [2, 1]");
    }

    #[test]
    fn test_non_integrable_display() {
        let err = SamplerError::NonIntegrable { total: 0.0 };
        assert!(format!("{}", err).contains("total flux = 0"));
    }

    #[test]
    fn test_subdivision_limit_display() {
        let err = SamplerError::SubdivisionLimit {
            max_intervals: 4096,
        };
        assert!(format!("{}", err).contains("4096"));
    }

    #[test]
    fn test_error_trait_implementation() {
        let err = SamplerError::NonIntegrable { total: f64::NAN };
        let _: &dyn std::error::Error = &err;
    }
}
