//! Numerical tolerance bundle shared by every profile family.
//!
//! This module provides configuration types controlling the accuracy /
//! performance trade-offs of profile evaluation and photon sampling. The
//! bundle participates in profile-info cache keys, so it is hashable and
//! comparable by exact value: two bundles with equal values are
//! interchangeable and map to the same cached precomputation.

use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Azimuthal-angle strategy for radial photon draws.
///
/// Radial samplers draw a radius and an independent angle uniform on the
/// circle. The two supported strategies trade speed for deviate usage:
///
/// - `UnitDiscRejection`: draw paired deviates in the unit square and reject
///   points outside the unit disc, then scale the surviving direction to the
///   sampled radius. Avoids trigonometric calls; consumes a variable number
///   of deviates (mean 8/π per sample).
/// - `DirectSinCos`: map a single deviate to `theta = 2*pi*u` and take
///   `(cos theta, sin theta)`. Fixed deviate usage; one sincos per sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AngleMethod {
    /// Paired-deviate rejection inside the unit disc (no trigonometry).
    #[default]
    UnitDiscRejection,

    /// Direct angle draw via `theta = 2*pi*u` and a sincos evaluation.
    DirectSinCos,
}

/// Error raised when a tolerance bundle fails validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamsError {
    /// A tolerance is outside its admissible open interval.
    #[error("Invalid tolerance {name} = {value}: must lie in ({min}, {max})")]
    InvalidTolerance {
        /// Name of the offending field
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Exclusive lower bound
        min: f64,
        /// Exclusive upper bound
        max: f64,
    },
}

/// Numerical tolerances consumed by the profile core.
///
/// Immutable once built. The fields mirror the knobs the evaluation and
/// sampling routines actually consume:
///
/// - `folding_threshold`: fraction of flux allowed to fold beyond the
///   real-space truncation radius; defines `step_k`
/// - `maxk_threshold`: Fourier-amplitude cutoff defining `max_k`
/// - `stepk_minimum_hlr`: minimum real-space support in half-light-radius
///   units (floor applied to the folding radius)
/// - `shoot_accuracy`: photon-sampling error budget (truncated flux,
///   interval subdivision, origin flattening)
/// - `kvalue_accuracy` / `xvalue_accuracy`: accuracy floors for tabulated
///   Fourier / real-space evaluators (drive lookup-table spacing)
/// - `integration_relerr` / `integration_abserr`: adaptive quadrature
///   targets
/// - `table_spacing`: multiplier on the accuracy-derived table grid spacing
///   (> 1 trades accuracy for smaller tables)
/// - `angle_method`: azimuthal draw strategy for photon shooting
///
/// Equality and hashing are bit-exact over the float fields, making the
/// bundle usable as an opaque cache-key component. Validation rejects
/// non-finite and out-of-range values, so bit-exact equality coincides with
/// numeric equality for every bundle that can exist.
///
/// # Examples
///
/// ```rust
/// use profile_core::types::ProfileParams;
///
/// // Library defaults
/// let params = ProfileParams::default();
/// assert_eq!(params.folding_threshold, 5.0e-3);
///
/// // Tightened real-space truncation
/// let tight = ProfileParams::builder()
///     .folding_threshold(1.0e-4)
///     .build()
///     .expect("valid tolerances");
/// assert!(tight.folding_threshold < params.folding_threshold);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileParams {
    /// Fraction of total flux allowed to alias beyond the truncation radius.
    pub folding_threshold: f64,
    /// Fourier amplitudes below this fraction of flux are treated as zero.
    pub maxk_threshold: f64,
    /// Minimum real-space support, in units of the half-light radius.
    pub stepk_minimum_hlr: f64,
    /// Error budget for photon shooting.
    pub shoot_accuracy: f64,
    /// Accuracy floor for tabulated Fourier-space values.
    pub kvalue_accuracy: f64,
    /// Accuracy floor for tabulated real-space values.
    pub xvalue_accuracy: f64,
    /// Relative error target for adaptive quadrature.
    pub integration_relerr: f64,
    /// Absolute error floor for adaptive quadrature.
    pub integration_abserr: f64,
    /// Multiplier on accuracy-derived lookup-table grid spacing.
    pub table_spacing: f64,
    /// Azimuthal-angle strategy for photon draws.
    pub angle_method: AngleMethod,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            folding_threshold: 5.0e-3,
            maxk_threshold: 1.0e-3,
            stepk_minimum_hlr: 5.0,
            shoot_accuracy: 1.0e-5,
            kvalue_accuracy: 1.0e-5,
            xvalue_accuracy: 1.0e-5,
            integration_relerr: 1.0e-6,
            integration_abserr: 1.0e-8,
            table_spacing: 1.0,
            angle_method: AngleMethod::default(),
        }
    }
}

impl ProfileParams {
    /// Creates a new builder seeded with the library defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use profile_core::types::ProfileParams;
    ///
    /// let params = ProfileParams::builder()
    ///     .shoot_accuracy(1.0e-4)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.shoot_accuracy, 1.0e-4);
    /// ```
    #[inline]
    pub fn builder() -> ProfileParamsBuilder {
        ProfileParamsBuilder::default()
    }

    /// Validates the bundle.
    ///
    /// # Errors
    ///
    /// Returns `ParamsError::InvalidTolerance` if any fractional tolerance
    /// lies outside `(0, 1)`, or any scale factor is not a positive finite
    /// number.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let fractions = [
            ("folding_threshold", self.folding_threshold),
            ("maxk_threshold", self.maxk_threshold),
            ("shoot_accuracy", self.shoot_accuracy),
            ("kvalue_accuracy", self.kvalue_accuracy),
            ("xvalue_accuracy", self.xvalue_accuracy),
            ("integration_relerr", self.integration_relerr),
            ("integration_abserr", self.integration_abserr),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(ParamsError::InvalidTolerance {
                    name,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        let scales = [
            ("stepk_minimum_hlr", self.stepk_minimum_hlr),
            ("table_spacing", self.table_spacing),
        ];
        for (name, value) in scales {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamsError::InvalidTolerance {
                    name,
                    value,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
        }
        Ok(())
    }

    fn float_fields(&self) -> [f64; 9] {
        [
            self.folding_threshold,
            self.maxk_threshold,
            self.stepk_minimum_hlr,
            self.shoot_accuracy,
            self.kvalue_accuracy,
            self.xvalue_accuracy,
            self.integration_relerr,
            self.integration_abserr,
            self.table_spacing,
        ]
    }
}

// Bit-exact equality keeps Eq and Hash mutually consistent. Validation
// excludes NaN and signed zero, so this coincides with numeric equality.
impl PartialEq for ProfileParams {
    fn eq(&self, other: &Self) -> bool {
        self.angle_method == other.angle_method
            && self
                .float_fields()
                .iter()
                .zip(other.float_fields().iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for ProfileParams {}

impl Hash for ProfileParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for field in self.float_fields() {
            state.write_u64(field.to_bits());
        }
        self.angle_method.hash(state);
    }
}

/// Builder for [`ProfileParams`].
///
/// Starts from the library defaults; every setter overrides one field and
/// `build` validates the result.
#[derive(Clone, Debug)]
pub struct ProfileParamsBuilder {
    params: ProfileParams,
}

impl Default for ProfileParamsBuilder {
    fn default() -> Self {
        Self {
            params: ProfileParams::default(),
        }
    }
}

impl ProfileParamsBuilder {
    /// Sets the real-space folding threshold (fraction of flux).
    #[inline]
    pub fn folding_threshold(mut self, value: f64) -> Self {
        self.params.folding_threshold = value;
        self
    }

    /// Sets the Fourier-amplitude cutoff defining `max_k`.
    #[inline]
    pub fn maxk_threshold(mut self, value: f64) -> Self {
        self.params.maxk_threshold = value;
        self
    }

    /// Sets the minimum real-space support in half-light-radius units.
    #[inline]
    pub fn stepk_minimum_hlr(mut self, value: f64) -> Self {
        self.params.stepk_minimum_hlr = value;
        self
    }

    /// Sets the photon-sampling error budget.
    #[inline]
    pub fn shoot_accuracy(mut self, value: f64) -> Self {
        self.params.shoot_accuracy = value;
        self
    }

    /// Sets the tabulated Fourier-value accuracy floor.
    #[inline]
    pub fn kvalue_accuracy(mut self, value: f64) -> Self {
        self.params.kvalue_accuracy = value;
        self
    }

    /// Sets the tabulated real-space-value accuracy floor.
    #[inline]
    pub fn xvalue_accuracy(mut self, value: f64) -> Self {
        self.params.xvalue_accuracy = value;
        self
    }

    /// Sets the relative error target for adaptive quadrature.
    #[inline]
    pub fn integration_relerr(mut self, value: f64) -> Self {
        self.params.integration_relerr = value;
        self
    }

    /// Sets the absolute error floor for adaptive quadrature.
    #[inline]
    pub fn integration_abserr(mut self, value: f64) -> Self {
        self.params.integration_abserr = value;
        self
    }

    /// Sets the lookup-table grid spacing multiplier.
    #[inline]
    pub fn table_spacing(mut self, value: f64) -> Self {
        self.params.table_spacing = value;
        self
    }

    /// Sets the azimuthal-angle strategy for photon draws.
    #[inline]
    pub fn angle_method(mut self, method: AngleMethod) -> Self {
        self.params.angle_method = method;
        self
    }

    /// Builds and validates the bundle.
    ///
    /// # Errors
    ///
    /// Returns `ParamsError::InvalidTolerance` if any field fails
    /// validation; see [`ProfileParams::validate`].
    pub fn build(self) -> Result<ProfileParams, ParamsError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
