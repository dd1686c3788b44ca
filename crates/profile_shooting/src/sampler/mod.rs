//! Radius sampling by interval decomposition and rejection.
//!
//! A [`OneDimensionalSampler`] reduces drawing from an arbitrary radial
//! flux density to three cheap steps: binary search on precomputed
//! cumulative fluxes to pick an interval, an area-uniform proposal inside
//! that annulus, and rejection against the interval's density bound. The
//! decomposition is refined at construction until every interval's flux is
//! known to within the `shoot_accuracy` budget, after which the sampler is
//! immutable and shareable across threads.

mod interval;

use crate::density::RadialDensity;
use crate::error::SamplerError;
use crate::photon::PhotonArray;
use crate::rng::ShotRng;
use interval::{build_intervals, Interval};
use profile_core::math::integrate::{adaptive_simpson, QuadratureConfig};
use profile_core::types::{AngleMethod, ProfileParams};
use std::f64::consts::TAU;
use std::sync::Arc;

/// Attempt bound for the unit-disc direction draw.
const DISC_REJECTION_TRIES: usize = 256;

/// Photon-position sampler for a radially symmetric flux density.
///
/// Construction integrates `2 pi r f(r)` over the support, decomposes it
/// into flux intervals, and stores the cumulative masses; see the module
/// docs for the draw procedure. All draw methods take `&self` plus a
/// caller-owned [`ShotRng`], so one sampler may serve many threads.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use profile_core::types::ProfileParams;
/// use profile_shooting::rng::ShotRng;
/// use profile_shooting::sampler::OneDimensionalSampler;
///
/// let params = ProfileParams::default();
/// let sampler = OneDimensionalSampler::new(
///     Arc::new(|r: f64| (-0.5 * r * r).exp()),
///     (0.0, 8.0),
///     &params,
/// )
/// .unwrap();
///
/// // Total flux of a unit Gaussian surface density: 2 pi
/// assert!((sampler.total_flux() - std::f64::consts::TAU).abs() < 1e-3);
///
/// let mut rng = ShotRng::from_seed(1);
/// let r = sampler.draw_radius(&mut rng);
/// assert!((0.0..=8.0).contains(&r));
/// ```
pub struct OneDimensionalSampler {
    density: Arc<dyn RadialDensity>,
    intervals: Vec<Interval>,
    total_flux: f64,
    angle_method: AngleMethod,
}

impl OneDimensionalSampler {
    /// Build a sampler for `density` over the radial support `range`.
    ///
    /// # Arguments
    ///
    /// * `density` - Surface density `f(r)`, non-negative on the support
    /// * `range` - `(lower, upper)` radial support, `0 <= lower < upper`
    /// * `params` - Accuracy budget (`shoot_accuracy`, quadrature targets)
    ///   and the azimuthal draw strategy
    ///
    /// # Errors
    ///
    /// * [`SamplerError::DegenerateSupport`] - empty, inverted, negative or
    ///   non-finite support
    /// * [`SamplerError::NonIntegrable`] - the annular flux integral is not
    ///   a positive finite number
    /// * [`SamplerError::SubdivisionLimit`] - interval refinement failed to
    ///   converge within its budget
    pub fn new(
        density: Arc<dyn RadialDensity>,
        range: (f64, f64),
        params: &ProfileParams,
    ) -> Result<Self, SamplerError> {
        let (lower, upper) = range;
        if !lower.is_finite() || !upper.is_finite() || lower < 0.0 || !(upper > lower) {
            return Err(SamplerError::DegenerateSupport { lower, upper });
        }

        let quad = QuadratureConfig {
            rel_tol: params.integration_relerr,
            abs_tol: params.integration_abserr,
            ..Default::default()
        };

        let total_estimate = {
            let f = |r: f64| TAU * r * density.density(r);
            adaptive_simpson(f, lower, upper, &quad)
        };
        if !total_estimate.is_finite() || total_estimate <= 0.0 {
            return Err(SamplerError::NonIntegrable {
                total: total_estimate,
            });
        }

        let flux_tol = params.shoot_accuracy * total_estimate;
        let mut intervals = build_intervals(density.as_ref(), lower, upper, flux_tol, &quad)?;

        let mut running = 0.0;
        for iv in &mut intervals {
            running += iv.flux;
            iv.cumulative = running;
        }
        if !running.is_finite() || running <= 0.0 {
            return Err(SamplerError::NonIntegrable { total: running });
        }

        Ok(Self {
            density,
            intervals,
            total_flux: running,
            angle_method: params.angle_method,
        })
    }

    /// Total annular flux of the density over the support.
    #[inline]
    pub fn total_flux(&self) -> f64 {
        self.total_flux
    }

    /// The radial support `(lower, upper)` the sampler covers.
    #[inline]
    pub fn support(&self) -> (f64, f64) {
        // Construction guarantees at least INITIAL_PANELS leaves
        (
            self.intervals[0].lower,
            self.intervals[self.intervals.len() - 1].upper,
        )
    }

    /// Number of intervals in the flux decomposition.
    #[inline]
    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    /// Draw one radius distributed as `r f(r)` on the support.
    ///
    /// One deviate selects the interval, with its in-interval remainder
    /// recycled as the first proposal; further deviates are consumed only
    /// by rejection rounds.
    pub fn draw_radius(&self, rng: &mut ShotRng) -> f64 {
        let target = rng.gen_uniform() * self.total_flux;
        let idx = self
            .intervals
            .partition_point(|iv| iv.cumulative <= target)
            .min(self.intervals.len() - 1);
        let iv = &self.intervals[idx];

        let frac = if iv.flux > 0.0 {
            (target - (iv.cumulative - iv.flux)) / iv.flux
        } else {
            0.5
        };
        iv.sample_radius(frac, rng, self.density.as_ref())
    }

    /// Draw one position: a radius paired with an isotropic direction.
    pub fn draw_position(&self, rng: &mut ShotRng) -> (f64, f64) {
        let r = self.draw_radius(rng);
        let (ux, uy) = self.draw_direction(rng);
        (r * ux, r * uy)
    }

    /// Shoot `n` photons, each carrying flux `total_flux / n`.
    ///
    /// Photons land at isotropic angles around the origin with radii
    /// distributed as the density; their weights sum to [`Self::total_flux`]
    /// regardless of `n`. `n = 0` yields an empty array.
    pub fn shoot(&self, n: usize, rng: &mut ShotRng) -> PhotonArray {
        let mut photons = PhotonArray::with_capacity(n);
        if n == 0 {
            return photons;
        }
        let weight = self.total_flux / n as f64;
        for _ in 0..n {
            let (x, y) = self.draw_position(rng);
            photons.push(x, y, weight);
        }
        photons
    }

    /// Unit direction on the circle, by the configured strategy.
    fn draw_direction(&self, rng: &mut ShotRng) -> (f64, f64) {
        match self.angle_method {
            AngleMethod::UnitDiscRejection => {
                for _ in 0..DISC_REJECTION_TRIES {
                    let x = 2.0 * rng.gen_uniform() - 1.0;
                    let y = 2.0 * rng.gen_uniform() - 1.0;
                    let rsq = x * x + y * y;
                    if rsq > 0.0 && rsq <= 1.0 {
                        let inv = rsq.sqrt().recip();
                        return (x * inv, y * inv);
                    }
                }
                // A healthy generator cannot miss the disc this often;
                // fall back to the trigonometric draw
                Self::direct_direction(rng)
            }
            AngleMethod::DirectSinCos => Self::direct_direction(rng),
        }
    }

    fn direct_direction(rng: &mut ShotRng) -> (f64, f64) {
        let theta = TAU * rng.gen_uniform();
        let (sin_t, cos_t) = theta.sin_cos();
        (cos_t, sin_t)
    }

    #[cfg(test)]
    fn intervals(&self) -> &[Interval] {
        &self.intervals
    }
}

impl std::fmt::Debug for OneDimensionalSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneDimensionalSampler")
            .field("intervals", &self.intervals.len())
            .field("total_flux", &self.total_flux)
            .field("angle_method", &self.angle_method)
            .finish()
    }
}
