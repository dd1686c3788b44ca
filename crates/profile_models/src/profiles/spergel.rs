//! Analytic Spergel surface-brightness family.
//!
//! The Spergel profile (Spergel 2010, ApJS 191, 58) describes galaxy
//! light with a modified Bessel kernel of the second kind,
//!
//! ```text
//! I(r) = flux * (r/r0)^nu K_nu(r/r0) / (2 pi 2^nu Gamma(nu+1) r0^2)
//! ```
//!
//! where the index `nu` interpolates between exponential-like
//! (`nu = 0.5`) and de Vaucouleurs-like (`nu -> -0.85`) shapes. Unlike
//! the Sersic family it has a closed-form Fourier transform,
//!
//! ```text
//! kValue(k) = flux / (1 + (k r0)^2)^(1 + nu)
//! ```
//!
//! which makes it attractive for fitting pipelines that work in the
//! Fourier domain.
//!
//! The family splits into [`SpergelInfo`], the shape-only state for one
//! index `nu` in scale-radius units, and [`SpergelProfile`], the sized
//! and fluxed instance. Infos are shared through a keyed cache; see
//! [`spergel_info`].

use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use statrs::function::gamma::gamma;

use profile_core::math::solvers::BrentSolver;
use profile_core::math::special::bessel_k;
use profile_core::types::{ProfileParams, SolverError};
use profile_shooting::photon::PhotonArray;
use profile_shooting::rng::ShotRng;
use profile_shooting::sampler::OneDimensionalSampler;

use crate::cache::{FloatKey, InfoCache};
use crate::error::ProfileError;

/// Smallest supported Spergel index.
///
/// Below roughly -0.85 the central cusp integrates so slowly that
/// derived radii stop being numerically meaningful.
pub const NU_MIN: f64 = -0.85;

/// Largest supported Spergel index.
pub const NU_MAX: f64 = 4.0;

/// Default bracket for enclosed-flux inversions, in scale-radius units.
const FLUX_RADIUS_BRACKET: (f64, f64) = (1.0e-3, 25.0);

/// Inner radius below which the shooting density is held constant.
///
/// The kernel `u^nu K_nu(u)` diverges at the origin for `nu <= 0`, and
/// even for positive `nu` the Bessel evaluation loses meaning at
/// `u = 0`. Flattening the density inside this radius keeps quadrature
/// and rejection sampling finite while moving less than the shooting
/// accuracy's share of the flux for all but the steepest indices.
const SHOOT_FLATTEN_RADIUS: f64 = 1.0e-6;

const SPERGEL_CACHE_CAPACITY: usize = 100;

static SPERGEL_CACHE: Lazy<InfoCache<(FloatKey, ProfileParams), SpergelInfo>> =
    Lazy::new(|| InfoCache::new("spergel", SPERGEL_CACHE_CAPACITY));

/// Returns the shared precomputation for index `nu`, building it on
/// first use.
///
/// Infos are keyed on the exact bits of `nu` together with the full
/// accuracy parameter set, so two callers using the same index and
/// parameters receive the same `Arc`.
///
/// # Example
///
/// ```
/// use profile_core::types::ProfileParams;
/// use profile_models::profiles::spergel_info;
///
/// let params = ProfileParams::default();
/// let info = spergel_info(0.5, &params).unwrap();
/// let again = spergel_info(0.5, &params).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&info, &again));
/// ```
pub fn spergel_info(nu: f64, params: &ProfileParams) -> Result<Arc<SpergelInfo>, ProfileError> {
    SPERGEL_CACHE.get_or_build((FloatKey::from(nu), params.clone()), || {
        SpergelInfo::new(nu, params.clone())
    })
}

/// Shape-only Spergel state for one index, in scale-radius units.
///
/// Everything here is expressed for `r0 = 1` and unit flux; instances
/// rescale on evaluation. Construction eagerly solves the half-light
/// radius `c_nu`, while the folding radius behind [`step_k`], the
/// Fourier cutoff behind [`max_k`] and the photon sampler are each
/// derived once on first use.
///
/// [`step_k`]: SpergelInfo::step_k
/// [`max_k`]: SpergelInfo::max_k
#[derive(Debug)]
pub struct SpergelInfo {
    nu: f64,
    params: ProfileParams,
    gamma_nu_plus_1: f64,
    gamma_nu_plus_2: f64,
    /// Total-flux normalisation `2 pi 2^nu Gamma(nu+1)`.
    flux_norm: f64,
    /// Half-light radius in scale-radius units.
    cnu: f64,
    step_k: OnceCell<f64>,
    max_k: OnceCell<f64>,
    sampler: OnceCell<OneDimensionalSampler>,
}

impl SpergelInfo {
    /// Builds the shape state for index `nu`.
    ///
    /// # Arguments
    ///
    /// * `nu` - Spergel index, in `[-0.85, 4.0]`
    /// * `params` - Accuracy and tabulation parameters
    ///
    /// # Returns
    ///
    /// * `Err(ProfileError::ParameterRange)` - index outside the
    ///   supported range or not finite
    /// * `Err(ProfileError::Params)` - invalid parameter set
    /// * `Err(ProfileError::Solver)` - the half-light solve failed
    pub fn new(nu: f64, params: ProfileParams) -> Result<Self, ProfileError> {
        params.validate()?;
        if !nu.is_finite() || !(NU_MIN..=NU_MAX).contains(&nu) {
            return Err(ProfileError::ParameterRange {
                name: "nu",
                value: nu,
                min: NU_MIN,
                max: NU_MAX,
            });
        }

        let gamma_nu_plus_1 = gamma(nu + 1.0);
        let gamma_nu_plus_2 = gamma(nu + 2.0);
        let flux_norm = TAU * 2f64.powf(nu) * gamma_nu_plus_1;
        let cnu = Self::flux_radius_impl(nu, gamma_nu_plus_2, 0.5)?;

        Ok(Self {
            nu,
            params,
            gamma_nu_plus_1,
            gamma_nu_plus_2,
            flux_norm,
            cnu,
            step_k: OnceCell::new(),
            max_k: OnceCell::new(),
            sampler: OnceCell::new(),
        })
    }

    /// The Spergel index this info was built for.
    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// The accuracy parameters this info was built with.
    pub fn params(&self) -> &ProfileParams {
        &self.params
    }

    /// Half-light radius `c_nu` in scale-radius units.
    pub fn half_light_radius(&self) -> f64 {
        self.cnu
    }

    /// Total-flux normalisation `2 pi 2^nu Gamma(nu+1)`.
    ///
    /// `radial_value(r) / flux_normalization()` integrates to one over
    /// the plane.
    pub fn flux_normalization(&self) -> f64 {
        self.flux_norm
    }

    /// Unnormalised surface brightness `u^nu K_nu(u)` at `u = |r|`.
    ///
    /// At the origin the kernel has the finite limit
    /// `Gamma(nu+1) 2^nu / (2 nu)` for `nu > 0` and diverges otherwise;
    /// the divergent case reports `f64::INFINITY` rather than NaN.
    pub fn radial_value(&self, r: f64) -> f64 {
        let u = r.abs();
        if u == 0.0 {
            return if self.nu > 0.0 {
                self.gamma_nu_plus_1 * 2f64.powf(self.nu) / (2.0 * self.nu)
            } else {
                f64::INFINITY
            };
        }
        u.powf(self.nu) * bessel_k(self.nu, u)
    }

    /// Unit-flux Fourier amplitude `(1 + k^2)^(-1-nu)`.
    ///
    /// Exact for every `k`; no tabulation is involved. The amplitude is
    /// one at `k = 0` and decreases monotonically.
    pub fn fourier_value(&self, k: f64) -> f64 {
        (1.0 + k * k).powf(-1.0 - self.nu)
    }

    /// Fraction of the total flux enclosed within radius `u`.
    ///
    /// Uses the closed form
    /// `1 - 2(1+nu) (u/2)^(1+nu) K_{1+nu}(u) / Gamma(2+nu)`, which for
    /// `nu = 0.5` reduces to `1 - (1+u) e^{-u}`.
    pub fn enclosed_flux(&self, u: f64) -> f64 {
        Self::enclosed_flux_impl(self.nu, self.gamma_nu_plus_2, u)
    }

    /// Radius enclosing `fraction` of the total flux, in scale-radius
    /// units.
    ///
    /// # Returns
    ///
    /// * `Err(ProfileError::ParameterRange)` - fraction outside `(0, 1)`
    /// * `Err(ProfileError::Solver)` - the bracket expansion or root
    ///   solve failed
    pub fn flux_radius(&self, fraction: f64) -> Result<f64, ProfileError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ProfileError::ParameterRange {
                name: "fraction",
                value: fraction,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self::flux_radius_impl(self.nu, self.gamma_nu_plus_2, fraction)?)
    }

    /// Spatial frequency step for aliasing-safe Fourier sampling, in
    /// inverse scale-radius units.
    ///
    /// `pi` over the radius enclosing all but the folding threshold of
    /// the flux, floored at `stepk_minimum_hlr` half-light radii. The
    /// folding radius is solved once and memoised.
    pub fn step_k(&self) -> Result<f64, ProfileError> {
        self.step_k
            .get_or_try_init(|| {
                let folded = Self::flux_radius_impl(
                    self.nu,
                    self.gamma_nu_plus_2,
                    1.0 - self.params.folding_threshold,
                )?;
                let support = folded.max(self.params.stepk_minimum_hlr * self.cnu);
                Ok(PI / support)
            })
            .copied()
    }

    /// Largest spatial frequency with significant amplitude, in inverse
    /// scale-radius units.
    ///
    /// Inverts the closed-form amplitude at the `maxk_threshold`:
    /// `maxk = threshold^(-1 / (2(1+nu)))`, dropping the `+1` inside
    /// the amplitude since the threshold is reached at `k >> 1`.
    pub fn max_k(&self) -> f64 {
        *self.max_k.get_or_init(|| {
            self.params
                .maxk_threshold
                .powf(-1.0 / (2.0 * (1.0 + self.nu)))
        })
    }

    /// Draws `n` photons from the unit-flux profile.
    ///
    /// Radii follow the flattened kernel over the support enclosing
    /// `1 - shoot_accuracy` of the flux, so the photon weights sum to
    /// just under one; callers must not renormalise, the missing tail
    /// is part of the sampling contract. The sampler is built on first
    /// use and shared by later calls.
    pub fn shoot(&self, n: usize, rng: &mut ShotRng) -> Result<PhotonArray, ProfileError> {
        let sampler = self.sampler()?;
        Ok(sampler.shoot(n, rng))
    }

    fn sampler(&self) -> Result<&OneDimensionalSampler, ProfileError> {
        self.sampler.get_or_try_init(|| {
            let support = Self::flux_radius_impl(
                self.nu,
                self.gamma_nu_plus_2,
                1.0 - self.params.shoot_accuracy,
            )?;
            let flatten = self.flatten_radius()?;
            let nu = self.nu;
            let norm = 1.0 / self.flux_norm;
            let density = move |r: f64| {
                let u = r.max(flatten);
                u.powf(nu) * bessel_k(nu, u) * norm
            };
            OneDimensionalSampler::new(Arc::new(density), (0.0, support), &self.params)
                .map_err(ProfileError::from)
        })
    }

    /// Radius inside which the shooting density is held constant.
    ///
    /// For `nu <= 0` the radius enclosing half the shooting accuracy's
    /// flux budget is used, so the flattened core moves a bounded flux
    /// fraction. For the steepest indices that radius falls below the
    /// numerical floor and the floor wins; the core bias then grows
    /// beyond the budget, which is the documented cost of supporting
    /// `nu` near -0.85 at all.
    fn flatten_radius(&self) -> Result<f64, ProfileError> {
        if self.nu > 0.0 {
            return Ok(SHOOT_FLATTEN_RADIUS);
        }
        let target = 0.5 * self.params.shoot_accuracy;
        if Self::enclosed_flux_impl(self.nu, self.gamma_nu_plus_2, SHOOT_FLATTEN_RADIUS) >= target
        {
            return Ok(SHOOT_FLATTEN_RADIUS);
        }
        Ok(Self::flux_radius_impl(self.nu, self.gamma_nu_plus_2, target)?)
    }

    fn enclosed_flux_impl(nu: f64, gamma_nu_plus_2: f64, u: f64) -> f64 {
        if u <= 0.0 {
            return 0.0;
        }
        1.0 - 2.0 * (1.0 + nu) * (0.5 * u).powf(1.0 + nu) * bessel_k(1.0 + nu, u)
            / gamma_nu_plus_2
    }

    /// Inverts the enclosed-flux relation for one fraction.
    ///
    /// The default bracket covers every fraction the family itself
    /// asks for at default parameters. A tightened folding threshold
    /// pushes the root above it and a steep negative index pushes the
    /// flattening root below it, so both expansion directions are
    /// exercised in practice.
    fn flux_radius_impl(
        nu: f64,
        gamma_nu_plus_2: f64,
        fraction: f64,
    ) -> Result<f64, SolverError> {
        let objective = |u: f64| Self::enclosed_flux_impl(nu, gamma_nu_plus_2, u) - fraction;
        let solver = BrentSolver::with_defaults();
        let (lo, hi) = FLUX_RADIUS_BRACKET;
        let f_lo = objective(lo);
        let f_hi = objective(hi);
        let (lo, hi) = if f_lo * f_hi <= 0.0 {
            (lo, hi)
        } else if f_lo > 0.0 {
            solver.bracket_lower(&objective, lo, hi, 0.0)?
        } else {
            solver.bracket_upper(&objective, lo, hi)?
        };
        solver.find_root(objective, lo, hi)
    }
}

/// How the radius argument of a [`SpergelProfile`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RadiusKind {
    /// The radius is the scale radius `r0` directly.
    Scale,
    /// The radius is the half-light radius; `r0` is derived from it.
    HalfLight,
}

/// A sized, fluxed Spergel profile.
///
/// Holds an `Arc` to the shared [`SpergelInfo`] for its index plus the
/// scale radius and flux of this particular object. All evaluation is
/// delegated to the info and rescaled, so instances are cheap to create
/// and clone.
#[derive(Debug, Clone)]
pub struct SpergelProfile {
    info: Arc<SpergelInfo>,
    scale_radius: f64,
    flux: f64,
    /// Central-ish surface-brightness prefactor `flux / (r0^2 N)`.
    xnorm: f64,
}

impl SpergelProfile {
    /// Creates a profile with the given index, size and flux.
    ///
    /// # Arguments
    ///
    /// * `nu` - Spergel index, in `[-0.85, 4.0]`
    /// * `radius` - positive size, interpreted per `radius_kind`
    /// * `radius_kind` - scale-radius or half-light interpretation
    /// * `flux` - total flux, any finite value
    /// * `params` - accuracy parameters, also the cache key
    pub fn new(
        nu: f64,
        radius: f64,
        radius_kind: RadiusKind,
        flux: f64,
        params: &ProfileParams,
    ) -> Result<Self, ProfileError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ProfileError::ParameterRange {
                name: "radius",
                value: radius,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if !flux.is_finite() {
            return Err(ProfileError::ParameterRange {
                name: "flux",
                value: flux,
                min: f64::NEG_INFINITY,
                max: f64::INFINITY,
            });
        }

        let info = spergel_info(nu, params)?;
        let scale_radius = match radius_kind {
            RadiusKind::Scale => radius,
            RadiusKind::HalfLight => radius / info.half_light_radius(),
        };
        let xnorm = flux / (scale_radius * scale_radius * info.flux_normalization());

        Ok(Self {
            info,
            scale_radius,
            flux,
            xnorm,
        })
    }

    /// The shared shape state backing this instance.
    pub fn info(&self) -> &Arc<SpergelInfo> {
        &self.info
    }

    /// The Spergel index.
    pub fn nu(&self) -> f64 {
        self.info.nu()
    }

    /// Scale radius `r0` in physical units.
    pub fn scale_radius(&self) -> f64 {
        self.scale_radius
    }

    /// Half-light radius in physical units.
    pub fn half_light_radius(&self) -> f64 {
        self.info.half_light_radius() * self.scale_radius
    }

    /// Total flux.
    pub fn flux(&self) -> f64 {
        self.flux
    }

    /// Surface brightness at radius `r` in physical units.
    pub fn radial_value(&self, r: f64) -> f64 {
        self.xnorm * self.info.radial_value(r / self.scale_radius)
    }

    /// Fourier amplitude at spatial frequency `k` in physical units.
    ///
    /// Equals `flux` at `k = 0`.
    pub fn fourier_value(&self, k: f64) -> f64 {
        self.flux * self.info.fourier_value(k * self.scale_radius)
    }

    /// Frequency step for aliasing-safe sampling, in physical units.
    pub fn step_k(&self) -> Result<f64, ProfileError> {
        Ok(self.info.step_k()? / self.scale_radius)
    }

    /// Largest significant frequency, in physical units.
    pub fn max_k(&self) -> f64 {
        self.info.max_k() / self.scale_radius
    }

    /// Draws `n` photons carrying this profile's size and flux.
    ///
    /// Photon weights sum to `flux * (1 - shoot_accuracy)` up to
    /// quadrature tolerance; the truncated tail is deliberately not
    /// redistributed over the drawn photons.
    pub fn shoot(&self, n: usize, rng: &mut ShotRng) -> Result<PhotonArray, ProfileError> {
        let mut photons = self.info.shoot(n, rng)?;
        photons.scale_positions(self.scale_radius);
        photons.scale_flux(self.flux);
        Ok(photons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// Half-light radius of the nu = 1/2 profile, from solving
    /// 1 - (1+u) e^{-u} = 1/2 independently.
    const CNU_HALF: f64 = 1.678_346_990_016_661;

    fn median(values: &mut [f64]) -> f64 {
        values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
        values[values.len() / 2]
    }

    #[test]
    fn half_light_radius_matches_independent_solve() {
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        assert_relative_eq!(info.half_light_radius(), CNU_HALF, max_relative = 1e-9);
    }

    #[test]
    fn radial_value_closed_form_at_nu_half() {
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        // K_{1/2}(x) = sqrt(pi / 2x) e^{-x}, so u^{1/2} K_{1/2}(u)
        // is sqrt(pi/2) e^{-u}.
        let expected = |u: f64| (PI / 2.0).sqrt() * (-u).exp();
        assert_relative_eq!(info.radial_value(0.0), expected(0.0), max_relative = 1e-12);
        assert_relative_eq!(info.radial_value(1.0), expected(1.0), max_relative = 1e-10);
        assert_relative_eq!(info.radial_value(4.5), expected(4.5), max_relative = 1e-10);
        // Radial symmetry.
        assert_eq!(info.radial_value(-2.0), info.radial_value(2.0));
    }

    #[test]
    fn radial_value_center_diverges_for_cuspy_indices() {
        let cuspy = SpergelInfo::new(-0.3, ProfileParams::default()).unwrap();
        assert_eq!(cuspy.radial_value(0.0), f64::INFINITY);

        let flat = SpergelInfo::new(1.5, ProfileParams::default()).unwrap();
        assert!(flat.radial_value(0.0).is_finite());
        assert!(flat.radial_value(0.0) > 0.0);
    }

    #[test]
    fn fourier_value_is_unit_normalised_and_monotone() {
        let info = SpergelInfo::new(1.2, ProfileParams::default()).unwrap();
        assert_relative_eq!(info.fourier_value(0.0), 1.0, max_relative = 1e-15);
        let mut previous = 1.0;
        for i in 1..40 {
            let value = info.fourier_value(0.25 * i as f64);
            assert!(value > 0.0);
            assert!(value < previous);
            previous = value;
        }
        assert_eq!(info.fourier_value(-3.0), info.fourier_value(3.0));
    }

    #[test]
    fn enclosed_flux_closed_form_at_nu_half() {
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        // 1 - (1+u) e^{-u} at u = 1.
        assert_relative_eq!(
            info.enclosed_flux(1.0),
            1.0 - 2.0 * (-1.0f64).exp(),
            max_relative = 1e-10
        );
        assert_eq!(info.enclosed_flux(0.0), 0.0);
        assert_relative_eq!(info.enclosed_flux(40.0), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn flux_radius_round_trips_enclosed_flux() {
        let info = SpergelInfo::new(1.2, ProfileParams::default()).unwrap();
        for fraction in [0.05, 0.3, 0.5, 0.9, 0.999] {
            let radius = info.flux_radius(fraction).unwrap();
            assert_relative_eq!(info.enclosed_flux(radius), fraction, max_relative = 1e-8);
        }
    }

    #[test]
    fn flux_radius_rejects_degenerate_fractions() {
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        for bad in [0.0, 1.0, -0.2, 1.4, f64::NAN] {
            let result = info.flux_radius(bad);
            assert!(matches!(
                result,
                Err(ProfileError::ParameterRange { name: "fraction", .. })
            ));
        }
    }

    #[test]
    fn step_k_hits_minimum_hlr_floor_at_default_folding() {
        // At the default folding threshold the 99.5%-light radius of
        // the nu = 1/2 profile sits below five half-light radii, so the
        // floor decides the step.
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        let expected = PI / (5.0 * info.half_light_radius());
        assert_relative_eq!(info.step_k().unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn step_k_shrinks_when_folding_tightens() {
        let loose = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        let tight_params = ProfileParams::builder()
            .folding_threshold(1e-4)
            .build()
            .unwrap();
        let tight = SpergelInfo::new(0.5, tight_params).unwrap();
        assert!(tight.step_k().unwrap() < loose.step_k().unwrap());
    }

    #[test]
    fn max_k_closed_form_and_threshold_response() {
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        // threshold^{-1/(2(1+nu))} = 1000^{1/3} at the defaults.
        assert_relative_eq!(info.max_k(), 10.0, max_relative = 1e-12);
        // The approximation drops the +1 inside the amplitude, so the
        // true amplitude at maxk is even smaller than the threshold.
        assert!(info.fourier_value(info.max_k()) < info.params().maxk_threshold);

        let tight_params = ProfileParams::builder()
            .maxk_threshold(1e-4)
            .build()
            .unwrap();
        let tight = SpergelInfo::new(0.5, tight_params).unwrap();
        assert!(tight.max_k() > info.max_k());
    }

    #[test]
    fn index_range_is_enforced() {
        for bad in [4.5, -0.9, f64::NAN, f64::INFINITY] {
            let result = SpergelInfo::new(bad, ProfileParams::default());
            assert!(matches!(
                result,
                Err(ProfileError::ParameterRange { name: "nu", .. })
            ));
        }
        assert!(SpergelInfo::new(NU_MIN, ProfileParams::default()).is_ok());
        assert!(SpergelInfo::new(NU_MAX, ProfileParams::default()).is_ok());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut params = ProfileParams::default();
        params.folding_threshold = 0.0;
        let result = SpergelInfo::new(0.5, params);
        assert!(matches!(result, Err(ProfileError::Params(_))));
    }

    #[test]
    fn shooting_conserves_flux_within_support() {
        let info = SpergelInfo::new(0.5, ProfileParams::default()).unwrap();
        let mut rng = ShotRng::from_seed(1405);
        let photons = info.shoot(5000, &mut rng).unwrap();
        assert_eq!(photons.len(), 5000);

        // Weights sum to 1 - shoot_accuracy up to quadrature slop.
        assert_abs_diff_eq!(photons.total_flux(), 1.0, epsilon = 1e-3);

        let support = info.flux_radius(1.0 - info.params().shoot_accuracy).unwrap();
        let mut radii: Vec<f64> = photons
            .x()
            .iter()
            .zip(photons.y())
            .map(|(x, y)| x.hypot(*y))
            .collect();
        assert!(radii.iter().all(|r| *r <= support * (1.0 + 1e-12)));

        // The empirical median radius estimates the half-light radius.
        let med = median(&mut radii);
        assert_relative_eq!(med, info.half_light_radius(), max_relative = 0.05);
    }

    #[test]
    fn shooting_handles_cuspy_indices() {
        let info = SpergelInfo::new(-0.6, ProfileParams::default()).unwrap();
        let mut rng = ShotRng::from_seed(97);
        let photons = info.shoot(2000, &mut rng).unwrap();
        assert!(photons.total_flux() > 0.97 && photons.total_flux() < 1.01);
        assert!(photons.x().iter().all(|v| v.is_finite()));
        assert!(photons.y().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn info_cache_shares_and_separates() {
        let params = ProfileParams::default();
        let a = spergel_info(2.2, &params).unwrap();
        let b = spergel_info(2.2, &params).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let other_params = ProfileParams::builder()
            .folding_threshold(2e-3)
            .build()
            .unwrap();
        let c = spergel_info(2.2, &other_params).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));

        let d = spergel_info(2.25, &params).unwrap();
        assert!(!Arc::ptr_eq(&a, &d));
    }

    #[test]
    fn profile_scales_radial_and_fourier_values() {
        let params = ProfileParams::default();
        let profile = SpergelProfile::new(0.5, 2.0, RadiusKind::Scale, 3.0, &params).unwrap();
        let info = spergel_info(0.5, &params).unwrap();

        // flux / (r0^2 N) * kernel(r / r0)
        let expected_radial =
            3.0 / (4.0 * info.flux_normalization()) * info.radial_value(1.3 / 2.0);
        assert_relative_eq!(profile.radial_value(1.3), expected_radial, max_relative = 1e-12);

        assert_relative_eq!(profile.fourier_value(0.0), 3.0, max_relative = 1e-15);
        let expected_fourier = 3.0 * (1.0_f64 + (0.7 * 2.0) * (0.7 * 2.0)).powf(-1.5);
        assert_relative_eq!(profile.fourier_value(0.7), expected_fourier, max_relative = 1e-12);

        assert_relative_eq!(
            profile.step_k().unwrap(),
            info.step_k().unwrap() / 2.0,
            max_relative = 1e-15
        );
        assert_relative_eq!(profile.max_k(), info.max_k() / 2.0, max_relative = 1e-15);
    }

    #[test]
    fn half_light_construction_recovers_the_requested_radius() {
        let params = ProfileParams::default();
        let profile =
            SpergelProfile::new(0.5, 2.5, RadiusKind::HalfLight, 1.0, &params).unwrap();
        assert_relative_eq!(profile.half_light_radius(), 2.5, max_relative = 1e-12);
        assert_relative_eq!(profile.scale_radius(), 2.5 / CNU_HALF, max_relative = 1e-9);
        // Half the flux inside the half-light radius.
        assert_relative_eq!(
            profile.info().enclosed_flux(2.5 / profile.scale_radius()),
            0.5,
            max_relative = 1e-9
        );
    }

    #[test]
    fn profile_shoot_carries_size_and_flux() {
        let params = ProfileParams::default();
        let profile = SpergelProfile::new(0.5, 3.0, RadiusKind::Scale, 2.0, &params).unwrap();
        let mut rng = ShotRng::from_seed(2203);
        let photons = profile.shoot(4000, &mut rng).unwrap();

        assert_abs_diff_eq!(photons.total_flux(), 2.0, epsilon = 2e-3);
        let mut radii: Vec<f64> = photons
            .x()
            .iter()
            .zip(photons.y())
            .map(|(x, y)| x.hypot(*y))
            .collect();
        let med = median(&mut radii);
        assert_relative_eq!(med, profile.half_light_radius(), max_relative = 0.05);
    }

    #[test]
    fn profile_rejects_bad_radius_and_flux() {
        let params = ProfileParams::default();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = SpergelProfile::new(0.5, bad, RadiusKind::Scale, 1.0, &params);
            assert!(matches!(
                result,
                Err(ProfileError::ParameterRange { name: "radius", .. })
            ));
        }
        let result = SpergelProfile::new(0.5, 1.0, RadiusKind::Scale, f64::NAN, &params);
        assert!(matches!(
            result,
            Err(ProfileError::ParameterRange { name: "flux", .. })
        ));
        // Zero and negative fluxes are legal; they describe subtracted
        // components.
        assert!(SpergelProfile::new(0.5, 1.0, RadiusKind::Scale, -2.0, &params).is_ok());
    }
}
