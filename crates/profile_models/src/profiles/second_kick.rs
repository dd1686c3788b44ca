//! Tabulated atmospheric second-kick family.
//!
//! A finite exposure through Kolmogorov turbulence averages away phase
//! power below a critical spatial frequency `kcrit`; what remains is a
//! small unscattered core plus a scattered halo, the "second kick" a
//! photon receives from the residual high-frequency turbulence. The
//! family works from the truncated phase structure function
//!
//! ```text
//! D(rho) = A * rho^(5/3) * F(rho * kcrit)
//! F(x)   = integral_x^inf t^(-8/3) (1 - J_0(t)) dt
//! ```
//!
//! normalised so that `D` reproduces the Kolmogorov `6.883877 rho^(5/3)`
//! as `kcrit -> 0`. The structure function saturates at a finite
//! `D(inf)`, which puts a fraction
//!
//! ```text
//! delta = exp(-D(inf) / 2)
//! ```
//!
//! of the flux into an unscattered point component. The tabulated
//! Fourier profile deliberately carries only the scattered remainder
//! `exp(-D(k)/2) - delta`; instances add the flat `delta` floor back, so
//! the split is exact at both ends: unit amplitude at `k = 0` and no
//! spurious tail truncation of the point component.
//!
//! All info-level quantities are dimensionless, with frequencies in
//! units of `k0 = 2 pi r0 / lambda` and radii in `1 / k0`;
//! [`SecondKickProfile`] applies the physical `lambda / r0` scaling.

use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use statrs::function::gamma::gamma;

use profile_core::math::integrate::{hankel_transform, QuadratureConfig};
use profile_core::math::table::{Interpolation, LookupTable};
use profile_core::types::{ProfileParams, TableError};
use profile_shooting::photon::PhotonArray;
use profile_shooting::rng::ShotRng;
use profile_shooting::sampler::OneDimensionalSampler;

use crate::cache::{FloatKey, InfoCache};
use crate::error::ProfileError;

/// Kolmogorov structure-function coefficient.
const KOLMOGOROV_COEFF: f64 = 6.883877;

/// Crossover between the series and asymptotic tail evaluations.
const TAIL_CROSSOVER: f64 = 25.0;

/// Relative term size terminating the tail series.
const TAIL_SERIES_TOL: f64 = 1e-15;
const TAIL_SERIES_MAX_TERMS: usize = 200;

/// Consecutive sub-threshold samples ending the Fourier march.
///
/// A single quiet sample is not enough: the scattered amplitude crosses
/// zero on its way into an oscillating tail, and one grid point can land
/// inside that crossing while macroscopic lobes still follow.
const KV_QUIET_POINTS: usize = 3;

const KV_TABLE_MAX_POINTS: usize = 100_000;
const RADIAL_TABLE_MAX_POINTS: usize = 100_000;

const SECOND_KICK_CACHE_CAPACITY: usize = 25;

/// `F(0) = 1.2 Gamma(1/6) / (2^(8/3) Gamma(11/6))`, about 1.11834.
static TAIL_AT_ZERO: Lazy<f64> =
    Lazy::new(|| 1.2 * gamma(1.0 / 6.0) / (2f64.powf(8.0 / 3.0) * gamma(11.0 / 6.0)));

/// Structure-function amplitude `6.883877 / F(0)`.
static STRUCTURE_AMPLITUDE: Lazy<f64> = Lazy::new(|| KOLMOGOROV_COEFF / *TAIL_AT_ZERO);

static SECOND_KICK_CACHE: Lazy<InfoCache<(FloatKey, ProfileParams), SecondKickInfo>> =
    Lazy::new(|| InfoCache::new("second_kick", SECOND_KICK_CACHE_CAPACITY));

/// Returns the shared precomputation for `kcrit`, building it on first
/// use.
///
/// Keyed on the exact bits of `kcrit` together with the accuracy
/// parameter set, like [`crate::profiles::spergel_info`]. Builds are
/// noticeably heavier here, so the shared cache matters more.
pub fn second_kick_info(
    kcrit: f64,
    params: &ProfileParams,
) -> Result<Arc<SecondKickInfo>, ProfileError> {
    SECOND_KICK_CACHE.get_or_build((FloatKey::from(kcrit), params.clone()), || {
        SecondKickInfo::new(kcrit, params.clone())
    })
}

/// Truncated-spectrum tail integral
/// `F(x) = integral_x^inf t^(-8/3) (1 - J_0(t)) dt`.
///
/// Below the crossover, `F(0)` minus the term-by-term integral of the
/// `J_0` power series:
///
/// ```text
/// F(x) = F(0) - sum_{m>=1} (-1)^(m+1) x^(2m-5/3) / (4^m (m!)^2 (2m - 5/3))
/// ```
///
/// Above it, integration by parts against the `J_0` asymptotic form:
///
/// ```text
/// F(x) = 3/5 x^(-5/3)
///      + sqrt(2/pi) [ x^(-19/6) sin(x - pi/4)
///                    - (19/6 + 1/8) x^(-25/6) cos(x - pi/4) ]
/// ```
///
/// The two regimes agree to a few parts in 1e7 at the crossover.
fn structure_tail(x: f64) -> f64 {
    if x <= 0.0 {
        return *TAIL_AT_ZERO;
    }
    if x < TAIL_CROSSOVER {
        let x2 = x * x;
        let prefactor = x.powf(-5.0 / 3.0);
        // base tracks x^(2m) / (4^m (m!)^2), starting at m = 1.
        let mut base = 0.25 * x2;
        let mut sign = 1.0;
        let mut sum = 0.0;
        for m in 1..=TAIL_SERIES_MAX_TERMS {
            let term = sign * base * prefactor / (2.0 * m as f64 - 5.0 / 3.0);
            sum += term;
            if term.abs() < TAIL_SERIES_TOL * (1.0 + sum.abs()) {
                break;
            }
            let next = m as f64 + 1.0;
            base *= 0.25 * x2 / (next * next);
            sign = -sign;
        }
        *TAIL_AT_ZERO - sum
    } else {
        let phase = x - 0.25 * PI;
        0.6 * x.powf(-5.0 / 3.0)
            + (2.0 / PI).sqrt()
                * (x.powf(-19.0 / 6.0) * phase.sin()
                    - (19.0 / 6.0 + 0.125) * x.powf(-25.0 / 6.0) * phase.cos())
    }
}

/// Result of the Fourier-side tabulation.
struct FourierBuild {
    table: LookupTable,
    max_k: f64,
    /// First frequency at which the scattered amplitude drops below the
    /// threshold; the radial grid is matched to this bright bandwidth.
    bright_k: f64,
}

/// Result of the radial-side tabulation.
struct RadialBuild {
    table: LookupTable,
    half_light_radius: f64,
    step_k: f64,
    shoot_radius: f64,
}

/// Shape-only second-kick state for one `kcrit`, in `k0` units.
///
/// Construction is eager: the scattered Fourier amplitude is marched
/// onto a grid until it stays below the amplitude threshold, the radial
/// profile is recovered from it by Hankel transform, and the
/// characteristic radii fall out of the cumulative flux during that
/// march. Only the photon sampler is deferred to first use.
///
/// When the scattered fraction `1 - delta` is below the folding
/// threshold the halo is unresolvable and the info degenerates to a
/// pure point component: zero radial table, zero half-light radius and
/// a nominal `step_k` of `pi`.
#[derive(Debug)]
pub struct SecondKickInfo {
    kcrit: f64,
    params: ProfileParams,
    delta: f64,
    kv_table: LookupTable,
    radial_table: LookupTable,
    step_k: f64,
    max_k: f64,
    half_light_radius: f64,
    /// Support of the shooting density; zero in the degenerate regime.
    shoot_radius: f64,
    sampler: OnceCell<OneDimensionalSampler>,
}

impl SecondKickInfo {
    /// Builds the shape state for the given critical frequency.
    ///
    /// # Arguments
    ///
    /// * `kcrit` - positive critical frequency in `k0` units; phase
    ///   power below it has been averaged away
    /// * `params` - accuracy and tabulation parameters
    ///
    /// # Returns
    ///
    /// * `Err(ProfileError::ParameterRange)` - `kcrit` not positive and
    ///   finite
    /// * `Err(ProfileError::Params)` - invalid parameter set
    /// * `Err(ProfileError::Table)` - a tabulation overran its point
    ///   budget or produced an unusable profile
    pub fn new(kcrit: f64, params: ProfileParams) -> Result<Self, ProfileError> {
        params.validate()?;
        if !kcrit.is_finite() || kcrit <= 0.0 {
            return Err(ProfileError::ParameterRange {
                name: "kcrit",
                value: kcrit,
                min: 0.0,
                max: f64::INFINITY,
            });
        }

        let limit_mass = *STRUCTURE_AMPLITUDE * 0.6 * kcrit.powf(-5.0 / 3.0);
        let delta = (-0.5 * limit_mass).exp();

        let fourier = Self::build_fourier_table(kcrit, delta, &params)?;

        let scattered = 1.0 - delta;
        if scattered <= params.folding_threshold {
            let radial_table = LookupTable::from_points(
                &[0.0, 0.5, 1.0],
                &[0.0, 0.0, 0.0],
                Interpolation::Linear,
            )?;
            return Ok(Self {
                kcrit,
                params,
                delta,
                kv_table: fourier.table,
                radial_table,
                step_k: PI,
                max_k: fourier.max_k,
                half_light_radius: 0.0,
                shoot_radius: 0.0,
                sampler: OnceCell::new(),
            });
        }

        let radial = Self::build_radial_table(&fourier, delta, &params)?;
        Ok(Self {
            kcrit,
            params,
            delta,
            kv_table: fourier.table,
            radial_table: radial.table,
            step_k: radial.step_k,
            max_k: fourier.max_k,
            half_light_radius: radial.half_light_radius,
            shoot_radius: radial.shoot_radius,
            sampler: OnceCell::new(),
        })
    }

    /// The critical frequency this info was built for, in `k0` units.
    pub fn kcrit(&self) -> f64 {
        self.kcrit
    }

    /// The accuracy parameters this info was built with.
    pub fn params(&self) -> &ProfileParams {
        &self.params
    }

    /// Unscattered flux fraction `exp(-D(inf)/2)`.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Half-light radius of the scattered halo, in `1/k0` units.
    ///
    /// Zero in the degenerate regime.
    pub fn half_light_radius(&self) -> f64 {
        self.half_light_radius
    }

    /// Frequency step for aliasing-safe Fourier sampling, in `k0`
    /// units.
    pub fn step_k(&self) -> f64 {
        self.step_k
    }

    /// Largest frequency with significant scattered amplitude, in `k0`
    /// units.
    pub fn max_k(&self) -> f64 {
        self.max_k
    }

    /// Truncated phase structure function `D(rho)`.
    ///
    /// `rho` is a dimensionless separation in `1/k0` units. Approaches
    /// the Kolmogorov `6.883877 rho^(5/3)` for `rho * kcrit << 1` and
    /// saturates at `-2 ln(delta)` for large separations.
    pub fn structure_function(&self, rho: f64) -> f64 {
        Self::structure_function_impl(self.kcrit, rho)
    }

    /// Tabulated scattered Fourier amplitude at frequency `k`.
    ///
    /// This is the halo component only: unity minus `delta` at `k = 0`,
    /// and zero beyond the tabulated range, where the true amplitude
    /// oscillates below the `maxk_threshold`. Instances add the flat
    /// `delta` component back.
    pub fn fourier_value(&self, k: f64) -> f64 {
        let k = k.abs();
        if k >= self.kv_table.x_max() {
            return 0.0;
        }
        self.kv_table.eval_clamped(k)
    }

    /// Untabulated scattered amplitude `exp(-D(k)/2) - delta`.
    ///
    /// Exact at any frequency; the tabulated [`fourier_value`] is the
    /// gridded form of this.
    ///
    /// [`fourier_value`]: SecondKickInfo::fourier_value
    pub fn fourier_value_exact(&self, k: f64) -> f64 {
        Self::fourier_value_raw(self.kcrit, self.delta, k.abs())
    }

    /// Scattered-halo surface brightness at radius `r`, in `1/k0`
    /// units, from the tabulated radial profile.
    ///
    /// Zero beyond the tabulated extent and everywhere in the
    /// degenerate regime. The unscattered `delta` component is not
    /// included; it lives in the origin-photon path of [`shoot`] and in
    /// the flat floor instances add in Fourier space.
    ///
    /// [`shoot`]: SecondKickInfo::shoot
    pub fn radial_value(&self, r: f64) -> f64 {
        let r = r.abs();
        if r > self.radial_table.x_max() {
            return 0.0;
        }
        self.radial_table.eval_clamped(r)
    }

    /// Scattered-halo surface brightness by direct Hankel transform of
    /// the tabulated Fourier amplitude.
    ///
    /// Reference evaluator for the gridded [`radial_value`]; much
    /// slower, intended for diagnostics.
    ///
    /// [`radial_value`]: SecondKickInfo::radial_value
    pub fn radial_value_exact(&self, r: f64) -> f64 {
        let quad = QuadratureConfig {
            rel_tol: self.params.integration_relerr,
            abs_tol: self.params.integration_abserr,
            ..Default::default()
        };
        hankel_transform(
            |k| self.kv_table.eval_clamped(k),
            r.abs(),
            self.kv_table.x_max(),
            &quad,
        ) / TAU
    }

    /// Draws `n` photons from the unit-flux profile.
    ///
    /// Each photon carries weight `(delta + S) / n`, where `S` is the
    /// sampler's integral over the tabulated halo; a photon lands at
    /// the origin with probability `delta / (delta + S)` and otherwise
    /// draws a halo position. In the degenerate regime every photon
    /// sits at the origin and the weights sum to `delta` exactly.
    pub fn shoot(&self, n: usize, rng: &mut ShotRng) -> Result<PhotonArray, ProfileError> {
        if n == 0 {
            return Ok(PhotonArray::with_capacity(0));
        }
        if self.shoot_radius == 0.0 {
            let mut photons = PhotonArray::with_capacity(n);
            let weight = self.delta / n as f64;
            for _ in 0..n {
                photons.push(0.0, 0.0, weight);
            }
            return Ok(photons);
        }

        let sampler = self.sampler()?;
        let scattered = sampler.total_flux();
        let total = self.delta + scattered;
        let origin_fraction = self.delta / total;
        let weight = total / n as f64;

        let mut photons = PhotonArray::with_capacity(n);
        for _ in 0..n {
            if rng.gen_uniform() < origin_fraction {
                photons.push(0.0, 0.0, weight);
            } else {
                let (x, y) = sampler.draw_position(rng);
                photons.push(x, y, weight);
            }
        }
        Ok(photons)
    }

    fn sampler(&self) -> Result<&OneDimensionalSampler, ProfileError> {
        self.sampler.get_or_try_init(|| {
            let table = self.radial_table.clone();
            let density = move |r: f64| table.eval_clamped(r).max(0.0);
            OneDimensionalSampler::new(Arc::new(density), (0.0, self.shoot_radius), &self.params)
                .map_err(ProfileError::from)
        })
    }

    fn structure_function_impl(kcrit: f64, rho: f64) -> f64 {
        let rho = rho.abs();
        if rho == 0.0 {
            return 0.0;
        }
        *STRUCTURE_AMPLITUDE * rho.powf(5.0 / 3.0) * structure_tail(rho * kcrit)
    }

    fn fourier_value_raw(kcrit: f64, delta: f64, k: f64) -> f64 {
        (-0.5 * Self::structure_function_impl(kcrit, k)).exp() - delta
    }

    /// Marches the scattered amplitude onto a uniform grid.
    ///
    /// The march ends once the amplitude has stayed below the
    /// `maxk_threshold` for [`KV_QUIET_POINTS`] consecutive samples;
    /// `max_k` is the first sample of that run. The grid spacing
    /// follows the fourth-root interpolation-error rule
    /// `table_spacing * (kvalue_accuracy / 10)^(1/4)`.
    fn build_fourier_table(
        kcrit: f64,
        delta: f64,
        params: &ProfileParams,
    ) -> Result<FourierBuild, ProfileError> {
        let dk = params.table_spacing * (params.kvalue_accuracy / 10.0).powf(0.25);
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut quiet_run = 0usize;
        let mut run_start = None;
        let mut bright_k = None;
        let mut i = 0usize;
        let max_k = loop {
            let k = i as f64 * dk;
            let value = Self::fourier_value_raw(kcrit, delta, k);
            xs.push(k);
            ys.push(value);
            if value < params.maxk_threshold && bright_k.is_none() {
                bright_k = Some(k);
            }
            if value.abs() < params.maxk_threshold {
                if run_start.is_none() {
                    run_start = Some(k);
                }
                quiet_run += 1;
                if quiet_run >= KV_QUIET_POINTS {
                    if let Some(start) = run_start {
                        break start;
                    }
                }
            } else {
                run_start = None;
                quiet_run = 0;
            }
            if xs.len() >= KV_TABLE_MAX_POINTS {
                return Err(ProfileError::Table(TableError::InvalidInput(format!(
                    "Fourier table for kcrit = {} still above the amplitude threshold after {} points",
                    kcrit, KV_TABLE_MAX_POINTS
                ))));
            }
            i += 1;
        };
        let table = LookupTable::from_points(&xs, &ys, Interpolation::NaturalSpline)?;
        Ok(FourierBuild {
            table,
            max_k,
            bright_k: bright_k.unwrap_or(dk),
        })
    }

    /// Recovers the radial profile from the Fourier table by Hankel
    /// transform and derives the characteristic radii from the
    /// cumulative flux along the way.
    ///
    /// The radial grid is matched to the bright bandwidth rather than
    /// the full tabulated extent: the oscillating spectral tail beyond
    /// the first threshold crossing carries only sub-threshold
    /// amplitude, so it shapes the fine core but not the halo scales
    /// the grid must resolve. The transform itself still integrates
    /// over the whole table.
    fn build_radial_table(
        fourier: &FourierBuild,
        delta: f64,
        params: &ProfileParams,
    ) -> Result<RadialBuild, ProfileError> {
        let quad = QuadratureConfig {
            rel_tol: params.integration_relerr,
            abs_tol: params.integration_abserr,
            ..Default::default()
        };
        let k_limit = fourier.table.x_max();
        let transform =
            |r: f64| hankel_transform(|k| fourier.table.eval_clamped(k), r, k_limit, &quad) / TAU;

        let x0 = transform(0.0);
        if !(x0 > 0.0) {
            return Err(ProfileError::Table(TableError::InvalidInput(format!(
                "scattered radial profile is non-positive at the origin: {}",
                x0
            ))));
        }

        let dr = params.table_spacing * PI / (10.0 * fourier.bright_k);
        let scattered = 1.0 - delta;
        let half_target = 0.5 * scattered;
        let fold_target = scattered - params.folding_threshold;
        let shoot_target = scattered * (1.0 - params.shoot_accuracy);
        let floor = params.xvalue_accuracy * x0;

        let mut xs = vec![0.0];
        let mut ys = vec![x0];
        let mut cumulative = 0.0;
        let mut half_radius = None;
        let mut fold_radius = None;
        let mut shoot_radius = None;
        let mut i = 1usize;
        loop {
            let r = i as f64 * dr;
            let value = transform(r);
            xs.push(r);
            ys.push(value);
            cumulative += TAU * r * value * dr;
            if half_radius.is_none() && cumulative >= half_target {
                half_radius = Some(r);
            }
            if fold_radius.is_none() && cumulative >= fold_target {
                fold_radius = Some(r);
            }
            if shoot_radius.is_none() && cumulative >= shoot_target {
                shoot_radius = Some(r);
                break;
            }
            if value.abs() < floor && xs.len() >= 4 {
                break;
            }
            if xs.len() >= RADIAL_TABLE_MAX_POINTS {
                return Err(ProfileError::Table(TableError::InvalidInput(format!(
                    "radial table exceeded {} points before covering its flux targets",
                    RADIAL_TABLE_MAX_POINTS
                ))));
            }
            i += 1;
        }

        let last = xs[xs.len() - 1];
        let half_light_radius = half_radius.ok_or_else(|| {
            ProfileError::Table(TableError::InvalidInput(
                "radial march ended before enclosing half of the scattered flux".to_string(),
            ))
        })?;
        // A tail that dips below the brightness floor before reaching
        // the outer targets truncates them at the last tabulated
        // radius.
        let fold = fold_radius.unwrap_or(last);
        let shoot = shoot_radius.unwrap_or(last);
        let step_k = PI / fold.max(params.stepk_minimum_hlr * half_light_radius);
        let table = LookupTable::from_points(&xs, &ys, Interpolation::NaturalSpline)?;
        Ok(RadialBuild {
            table,
            half_light_radius,
            step_k,
            shoot_radius: shoot,
        })
    }
}

/// A sized, fluxed second-kick profile.
///
/// Couples the shared [`SecondKickInfo`] for its `kcrit` with the
/// physical `lambda / r0` ratio fixing the scale `k0 = 2 pi r0 /
/// lambda` and with the object's flux. In Fourier space the instance
/// restores the flat `delta` component the tabulated info omits.
#[derive(Debug, Clone)]
pub struct SecondKickProfile {
    info: Arc<SecondKickInfo>,
    lam_over_r0: f64,
    /// Physical frequency scale `2 pi / (lambda / r0)`.
    k0: f64,
    flux: f64,
    /// Surface-brightness prefactor `flux * k0^2`.
    xnorm: f64,
}

impl SecondKickProfile {
    /// Creates a profile for seeing ratio `lam_over_r0` and critical
    /// frequency `kcrit`.
    ///
    /// # Arguments
    ///
    /// * `lam_over_r0` - positive wavelength over Fried parameter, in
    ///   the caller's angular units
    /// * `kcrit` - positive critical frequency in `k0` units
    /// * `flux` - total flux, any finite value
    /// * `params` - accuracy parameters, also the cache key
    pub fn new(
        lam_over_r0: f64,
        kcrit: f64,
        flux: f64,
        params: &ProfileParams,
    ) -> Result<Self, ProfileError> {
        if !lam_over_r0.is_finite() || lam_over_r0 <= 0.0 {
            return Err(ProfileError::ParameterRange {
                name: "lam_over_r0",
                value: lam_over_r0,
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

        let info = second_kick_info(kcrit, params)?;
        let k0 = TAU / lam_over_r0;
        let xnorm = flux * k0 * k0;

        Ok(Self {
            info,
            lam_over_r0,
            k0,
            flux,
            xnorm,
        })
    }

    /// The shared shape state backing this instance.
    pub fn info(&self) -> &Arc<SecondKickInfo> {
        &self.info
    }

    /// The seeing ratio `lambda / r0`.
    pub fn lam_over_r0(&self) -> f64 {
        self.lam_over_r0
    }

    /// The critical frequency in `k0` units.
    pub fn kcrit(&self) -> f64 {
        self.info.kcrit()
    }

    /// Unscattered flux fraction.
    pub fn delta(&self) -> f64 {
        self.info.delta()
    }

    /// Total flux.
    pub fn flux(&self) -> f64 {
        self.flux
    }

    /// Half-light radius of the scattered halo, in physical units.
    pub fn half_light_radius(&self) -> f64 {
        self.info.half_light_radius() / self.k0
    }

    /// Scattered-halo surface brightness at physical radius `r`.
    pub fn radial_value(&self, r: f64) -> f64 {
        self.xnorm * self.info.radial_value(r * self.k0)
    }

    /// Fourier amplitude at physical frequency `k`, including the flat
    /// unscattered component.
    ///
    /// Equals `flux` at `k = 0` and approaches `flux * delta` beyond
    /// the tabulated halo.
    pub fn fourier_value(&self, k: f64) -> f64 {
        self.flux * (self.info.fourier_value(k / self.k0) + self.info.delta())
    }

    /// Frequency step for aliasing-safe sampling, in physical units.
    pub fn step_k(&self) -> f64 {
        self.info.step_k() * self.k0
    }

    /// Largest significant halo frequency, in physical units.
    pub fn max_k(&self) -> f64 {
        self.info.max_k() * self.k0
    }

    /// Draws `n` photons carrying this profile's scale and flux.
    pub fn shoot(&self, n: usize, rng: &mut ShotRng) -> Result<PhotonArray, ProfileError> {
        let mut photons = self.info.shoot(n, rng)?;
        photons.scale_positions(self.k0.recip());
        photons.scale_flux(self.flux);
        Ok(photons)
    }
}
