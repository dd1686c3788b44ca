//! Interval decomposition of an annular flux integral.

use crate::density::RadialDensity;
use crate::error::SamplerError;
use crate::rng::ShotRng;
use profile_core::math::integrate::{adaptive_simpson, trapezoid, QuadratureConfig};
use std::f64::consts::TAU;

/// Number of equal panels the support is cut into before refinement.
const INITIAL_PANELS: usize = 8;
/// Refinement depth bound per branch.
const MAX_SPLIT_DEPTH: usize = 24;
/// Hard budget on the number of intervals.
const MAX_INTERVALS: usize = 4096;
/// Panels in the crude cross-check estimate.
const TRAPEZOID_PANELS: usize = 2;
/// Candidate budget for one radius draw.
const MAX_REJECTION_TRIES: usize = 64;

/// One leaf of the flux decomposition.
///
/// `cumulative` is the running flux total up to and including this leaf,
/// so a uniform deviate scaled by the total flux selects a leaf by binary
/// search on the `cumulative` values.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Interval {
    /// Lower radius bound
    pub(crate) lower: f64,
    /// Upper radius bound
    pub(crate) upper: f64,
    /// Annular flux `2 pi int r f(r) dr` over the bounds
    pub(crate) flux: f64,
    /// Running flux total including this leaf
    pub(crate) cumulative: f64,
    /// Density bound used for rejection, `max(f(lower), f(upper))`
    pub(crate) max_density: f64,
}

impl Interval {
    /// Draw a radius inside this interval.
    ///
    /// The proposal is uniform over the annulus area, `r = sqrt` of a lerp
    /// in `r^2`, and candidates are rejected against `max_density`. The
    /// first candidate reuses `first_frac`, the already-uniform remainder
    /// of the deviate that selected this interval. If the candidate budget
    /// runs out the last candidate is kept rather than looping without
    /// bound.
    pub(crate) fn sample_radius(
        &self,
        first_frac: f64,
        rng: &mut ShotRng,
        density: &dyn RadialDensity,
    ) -> f64 {
        let r2_lower = self.lower * self.lower;
        let r2_span = self.upper * self.upper - r2_lower;
        let radius_at = |frac: f64| (r2_lower + frac * r2_span).sqrt();

        let mut r = radius_at(first_frac.clamp(0.0, 1.0));
        if self.max_density <= 0.0 {
            return r;
        }
        for _ in 0..MAX_REJECTION_TRIES {
            if rng.gen_uniform() * self.max_density <= density.density(r) {
                break;
            }
            r = radius_at(rng.gen_uniform());
        }
        r
    }
}

/// Decompose `[lower, upper]` into intervals whose annular fluxes are each
/// known to within `flux_tol`.
///
/// Starting from [`INITIAL_PANELS`] equal panels, each interval's flux is
/// evaluated twice, by adaptive Simpson and by a coarse trapezoid rule;
/// disagreement beyond `flux_tol` bisects the interval. Leaves come out in
/// ascending radius order with `cumulative` left at zero for the caller to
/// fill.
pub(crate) fn build_intervals(
    density: &dyn RadialDensity,
    lower: f64,
    upper: f64,
    flux_tol: f64,
    quad: &QuadratureConfig,
) -> Result<Vec<Interval>, SamplerError> {
    let annular = |r: f64| TAU * r * density.density(r);

    // Depth-first, left branch first, so leaves emerge already sorted
    let mut stack: Vec<(f64, f64, usize)> = Vec::with_capacity(INITIAL_PANELS);
    let width = (upper - lower) / INITIAL_PANELS as f64;
    for i in (0..INITIAL_PANELS).rev() {
        let a = lower + width * i as f64;
        let b = if i == INITIAL_PANELS - 1 {
            upper
        } else {
            lower + width * (i + 1) as f64
        };
        stack.push((a, b, 0));
    }

    let mut leaves: Vec<Interval> = Vec::new();
    while let Some((a, b, depth)) = stack.pop() {
        let mass = adaptive_simpson(&annular, a, b, quad);
        let crude = trapezoid(&annular, a, b, TRAPEZOID_PANELS);

        if (crude - mass).abs() <= flux_tol {
            let max_density = density.density(a).max(density.density(b)).max(0.0);
            leaves.push(Interval {
                lower: a,
                upper: b,
                flux: mass.max(0.0),
                cumulative: 0.0,
                max_density,
            });
            continue;
        }

        if depth >= MAX_SPLIT_DEPTH || leaves.len() + stack.len() + 2 > MAX_INTERVALS {
            return Err(SamplerError::SubdivisionLimit {
                max_intervals: MAX_INTERVALS,
            });
        }
        let mid = 0.5 * (a + b);
        stack.push((mid, b, depth + 1));
        stack.push((a, mid, depth + 1));
    }

    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> QuadratureConfig {
        QuadratureConfig::default()
    }

    #[test]
    fn test_leaves_cover_support_contiguously() {
        let density = |r: f64| (-r).exp();
        let leaves = build_intervals(&density, 0.0, 10.0, 1e-5, &quad()).unwrap();

        assert!(leaves.len() >= INITIAL_PANELS);
        assert_eq!(leaves.first().unwrap().lower, 0.0);
        assert_eq!(leaves.last().unwrap().upper, 10.0);
        for pair in leaves.windows(2) {
            // Bisection shares boundary values bit for bit
            assert_eq!(pair[0].upper, pair[1].lower);
        }
    }

    #[test]
    fn test_leaf_fluxes_sum_to_total() {
        let density = |r: f64| (-r).exp();
        let leaves = build_intervals(&density, 0.0, 30.0, 1e-6, &quad()).unwrap();

        let total: f64 = leaves.iter().map(|iv| iv.flux).sum();
        // 2 pi int_0^inf r e^{-r} dr = 2 pi
        assert_relative_eq!(total, TAU, max_relative = 1e-5);
    }

    #[test]
    fn test_flat_density_needs_no_refinement() {
        // Annular integrand is linear in r, so trapezoid and Simpson agree
        let density = |_r: f64| 1.0;
        let leaves = build_intervals(&density, 0.0, 4.0, 1e-8, &quad()).unwrap();
        assert_eq!(leaves.len(), INITIAL_PANELS);
    }

    #[test]
    fn test_refinement_concentrates_where_density_varies() {
        let density = |r: f64| (-r).exp();
        let leaves = build_intervals(&density, 0.0, 16.0, 1e-5, &quad()).unwrap();

        let inner = leaves.iter().filter(|iv| iv.upper <= 2.0).count();
        let outer = leaves.iter().filter(|iv| iv.lower >= 14.0).count();
        assert!(
            inner > outer,
            "expected more intervals near the core: inner = {}, outer = {}",
            inner,
            outer
        );
    }

    #[test]
    fn test_pathological_density_hits_subdivision_limit() {
        // A discontinuous spike keeps the two flux estimates apart at any
        // bisection depth
        let density = |r: f64| if (1.0..1.0 + 1e-12).contains(&r) { 1e12 } else { 1.0 };
        let result = build_intervals(&density, 0.0, 4.0, 1e-12, &quad());
        assert!(matches!(
            result,
            Err(SamplerError::SubdivisionLimit { .. })
        ));
    }

    #[test]
    fn test_sample_radius_stays_in_bounds() {
        let density = |r: f64| (-r).exp();
        let interval = Interval {
            lower: 1.0,
            upper: 2.0,
            flux: 0.5,
            cumulative: 0.5,
            max_density: density.density(1.0),
        };
        let mut rng = ShotRng::from_seed(11);
        for i in 0..2000 {
            let frac = (i % 100) as f64 / 100.0;
            let r = interval.sample_radius(frac, &mut rng, &density);
            assert!((1.0..=2.0).contains(&r), "radius {} out of bounds", r);
        }
    }

    #[test]
    fn test_sample_radius_zero_density_returns_proposal() {
        let density = |_r: f64| 0.0;
        let interval = Interval {
            lower: 0.0,
            upper: 1.0,
            flux: 0.0,
            cumulative: 0.0,
            max_density: 0.0,
        };
        let mut rng = ShotRng::from_seed(3);
        let r = interval.sample_radius(0.25, &mut rng, &density);
        // frac = 0.25 in r^2 maps to r = 0.5
        assert_relative_eq!(r, 0.5, epsilon = 1e-15);
    }
}
