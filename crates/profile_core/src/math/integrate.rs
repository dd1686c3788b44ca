//! One-dimensional quadrature routines.
//!
//! The profile evaluators lean on two workhorses:
//!
//! - [`adaptive_simpson`]: recursive Simpson refinement with a Richardson
//!   correction term, used for enclosed-flux integrals and interval masses.
//! - [`hankel_transform`]: the zeroth-order Hankel transform
//!   `integral of f(k) * J0(k r) * k dk`, evaluated panel by panel between
//!   consecutive oscillation scales of the Bessel kernel.
//!
//! Both return plain `f64` rather than `Result`: the recursion depth bound
//! guarantees termination, and at the bound the best refined estimate is
//! returned. A pathological integrand (NaN, signed overflow) propagates
//! through the arithmetic and is surfaced by the caller's own validation,
//! which keeps these functions usable inside root-bracketing closures.

use crate::math::special::bessel_j0;
use std::f64::consts::PI;

/// Accuracy targets and recursion bound for adaptive quadrature.
///
/// Refinement of a panel stops once the Simpson difference satisfies
/// `|S_fine - S_coarse| <= 15 * (abs_tol + rel_tol * |S_fine|)`; the factor
/// 15 comes from the O(h^4) error cancellation in the Richardson estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureConfig {
    /// Relative accuracy target for each panel.
    pub rel_tol: f64,
    /// Absolute accuracy floor, halved at each subdivision.
    pub abs_tol: f64,
    /// Maximum recursion depth before the refined estimate is accepted as-is.
    pub max_depth: usize,
}

impl Default for QuadratureConfig {
    /// Tight defaults suitable for building lookup tables:
    /// `rel_tol = 1e-10`, `abs_tol = 1e-14`, `max_depth = 24`.
    fn default() -> Self {
        Self {
            rel_tol: 1e-10,
            abs_tol: 1e-14,
            max_depth: 24,
        }
    }
}

impl QuadratureConfig {
    /// Create a configuration with explicit targets.
    ///
    /// # Panics
    ///
    /// Panics if either tolerance is non-positive or `max_depth` is zero.
    pub fn new(rel_tol: f64, abs_tol: f64, max_depth: usize) -> Self {
        assert!(rel_tol > 0.0, "rel_tol must be positive");
        assert!(abs_tol > 0.0, "abs_tol must be positive");
        assert!(max_depth > 0, "max_depth must be > 0");
        Self {
            rel_tol,
            abs_tol,
            max_depth,
        }
    }
}

/// Integrate `f` over `[a, b]` by adaptive Simpson refinement.
///
/// The interval is bisected until each panel meets the accuracy targets in
/// `config`, and the accepted value includes the `delta / 15` Richardson
/// correction, so the effective order is that of Boole's rule on smooth
/// integrands. Exact (up to rounding) for polynomials of degree three or
/// less without any subdivision.
///
/// # Arguments
///
/// * `f` - Integrand
/// * `a` - Lower limit
/// * `b` - Upper limit (may be below `a`; the result is then negated)
/// * `config` - Accuracy targets and recursion bound
///
/// # Example
///
/// ```
/// use profile_core::math::integrate::{adaptive_simpson, QuadratureConfig};
///
/// let cfg = QuadratureConfig::default();
/// let s = adaptive_simpson(|x: f64| x.sin(), 0.0, std::f64::consts::PI, &cfg);
/// assert!((s - 2.0).abs() < 1e-12);
/// ```
pub fn adaptive_simpson<F>(f: F, a: f64, b: f64, config: &QuadratureConfig) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }
    let m = 0.5 * (a + b);
    let fa = f(a);
    let fb = f(b);
    let fm = f(m);
    let whole = simpson_panel(a, b, fa, fm, fb);
    refine(
        &f,
        a,
        fa,
        m,
        fm,
        b,
        fb,
        whole,
        config.abs_tol,
        config.rel_tol,
        config.max_depth,
    )
}

/// Simpson's rule over one panel given the three sampled ordinates.
#[inline]
fn simpson_panel(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn refine<F>(
    f: &F,
    a: f64,
    fa: f64,
    m: f64,
    fm: f64,
    b: f64,
    fb: f64,
    whole: f64,
    abs_tol: f64,
    rel_tol: f64,
    depth: usize,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson_panel(a, m, fa, flm, fm);
    let right = simpson_panel(m, b, fm, frm, fb);
    let refined = left + right;
    let delta = refined - whole;

    if depth == 0 || delta.abs() <= 15.0 * (abs_tol + rel_tol * refined.abs()) {
        return refined + delta / 15.0;
    }

    let half_abs = 0.5 * abs_tol;
    refine(f, a, fa, lm, flm, m, fm, left, half_abs, rel_tol, depth - 1)
        + refine(f, m, fm, rm, frm, b, fb, right, half_abs, rel_tol, depth - 1)
}

/// Composite trapezoid rule over `[a, b]` with `n` uniform panels.
///
/// Deliberately crude: callers use it as the low-order cross-check against
/// [`adaptive_simpson`] when deciding whether a region is smooth enough to
/// sample from directly.
///
/// # Panics
///
/// Panics if `n` is zero.
pub fn trapezoid<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    assert!(n > 0, "trapezoid requires at least one panel");
    let h = (b - a) / n as f64;
    let mut sum = 0.5 * (f(a) + f(b));
    for i in 1..n {
        sum += f(a + h * i as f64);
    }
    sum * h
}

/// Panels below this contribution, twice in a row, terminate the Hankel sum.
const HANKEL_QUIET_PANELS: usize = 2;

/// Zeroth-order Hankel transform `integral_0^k_max f(k) * J0(k r) * k dk`.
///
/// For `r > 0` the domain is split into panels of width `pi / r`, one per
/// half-oscillation of the Bessel kernel, each integrated adaptively; the
/// alternating panel sums converge quickly and the loop stops early once
/// two consecutive panels contribute below the configured tolerances. For
/// `r = 0` the kernel is identically one and a single adaptive pass is used.
///
/// No `1 / (2 pi)` or other transform normalisation is applied here; the
/// caller owns its convention.
pub fn hankel_transform<F>(f: F, r: f64, k_max: f64, config: &QuadratureConfig) -> f64
where
    F: Fn(f64) -> f64,
{
    debug_assert!(r >= 0.0, "hankel_transform requires r >= 0, got {}", r);
    debug_assert!(k_max > 0.0, "hankel_transform requires k_max > 0");

    if r == 0.0 {
        return adaptive_simpson(|k| f(k) * k, 0.0, k_max, config);
    }

    let integrand = |k: f64| f(k) * bessel_j0(k * r) * k;
    let panel_width = PI / r;
    let mut total = 0.0;
    let mut lower = 0.0;
    let mut quiet = 0;

    while lower < k_max {
        let upper = (lower + panel_width).min(k_max);
        let panel = adaptive_simpson(integrand, lower, upper, config);
        total += panel;
        if panel.abs() <= config.abs_tol + config.rel_tol * total.abs() {
            quiet += 1;
            if quiet >= HANKEL_QUIET_PANELS {
                break;
            }
        } else {
            quiet = 0;
        }
        lower = upper;
    }

    total
}
