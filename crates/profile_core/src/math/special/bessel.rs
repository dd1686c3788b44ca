//! Bessel kernels: `K_nu` of real order and `J_0`.
//!
//! `K_nu` follows the standard fractional-order scheme (Temme's series for
//! small argument, Steed's continued fraction CF2 for large, upward
//! recurrence in the order), with the auxiliary Gamma combinations evaluated
//! exactly via `statrs` instead of Chebyshev fits. `J_0` uses the classic
//! rational approximations (Abramowitz & Stegun 9.4.1/9.4.3 lineage),
//! accurate to about 1e-8 absolute, which is ample for the quadratures
//! layered on top of it.

use statrs::function::gamma::gamma;
use std::f64::consts::{FRAC_2_PI, FRAC_PI_4, PI};

/// Series / continued-fraction iteration cap.
const MAXIT: usize = 10_000;
/// Termination threshold for the K_nu expansions.
const EPS: f64 = 1.0e-16;
/// Euler-Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Modified Bessel function of the second kind `K_nu(x)` for real order.
///
/// Valid for `x > 0` and any real `nu` (`K_{-nu} = K_nu`). Underflows
/// gracefully to `0.0` for large `x`; the caller is responsible for keeping
/// `x` strictly positive. `K_nu` diverges at the origin, so radial
/// evaluators special-case `r = 0` before calling this.
///
/// # Arguments
///
/// * `nu` - Order (any finite real value)
/// * `x` - Argument, strictly positive
///
/// # Returns
///
/// The value of `K_nu(x)`.
///
/// # Example
///
/// ```
/// use profile_core::math::special::bessel_k;
///
/// // Half-integer orders have a closed form:
/// // K_{1/2}(x) = sqrt(pi / (2x)) * exp(-x)
/// let x = 1.7_f64;
/// let exact = (std::f64::consts::PI / (2.0 * x)).sqrt() * (-x).exp();
/// assert!((bessel_k(0.5, x) - exact).abs() < 1e-12);
/// ```
pub fn bessel_k(nu: f64, x: f64) -> f64 {
    debug_assert!(x > 0.0, "bessel_k requires x > 0, got {}", x);

    let nu = nu.abs();
    let nl = (nu + 0.5).floor() as usize;
    let mu = nu - nl as f64; // mu in [-0.5, 0.5]

    let (mut k_mu, mut k_mu1) = if x <= 2.0 {
        k_small_arg(mu, x)
    } else {
        k_large_arg(mu, x)
    };

    // Upward recurrence in the order: K_{v+1} = (2v/x) K_v + K_{v-1}
    let two_over_x = 2.0 / x;
    for i in 1..=nl {
        let k_next = (mu + i as f64) * two_over_x * k_mu1 + k_mu;
        k_mu = k_mu1;
        k_mu1 = k_next;
    }

    k_mu
}

/// Temme's series for `K_mu` and `K_{mu+1}`, `|mu| <= 1/2`, `x <= 2`.
fn k_small_arg(mu: f64, x: f64) -> (f64, f64) {
    let x2 = 0.5 * x;
    let pimu = PI * mu;
    let fact = if pimu.abs() < EPS {
        1.0
    } else {
        pimu / pimu.sin()
    };

    let d = -x2.ln();
    let e = mu * d;
    let fact2 = if e.abs() < EPS { 1.0 } else { e.sinh() / e };

    let (gam1, gam2, inv_gamma_plus, inv_gamma_minus) = temme_gammas(mu);

    let mut ff = fact * (gam1 * e.cosh() + gam2 * fact2 * d);
    let mut sum = ff;
    let e_exp = e.exp();
    let mut p = 0.5 * e_exp / inv_gamma_plus;
    let mut q = 0.5 / (e_exp * inv_gamma_minus);
    let mut c = 1.0;
    let x2sq = x2 * x2;
    let mut sum1 = p;

    for i in 1..=MAXIT {
        let fi = i as f64;
        ff = (fi * ff + p + q) / (fi * fi - mu * mu);
        c *= x2sq / fi;
        p /= fi - mu;
        q /= fi + mu;
        sum += c * ff;
        sum1 += c * (p - fi * ff);
        if (c * ff).abs() < sum.abs() * EPS {
            break;
        }
    }

    (sum, sum1 * 2.0 / x)
}

/// Steed's continued fraction CF2 for `K_mu` and `K_{mu+1}`, `x > 2`.
fn k_large_arg(mu: f64, x: f64) -> (f64, f64) {
    let a1 = 0.25 - mu * mu;
    let mut b = 2.0 * (1.0 + x);
    let mut d = 1.0 / b;
    let mut delh = d;
    let mut h = d;
    let mut q1 = 0.0;
    let mut q2 = 1.0;
    let mut a = -a1;
    let mut c = a1;
    let mut q = c;
    let mut s = 1.0 + q * delh;

    for i in 2..=MAXIT {
        let fi = i as f64;
        a -= 2.0 * (fi - 1.0);
        c = -a * c / fi;
        let qnew = (q1 - b * q2) / a;
        q1 = q2;
        q2 = qnew;
        q += c * qnew;
        b += 2.0;
        d = 1.0 / (b + a * d);
        delh = (b * d - 1.0) * delh;
        h += delh;
        let dels = q * delh;
        s += dels;
        if (dels / s).abs() < EPS {
            break;
        }
    }

    let h = a1 * h;
    let k_mu = (PI / (2.0 * x)).sqrt() * (-x).exp() / s;
    let k_mu1 = k_mu * (mu + x + 0.5 - h) / x;

    (k_mu, k_mu1)
}

/// Gamma combinations for Temme's series:
/// `Gamma1 = [1/G(1-mu) - 1/G(1+mu)] / (2 mu)`,
/// `Gamma2 = [1/G(1-mu) + 1/G(1+mu)] / 2`,
/// plus the two reciprocals themselves.
fn temme_gammas(mu: f64) -> (f64, f64, f64, f64) {
    let inv_gamma_plus = 1.0 / gamma(1.0 + mu);
    let inv_gamma_minus = 1.0 / gamma(1.0 - mu);
    let gam1 = if mu.abs() < 1.0e-8 {
        // mu -> 0 limit; direct evaluation cancels catastrophically
        -EULER_GAMMA
    } else {
        (inv_gamma_minus - inv_gamma_plus) / (2.0 * mu)
    };
    let gam2 = 0.5 * (inv_gamma_minus + inv_gamma_plus);
    (gam1, gam2, inv_gamma_plus, inv_gamma_minus)
}

/// Bessel function of the first kind, order zero.
///
/// Rational approximation below `|x| = 8`, asymptotic amplitude/phase form
/// above; absolute accuracy about 1e-8 across the real line.
///
/// # Example
///
/// ```
/// use profile_core::math::special::bessel_j0;
///
/// assert!((bessel_j0(0.0) - 1.0).abs() < 1e-15);
/// // First zero of J_0
/// assert!(bessel_j0(2.404825557695773).abs() < 1e-8);
/// ```
pub fn bessel_j0(x: f64) -> f64 {
    let ax = x.abs();

    if ax < 8.0 {
        let y = x * x;
        let num = 57_568_490_574.0
            + y * (-13_362_590_354.0
                + y * (651_619_640.7
                    + y * (-11_214_424.18 + y * (77_392.330_17 + y * (-184.905_245_6)))));
        let den = 57_568_490_411.0
            + y * (1_029_532_985.0
                + y * (9_494_680.718 + y * (59_272.648_53 + y * (267.853_271_2 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - FRAC_PI_4;
        let p = 1.0
            + y * (-0.109_862_862_7e-2
                + y * (0.273_451_040_7e-4 + y * (-0.207_337_063_9e-5 + y * 0.209_388_721_1e-6)));
        let q = -0.156_249_999_5e-1
            + y * (0.143_048_876_5e-3
                + y * (-0.691_114_765_1e-5 + y * (0.762_109_516_1e-6 + y * (-0.934_935_152e-7))));
        (FRAC_2_PI / ax).sqrt() * (xx.cos() * p - z * xx.sin() * q)
    }
}
