//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Attempt budget for geometric bracket expansion.
const MAX_BRACKET_STEPS: usize = 40;

/// Brent's method root finder.
///
/// Combines bisection, secant, and inverse quadratic interpolation for
/// robust root finding without derivatives. This is the inversion engine
/// behind every characteristic-scale derivation: flux-enclosing radii,
/// real-space truncation radii, and any tabulated-threshold crossing with a
/// single sign change on the bracket.
///
/// # Type Parameters
///
/// * `T` - Floating-point type (e.g., `f64`)
///
/// # Algorithm
///
/// Each iteration chooses between:
/// - **Bisection**: guaranteed progress, linear convergence
/// - **Secant step**: superlinear when the function is locally near-linear
/// - **Inverse quadratic interpolation**: fastest when three distinct
///   residuals are available
///
/// falling back to bisection whenever an interpolated step would leave the
/// bracket or underperform it. The bracket never widens, so a valid input
/// bracket guarantees convergence for continuous functions.
///
/// # Example
///
/// ```
/// use profile_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
///
/// // Invert an enclosed-flux-style relation: 1 - e^{-u} = 0.5
/// let f = |u: f64| 1.0 - (-u).exp() - 0.5;
///
/// let root = solver.find_root(f, 0.01, 10.0).unwrap();
/// assert!((root - 2.0_f64.ln()).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    /// Solver configuration
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use profile_core::math::solvers::{BrentSolver, SolverConfig};
    ///
    /// let solver: BrentSolver<f64> = BrentSolver::new(SolverConfig::default());
    /// ```
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// Find a root of `f` in the bracket `[a, b]`.
    ///
    /// Requires that `f(a)` and `f(b)` have opposite signs (or one endpoint
    /// is already a root). The bracket may be given in either order.
    ///
    /// # Arguments
    ///
    /// * `f` - Function to find root of
    /// * `a` - One bracket endpoint
    /// * `b` - The other bracket endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(x)` - Root where `|f(x)| < tolerance` or the bracket has
    ///   collapsed below tolerance
    /// * `Err(SolverError::NoBracket)` - `f(a)` and `f(b)` have the same sign
    /// * `Err(SolverError::MaxIterationsExceeded)` - Iteration budget spent
    ///
    /// # Example
    ///
    /// ```
    /// use profile_core::math::solvers::{BrentSolver, SolverConfig};
    ///
    /// let solver = BrentSolver::new(SolverConfig::default());
    /// let root = solver.find_root(|x: f64| x * x - 2.0, 0.0, 2.0).unwrap();
    /// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
    /// ```
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let mut a = a;
        let mut b = b;
        let mut fa = f(a);
        let mut fb = f(b);

        if fa * fb > T::zero() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        // Keep b the endpoint with the smaller residual
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut e = d;

        let two = T::from(2.0).unwrap();
        let three = T::from(3.0).unwrap();

        for _iteration in 0..self.config.max_iterations {
            if fb.abs() < self.config.tolerance {
                return Ok(b);
            }

            let tol = self.config.tolerance;
            let m = (c - b) / two;

            if m.abs() <= tol {
                return Ok(b);
            }

            // Interpolated step, accepted only if it beats bisection and
            // stays comfortably inside the bracket
            let use_bisection;

            if fa != fc && fb != fc {
                // Inverse quadratic interpolation
                let r = fb / fc;
                let s = fb / fa;
                let t = fa / fc;

                let p = s * (t * (r - t) * (c - b) - (T::one() - r) * (b - a));
                let q = (t - T::one()) * (r - T::one()) * (s - T::one());

                if p.abs() < (three * m * q).abs() / two && p.abs() < (e * q).abs() / two {
                    e = d;
                    d = p / q;
                    use_bisection = false;
                } else {
                    use_bisection = true;
                }
            } else if fb != fa {
                // Secant step
                let s = fb / fa;
                let p = two * m * s;
                let q = T::one() - s;

                if p.abs() < (three * m * q).abs() / two && p.abs() < (e * q).abs() / two {
                    e = d;
                    d = p / q;
                    use_bisection = false;
                } else {
                    use_bisection = true;
                }
            } else {
                use_bisection = true;
            }

            if use_bisection {
                d = m;
                e = m;
            }

            a = b;
            fa = fb;

            if d.abs() > tol {
                b = b + d;
            } else {
                // Minimum step toward the far endpoint
                b = b + if m > T::zero() { tol } else { -tol };
            }

            fb = f(b);

            // Re-establish the bracket if b and c have drifted to one side
            if (fb > T::zero() && fc > T::zero()) || (fb < T::zero() && fc < T::zero()) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }

            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Grow the upper endpoint geometrically until `[a, b]` brackets a root.
    ///
    /// Used when a family's default bracket proves too short, e.g. a
    /// tightened folding threshold pushing the flux radius past the
    /// empirically safe interval. The lower endpoint slides up behind the
    /// probe so the returned bracket stays tight.
    ///
    /// # Arguments
    ///
    /// * `f` - Function whose sign change is sought
    /// * `a` - Lower endpoint (assumed on the near side of the root)
    /// * `b` - Initial upper endpoint
    ///
    /// # Returns
    ///
    /// * `Ok((lo, hi))` - A sign-changing bracket, possibly the input one
    /// * `Err(SolverError::NoBracket)` - No sign change within the expansion
    ///   budget; the error reports the full searched interval
    pub fn bracket_upper<F>(&self, f: &F, a: T, b: T) -> Result<(T, T), SolverError>
    where
        F: Fn(T) -> T,
    {
        let origin = a;
        let mut a = a;
        let mut b = b;
        let mut fa = f(a);
        let mut fb = f(b);

        if fa * fb <= T::zero() {
            return Ok((a, b));
        }

        let two = T::from(2.0).unwrap();
        let mut step = b - a;

        for _ in 0..MAX_BRACKET_STEPS {
            a = b;
            fa = fb;
            step = step * two;
            b = b + step;
            if !b.is_finite() {
                break;
            }
            fb = f(b);
            if fa * fb <= T::zero() {
                return Ok((a, b));
            }
        }

        Err(SolverError::NoBracket {
            a: origin.to_f64().unwrap_or(f64::NAN),
            b: b.to_f64().unwrap_or(f64::NAN),
        })
    }

    /// Shrink the lower endpoint geometrically toward `limit` until `[a, b]`
    /// brackets a root.
    ///
    /// The counterpart of [`bracket_upper`](Self::bracket_upper) for roots
    /// that sit below the default interval, e.g. the inner flux radius of a
    /// steep profile. Each attempt halves the gap between `a` and `limit`
    /// (typically zero for radius domains), sliding the upper endpoint down
    /// behind it.
    ///
    /// # Returns
    ///
    /// * `Ok((lo, hi))` - A sign-changing bracket, possibly the input one
    /// * `Err(SolverError::NoBracket)` - No sign change within the expansion
    ///   budget
    pub fn bracket_lower<F>(&self, f: &F, a: T, b: T, limit: T) -> Result<(T, T), SolverError>
    where
        F: Fn(T) -> T,
    {
        let origin = b;
        let mut a = a;
        let mut b = b;
        let mut fa = f(a);
        let mut fb = f(b);

        if fa * fb <= T::zero() {
            return Ok((a, b));
        }

        let two = T::from(2.0).unwrap();

        for _ in 0..MAX_BRACKET_STEPS {
            b = a;
            fb = fa;
            a = limit + (a - limit) / two;
            fa = f(a);
            if fa * fb <= T::zero() {
                return Ok((a, b));
            }
        }

        Err(SolverError::NoBracket {
            a: a.to_f64().unwrap_or(f64::NAN),
            b: origin.to_f64().unwrap_or(f64::NAN),
        })
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }
}
