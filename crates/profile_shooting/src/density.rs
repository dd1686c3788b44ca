//! The sampling capability a radial profile exposes.

/// A non-negative surface density `f(r)` on a radial support.
///
/// Implementors describe flux per unit area as a function of radius; the
/// sampler integrates `2 pi r f(r)` over annuli to obtain flux masses and
/// rejects candidate radii against pointwise `f(r)` values. Implementations
/// must be safe to call from multiple threads at once, since one sampler
/// instance may serve concurrent shooters.
///
/// Any `Fn(f64) -> f64 + Send + Sync` closure is a density, which keeps
/// tests and adaptors short:
///
/// ```rust
/// use profile_shooting::density::RadialDensity;
///
/// let gaussian = |r: f64| (-0.5 * r * r).exp();
/// assert!((gaussian.density(0.0) - 1.0).abs() < 1e-15);
/// ```
pub trait RadialDensity: Send + Sync {
    /// Evaluate the surface density at radius `r >= 0`.
    fn density(&self, r: f64) -> f64;
}

impl<F> RadialDensity for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    #[inline]
    fn density(&self, r: f64) -> f64 {
        self(r)
    }
}
