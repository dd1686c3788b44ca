//! Tabulated one-dimensional functions with selectable interpolation.
//!
//! Profile descriptors precompute expensive radial and Fourier curves once
//! and then answer point queries from a [`LookupTable`]. Two policies are
//! supported: piecewise [`Interpolation::Linear`] for curves queried through
//! a bounds-checked path, and [`Interpolation::NaturalSpline`] (natural
//! cubic, zero second derivative at the boundaries) where C2 smoothness
//! matters, such as integrands that feed further quadrature.

use crate::types::TableError;

/// Interpolation policy for a [`LookupTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Piecewise linear between adjacent knots. Requires 2+ points.
    Linear,
    /// Natural cubic spline with C2 continuity. Requires 3+ points.
    NaturalSpline,
}

impl Interpolation {
    /// Minimum number of knots the policy can work with.
    fn min_points(self) -> usize {
        match self {
            Interpolation::Linear => 2,
            Interpolation::NaturalSpline => 3,
        }
    }
}

/// Polynomial coefficients for one spline segment:
/// `y = a + b*dx + c*dx^2 + d*dx^3` with `dx = x - xs[i]`.
#[derive(Debug, Clone, Copy)]
struct SegmentCoeffs {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

/// An immutable table of `(x, y)` knots with interpolated lookup.
///
/// Knots are sorted by `x` during construction and must be strictly
/// increasing afterwards; a duplicate abscissa is rejected rather than
/// silently collapsed, since the tables built here come from generated
/// grids where a duplicate indicates an upstream bug.
///
/// # Example
///
/// ```
/// use profile_core::math::table::{Interpolation, LookupTable};
///
/// let table = LookupTable::from_points(
///     &[0.0, 1.0, 2.0],
///     &[0.0, 1.0, 4.0],
///     Interpolation::Linear,
/// ).unwrap();
///
/// assert_eq!(table.domain(), (0.0, 2.0));
/// assert!((table.eval(1.5).unwrap() - 2.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LookupTable {
    /// Sorted abscissae
    xs: Vec<f64>,
    /// Ordinates in `xs` order
    ys: Vec<f64>,
    interpolation: Interpolation,
    /// Per-segment cubic coefficients; empty under the linear policy
    coeffs: Vec<SegmentCoeffs>,
}

impl LookupTable {
    /// Build a table from knot arrays.
    ///
    /// # Arguments
    ///
    /// * `xs` - Abscissae (sorted internally if needed)
    /// * `ys` - Ordinates, same length as `xs`
    /// * `interpolation` - Lookup policy
    ///
    /// # Returns
    ///
    /// * `Err(TableError::InvalidInput)` - Mismatched array lengths
    /// * `Err(TableError::InsufficientData)` - Fewer points than the policy needs
    /// * `Err(TableError::NonMonotonic)` - Duplicate or non-finite abscissa
    pub fn from_points(
        xs: &[f64],
        ys: &[f64],
        interpolation: Interpolation,
    ) -> Result<Self, TableError> {
        if xs.len() != ys.len() {
            return Err(TableError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }

        let need = interpolation.min_points();
        if xs.len() < need {
            return Err(TableError::InsufficientData {
                got: xs.len(),
                need,
            });
        }

        let mut pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let (sorted_xs, sorted_ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

        // Strict monotonicity; the negated comparison also traps NaN
        for i in 0..sorted_xs.len() - 1 {
            if !(sorted_xs[i] < sorted_xs[i + 1]) {
                return Err(TableError::NonMonotonic { index: i + 1 });
            }
        }

        let coeffs = match interpolation {
            Interpolation::Linear => Vec::new(),
            Interpolation::NaturalSpline => Self::spline_coefficients(&sorted_xs, &sorted_ys),
        };

        Ok(Self {
            xs: sorted_xs,
            ys: sorted_ys,
            interpolation,
            coeffs,
        })
    }

    /// Sample `f` on a uniform grid of `n` points over `[x_min, x_max]`
    /// and build a table from the result.
    ///
    /// The final grid point is pinned to `x_max` exactly so the domain is
    /// not narrowed by accumulated rounding.
    pub fn tabulate<F>(
        f: F,
        x_min: f64,
        x_max: f64,
        n: usize,
        interpolation: Interpolation,
    ) -> Result<Self, TableError>
    where
        F: Fn(f64) -> f64,
    {
        if !(x_min < x_max) {
            return Err(TableError::InvalidInput(format!(
                "tabulation range must satisfy x_min < x_max: got [{}, {}]",
                x_min, x_max
            )));
        }
        let need = interpolation.min_points();
        if n < need {
            return Err(TableError::InsufficientData { got: n, need });
        }

        let dx = (x_max - x_min) / (n - 1) as f64;
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for i in 0..n {
            let x = if i == n - 1 {
                x_max
            } else {
                x_min + dx * i as f64
            };
            xs.push(x);
            ys.push(f(x));
        }

        Self::from_points(&xs, &ys, interpolation)
    }

    /// Natural cubic spline coefficients via the Thomas algorithm.
    ///
    /// Solves the tridiagonal system for the knot second derivatives with
    /// natural boundaries (`M[0] = M[n-1] = 0`), then converts to
    /// per-segment polynomial form.
    fn spline_coefficients(xs: &[f64], ys: &[f64]) -> Vec<SegmentCoeffs> {
        let n = xs.len();
        let h: Vec<f64> = (0..n - 1).map(|i| xs[i + 1] - xs[i]).collect();

        let mut m = vec![0.0_f64; n];

        if n == 3 {
            // Single interior unknown; the system is scalar
            let rhs = 6.0 * ((ys[2] - ys[1]) / h[1] - (ys[1] - ys[0]) / h[0]);
            m[1] = rhs / (2.0 * (h[0] + h[1]));
        } else {
            let interior = n - 2;
            let mut diag = Vec::with_capacity(interior);
            let mut rhs = Vec::with_capacity(interior);
            for i in 1..n - 1 {
                diag.push(2.0 * (h[i - 1] + h[i]));
                rhs.push(6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]));
            }

            // Forward elimination
            let mut c_prime = Vec::with_capacity(interior);
            let mut d_prime = Vec::with_capacity(interior);
            c_prime.push(h[1] / diag[0]);
            d_prime.push(rhs[0] / diag[0]);
            for i in 1..interior {
                let denom = diag[i] - h[i] * c_prime[i - 1];
                if i < interior - 1 {
                    c_prime.push(h[i + 1] / denom);
                }
                d_prime.push((rhs[i] - h[i] * d_prime[i - 1]) / denom);
            }

            // Back substitution; boundary rows stay zero
            m[n - 2] = d_prime[interior - 1];
            for i in (1..interior).rev() {
                m[i] = d_prime[i - 1] - c_prime[i - 1] * m[i + 1];
            }
        }

        (0..n - 1)
            .map(|i| SegmentCoeffs {
                a: ys[i],
                b: (ys[i + 1] - ys[i]) / h[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0,
                c: m[i] / 2.0,
                d: (m[i + 1] - m[i]) / (6.0 * h[i]),
            })
            .collect()
    }

    /// Segment index `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: f64) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        if pos == 0 {
            0
        } else if pos >= self.xs.len() {
            self.xs.len() - 2
        } else {
            pos - 1
        }
    }

    #[inline]
    fn eval_in_domain(&self, x: f64) -> f64 {
        let i = self.find_segment(x);
        match self.interpolation {
            Interpolation::Linear => {
                let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
                self.ys[i] + (self.ys[i + 1] - self.ys[i]) * t
            }
            Interpolation::NaturalSpline => {
                let c = &self.coeffs[i];
                let dx = x - self.xs[i];
                c.a + dx * (c.b + dx * (c.c + dx * c.d))
            }
        }
    }

    /// Interpolate at `x`, rejecting queries outside the knot range.
    ///
    /// # Returns
    ///
    /// * `Ok(y)` - The interpolated value
    /// * `Err(TableError::OutOfBounds)` - `x` outside [`Self::domain`]
    pub fn eval(&self, x: f64) -> Result<f64, TableError> {
        let (min, max) = self.domain();
        if x < min || x > max {
            return Err(TableError::OutOfBounds { x, min, max });
        }
        Ok(self.eval_in_domain(x))
    }

    /// Interpolate at `x` after clamping it into the knot range.
    ///
    /// Queries below the first knot return the first ordinate, queries
    /// beyond the last knot the last ordinate. Infallible, for hot paths
    /// where the caller has already decided how out-of-range arguments
    /// behave.
    #[inline]
    pub fn eval_clamped(&self, x: f64) -> f64 {
        let (min, max) = self.domain();
        self.eval_in_domain(x.clamp(min, max))
    }

    /// The valid interpolation range `(x_min, x_max)`.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// First abscissa.
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.xs[0]
    }

    /// Last abscissa.
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Number of knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// True when the table holds no knots. Never true for a constructed table.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Sorted abscissae.
    #[inline]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Ordinates in abscissa order.
    #[inline]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // Construction
    // ========================================

    #[test]
    fn test_linear_minimum_points() {
        let table = LookupTable::from_points(&[0.0, 1.0], &[0.0, 2.0], Interpolation::Linear);
        assert!(table.is_ok());
        assert_eq!(table.unwrap().len(), 2);
    }

    #[test]
    fn test_spline_requires_three_points() {
        let result =
            LookupTable::from_points(&[0.0, 1.0], &[0.0, 2.0], Interpolation::NaturalSpline);
        match result.unwrap_err() {
            TableError::InsufficientData { got, need } => {
                assert_eq!(got, 2);
                assert_eq!(need, 3);
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result =
            LookupTable::from_points(&[0.0, 1.0, 2.0], &[0.0, 1.0], Interpolation::Linear);
        assert!(matches!(result, Err(TableError::InvalidInput(_))));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let table = LookupTable::from_points(
            &[3.0, 1.0, 2.0, 0.0],
            &[9.0, 1.0, 4.0, 0.0],
            Interpolation::Linear,
        )
        .unwrap();
        assert_eq!(table.xs(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(table.ys(), &[0.0, 1.0, 4.0, 9.0]);
    }

    #[test]
    fn test_duplicate_abscissa_rejected() {
        let result = LookupTable::from_points(
            &[0.0, 1.0, 1.0, 2.0],
            &[0.0, 1.0, 1.5, 4.0],
            Interpolation::Linear,
        );
        match result.unwrap_err() {
            TableError::NonMonotonic { index } => assert_eq!(index, 2),
            other => panic!("Expected NonMonotonic, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_abscissa_rejected() {
        let result = LookupTable::from_points(
            &[0.0, f64::NAN, 2.0],
            &[0.0, 1.0, 4.0],
            Interpolation::Linear,
        );
        assert!(matches!(result, Err(TableError::NonMonotonic { .. })));
    }

    // ========================================
    // Linear lookup
    // ========================================

    #[test]
    fn test_linear_knots_and_midpoints() {
        let table = LookupTable::from_points(
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 2.0, 4.0, 6.0],
            Interpolation::Linear,
        )
        .unwrap();
        assert_relative_eq!(table.eval(1.0).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(table.eval(0.5).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(table.eval(2.5).unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_non_uniform_spacing() {
        let table = LookupTable::from_points(
            &[0.0, 0.1, 1.0, 10.0],
            &[0.0, 1.0, 2.0, 3.0],
            Interpolation::Linear,
        )
        .unwrap();
        assert_relative_eq!(table.eval(0.05).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(table.eval(0.55).unwrap(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds_both_sides() {
        let table =
            LookupTable::from_points(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], Interpolation::Linear)
                .unwrap();

        match table.eval(-0.1).unwrap_err() {
            TableError::OutOfBounds { x, min, max } => {
                assert_relative_eq!(x, -0.1);
                assert_relative_eq!(min, 0.0);
                assert_relative_eq!(max, 2.0);
            }
            other => panic!("Expected OutOfBounds, got {:?}", other),
        }
        assert!(table.eval(2.1).is_err());
        assert!(table.eval(0.0).is_ok());
        assert!(table.eval(2.0).is_ok());
    }

    #[test]
    fn test_eval_clamped_saturates() {
        let table =
            LookupTable::from_points(&[0.0, 1.0, 2.0], &[5.0, 1.0, 4.0], Interpolation::Linear)
                .unwrap();
        assert_relative_eq!(table.eval_clamped(-3.0), 5.0, epsilon = 1e-12);
        assert_relative_eq!(table.eval_clamped(100.0), 4.0, epsilon = 1e-12);
        assert_relative_eq!(table.eval_clamped(0.5), 3.0, epsilon = 1e-12);
    }

    // ========================================
    // Spline lookup
    // ========================================

    #[test]
    fn test_spline_reproduces_collinear_data() {
        // All second derivatives vanish, so the spline is exactly linear
        let table = LookupTable::from_points(
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[1.0, 3.0, 5.0, 7.0, 9.0],
            Interpolation::NaturalSpline,
        )
        .unwrap();
        for &x in &[0.25, 1.7, 3.99] {
            assert_relative_eq!(table.eval(x).unwrap(), 1.0 + 2.0 * x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spline_interpolates_knots_exactly() {
        let xs = [0.0, 0.5, 1.3, 2.0, 3.1];
        let ys = [1.0, -0.2, 0.7, 2.2, -1.0];
        let table = LookupTable::from_points(&xs, &ys, Interpolation::NaturalSpline).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(table.eval(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spline_accuracy_on_sine() {
        // sin has zero curvature at 0 and pi, so the natural boundary is
        // exact and interior error is O(h^4)
        let n = 21;
        let xs: Vec<f64> = (0..n)
            .map(|i| std::f64::consts::PI * i as f64 / (n - 1) as f64)
            .collect();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let table = LookupTable::from_points(&xs, &ys, Interpolation::NaturalSpline).unwrap();

        for i in 0..n - 1 {
            let mid = 0.5 * (xs[i] + xs[i + 1]);
            assert_relative_eq!(table.eval(mid).unwrap(), mid.sin(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_spline_three_point_special_case() {
        let table = LookupTable::from_points(
            &[0.0, 1.0, 2.0],
            &[0.0, 1.0, 0.0],
            Interpolation::NaturalSpline,
        )
        .unwrap();
        // Symmetric data: peak of the spline sits at the centre knot
        assert_relative_eq!(table.eval(1.0).unwrap(), 1.0, epsilon = 1e-12);
        let left = table.eval(0.5).unwrap();
        let right = table.eval(1.5).unwrap();
        assert_relative_eq!(left, right, epsilon = 1e-12);
        assert!(left > 0.5, "spline should bow above the chord, got {}", left);
    }

    // ========================================
    // Tabulation
    // ========================================

    #[test]
    fn test_tabulate_pins_endpoints() {
        let table = LookupTable::tabulate(
            |x| x * x,
            0.0,
            std::f64::consts::PI,
            37,
            Interpolation::NaturalSpline,
        )
        .unwrap();
        let (min, max) = table.domain();
        assert_eq!(min, 0.0);
        assert_eq!(max, std::f64::consts::PI);
        assert_eq!(table.len(), 37);
    }

    #[test]
    fn test_tabulate_sine_roundtrip() {
        let table = LookupTable::tabulate(
            |x: f64| x.sin(),
            0.0,
            std::f64::consts::PI,
            101,
            Interpolation::NaturalSpline,
        )
        .unwrap();
        assert_relative_eq!(table.eval(1.0).unwrap(), 1.0_f64.sin(), epsilon = 1e-7);
        assert_relative_eq!(table.eval(2.5).unwrap(), 2.5_f64.sin(), epsilon = 1e-7);
    }

    #[test]
    fn test_tabulate_rejects_empty_range() {
        let result = LookupTable::tabulate(|x| x, 1.0, 1.0, 10, Interpolation::Linear);
        assert!(matches!(result, Err(TableError::InvalidInput(_))));
    }
}
