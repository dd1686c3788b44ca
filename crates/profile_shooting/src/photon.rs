//! Struct-of-arrays photon storage.

/// A batch of photon positions with per-photon flux weights.
///
/// Positions are stored as parallel `x` / `y` vectors rather than an array
/// of structs, so consumers that accumulate photons onto a grid can stream
/// each coordinate contiguously. Fluxes are signed: interference-capable
/// profiles may emit negative-weight photons, and `total_flux` reports the
/// signed sum.
///
/// # Examples
///
/// ```rust
/// use profile_shooting::photon::PhotonArray;
///
/// let mut photons = PhotonArray::with_capacity(2);
/// photons.push(1.0, 0.0, 0.5);
/// photons.push(0.0, -1.0, 0.5);
///
/// assert_eq!(photons.len(), 2);
/// assert!((photons.total_flux() - 1.0).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhotonArray {
    x: Vec<f64>,
    y: Vec<f64>,
    flux: Vec<f64>,
}

impl PhotonArray {
    /// Creates an empty array with room for `n` photons.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            flux: Vec::with_capacity(n),
        }
    }

    /// Appends one photon.
    #[inline]
    pub fn push(&mut self, x: f64, y: f64, flux: f64) {
        self.x.push(x);
        self.y.push(y);
        self.flux.push(flux);
    }

    /// Number of photons.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when the array holds no photons.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Photon x coordinates.
    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Photon y coordinates.
    #[inline]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Photon flux weights.
    #[inline]
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Signed sum of the flux weights.
    pub fn total_flux(&self) -> f64 {
        self.flux.iter().sum()
    }

    /// Multiplies every flux weight by `factor`.
    ///
    /// Used when assigning a profile's physical flux to photons drawn from
    /// a unit-flux density.
    pub fn scale_flux(&mut self, factor: f64) {
        for f in &mut self.flux {
            *f *= factor;
        }
    }

    /// Multiplies every position by `factor`.
    ///
    /// Converts photons drawn in a profile's dimensionless radial units
    /// into physical coordinates.
    pub fn scale_positions(&mut self, factor: f64) {
        for x in &mut self.x {
            *x *= factor;
        }
        for y in &mut self.y {
            *y *= factor;
        }
    }

    /// Appends all photons of `other`, leaving `other` empty.
    ///
    /// Convolution-style composition accumulates photons from several
    /// component profiles into one batch.
    pub fn append(&mut self, other: &mut PhotonArray) {
        self.x.append(&mut other.x);
        self.y.append(&mut other.y);
        self.flux.append(&mut other.flux);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_array() {
        let photons = PhotonArray::default();
        assert_eq!(photons.len(), 0);
        assert!(photons.is_empty());
        assert_eq!(photons.total_flux(), 0.0);
    }

    #[test]
    fn test_push_and_accessors() {
        let mut photons = PhotonArray::with_capacity(3);
        photons.push(1.0, 2.0, 0.25);
        photons.push(-1.0, 0.5, 0.75);

        assert_eq!(photons.len(), 2);
        assert_eq!(photons.x(), &[1.0, -1.0]);
        assert_eq!(photons.y(), &[2.0, 0.5]);
        assert_eq!(photons.flux(), &[0.25, 0.75]);
    }

    #[test]
    fn test_total_flux_is_signed() {
        let mut photons = PhotonArray::default();
        photons.push(0.0, 0.0, 1.5);
        photons.push(0.0, 0.0, -0.5);
        assert_relative_eq!(photons.total_flux(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_scale_flux() {
        let mut photons = PhotonArray::default();
        photons.push(0.0, 0.0, 0.5);
        photons.push(0.0, 0.0, 0.25);
        photons.scale_flux(4.0);
        assert_eq!(photons.flux(), &[2.0, 1.0]);
    }

    #[test]
    fn test_scale_positions_leaves_flux_alone() {
        let mut photons = PhotonArray::default();
        photons.push(1.0, -2.0, 0.5);
        photons.scale_positions(3.0);
        assert_eq!(photons.x(), &[3.0]);
        assert_eq!(photons.y(), &[-6.0]);
        assert_eq!(photons.flux(), &[0.5]);
    }

    #[test]
    fn test_append_moves_photons() {
        let mut a = PhotonArray::default();
        a.push(1.0, 1.0, 0.5);
        let mut b = PhotonArray::default();
        b.push(2.0, 2.0, 0.5);
        b.push(3.0, 3.0, 0.5);

        a.append(&mut b);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
        assert_eq!(a.x(), &[1.0, 2.0, 3.0]);
    }
}
