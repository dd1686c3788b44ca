//! Special functions for radial profile evaluation.
//!
//! This module provides the Bessel kernels the profile families are built
//! from:
//! - [`bessel_k`]: modified Bessel function of the second kind, real order
//! - [`bessel_j0`]: Bessel function of the first kind, order zero
//!
//! Gamma-family values come from `statrs` and are consumed directly by the
//! callers; only the kernels without an ecosystem implementation live here.

mod bessel;

pub use bessel::{bessel_j0, bessel_k};
