//! Numerical routines backing profile evaluation and sampling.
//!
//! This module provides:
//! - `solvers`: Brent root finding with bracket expansion
//! - `special`: Bessel kernels (`K_nu`, `J_0`) used by the closed-form and
//!   tabulated profile families
//! - `integrate`: adaptive Simpson quadrature and Hankel transforms
//! - `table`: interpolating lookup tables for tabulated evaluators

pub mod integrate;
pub mod solvers;
pub mod special;
pub mod table;
