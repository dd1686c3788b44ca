//! Root-finding for characteristic-scale derivation.
//!
//! Profile families invert transcendental relations (enclosed-flux radii,
//! Fourier-amplitude thresholds) that have a single crossing on a known or
//! discoverable bracket. [`BrentSolver`] provides the derivative-free
//! inversion; its bracket-expansion helpers recover when a tightened
//! tolerance pushes the root outside the family's default interval.
//!
//! ## Configuration
//!
//! Solvers use [`SolverConfig`] for:
//! - `tolerance`: Convergence tolerance (default: 1e-10)
//! - `max_iterations`: Maximum iteration count (default: 100)
//!
//! ## Example
//!
//! ```
//! use profile_core::math::solvers::{BrentSolver, SolverConfig};
//!
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x.exp() - 2.0, 0.0, 1.0).unwrap();
//! assert!((root - 2.0_f64.ln()).abs() < 1e-9);
//! ```

mod brent;
mod config;

pub use brent::BrentSolver;
pub use config::SolverConfig;
