//! # profile_core: Numerical Foundation for Radial Light Profiles
//!
//! ## Layer 1 (Foundation) Role
//!
//! profile_core is the bottom layer of the 3-layer architecture, providing:
//! - Root finding: `BrentSolver`, `SolverConfig` (`math::solvers`)
//! - Special functions: modified Bessel `K_nu`, Bessel `J_0` (`math::special`)
//! - Adaptive quadrature and Hankel transforms (`math::integrate`)
//! - Interpolating lookup tables (`math::table`)
//! - Tolerance bundle: `ProfileParams` (`types::params`)
//! - Error types: `SolverError`, `TableError` (`types::error`)
//!
//! ## Minimal Dependency Principle
//!
//! Layer 1 has no dependencies on other profile_* crates, with minimal
//! external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - statrs: Gamma-family special functions
//! - thiserror: Structured error types
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use profile_core::math::solvers::{BrentSolver, SolverConfig};
//! use profile_core::types::ProfileParams;
//!
//! // Invert a transcendental relation on a bracket
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x * x - 2.0, 1.0, 2.0).unwrap();
//! assert!((root - 2.0_f64.sqrt()).abs() < 1e-9);
//!
//! // Tolerance bundle with library defaults
//! let params = ProfileParams::default();
//! assert_eq!(params.folding_threshold, 5.0e-3);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for `ProfileParams` and error types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        assert_eq!(2 + 2, 4);
    }
}
