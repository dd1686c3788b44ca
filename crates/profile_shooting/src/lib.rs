//! # profile_shooting: Photon Sampling for Radial Profiles
//!
//! ## Layer 2 (Sampling) Role
//!
//! profile_shooting turns a one-dimensional radial flux density into
//! stochastic photon positions:
//! - `RadialDensity`: the capability a profile exposes to be sampled
//!   (`density`)
//! - `OneDimensionalSampler`: interval decomposition plus rejection
//!   sampling of radii (`sampler`)
//! - `PhotonArray`: struct-of-arrays photon storage (`photon`)
//! - `ShotRng`: seeded uniform deviate source (`rng`)
//!
//! The sampler is built once per profile descriptor and is immutable
//! afterwards, so a single instance can serve concurrent shooters that each
//! bring their own `ShotRng`.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use profile_core::types::ProfileParams;
//! use profile_shooting::rng::ShotRng;
//! use profile_shooting::sampler::OneDimensionalSampler;
//!
//! // Exponential disc, truncated at 20 scale radii
//! let params = ProfileParams::default();
//! let sampler = OneDimensionalSampler::new(
//!     Arc::new(|r: f64| (-r).exp()),
//!     (0.0, 20.0),
//!     &params,
//! )
//! .unwrap();
//!
//! let mut rng = ShotRng::from_seed(42);
//! let photons = sampler.shoot(1000, &mut rng);
//! assert_eq!(photons.len(), 1000);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod density;
pub mod error;
pub mod photon;
pub mod rng;
pub mod sampler;
