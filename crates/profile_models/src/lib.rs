//! # profile_models
//!
//! Concrete radially symmetric light-profile families built on the
//! numerical kernels of `profile_core` and the photon-sampling engine of
//! `profile_shooting` (Layer 3).
//!
//! Two families are provided:
//!
//! - [`profiles::spergel`]: the analytic Spergel surface-brightness
//!   family, a bridge between exponential and de Vaucouleurs shapes with
//!   a closed-form Fourier transform.
//! - [`profiles::second_kick`]: the tabulated atmospheric "second kick",
//!   the residual high-frequency PSF component left after a finite
//!   exposure has averaged the low-frequency turbulence away.
//!
//! Both families split their state into a shape-only precomputation
//! (`SpergelInfo`, `SecondKickInfo`) shared through a keyed cache, and a
//! lightweight instance (`SpergelProfile`, `SecondKickProfile`) carrying
//! radius, flux and wavelength scalings.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod cache;
pub mod error;
pub mod profiles;
