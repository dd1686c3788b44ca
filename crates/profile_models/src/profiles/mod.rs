//! Concrete light-profile families.
//!
//! Each family follows the same split: a shape-only precomputation
//! built once per distinct shape key and shared through the cache in
//! [`crate::cache`], and a cheap instance type layering radius, flux
//! and wavelength scalings on top of the shared state.

pub mod second_kick;
pub mod spergel;

pub use second_kick::{second_kick_info, SecondKickInfo, SecondKickProfile};
pub use spergel::{spergel_info, RadiusKind, SpergelInfo, SpergelProfile};
