//! Core error and configuration types.
//!
//! This module provides:
//! - `error`: Structured error types for root finding and lookup-table operations
//! - `params`: The numerical tolerance bundle shared by every profile family
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level:
//! - [`SolverError`], [`TableError`] from `error`
//! - [`ProfileParams`], [`ProfileParamsBuilder`], [`ParamsError`], [`AngleMethod`] from `params`

pub mod error;
pub mod params;

// Re-export commonly used types at module level
pub use error::{SolverError, TableError};
pub use params::{AngleMethod, ParamsError, ProfileParams, ProfileParamsBuilder};
