//! # tw-core
//!
//! Shared building blocks for tagweight:
//! - flavour categories, systematic variations and operating points
//! - the [`Error`] taxonomy used by every crate in the workspace
//! - collaborator traits for physics objects and simulated efficiencies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{EfficiencyProvider, Substructure, TagCandidate};
pub use types::{Category, OperatingPoint, Variation};
