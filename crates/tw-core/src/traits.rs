//! Core traits for tagweight
//!
//! The engine never depends on a concrete event model or efficiency source:
//! physics objects and simulated efficiencies are supplied through these
//! traits.

use crate::{Category, Result};

/// A physics object that can be tagged.
pub trait TagCandidate {
    /// Transverse momentum (GeV)
    fn pt(&self) -> f64;

    /// Pseudorapidity
    fn eta(&self) -> f64;

    /// Generator-level hadron flavour code
    fn flavour(&self) -> i32;

    /// Tagger discriminant
    fn score(&self) -> f64;

    /// Flavour category derived from [`TagCandidate::flavour`].
    fn category(&self) -> Category {
        Category::from_flavour(self.flavour())
    }
}

/// An object carrying tagged sub-objects (e.g. subjets of a large-radius jet).
pub trait Substructure {
    /// Constituent type
    type Constituent: TagCandidate;

    /// Constituents in storage order.
    fn constituents(&self) -> &[Self::Constituent];
}

/// Simulated tagging efficiency used by the untagged-object weight.
pub trait EfficiencyProvider: Send + Sync {
    /// Efficiency for an object of `category` at (`pt`, `eta`).
    fn efficiency(&self, category: Category, pt: f64, eta: f64) -> Result<f64>;

    /// Provider name for diagnostics.
    fn name(&self) -> &str;
}
