//! Plain object model: small-radius jets and large-radius jets with subjets.

use serde::{Deserialize, Serialize};

use tw_core::{Substructure, TagCandidate};

/// A jet with the fields the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    /// Transverse momentum (GeV)
    pub pt: f64,
    /// Pseudorapidity
    pub eta: f64,
    /// Generator-level hadron flavour (5 = b, 4 = c, 15 = tau, else light)
    #[serde(default, alias = "flavour")]
    pub hadron_flavour: i32,
    /// Tagger discriminant
    #[serde(default)]
    pub score: f64,
}

impl Jet {
    /// Create a jet.
    pub fn new(pt: f64, eta: f64, hadron_flavour: i32, score: f64) -> Self {
        Self { pt, eta, hadron_flavour, score }
    }
}

impl TagCandidate for Jet {
    fn pt(&self) -> f64 {
        self.pt
    }

    fn eta(&self) -> f64 {
        self.eta
    }

    fn flavour(&self) -> i32 {
        self.hadron_flavour
    }

    fn score(&self) -> f64 {
        self.score
    }
}

/// A large-radius jet whose subjets are tagged individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatJet {
    /// Transverse momentum (GeV)
    pub pt: f64,
    /// Pseudorapidity
    pub eta: f64,
    /// Generator-level hadron flavour
    #[serde(default, alias = "flavour")]
    pub hadron_flavour: i32,
    /// Tagger discriminant of the large-radius jet itself
    #[serde(default)]
    pub score: f64,
    /// Subjets in storage order
    #[serde(default)]
    pub subjets: Vec<Jet>,
}

impl TagCandidate for FatJet {
    fn pt(&self) -> f64 {
        self.pt
    }

    fn eta(&self) -> f64 {
        self.eta
    }

    fn flavour(&self) -> i32 {
        self.hadron_flavour
    }

    fn score(&self) -> f64 {
        self.score
    }
}

impl Substructure for FatJet {
    type Constituent = Jet;

    fn constituents(&self) -> &[Jet] {
        &self.subjets
    }
}
