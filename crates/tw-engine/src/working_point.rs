//! Operating configuration: tagger, working point, tag cut and the
//! measurement types used to select calibration rows.

use serde::Serialize;

use tw_core::{Error, OperatingPoint, Result};

/// Published discriminant cuts as `(tagger, [loose, medium, tight])`.
const KNOWN_CUTS: &[(&str, [f64; 3])] = &[
    ("CSVv2", [0.5426, 0.8484, 0.9535]),
    ("DeepCSV", [0.2217, 0.6321, 0.8953]),
    ("DeepJet", [0.0614, 0.3093, 0.7221]),
];

/// Published cut for `tagger` at `operating_point`, if known.
///
/// Reshaping has no single cut.
pub fn default_cut(tagger: &str, operating_point: OperatingPoint) -> Option<f64> {
    let index = match operating_point {
        OperatingPoint::Loose => 0,
        OperatingPoint::Medium => 1,
        OperatingPoint::Tight => 2,
        OperatingPoint::Reshaping => return None,
    };
    KNOWN_CUTS.iter().find(|(name, _)| *name == tagger).map(|(_, cuts)| cuts[index])
}

/// Tag decision: strictly above the cut.
pub fn is_tagged(value: f64, cut: f64) -> bool {
    value > cut
}

/// Immutable operating configuration of one engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingPointConfig {
    tagger: String,
    operating_point: OperatingPoint,
    cut: f64,
    measurement_type_heavy: String,
    measurement_type_light: String,
}

impl WorkingPointConfig {
    /// Configuration using the published cut of a known tagger.
    pub fn new(
        tagger: impl Into<String>,
        working_point: &str,
        measurement_type_heavy: impl Into<String>,
        measurement_type_light: impl Into<String>,
    ) -> Result<Self> {
        let tagger = tagger.into();
        let operating_point: OperatingPoint = working_point.parse()?;
        let cut = default_cut(&tagger, operating_point).ok_or_else(|| {
            Error::Configuration(format!(
                "no default cut for tagger '{tagger}' at working point {operating_point}; \
                 set the cut explicitly"
            ))
        })?;
        Ok(Self {
            tagger,
            operating_point,
            cut,
            measurement_type_heavy: measurement_type_heavy.into(),
            measurement_type_light: measurement_type_light.into(),
        })
    }

    /// Configuration with an explicit tag cut.
    pub fn with_cut(
        tagger: impl Into<String>,
        working_point: &str,
        cut: f64,
        measurement_type_heavy: impl Into<String>,
        measurement_type_light: impl Into<String>,
    ) -> Result<Self> {
        let operating_point: OperatingPoint = working_point.parse()?;
        if !cut.is_finite() {
            return Err(Error::Configuration(format!("tag cut must be finite, got {cut}")));
        }
        Ok(Self {
            tagger: tagger.into(),
            operating_point,
            cut,
            measurement_type_heavy: measurement_type_heavy.into(),
            measurement_type_light: measurement_type_light.into(),
        })
    }

    /// Tagger identifier.
    pub fn tagger(&self) -> &str {
        &self.tagger
    }

    /// Operating point.
    pub fn operating_point(&self) -> OperatingPoint {
        self.operating_point
    }

    /// Discriminant cut used for the tag decision.
    pub fn cut(&self) -> f64 {
        self.cut
    }

    /// Measurement type selecting b and c rows.
    pub fn measurement_type_heavy(&self) -> &str {
        &self.measurement_type_heavy
    }

    /// Measurement type selecting light rows.
    pub fn measurement_type_light(&self) -> &str {
        &self.measurement_type_light
    }

    /// Tag decision for a discriminant value at this working point.
    pub fn is_tagged(&self, score: f64) -> bool {
        is_tagged(score, self.cut)
    }
}
