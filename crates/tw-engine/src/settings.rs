//! User-facing tool settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use tw_core::Result;

use crate::efficiency::DEFAULT_MC_EFFICIENCY;
use crate::working_point::WorkingPointConfig;

/// Settings of a [`crate::ScaleFactorTool`], deserializable from JSON or YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSettings {
    /// Tagger identifier; selects the default tag cut.
    #[serde(default = "default_tagger")]
    pub tagger: String,

    /// Working point name (`Loose`, `Medium`, `Tight` or `Reshaping`).
    #[serde(default = "default_working_point")]
    pub working_point: String,

    /// Calibration CSV file. Relative paths resolve against `calibration_dir`.
    #[serde(default = "default_calibration_file")]
    pub calibration_file: PathBuf,

    /// Directory holding calibration files.
    #[serde(default)]
    pub calibration_dir: Option<PathBuf>,

    /// Measurement type for b and c rows.
    #[serde(default = "default_measurement_type_heavy")]
    pub measurement_type_heavy: String,

    /// Measurement type for light rows.
    #[serde(default = "default_measurement_type_light")]
    pub measurement_type_light: String,

    /// Explicit tag cut; required for `Reshaping` and unknown taggers.
    #[serde(default)]
    pub cut: Option<f64>,

    /// Constant simulated tagging efficiency for untagged objects.
    #[serde(default = "default_mc_efficiency")]
    pub mc_efficiency: f64,
}

fn default_tagger() -> String {
    "CSVv2".to_string()
}

fn default_working_point() -> String {
    "Loose".to_string()
}

fn default_calibration_file() -> PathBuf {
    PathBuf::from("CSVv2.csv")
}

fn default_measurement_type_heavy() -> String {
    "comb".to_string()
}

fn default_measurement_type_light() -> String {
    "incl".to_string()
}

fn default_mc_efficiency() -> f64 {
    DEFAULT_MC_EFFICIENCY
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tagger: default_tagger(),
            working_point: default_working_point(),
            calibration_file: default_calibration_file(),
            calibration_dir: None,
            measurement_type_heavy: default_measurement_type_heavy(),
            measurement_type_light: default_measurement_type_light(),
            cut: None,
            mc_efficiency: default_mc_efficiency(),
        }
    }
}

impl ToolSettings {
    /// Location of the calibration file.
    pub fn calibration_path(&self) -> PathBuf {
        match &self.calibration_dir {
            Some(dir) if self.calibration_file.is_relative() => dir.join(&self.calibration_file),
            _ => self.calibration_file.clone(),
        }
    }

    /// Operating configuration described by these settings.
    pub fn working_point_config(&self) -> Result<WorkingPointConfig> {
        match self.cut {
            Some(cut) => WorkingPointConfig::with_cut(
                self.tagger.as_str(),
                &self.working_point,
                cut,
                self.measurement_type_heavy.as_str(),
                self.measurement_type_light.as_str(),
            ),
            None => WorkingPointConfig::new(
                self.tagger.as_str(),
                &self.working_point,
                self.measurement_type_heavy.as_str(),
                self.measurement_type_light.as_str(),
            ),
        }
    }
}
