//! # tw-engine
//!
//! Scale-factor evaluation and event reweighting for tagged physics objects.
//!
//! A [`ScaleFactorEngine`] owns the central, up and down calibration tables of
//! one [`WorkingPointConfig`] and turns object kinematics into per-object and
//! per-collection weights. [`ScaleFactorTool`] wraps it in a configure-once
//! lifecycle driven by [`ToolSettings`].
//!
//! ```no_run
//! use tw_engine::{Jet, ScaleFactorTool, ToolSettings};
//!
//! let settings = ToolSettings { working_point: "Medium".into(), ..ToolSettings::default() };
//! let mut tool = ScaleFactorTool::new("BTagSF");
//! tool.configure_from_settings(&settings).unwrap();
//!
//! let jets = [Jet::new(55.0, 0.4, 5, 0.91), Jet::new(32.0, -1.7, 0, 0.12)];
//! let nominal = tool.collection_weight(&jets, 0.0).unwrap();
//! let up = tool.collection_weight(&jets, 1.0).unwrap();
//! println!("weight {nominal} (+1 sigma: {up})");
//! ```

#![warn(clippy::all)]

pub mod efficiency;
pub mod engine;
pub mod object;
pub mod settings;
pub mod tool;
pub mod working_point;

pub use efficiency::{BinnedEfficiency, ConstantEfficiency, DEFAULT_MC_EFFICIENCY, EfficiencyMap};
pub use engine::{MAX_ABS_ETA, PT_MAX_OFFSET, PT_MIN_OFFSET, ScaleFactorEngine};
pub use object::{FatJet, Jet};
pub use settings::ToolSettings;
pub use tool::ScaleFactorTool;
pub use working_point::{WorkingPointConfig, default_cut, is_tagged};
