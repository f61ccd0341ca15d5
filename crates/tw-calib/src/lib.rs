//! # tw-calib
//!
//! Calibration side of tagweight.
//!
//! - [`Formula`]: compiled single-variable functional forms stored per bin
//! - [`CalibrationEntry`]: one measured row (selection tags + validity region)
//! - [`CalibrationSource`] / [`CalibrationSet`]: row queries, readable from CSV
//! - [`CalibrationTable`]: immutable per-(operating point, variation) lookup
//!
//! ## Example
//!
//! ```no_run
//! use tw_calib::{CalibrationSet, CalibrationTable};
//! use tw_core::{Category, Variation};
//!
//! let set = CalibrationSet::from_csv_path("CSVv2.csv").unwrap();
//! let table = CalibrationTable::build(&set, "Medium", Variation::Central, "comb", "incl").unwrap();
//! let (pt_min, pt_max) = table.valid_pt_range(Category::B, 0.5).unwrap();
//! let sf = table.evaluate(Category::B, 0.5, 0.5 * (pt_min + pt_max)).unwrap();
//! println!("sf = {sf}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod formula;
pub mod source;
pub mod table;

pub use entry::{CalibrationEntry, EntryBounds, EntryKey};
pub use formula::Formula;
pub use source::{CalibrationSet, CalibrationSource, EntryQuery};
pub use table::CalibrationTable;
