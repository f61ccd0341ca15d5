#![no_main]

use libfuzzer_sys::fuzz_target;
use tw_calib::{CalibrationSet, CalibrationTable, Formula};
use tw_core::{Category, Variation};

fuzz_target!(|data: &[u8]| {
    // Formula compiler on its own.
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(f) = Formula::compile(text) {
            let _ = f.eval(42.0);
        }
    }

    let Ok(set) = CalibrationSet::from_csv_reader(data) else {
        return;
    };
    for wp in ["Loose", "Medium", "Tight", "Reshaping"] {
        let Ok(table) = CalibrationTable::build(&set, wp, Variation::Central, "comb", "incl") else {
            continue;
        };
        for category in Category::ALL {
            if let Ok((lo, hi)) = table.valid_pt_range(category, 0.5) {
                let _ = table.evaluate_with_discriminant(category, 0.5, 0.5 * (lo + hi), 0.5);
            }
        }
    }
});
