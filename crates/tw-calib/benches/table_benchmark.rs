use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tw_calib::{CalibrationEntry, CalibrationSet, CalibrationTable, EntryBounds, EntryKey, Formula};
use tw_core::{Category, OperatingPoint, Variation};

/// `n_pt` pt bins x 4 |eta| bins per category, rational-function values.
fn make_set(n_pt: usize) -> CalibrationSet {
    let mut set = CalibrationSet::new("bench");
    let formula = Formula::compile("0.887973*((1.+(0.0523821*x))/(1.+(0.0460876*x)))").unwrap();
    for category in Category::ALL {
        let measurement_type = if category.is_heavy() { "comb" } else { "incl" };
        for ieta in 0..4 {
            let eta_min = 0.6 * ieta as f64;
            for ipt in 0..n_pt {
                let pt_min = 20.0 + 10.0 * ipt as f64;
                let key = EntryKey {
                    operating_point: OperatingPoint::Medium,
                    measurement_type: measurement_type.into(),
                    sys_type: "central".into(),
                    category,
                };
                let bounds = EntryBounds::new(eta_min, eta_min + 0.6, pt_min, pt_min + 10.0);
                set.push(CalibrationEntry::new(key, bounds, formula.clone()).unwrap());
            }
        }
    }
    set
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibration_table");

    for n_pt in [4usize, 16, 64] {
        let set = make_set(n_pt);
        let table =
            CalibrationTable::build(&set, "Medium", Variation::Central, "comb", "incl").unwrap();
        let pt_hi = 20.0 + 10.0 * n_pt as f64;

        group.bench_with_input(BenchmarkId::new("evaluate", n_pt), &pt_hi, |b, &hi| {
            b.iter(|| {
                let mut acc = 0.0;
                for i in 0..100 {
                    let pt = 20.0 + (hi - 20.0) * (i as f64 + 0.5) / 100.0;
                    acc += table.evaluate(Category::B, -1.3, pt).unwrap();
                }
                black_box(acc)
            })
        });

        group.bench_with_input(BenchmarkId::new("valid_pt_range", n_pt), &n_pt, |b, _| {
            b.iter(|| black_box(table.valid_pt_range(Category::Udsg, black_box(2.0)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
