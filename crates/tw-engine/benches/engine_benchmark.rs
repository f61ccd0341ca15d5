use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tw_calib::{CalibrationEntry, CalibrationSet, EntryBounds, EntryKey, Formula};
use tw_core::{Category, OperatingPoint, Variation};
use tw_engine::{Jet, ScaleFactorEngine, WorkingPointConfig};

fn make_engine() -> ScaleFactorEngine {
    let mut set = CalibrationSet::new("CSVv2");
    let central = Formula::compile("0.887973*((1.+(0.0523821*x))/(1.+(0.0460876*x)))").unwrap();
    for variation in Variation::ALL {
        let formula = match variation {
            Variation::Central => central.clone(),
            Variation::Up => Formula::compile("0.9*((1.+(0.0523821*x))/(1.+(0.0460876*x)))").unwrap(),
            Variation::Down => Formula::compile("0.87*((1.+(0.0523821*x))/(1.+(0.0460876*x)))").unwrap(),
        };
        for category in Category::ALL {
            let measurement_type = if category.is_heavy() { "comb" } else { "incl" };
            for ipt in 0..10 {
                let pt_min = 20.0 + 65.0 * ipt as f64;
                let key = EntryKey {
                    operating_point: OperatingPoint::Medium,
                    measurement_type: measurement_type.into(),
                    sys_type: variation.as_str().into(),
                    category,
                };
                let bounds = EntryBounds::new(0.0, 2.4, pt_min, pt_min + 65.0);
                set.push(CalibrationEntry::new(key, bounds, formula.clone()).unwrap());
            }
        }
    }
    let cfg = WorkingPointConfig::new("CSVv2", "Medium", "comb", "incl").unwrap();
    ScaleFactorEngine::new(cfg, &set).unwrap()
}

fn make_jets(n: usize) -> Vec<Jet> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            Jet::new(15.0 + 700.0 * t, -2.6 + 5.2 * t, [5, 4, 0][i % 3], t)
        })
        .collect()
}

fn bench_weights(c: &mut Criterion) {
    let engine = make_engine();
    let mut group = c.benchmark_group("scale_factor_engine");

    for sigma in [0.0, 1.0] {
        group.bench_with_input(BenchmarkId::new("scale_factor", sigma), &sigma, |b, &s| {
            b.iter(|| black_box(engine.scale_factor(Category::B, 0.7, black_box(123.0), s).unwrap()))
        });
    }

    for n in [4usize, 16, 64] {
        let jets = make_jets(n);
        group.bench_with_input(BenchmarkId::new("collection_weight", n), &jets, |b, jets| {
            b.iter(|| black_box(engine.collection_weight(jets, black_box(-0.5)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_weights);
criterion_main!(benches);
