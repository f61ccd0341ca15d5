//! Event input and per-event weights.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tw_engine::{FatJet, Jet, ScaleFactorEngine};

#[derive(Debug, Clone, Deserialize)]
pub struct EventsFile {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub jets: Vec<Jet>,
    #[serde(default)]
    pub fat_jets: Vec<FatJet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventWeight {
    pub index: usize,
    /// Product over small-radius jets.
    pub jet_weight: f64,
    /// Product over the subjets of all large-radius jets.
    pub subjet_weight: f64,
    pub weight: f64,
}

pub fn read_events(path: &Path) -> Result<EventsFile> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: EventsFile =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(path = %path.display(), events = file.events.len(), "events loaded");
    Ok(file)
}

/// Weights of every event at `sigma`, in input order.
pub fn event_weights(engine: &ScaleFactorEngine, events: &[Event], sigma: f64) -> Result<Vec<EventWeight>> {
    events
        .par_iter()
        .enumerate()
        .map(|(index, event)| {
            let jet_weight = engine
                .collection_weight(&event.jets, sigma)
                .with_context(|| format!("event {index}: jet weight"))?;
            let subjet_weight = engine
                .collection_substructure_weight(&event.fat_jets, sigma)
                .with_context(|| format!("event {index}: subjet weight"))?;
            Ok(EventWeight { index, jet_weight, subjet_weight, weight: jet_weight * subjet_weight })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tw_calib::{CalibrationEntry, CalibrationSet, EntryBounds, EntryKey, Formula};
    use tw_core::{Category, OperatingPoint, Variation};
    use tw_engine::WorkingPointConfig;

    fn engine() -> ScaleFactorEngine {
        let mut set = CalibrationSet::new("CSVv2");
        for variation in Variation::ALL {
            for (category, mt, value) in
                [(Category::B, "comb", 0.9), (Category::C, "comb", 0.95), (Category::Udsg, "incl", 1.1)]
            {
                let key = EntryKey {
                    operating_point: OperatingPoint::Medium,
                    measurement_type: mt.into(),
                    sys_type: variation.as_str().into(),
                    category,
                };
                let bounds = EntryBounds::new(0.0, 2.4, 20.0, 1000.0);
                set.push(CalibrationEntry::new(key, bounds, Formula::constant(value)).unwrap());
            }
        }
        let cfg = WorkingPointConfig::new("CSVv2", "Medium", "comb", "incl").unwrap();
        ScaleFactorEngine::new(cfg, &set).unwrap()
    }

    #[test]
    fn test_event_weights_in_order() {
        let events: EventsFile = serde_json::from_str(
            r#"{"events": [
                {"jets": [{"pt": 50, "eta": 0.5, "hadron_flavour": 5, "score": 0.9}]},
                {},
                {"jets": [{"pt": 60, "eta": 1.0, "hadron_flavour": 4, "score": 0.95}],
                 "fat_jets": [{"pt": 400, "eta": 0.2, "subjets": [
                    {"pt": 200, "eta": 0.1, "hadron_flavour": 0, "score": 0.99}
                 ]}]}
            ]}"#,
        )
        .unwrap();

        let w = event_weights(&engine(), &events.events, 0.0).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.iter().map(|e| e.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_relative_eq!(w[0].weight, 0.9, epsilon = 1e-12);
        assert_eq!(w[1].weight, 1.0);
        assert_relative_eq!(w[2].jet_weight, 0.95, epsilon = 1e-12);
        assert_relative_eq!(w[2].subjet_weight, 1.1, epsilon = 1e-12);
        assert_relative_eq!(w[2].weight, 0.95 * 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_error_names_event() {
        let bad = Event { jets: vec![Jet::new(f64::NAN, 0.5, 5, 0.9)], fat_jets: vec![] };
        let err = event_weights(&engine(), &[Event::default(), bad], 0.0).unwrap_err();
        assert!(format!("{err:#}").contains("event 1"));
    }
}
