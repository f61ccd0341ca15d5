//! Simulated tagging efficiency providers.
//!
//! The untagged-object weight `(1 - s·eff) / (1 - eff)` needs the simulated
//! efficiency `eff`. It is injected through [`EfficiencyProvider`]; the
//! default is a single constant.

use std::collections::BTreeMap;

use tw_core::{Category, EfficiencyProvider, Error, Result};

/// Default simulated efficiency of [`ConstantEfficiency`].
pub const DEFAULT_MC_EFFICIENCY: f64 = 0.95;

/// Reject efficiencies for which the untagged weight is undefined.
pub(crate) fn check_efficiency(value: f64, context: &str) -> Result<f64> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::Configuration(format!(
            "simulated efficiency {value} ({context}) must lie in [0, 1)"
        )))
    }
}

/// The same efficiency for every object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEfficiency {
    value: f64,
}

impl ConstantEfficiency {
    /// Constant efficiency; must lie in `[0, 1)`.
    pub fn new(value: f64) -> Result<Self> {
        Ok(Self { value: check_efficiency(value, "constant")? })
    }

    /// The configured value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for ConstantEfficiency {
    fn default() -> Self {
        Self { value: DEFAULT_MC_EFFICIENCY }
    }
}

impl EfficiencyProvider for ConstantEfficiency {
    fn efficiency(&self, _category: Category, _pt: f64, _eta: f64) -> Result<f64> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Efficiency binned in pt and |eta| for one category.
///
/// Points outside the edges fold into the first/last bin.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyMap {
    pt_edges: Vec<f64>,
    abs_eta_edges: Vec<f64>,
    /// Row-major `[pt_bin][eta_bin]`.
    values: Vec<f64>,
}

impl EfficiencyMap {
    /// Create a map; `values` is row-major over `(pt bin, |eta| bin)`.
    pub fn new(pt_edges: Vec<f64>, abs_eta_edges: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        validate_edges(&pt_edges, "pt")?;
        validate_edges(&abs_eta_edges, "|eta|")?;
        let expected = (pt_edges.len() - 1) * (abs_eta_edges.len() - 1);
        if values.len() != expected {
            return Err(Error::Configuration(format!(
                "efficiency map expects {expected} values, got {}",
                values.len()
            )));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::Configuration(format!("efficiency map holds non-finite value {v}")));
        }
        Ok(Self { pt_edges, abs_eta_edges, values })
    }

    /// Stored value of the (folded) bin containing (`pt`, `eta`).
    pub fn lookup(&self, pt: f64, eta: f64) -> f64 {
        let n_eta = self.abs_eta_edges.len() - 1;
        let ipt = folded_bin(&self.pt_edges, pt);
        let ieta = folded_bin(&self.abs_eta_edges, eta.abs());
        self.values[ipt * n_eta + ieta]
    }
}

fn validate_edges(edges: &[f64], axis: &str) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::Configuration(format!("{axis} axis needs at least two edges")));
    }
    let increasing = edges.windows(2).all(|w| w[0].is_finite() && w[1].is_finite() && w[0] < w[1]);
    if !increasing {
        return Err(Error::Configuration(format!("{axis} edges must be finite and increasing")));
    }
    Ok(())
}

/// Bin index of `x`, folding under/overflow into the edge bins.
fn folded_bin(edges: &[f64], x: f64) -> usize {
    let n_bins = edges.len() - 1;
    if x.is_nan() || x < edges[0] {
        return 0;
    }
    if x >= edges[n_bins] {
        return n_bins - 1;
    }
    edges.partition_point(|&e| e <= x) - 1
}

/// Per-category efficiency maps.
#[derive(Debug, Clone, Default)]
pub struct BinnedEfficiency {
    maps: BTreeMap<Category, EfficiencyMap>,
}

impl BinnedEfficiency {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the map of `category`.
    pub fn with_map(mut self, category: Category, map: EfficiencyMap) -> Self {
        self.maps.insert(category, map);
        self
    }
}

impl EfficiencyProvider for BinnedEfficiency {
    fn efficiency(&self, category: Category, pt: f64, eta: f64) -> Result<f64> {
        let map = self.maps.get(&category).ok_or_else(|| {
            Error::Lookup(format!("no simulated efficiency map for category {category}"))
        })?;
        let context = format!("category {category}, pt={pt}, eta={eta}");
        check_efficiency(map.lookup(pt, eta), &context)
    }

    fn name(&self) -> &str {
        "binned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let c = ConstantEfficiency::default();
        assert_eq!(c.value(), DEFAULT_MC_EFFICIENCY);
        assert_eq!(c.efficiency(Category::B, 10.0, 3.0).unwrap(), 0.95);
        assert_eq!(ConstantEfficiency::new(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn test_constant_rejects_unity() {
        assert!(matches!(ConstantEfficiency::new(1.0), Err(Error::Configuration(_))));
        assert!(ConstantEfficiency::new(1.2).is_err());
        assert!(ConstantEfficiency::new(-0.1).is_err());
        assert!(ConstantEfficiency::new(f64::NAN).is_err());
    }

    fn b_map() -> EfficiencyMap {
        // pt [20,50,100,1000] x |eta| [0,1.2,2.4]
        EfficiencyMap::new(
            vec![20.0, 50.0, 100.0, 1000.0],
            vec![0.0, 1.2, 2.4],
            vec![0.60, 0.55, 0.70, 0.65, 0.75, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_map_lookup_and_folding() {
        let m = b_map();
        assert_eq!(m.lookup(30.0, 0.5), 0.60);
        assert_eq!(m.lookup(30.0, -1.5), 0.55);
        assert_eq!(m.lookup(50.0, 0.0), 0.70);
        // underflow/overflow fold into edge bins
        assert_eq!(m.lookup(5.0, 0.5), 0.60);
        assert_eq!(m.lookup(5000.0, 0.5), 0.75);
        assert_eq!(m.lookup(30.0, 3.0), 0.55);
        assert_eq!(m.lookup(f64::NAN, 0.5), 0.60);
    }

    #[test]
    fn test_map_validation() {
        assert!(EfficiencyMap::new(vec![20.0], vec![0.0, 2.4], vec![]).is_err());
        assert!(EfficiencyMap::new(vec![50.0, 20.0], vec![0.0, 2.4], vec![0.5]).is_err());
        assert!(EfficiencyMap::new(vec![20.0, 50.0], vec![0.0, 2.4], vec![0.5, 0.6]).is_err());
        assert!(EfficiencyMap::new(vec![20.0, 50.0], vec![0.0, 2.4], vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_binned_provider() {
        let p = BinnedEfficiency::new().with_map(Category::B, b_map());
        assert_eq!(p.efficiency(Category::B, 30.0, 0.1).unwrap(), 0.60);
        // a stored 1.0 is a configuration hazard
        assert!(matches!(p.efficiency(Category::B, 500.0, 2.0), Err(Error::Configuration(_))));
        assert!(matches!(p.efficiency(Category::C, 30.0, 0.1), Err(Error::Lookup(_))));
        assert_eq!(p.name(), "binned");
    }
}
