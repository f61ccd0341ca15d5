//! Scale-factor evaluation and tag-aware event reweighting.
//!
//! For an object of flavour category `f` at (`pt`, `eta`) the raw scale
//! factor `s` comes from the central calibration table, optionally shifted
//! toward the up or down table by a continuous nuisance parameter `sigma`:
//!
//! ```text
//! s(sigma) = central + |sigma_eff| * (variation - central)
//! ```
//!
//! where `variation` is the up table for `sigma > 0` and the down table for
//! `sigma < 0`. Outside the calibrated pt range the lookup is pinned just
//! inside the edge and `sigma_eff = 2 * sigma`.
//!
//! The per-object weight is `s` for tagged objects and
//! `(1 - s * eff) / (1 - eff)` for untagged ones, with `eff` the simulated
//! tagging efficiency. Collections multiply their per-object weights.

use std::fmt;

use tw_calib::{CalibrationSource, CalibrationTable};
use tw_core::{
    Category, EfficiencyProvider, Error, OperatingPoint, Result, Substructure, TagCandidate,
    Variation,
};

use crate::efficiency::ConstantEfficiency;
use crate::working_point::WorkingPointConfig;

/// Tracker acceptance in |eta|; objects beyond it get a scale factor of 1.
pub const MAX_ABS_ETA: f64 = 2.4;

/// Offset inside the lower pt edge used when pt is below the calibrated range.
pub const PT_MIN_OFFSET: f64 = 1e-5;

/// Offset inside the upper pt edge used when pt is above the calibrated range.
///
/// A calibrated pt span narrower than this offset pins the lookup below
/// `pt_min`, so an above-range pt then fails with [`Error::Lookup`].
pub const PT_MAX_OFFSET: f64 = 0.1;

/// Evaluator over the central/up/down tables of one operating configuration.
///
/// All evaluation is read-only; an engine can be shared across threads.
pub struct ScaleFactorEngine {
    config: WorkingPointConfig,
    central: CalibrationTable,
    up: CalibrationTable,
    down: CalibrationTable,
    efficiency: Box<dyn EfficiencyProvider>,
}

impl fmt::Debug for ScaleFactorEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleFactorEngine")
            .field("config", &self.config)
            .field("central_entries", &self.central.len())
            .field("up_entries", &self.up.len())
            .field("down_entries", &self.down.len())
            .field("efficiency", &self.efficiency.name())
            .finish()
    }
}

impl ScaleFactorEngine {
    /// Build the three tables from `source` for `config`.
    ///
    /// Uses [`ConstantEfficiency::default`] until another provider is set
    /// with [`ScaleFactorEngine::with_efficiency`].
    pub fn new(config: WorkingPointConfig, source: &dyn CalibrationSource) -> Result<Self> {
        if !source.tagger().is_empty() && source.tagger() != config.tagger() {
            log::warn!(
                "calibration source is for tagger '{}' but the configuration names '{}'",
                source.tagger(),
                config.tagger()
            );
        }

        let build = |variation| {
            CalibrationTable::build_for(
                source,
                config.operating_point(),
                variation,
                config.measurement_type_heavy(),
                config.measurement_type_light(),
            )
        };
        let central = build(Variation::Central)?;
        let up = build(Variation::Up)?;
        let down = build(Variation::Down)?;

        Self::from_tables(config, central, up, down)
    }

    /// Assemble an engine from prebuilt tables.
    ///
    /// Each table must carry the matching variation and the configured
    /// operating point.
    pub fn from_tables(
        config: WorkingPointConfig,
        central: CalibrationTable,
        up: CalibrationTable,
        down: CalibrationTable,
    ) -> Result<Self> {
        for (table, expected) in
            [(&central, Variation::Central), (&up, Variation::Up), (&down, Variation::Down)]
        {
            if table.variation() != expected {
                return Err(Error::Configuration(format!(
                    "{expected} slot holds a {} table",
                    table.variation()
                )));
            }
            if table.operating_point() != config.operating_point() {
                return Err(Error::Configuration(format!(
                    "{expected} table is for {} but the configuration is {}",
                    table.operating_point(),
                    config.operating_point()
                )));
            }
        }

        Ok(Self { config, central, up, down, efficiency: Box::new(ConstantEfficiency::default()) })
    }

    /// Replace the simulated-efficiency provider.
    pub fn with_efficiency<P: EfficiencyProvider + 'static>(mut self, provider: P) -> Self {
        self.efficiency = Box::new(provider);
        self
    }

    /// Operating configuration.
    pub fn config(&self) -> &WorkingPointConfig {
        &self.config
    }

    /// Table of one variation.
    pub fn table(&self, variation: Variation) -> &CalibrationTable {
        match variation {
            Variation::Central => &self.central,
            Variation::Up => &self.up,
            Variation::Down => &self.down,
        }
    }

    /// Simulated-efficiency provider in use.
    pub fn efficiency_provider(&self) -> &dyn EfficiencyProvider {
        self.efficiency.as_ref()
    }

    /// Flavour category of a hadron flavour code.
    pub fn classify(flavour: i32) -> Category {
        Category::from_flavour(flavour)
    }

    /// Tag decision for a discriminant value.
    pub fn is_tagged(&self, score: f64) -> bool {
        self.config.is_tagged(score)
    }

    /// Tag decision for an object.
    pub fn is_tagged_object<T: TagCandidate + ?Sized>(&self, object: &T) -> bool {
        self.is_tagged(object.score())
    }

    /// Raw scale factor at (`eta`, `pt`) shifted by `sigma`.
    ///
    /// A reshaping calibration is evaluated at discriminant 0 (its lowest
    /// bin); use [`ScaleFactorEngine::scale_factor_with_discriminant`] or
    /// [`ScaleFactorEngine::object_weight`] to pass the score.
    pub fn scale_factor(&self, category: Category, eta: f64, pt: f64, sigma: f64) -> Result<f64> {
        self.scale_factor_with_discriminant(category, eta, pt, 0.0, sigma)
    }

    /// Raw scale factor; `discr` selects the bin of a reshaping calibration
    /// and is ignored otherwise.
    pub fn scale_factor_with_discriminant(
        &self,
        category: Category,
        eta: f64,
        pt: f64,
        discr: f64,
        sigma: f64,
    ) -> Result<f64> {
        for (name, value) in [("eta", eta), ("pt", pt), ("sigma", sigma)] {
            if !value.is_finite() {
                return Err(Error::Evaluation(format!("{name} must be finite, got {value}")));
            }
        }

        if eta.abs() > MAX_ABS_ETA {
            return Ok(1.0);
        }

        let (pt_min, pt_max) = self.central.valid_pt_range(category, eta)?;
        let (eval_pt, out_of_bounds) = if pt < pt_min {
            (pt_min + PT_MIN_OFFSET, true)
        } else if pt > pt_max {
            (pt_max - PT_MAX_OFFSET, true)
        } else {
            (pt, false)
        };
        let sigma_eff = if out_of_bounds { 2.0 * sigma } else { sigma };

        let central = self.central.evaluate_with_discriminant(category, eta, eval_pt, discr)?;
        let sf = if sigma.abs() < f64::EPSILON {
            central
        } else if sigma > 0.0 {
            let up = self.up.evaluate_with_discriminant(category, eta, eval_pt, discr)?;
            shift_toward(central, up, sigma_eff)
        } else {
            let down = self.down.evaluate_with_discriminant(category, eta, eval_pt, discr)?;
            shift_toward(central, down, sigma_eff.abs())
        };

        if sf == 0.0 || !sf.is_finite() {
            return Err(Error::Evaluation(format!(
                "scale factor is {sf} for category {category} at pt={pt}, eta={eta}, sigma={sigma}"
            )));
        }

        if out_of_bounds {
            log::debug!(
                "pt={pt} outside [{pt_min}, {pt_max}] for {category}: evaluated at {eval_pt}, sigma {sigma} -> {sigma_eff}"
            );
        }
        Ok(sf)
    }

    /// Weight of an object of known category and tag decision.
    ///
    /// Like [`ScaleFactorEngine::scale_factor`], reshaping calibrations are
    /// evaluated at discriminant 0.
    pub fn category_weight(
        &self,
        category: Category,
        eta: f64,
        pt: f64,
        tagged: bool,
        sigma: f64,
    ) -> Result<f64> {
        let sf = self.scale_factor(category, eta, pt, sigma)?;
        self.tag_weight(category, eta, pt, tagged, sf)
    }

    /// Weight of an object given its kinematics, flavour code and tag decision.
    ///
    /// Reshaping calibrations are evaluated at discriminant 0.
    pub fn kinematic_weight(
        &self,
        pt: f64,
        eta: f64,
        flavour: i32,
        tagged: bool,
        sigma: f64,
    ) -> Result<f64> {
        self.category_weight(Category::from_flavour(flavour), eta, pt, tagged, sigma)
    }

    /// Weight of an object; category and tag decision are derived from it.
    pub fn object_weight<T: TagCandidate + ?Sized>(&self, object: &T, sigma: f64) -> Result<f64> {
        let category = object.category();
        let (pt, eta, score) = (object.pt(), object.eta(), object.score());
        let tagged = self.is_tagged(score);

        let sf = if self.config.operating_point() == OperatingPoint::Reshaping {
            self.scale_factor_with_discriminant(category, eta, pt, score, sigma)?
        } else {
            self.scale_factor(category, eta, pt, sigma)?
        };
        let weight = self.tag_weight(category, eta, pt, tagged, sf)?;

        log::debug!(
            "flavour {} ({category}) pt={pt} eta={eta} tagged={tagged}: sf={sf} weight={weight}",
            object.flavour()
        );
        Ok(weight)
    }

    /// Product of the constituent weights (1 without constituents).
    pub fn substructure_weight<S: Substructure + ?Sized>(&self, object: &S, sigma: f64) -> Result<f64> {
        self.collection_weight(object.constituents(), sigma)
    }

    /// Product of the object weights (1 for an empty collection).
    pub fn collection_weight<T: TagCandidate>(&self, objects: &[T], sigma: f64) -> Result<f64> {
        objects.iter().try_fold(1.0, |acc, o| Ok(acc * self.object_weight(o, sigma)?))
    }

    /// Product of the substructure weights (1 for an empty collection).
    pub fn collection_substructure_weight<S: Substructure>(
        &self,
        objects: &[S],
        sigma: f64,
    ) -> Result<f64> {
        objects.iter().try_fold(1.0, |acc, o| Ok(acc * self.substructure_weight(o, sigma)?))
    }

    fn tag_weight(&self, category: Category, eta: f64, pt: f64, tagged: bool, sf: f64) -> Result<f64> {
        if tagged {
            return Ok(sf);
        }
        let eff = self.efficiency.efficiency(category, pt, eta)?;
        if !eff.is_finite() || eff >= 1.0 {
            return Err(Error::Configuration(format!(
                "{} efficiency provider returned {eff} for category {category}; \
                 the untagged weight needs eff < 1",
                self.efficiency.name()
            )));
        }
        Ok((1.0 - sf * eff) / (1.0 - eff))
    }
}

/// Move `fraction` of the way from `central` to `variation` (linear beyond 1).
fn shift_toward(central: f64, variation: f64, fraction: f64) -> f64 {
    fraction * (variation - central) + central
}
