//! Named tool with a configure-once lifecycle around [`ScaleFactorEngine`].

use tw_calib::{CalibrationSet, CalibrationSource};
use tw_core::{Category, Error, Result, Substructure, TagCandidate};

use crate::efficiency::ConstantEfficiency;
use crate::engine::ScaleFactorEngine;
use crate::settings::ToolSettings;
use crate::working_point::WorkingPointConfig;

/// Holds no engine until configured; every evaluation before that fails
/// with [`Error::Configuration`].
#[derive(Debug)]
pub struct ScaleFactorTool {
    name: String,
    engine: Option<ScaleFactorEngine>,
}

impl ScaleFactorTool {
    /// Unconfigured tool.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), engine: None }
    }

    /// Instance name used in log messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once an engine is installed.
    pub fn is_configured(&self) -> bool {
        self.engine.is_some()
    }

    /// Build the engine from `config` and `source`.
    pub fn configure(&mut self, config: WorkingPointConfig, source: &dyn CalibrationSource) -> Result<()> {
        self.ensure_unconfigured()?;
        let engine = ScaleFactorEngine::new(config, source)?;
        self.install(engine)
    }

    /// Read the calibration file named by `settings` and build the engine.
    pub fn configure_from_settings(&mut self, settings: &ToolSettings) -> Result<()> {
        self.ensure_unconfigured()?;
        let config = settings.working_point_config()?;
        let efficiency = ConstantEfficiency::new(settings.mc_efficiency)?;
        let source = CalibrationSet::from_csv_path(settings.calibration_path())?;
        let engine = ScaleFactorEngine::new(config, &source)?.with_efficiency(efficiency);
        self.install(engine)
    }

    /// Install a prebuilt engine.
    pub fn install(&mut self, engine: ScaleFactorEngine) -> Result<()> {
        self.ensure_unconfigured()?;
        let config = engine.config();
        log::info!("{}: tagger {}", self.name, config.tagger());
        log::info!(
            "{}: working point {} (cut {})",
            self.name,
            config.operating_point(),
            config.cut()
        );
        log::info!(
            "{}: measurement types heavy='{}' light='{}'",
            self.name,
            config.measurement_type_heavy(),
            config.measurement_type_light()
        );
        log::info!("{}: simulated efficiency from '{}'", self.name, engine.efficiency_provider().name());
        self.engine = Some(engine);
        Ok(())
    }

    /// The configured engine.
    pub fn engine(&self) -> Result<&ScaleFactorEngine> {
        self.engine
            .as_ref()
            .ok_or_else(|| Error::Configuration(format!("tool '{}' is not configured", self.name)))
    }

    fn ensure_unconfigured(&self) -> Result<()> {
        if self.engine.is_some() {
            return Err(Error::Configuration(format!("tool '{}' is already configured", self.name)));
        }
        Ok(())
    }

    /// See [`ScaleFactorEngine::scale_factor`].
    pub fn scale_factor(&self, category: Category, eta: f64, pt: f64, sigma: f64) -> Result<f64> {
        self.engine()?.scale_factor(category, eta, pt, sigma)
    }

    /// See [`ScaleFactorEngine::kinematic_weight`].
    pub fn kinematic_weight(
        &self,
        pt: f64,
        eta: f64,
        flavour: i32,
        tagged: bool,
        sigma: f64,
    ) -> Result<f64> {
        self.engine()?.kinematic_weight(pt, eta, flavour, tagged, sigma)
    }

    /// See [`ScaleFactorEngine::object_weight`].
    pub fn object_weight<T: TagCandidate + ?Sized>(&self, object: &T, sigma: f64) -> Result<f64> {
        self.engine()?.object_weight(object, sigma)
    }

    /// See [`ScaleFactorEngine::substructure_weight`].
    pub fn substructure_weight<S: Substructure + ?Sized>(&self, object: &S, sigma: f64) -> Result<f64> {
        self.engine()?.substructure_weight(object, sigma)
    }

    /// See [`ScaleFactorEngine::collection_weight`].
    pub fn collection_weight<T: TagCandidate>(&self, objects: &[T], sigma: f64) -> Result<f64> {
        self.engine()?.collection_weight(objects, sigma)
    }

    /// See [`ScaleFactorEngine::collection_substructure_weight`].
    pub fn collection_substructure_weight<S: Substructure>(
        &self,
        objects: &[S],
        sigma: f64,
    ) -> Result<f64> {
        self.engine()?.collection_substructure_weight(objects, sigma)
    }

    /// Tag decision for a discriminant value.
    pub fn is_tagged(&self, score: f64) -> Result<bool> {
        Ok(self.engine()?.is_tagged(score))
    }

    /// Tag decision for an object.
    pub fn is_tagged_object<T: TagCandidate + ?Sized>(&self, object: &T) -> Result<bool> {
        Ok(self.engine()?.is_tagged_object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Jet;
    use tw_calib::{CalibrationEntry, EntryBounds, EntryKey, Formula};
    use tw_core::{OperatingPoint, Variation};

    fn source() -> CalibrationSet {
        let mut set = CalibrationSet::new("CSVv2");
        for variation in Variation::ALL {
            for (category, mt) in [(Category::B, "comb"), (Category::Udsg, "incl")] {
                let key = EntryKey {
                    operating_point: OperatingPoint::Loose,
                    measurement_type: mt.into(),
                    sys_type: variation.as_str().into(),
                    category,
                };
                let bounds = EntryBounds::new(0.0, 2.4, 20.0, 1000.0);
                set.push(CalibrationEntry::new(key, bounds, Formula::constant(0.97)).unwrap());
            }
        }
        set
    }

    fn config() -> WorkingPointConfig {
        WorkingPointConfig::new("CSVv2", "Loose", "comb", "incl").unwrap()
    }

    #[test]
    fn test_unconfigured_rejects_evaluation() {
        let tool = ScaleFactorTool::new("BTagSF");
        assert!(!tool.is_configured());
        assert!(matches!(tool.scale_factor(Category::B, 0.5, 50.0, 0.0), Err(Error::Configuration(_))));
        assert!(matches!(tool.is_tagged(0.9), Err(Error::Configuration(_))));
        assert!(tool.collection_weight::<Jet>(&[], 0.0).is_err());
        let err = tool.engine().unwrap_err();
        assert!(err.to_string().contains("BTagSF"));
    }

    #[test]
    fn test_configure_once() {
        let mut tool = ScaleFactorTool::new("BTagSF");
        tool.configure(config(), &source()).unwrap();
        assert!(tool.is_configured());
        assert_eq!(tool.scale_factor(Category::B, 0.5, 50.0, 0.0).unwrap(), 0.97);
        assert!(tool.is_tagged(0.6).unwrap());

        let err = tool.configure(config(), &source()).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("already configured")));
        // still usable after the rejected second configure
        assert_eq!(tool.kinematic_weight(50.0, 0.5, 0, true, 0.0).unwrap(), 0.97);
    }

    #[test]
    fn test_failed_configure_leaves_unconfigured() {
        let mut tool = ScaleFactorTool::new("BTagSF");
        let tight = WorkingPointConfig::new("CSVv2", "Tight", "comb", "incl").unwrap();
        assert!(matches!(tool.configure(tight, &source()), Err(Error::Configuration(_))));
        assert!(!tool.is_configured());
        tool.configure(config(), &source()).unwrap();
        assert!(tool.is_configured());
    }

    #[test]
    fn test_settings_with_missing_file() {
        let mut tool = ScaleFactorTool::new("BTagSF");
        let settings = ToolSettings {
            calibration_file: "/nonexistent/tagweight/CSVv2.csv".into(),
            ..ToolSettings::default()
        };
        assert!(matches!(tool.configure_from_settings(&settings), Err(Error::Io(_))));
        assert!(!tool.is_configured());
    }
}
