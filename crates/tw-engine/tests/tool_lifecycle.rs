use std::path::PathBuf;

use approx::assert_relative_eq;
use tw_core::{Category, Error};
use tw_engine::{FatJet, Jet, ScaleFactorTool, ToolSettings};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures")
}

fn settings(working_point: &str) -> ToolSettings {
    ToolSettings {
        working_point: working_point.into(),
        calibration_dir: Some(fixtures_dir()),
        calibration_file: "csvv2_sample.csv".into(),
        ..ToolSettings::default()
    }
}

#[test]
fn configure_from_settings_loose() {
    let mut tool = ScaleFactorTool::new("BTagSF_Loose");
    tool.configure_from_settings(&settings("Loose")).unwrap();
    assert!(tool.is_configured());
    assert_eq!(tool.engine().unwrap().config().cut(), 0.5426);

    let tagged_b = Jet::new(50.0, 0.5, 5, 0.6);
    let untagged_light = Jet::new(40.0, -0.8, 21, 0.1);
    assert_eq!(tool.object_weight(&tagged_b, 0.0).unwrap(), 0.97);
    assert_relative_eq!(tool.object_weight(&untagged_light, 0.0).unwrap(), 0.05, epsilon = 1e-9);
    assert_relative_eq!(
        tool.collection_weight(&[tagged_b, untagged_light], 0.0).unwrap(),
        0.97 * 0.05,
        epsilon = 1e-9
    );

    let fat = FatJet { pt: 350.0, eta: 0.2, hadron_flavour: 5, score: 0.9, subjets: vec![tagged_b] };
    assert_eq!(tool.substructure_weight(&fat, 0.0).unwrap(), 0.97);
    assert_eq!(tool.collection_substructure_weight::<FatJet>(&[], 0.0).unwrap(), 1.0);
    assert!(tool.is_tagged_object(&fat).unwrap());
}

#[test]
fn custom_efficiency_changes_untagged_weight() {
    let mut tool = ScaleFactorTool::new("BTagSF");
    let s = ToolSettings { mc_efficiency: 0.5, ..settings("Loose") };
    tool.configure_from_settings(&s).unwrap();
    let w = tool.kinematic_weight(40.0, 0.3, 0, false, 0.0).unwrap();
    assert_relative_eq!(w, (1.0 - 1.05 * 0.5) / 0.5, epsilon = 1e-12);
}

#[test]
fn invalid_settings_are_configuration_errors() {
    let mut tool = ScaleFactorTool::new("BTagSF");
    assert!(matches!(tool.configure_from_settings(&settings("medium")), Err(Error::Configuration(_))));
    assert!(matches!(tool.configure_from_settings(&settings("Tight")), Err(Error::Configuration(_))));
    let bad_eff = ToolSettings { mc_efficiency: 1.0, ..settings("Loose") };
    assert!(matches!(tool.configure_from_settings(&bad_eff), Err(Error::Configuration(_))));
    assert!(!tool.is_configured());
    assert!(matches!(tool.scale_factor(Category::B, 0.5, 50.0, 0.0), Err(Error::Configuration(_))));
}

#[test]
fn second_configure_is_rejected() {
    let mut tool = ScaleFactorTool::new("BTagSF");
    tool.configure_from_settings(&settings("Loose")).unwrap();
    let err = tool.configure_from_settings(&settings("Medium")).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    // first configuration stays in force
    assert_eq!(tool.scale_factor(Category::B, 0.5, 50.0, 0.0).unwrap(), 0.97);
}
