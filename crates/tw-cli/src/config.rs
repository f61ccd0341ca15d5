//! Tool settings files (JSON or YAML).

use anyhow::{Context, Result};
use std::path::Path;
use tw_engine::{ScaleFactorTool, ToolSettings};

/// Read settings; `.json` is parsed as JSON, anything else as YAML.
///
/// Relative calibration locations are taken relative to the settings file.
pub fn read_settings(path: &Path) -> Result<ToolSettings> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let mut settings: ToolSettings = if ext == "json" {
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml_ng::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?
    };

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    match &settings.calibration_dir {
        Some(dir) if dir.is_relative() => settings.calibration_dir = Some(base.join(dir)),
        Some(_) => {}
        None => settings.calibration_dir = Some(base.to_path_buf()),
    }
    Ok(settings)
}

/// Configure a tool from a settings file.
pub fn load_tool(path: &Path) -> Result<ScaleFactorTool> {
    let settings = read_settings(path)?;
    tracing::info!(
        config = %path.display(),
        calibration = %settings.calibration_path().display(),
        working_point = %settings.working_point,
        "configuring scale-factor tool"
    );

    let mut tool = ScaleFactorTool::new("tagweight");
    tool.configure_from_settings(&settings)
        .with_context(|| format!("configuring from {}", path.display()))?;
    Ok(tool)
}
