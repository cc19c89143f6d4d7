use anyhow::Context;
use orb_runtime::SceneConfig;
use std::path::Path;

pub const CONFIG_FILE: &str = "orb.toml";

/// Reads the scene overrides at `path`. A missing file means the fixed scene.
pub fn load_scene_config(path: &Path) -> anyhow::Result<SceneConfig> {
    if !path.exists() {
        return Ok(SceneConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = SceneConfig::from_toml_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    log::info!("loaded scene config from {}", path.display());
    Ok(config)
}
