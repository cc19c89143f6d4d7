use glam::Vec3;
use orb_3d::SphereDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSection {
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 4],
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            clear_color: [1.0, 1.0, 0.8, 1.0],
        }
    }
}

impl ViewSection {
    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereSection {
    pub extent: [f32; 3],
    /// Radial then vertical segment count.
    pub segments: [u32; 2],
    pub inward_normals: bool,
}

impl Default for SphereSection {
    fn default() -> Self {
        Self {
            extent: [0.75, 0.75, 0.75],
            segments: [100, 100],
            inward_normals: false,
        }
    }
}

impl SphereSection {
    pub fn descriptor(&self) -> SphereDescriptor {
        SphereDescriptor {
            extent: Vec3::from_array(self.extent),
            radial_segments: self.segments[0],
            vertical_segments: self.segments[1],
            inward_normals: self.inward_normals,
        }
    }
}

/// Everything the setup sequence is parameterised by. The defaults are the
/// fixed scene: a 600x600 pale-yellow view and a 0.75 extent sphere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub view: ViewSection,
    pub sphere: SphereSection,
}

impl SceneConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_fixed_scene() {
        let config = SceneConfig::default();
        assert_eq!((config.view.width, config.view.height), (600, 600));
        let clear = config.view.clear_color();
        assert_eq!((clear.r, clear.g, clear.b, clear.a), (1.0, 1.0, 0.8, 1.0));
        assert_eq!(config.sphere.descriptor(), SphereDescriptor::default());
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
[view]
width = 800

[sphere]
segments = [32, 16]
"#,
        )
        .unwrap();
        assert_eq!(config.view.width, 800);
        assert_eq!(config.view.height, 600);
        assert_eq!(config.sphere.segments, [32, 16]);
        assert_eq!(config.sphere.extent, [0.75; 3]);
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(SceneConfig::from_toml_str("[view]\nwidth = \"wide\"").is_err());
    }
}
