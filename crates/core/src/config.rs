//! Widget configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Vectors are plain `[f32; 3]` arrays and colors are
//! `0xRRGGBB` integers to keep the file format free of math types.

use std::f32::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::DEFAULT_FIXED_STEP;
use crate::{Error, Result};

/// Top-level avatar configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub asset: AssetConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lighting: LightingConfig,
    pub ground: GroundConfig,
    pub animation: AnimationConfig,
    pub model: ModelConfig,
    pub renderer: RendererConfig,
}

/// Where the model payload lives and how it is streamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// File path or `http(s)://` URL of the `.glb`/`.gltf` payload.
    pub uri: String,
    /// Read size for streamed chunks, in bytes.
    pub chunk_size: usize,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            uri: "assets/3D/model.glb".to_string(),
            chunk_size: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            position: [0.5, 1.5, 2.1],
            target: [0.0, 1.0, 0.0],
        }
    }
}

/// Orbit controls. Zoom and pan are never configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub damping_factor: f32,
    /// Fixed distance between camera and target.
    pub distance: f32,
    /// Polar angle cap in radians, measured from straight up.
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            distance: 2.1,
            max_polar_angle: PI / 2.0,
            rotate_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub sun_color: u32,
    pub sun_intensity: f32,
    pub sun_position: [f32; 3],
    /// Shadow map edge length in texels.
    pub shadow_map_size: u32,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 1.5,
            sun_color: 0xfff6c6,
            sun_intensity: 7.0,
            sun_position: [8.0, 10.0, 5.0],
            shadow_map_size: 2048,
            shadow_near: 0.5,
            shadow_far: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub size: f32,
    pub shadow_opacity: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            shadow_opacity: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Clip name that marks the infinite idle loop.
    pub idle_clip: String,
    /// Clip played once per process on the first registration.
    pub greeting_clip: String,
    /// Cross-fade window in seconds.
    pub fade_seconds: f32,
    /// Animation seconds advanced per rendered frame.
    pub fixed_step: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            idle_clip: "Animation".to_string(),
            greeting_clip: "salute".to_string(),
            fade_seconds: 0.3,
            fixed_step: DEFAULT_FIXED_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub initial_yaw_radians: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            initial_yaw_radians: PI / 9.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Upper bound for the device pixel ratio used to size the backbuffer.
    pub max_pixel_ratio: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
        }
    }
}

impl AvatarConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!("Loaded avatar config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would break the scene or the animation clock.
    pub fn validate(&self) -> Result<()> {
        if self.animation.fixed_step <= 0.0 {
            return Err(Error::InvalidConfig(
                "animation.fixed_step must be positive".into(),
            ));
        }
        if self.animation.fade_seconds < 0.0 {
            return Err(Error::InvalidConfig(
                "animation.fade_seconds must not be negative".into(),
            ));
        }
        if self.camera.near <= 0.0 || self.camera.near >= self.camera.far {
            return Err(Error::InvalidConfig(format!(
                "camera planes must satisfy 0 < near < far (near={}, far={})",
                self.camera.near, self.camera.far
            )));
        }
        if self.lighting.shadow_map_size == 0 {
            return Err(Error::InvalidConfig(
                "lighting.shadow_map_size must be non-zero".into(),
            ));
        }
        if self.controls.distance <= 0.0 {
            return Err(Error::InvalidConfig(
                "controls.distance must be positive".into(),
            ));
        }
        if self.asset.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "asset.chunk_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AvatarConfig::from_toml_str("").unwrap();
        assert_eq!(config, AvatarConfig::default());
        assert_eq!(config.animation.idle_clip, "Animation");
        assert_eq!(config.animation.greeting_clip, "salute");
        assert_eq!(config.lighting.shadow_map_size, 2048);
    }

    #[test]
    fn test_partial_override() {
        let config = AvatarConfig::from_toml_str(
            r#"
            [asset]
            uri = "https://example.com/model.glb"

            [animation]
            idle_clip = "idle"
            "#,
        )
        .unwrap();

        assert_eq!(config.asset.uri, "https://example.com/model.glb");
        assert_eq!(config.asset.chunk_size, 64 * 1024);
        assert_eq!(config.animation.idle_clip, "idle");
        assert_eq!(config.animation.fade_seconds, 0.3);
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let err = AvatarConfig::from_toml_str("[animation]\nfixed_step = 0.0").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_inverted_planes() {
        let err = AvatarConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 1.0").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = AvatarConfig::from_toml_str("[camera\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AvatarConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
