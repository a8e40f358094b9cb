//! Demo configuration.
//!
//! Everything has a default, so a config file only needs the keys it changes. The file is
//! looked up in this order:
//!
//! 1. the path given as the first command line argument,
//! 2. `meshview.json` in the working directory,
//! 3. `meshview/meshview.json` in the user's config directory.
//!
//! A missing file in the last two locations means defaults. A file that exists but cannot be
//! parsed is an error.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use glam::{Vec3, Vec4};
use meshview_core::{
    gl::GlDefaults,
    light::{Attenuation, BaseLight, DirectionalLight, Light, PointLight, SpotLight},
};
use serde::{Deserialize, Serialize};

pub const FILE_NAME: &str = "meshview.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "meshview".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Asset path of the OBJ file.
    pub path: String,
    pub position: [f32; 3],
    /// Euler angles in degrees.
    pub rotation: [f32; 3],
    pub scale: f32,
    /// Degrees per frame around the model's Y axis.
    pub spin: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/cube.obj".to_string(),
            position: [0.0, 0.0, 4.0],
            rotation: [0.0, 0.0, 0.0],
            scale: 1.0,
            spin: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightKind {
    Directional {
        direction: [f32; 3],
    },
    Point {
        position: [f32; 3],
        attenuation: [f32; 3],
    },
    Spot {
        position: [f32; 3],
        direction: [f32; 3],
        attenuation: [f32; 3],
        /// Half-angle of the cone in degrees.
        cutoff: f32,
    },
}

/// The scene's light. A `light` section must name its `kind`; the other keys default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub color: [f32; 4],
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
    #[serde(flatten)]
    pub kind: LightKind,
    /// Draws a small sphere where a positioned light sits.
    pub marker: bool,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            ambient_intensity: 0.8,
            diffuse_intensity: 1.0,
            kind: LightKind::Directional {
                direction: [4.0, 2.0, 6.0],
            },
            marker: true,
        }
    }
}

impl LightConfig {
    /// The light itself.
    pub fn light(&self) -> Light {
        let base = BaseLight {
            color: Vec4::from(self.color),
            ambient_intensity: self.ambient_intensity,
            diffuse_intensity: self.diffuse_intensity,
        };
        let attenuation = |[constant, linear, exp]: [f32; 3]| Attenuation {
            constant,
            linear,
            exp,
        };
        match self.kind {
            LightKind::Directional { direction } => Light::Directional(DirectionalLight {
                base,
                direction: Vec3::from(direction),
            }),
            LightKind::Point {
                attenuation: a, ..
            } => Light::Point(PointLight {
                base,
                attenuation: attenuation(a),
            }),
            LightKind::Spot {
                direction,
                attenuation: a,
                cutoff,
                ..
            } => Light::Spot(SpotLight {
                base,
                attenuation: attenuation(a),
                direction: Vec3::from(direction),
                cutoff,
            }),
        }
    }

    /// Where the light's object goes. Directional lights have no position.
    pub fn position(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { .. } => None,
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => {
                Some(Vec3::from(position))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 4.0, 0.0],
            target: [0.0, 3.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullFace {
    Back,
    Front,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlConfig {
    pub clear_color: [f32; 4],
    pub cull_face: CullFace,
    pub depth_test: bool,
    pub alpha_blending: bool,
}

impl Default for GlConfig {
    fn default() -> Self {
        let defaults = GlDefaults::default();
        Self {
            clear_color: defaults.clear_color.to_array(),
            cull_face: CullFace::Back,
            depth_test: defaults.depth_test,
            alpha_blending: defaults.alpha_blending,
        }
    }
}

impl From<&GlConfig> for GlDefaults {
    fn from(config: &GlConfig) -> Self {
        Self {
            clear_color: Vec4::from(config.clear_color),
            cull_face: match config.cull_face {
                CullFace::Back => Some(glow::BACK),
                CullFace::Front => Some(glow::FRONT),
                CullFace::None => None,
            },
            depth_test: config.depth_test,
            alpha_blending: config.alpha_blending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    /// Directory searched for assets before the ones built into the binary.
    pub asset_dir: Option<PathBuf>,
    pub model: ModelConfig,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub gl: GlConfig,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            asset_dir: None,
            model: ModelConfig::default(),
            light: LightConfig::default(),
            camera: CameraConfig::default(),
            gl: GlConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl DemoConfig {
    /// Loads the configuration, from `explicit` if given, else from the default locations.
    /// Returns the config and the file it came from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        for path in Self::search_paths() {
            match Self::from_file(&path) {
                Ok(config) => return Ok((config, Some(path))),
                Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok((Self::default(), None))
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("meshview").join(FILE_NAME));
        }
        paths
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured log level, `info` if it does not parse.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DemoConfig =
            serde_json::from_str(r#"{ "window": { "width": 640 }, "log_level": "debug" }"#)
                .unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.model, ModelConfig::default());
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn light_kinds_are_tagged() {
        let config: LightConfig = serde_json::from_str(
            r#"{
                "kind": "point",
                "position": [2, 0, 12],
                "attenuation": [0.9, 0.01, 0.0],
                "color": [0.8, 0.2, 0.2, 1.0]
            }"#,
        )
        .unwrap();

        assert_eq!(config.position(), Some(Vec3::new(2.0, 0.0, 12.0)));
        let Light::Point(point) = config.light() else {
            panic!("expected a point light");
        };
        assert_eq!(point.attenuation.constant, 0.9);
        assert_eq!(point.base.color, Vec4::new(0.8, 0.2, 0.2, 1.0));
        assert_eq!(point.base.ambient_intensity, 0.8);
    }

    #[test]
    fn default_light_matches_demo_sun() {
        let light = LightConfig::default();
        assert_eq!(light.position(), None);
        assert_eq!(
            light.light(),
            Light::Directional(DirectionalLight {
                base: BaseLight {
                    color: Vec4::ONE,
                    ambient_intensity: 0.8,
                    diffuse_intensity: 1.0,
                },
                direction: Vec3::new(4.0, 2.0, 6.0),
            })
        );
    }

    #[test]
    fn gl_config_maps_cull_face() {
        let mut config = GlConfig::default();
        assert_eq!(GlDefaults::from(&config), GlDefaults::default());
        config.cull_face = CullFace::None;
        assert_eq!(GlDefaults::from(&config).cull_face, None);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = DemoConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn explicit_file_errors_are_reported() {
        let dir = std::env::temp_dir().join(format!("meshview-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let bad = dir.join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let good = dir.join("good.json");
        fs::write(&good, r#"{ "model": { "path": "models/ship.obj" } }"#).unwrap();

        assert!(matches!(
            DemoConfig::load(Some(&bad)),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            DemoConfig::load(Some(&dir.join("missing.json"))),
            Err(ConfigError::Io { .. })
        ));
        let (config, source) = DemoConfig::load(Some(&good)).unwrap();
        assert_eq!(config.model.path, "models/ship.obj");
        assert_eq!(source.as_deref(), Some(good.as_path()));

        fs::remove_dir_all(&dir).unwrap();
    }
}
