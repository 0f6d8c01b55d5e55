use glam::Vec3;
use serde::{Deserialize, Serialize};
use solidview_camera::orbit;
use solidview_common::Size;
use solidview_input::Key;
use solidview_render::SceneOptions;
use std::path::{Path, PathBuf};

pub const DEFAULT_WIDTH: u32 = 480;
pub const DEFAULT_HEIGHT: u32 = 480;
/// Largest surface edge accepted from configuration.
pub const MAX_DIMENSION: u32 = 16_384;

/// Errors from loading or validating viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{name} must be at most {MAX_DIMENSION}, got {value}")]
    InvalidDimension { name: &'static str, value: u32 },
    #[error("{name} must be finite, got {value}")]
    InvalidSpeed { name: &'static str, value: f32 },
    #[error("initial position must be finite, got {0:?}")]
    InvalidPosition(Vec3),
}

/// Key that switches drag from rotate to pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    #[default]
    Shift,
    Control,
    Alt,
    Meta,
}

impl From<ModifierKey> for Key {
    fn from(key: ModifierKey) -> Self {
        match key {
            ModifierKey::Shift => Key::Shift,
            ModifierKey::Control => Key::Control,
            ModifierKey::Alt => Key::Alt,
            ModifierKey::Meta => Key::Meta,
        }
    }
}

/// Initial camera placement and navigation speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    pub initial_position: Vec3,
    pub pan_speed: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            initial_position: Vec3::new(50.0, -50.0, 50.0),
            pan_speed: orbit::DEFAULT_PAN_SPEED,
            rotate_speed: orbit::DEFAULT_ROTATE_SPEED,
            zoom_speed: orbit::DEFAULT_ZOOM_SPEED,
        }
    }
}

/// Full viewer configuration. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerProps {
    pub animate: bool,
    pub width: u32,
    pub height: u32,
    pub modifier_key: ModifierKey,
    pub viewer: ViewerOptions,
    #[serde(flatten)]
    pub scene: SceneOptions,
}

impl Default for ViewerProps {
    fn default() -> Self {
        Self {
            animate: false,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            modifier_key: ModifierKey::default(),
            viewer: ViewerOptions::default(),
            scene: SceneOptions::default(),
        }
    }
}

impl ViewerProps {
    /// Configured surface size. Zero dimensions fall back to the defaults.
    pub fn size(&self) -> Size {
        Size::new(
            if self.width == 0 { DEFAULT_WIDTH } else { self.width },
            if self.height == 0 { DEFAULT_HEIGHT } else { self.height },
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value > MAX_DIMENSION {
                return Err(ConfigError::InvalidDimension { name, value });
            }
        }
        for (name, value) in [
            ("pan_speed", self.viewer.pan_speed),
            ("rotate_speed", self.viewer.rotate_speed),
            ("zoom_speed", self.viewer.zoom_speed),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidSpeed { name, value });
            }
        }
        if !self.viewer.initial_position.is_finite() {
            return Err(ConfigError::InvalidPosition(self.viewer.initial_position));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let props: Self = serde_json::from_str(json)?;
        props.validate()?;
        Ok(props)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let props = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "viewer configuration loaded");
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let p = ViewerProps::default();
        assert!(!p.animate);
        assert_eq!(p.size(), Size::new(480, 480));
        assert_eq!(p.viewer.initial_position, Vec3::new(50.0, -50.0, 50.0));
        assert_eq!(p.viewer.rotate_speed, 0.002);
        assert_eq!(p.modifier_key, ModifierKey::Shift);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn zero_dimensions_fall_back() {
        let p = ViewerProps {
            width: 0,
            height: 200,
            ..ViewerProps::default()
        };
        assert_eq!(p.size(), Size::new(480, 200));
    }

    #[test]
    fn partial_json_is_merged_with_defaults() {
        let p = ViewerProps::from_json_str(
            r#"{ "width": 640, "animate": true, "modifier_key": "alt",
                 "grid": { "show": false }, "viewer": { "zoom_speed": 0.1 } }"#,
        )
        .unwrap();
        assert_eq!(p.width, 640);
        assert_eq!(p.height, DEFAULT_HEIGHT);
        assert!(p.animate);
        assert_eq!(p.modifier_key, ModifierKey::Alt);
        assert!(!p.scene.grid.show);
        assert!(p.scene.axis.show);
        assert_eq!(p.viewer.zoom_speed, 0.1);
        assert_eq!(p.viewer.pan_speed, orbit::DEFAULT_PAN_SPEED);
    }

    #[test]
    fn oversized_dimension_rejected() {
        let err = ViewerProps::from_json_str(r#"{ "height": 100000 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDimension {
                name: "height",
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_reports_error() {
        let err = ViewerProps::from_json_str("{ width: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "height": 320 }}"#).unwrap();
        let p = ViewerProps::from_json_file(file.path()).unwrap();
        assert_eq!(p.size(), Size::new(480, 320));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ViewerProps::from_json_file("/nonexistent/solidview.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/solidview.json"));
    }
}
