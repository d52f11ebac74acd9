//! Render configuration (RON)
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Example:
//!
//! ```ron
//! (
//!   width: 320,
//!   height: 240,
//!   demo: Textured,
//!   filter: Nearest,
//!   raster: (backface_cull: false),
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::demos::DemoKind;
use crate::error::AssetError;
use crate::rasterizer::{mat4_perspective, FilterMode, Mat4, RasterSettings, HEIGHT, WIDTH};

/// Limits for config validation
pub mod limits {
    /// Largest framebuffer side
    pub const MAX_DIMENSION: usize = 4096;
    /// Field of view must stay strictly inside (0, 180) degrees
    pub const MAX_FOV_DEGREES: f32 = 180.0;
    pub const MAX_SCALE: f32 = 64.0;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Framebuffer width in pixels
    pub width: usize,
    /// Framebuffer height in pixels
    pub height: usize,
    /// Window magnification used by the viewer
    pub scale: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Demo shown at startup
    pub demo: DemoKind,
    pub filter: FilterMode,
    /// Image for the textured demo; a checkerboard is used when absent
    pub texture: Option<String>,
    pub raster: RasterSettings,
    /// off, error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            scale: 3.0,
            fov_degrees: 90.0,
            near: 0.1,
            far: 1000.0,
            demo: DemoKind::Clipping,
            filter: FilterMode::Bilinear,
            texture: None,
            raster: RasterSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl RenderConfig {
    /// Perspective projection for the configured buffer size and frustum
    pub fn projection(&self) -> Mat4 {
        mat4_perspective(
            self.width as f32,
            self.height as f32,
            self.near,
            self.far,
            self.fov_degrees.to_radians(),
        )
    }
}

/// Check a config for values the pipeline cannot use
pub fn validate_config(config: &RenderConfig) -> Result<(), AssetError> {
    if config.width == 0 || config.width > limits::MAX_DIMENSION {
        return Err(AssetError::Validation(format!(
            "width {} out of range (1..={})", config.width, limits::MAX_DIMENSION
        )));
    }
    if config.height == 0 || config.height > limits::MAX_DIMENSION {
        return Err(AssetError::Validation(format!(
            "height {} out of range (1..={})", config.height, limits::MAX_DIMENSION
        )));
    }
    if !(config.near > 0.0 && config.near < config.far && config.far.is_finite()) {
        return Err(AssetError::Validation(format!(
            "need 0 < near < far, got near {} far {}", config.near, config.far
        )));
    }
    if !(config.fov_degrees > 0.0 && config.fov_degrees < limits::MAX_FOV_DEGREES) {
        return Err(AssetError::Validation(format!(
            "fov_degrees {} out of range (0, {})", config.fov_degrees, limits::MAX_FOV_DEGREES
        )));
    }
    if !(config.scale > 0.0 && config.scale <= limits::MAX_SCALE) {
        return Err(AssetError::Validation(format!(
            "scale {} out of range (0, {}]", config.scale, limits::MAX_SCALE
        )));
    }
    if crate::logging::parse_level(&config.log_level).is_none() {
        return Err(AssetError::Validation(format!(
            "unknown log_level '{}'", config.log_level
        )));
    }
    Ok(())
}

/// Parse and validate a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, AssetError> {
    let config: RenderConfig = ron::from_str(s)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, AssetError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents)?;
    log::info!("loaded config {}", path.display());
    Ok(config)
}

/// Load a config, falling back to defaults if the file is missing or invalid
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> RenderConfig {
    let path = path.as_ref();
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("using default config ({}: {})", path.display(), e);
            RenderConfig::default()
        }
    }
}

/// Save a config as pretty RON
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), AssetError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());
    let ron_string = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, ron_string)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = load_config_from_str("(width: 64, demo: Textured, raster: (use_zbuffer: false))").unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, HEIGHT);
        assert_eq!(config.demo, DemoKind::Textured);
        assert!(!config.raster.use_zbuffer);
        assert!(config.raster.backface_cull);
    }

    #[test]
    fn test_validation_rejects_bad_frustum() {
        for bad in [
            "(near: 0.0)",
            "(near: 10.0, far: 5.0)",
            "(fov_degrees: 180.0)",
            "(width: 0)",
            "(height: 5000)",
            "(scale: -1.0)",
            "(log_level: \"loud\")",
        ] {
            match load_config_from_str(bad) {
                Err(AssetError::Validation(_)) => {}
                other => panic!("{} gave {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(load_config_from_str("(width: \"wide\")"), Err(AssetError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        let config = RenderConfig {
            width: 128,
            filter: FilterMode::Nearest,
            texture: Some("assets/brick.png".to_string()),
            ..RenderConfig::default()
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path().join("nope.ron"));
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_projection_uses_aspect() {
        let config = RenderConfig { width: 200, height: 100, ..RenderConfig::default() };
        let m = config.projection();
        assert!((m[0][0] - 1.0).abs() < 1e-5);
        assert!((m[1][1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&RenderConfig::default()).is_ok());
    }
}
