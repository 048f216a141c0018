//! Report configuration loaded from TOML
//!
//! ```toml
//! assets_dir = "static/images"
//! logo = "logo.jpg"
//! badge = "skf.jpg"
//!
//! [fonts]
//! regular = "fonts/ARIAL.ttf"
//! bold = "fonts/arialbd.ttf"
//!
//! [geometry]
//! machine_frame_height = 23.0
//! ```
//!
//! Every key is optional. Relative paths are resolved against `assets_dir`,
//! which itself is resolved against the directory of the config file.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::font_registry::FontLibrary;
use crate::geometry::DocumentGeometry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub assets_dir: PathBuf,
    /// Base directory of the image paths found in datasets
    pub media_dir: Option<PathBuf>,
    pub logo: PathBuf,
    /// Partner badge shown under "Con tecnología"
    pub badge: PathBuf,
    pub fonts: FontConfig,
    pub geometry: DocumentGeometry,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            media_dir: None,
            logo: PathBuf::from("logo.jpg"),
            badge: PathBuf::from("skf.jpg"),
            fonts: FontConfig::default(),
            geometry: DocumentGeometry::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_toml_str(content: &str) -> ReportResult<Self> {
        let config: ReportConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ReportResult<Self> {
        if !path.exists() {
            return Err(ReportError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.assets_dir = base.join(&config.assets_dir);
            config.media_dir = config.media_dir.map(|dir| base.join(dir));
        }
        debug!("Loaded config {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        self.geometry.validate().map_err(ReportError::Config)
    }

    /// Join a relative path onto the asset directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets_dir.join(path)
        }
    }

    pub fn logo_path(&self) -> PathBuf {
        self.resolve(&self.logo)
    }

    pub fn badge_path(&self) -> PathBuf {
        self.resolve(&self.badge)
    }

    /// Parse the configured fonts, falling back to the built-in faces
    pub fn font_library(&self) -> ReportResult<FontLibrary> {
        let regular = self.fonts.regular.as_deref().map(|path| self.resolve(path));
        let bold = self.fonts.bold.as_deref().map(|path| self.resolve(path));
        FontLibrary::load(regular.as_deref(), bold.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.logo_path(), PathBuf::from("assets/logo.jpg"));
    }

    #[test]
    fn test_partial_geometry() {
        let config = ReportConfig::from_toml_str(
            r#"
            assets_dir = "/srv/static"
            [geometry]
            machine_frame_height = 22.5
            "#,
        )
        .unwrap();
        assert_eq!(config.geometry.machine_frame_height, 22.5);
        assert_eq!(config.geometry.standard_frame_height, 26.0);
        assert_eq!(config.badge_path(), PathBuf::from("/srv/static/skf.jpg"));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let result = ReportConfig::from_toml_str("[geometry]\ncontent_width = 40.0\n");
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let result = ReportConfig::from_toml_str("logo = [");
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_file_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        fs::write(&path, "assets_dir = \"static\"\nmedia_dir = \"media\"\n").unwrap();
        let config = ReportConfig::from_file(&path).unwrap();
        assert_eq!(config.logo_path(), dir.path().join("static").join("logo.jpg"));
        assert_eq!(config.media_dir, Some(dir.path().join("media")));
    }

    #[test]
    fn test_missing_font_file_is_error() {
        let config = ReportConfig::from_toml_str("[fonts]\nregular = \"/nonexistent/ARIAL.ttf\"\n").unwrap();
        assert!(config.font_library().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = ReportConfig::from_file(Path::new("/nonexistent/report.toml"));
        assert!(matches!(result, Err(ReportError::Config(_))));
    }
}
