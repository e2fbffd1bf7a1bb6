//! User preferences persistence.
//!
//! Saves user preferences (language, theme, window) to ~/.config/gms/config.toml.
//! Probe history is never written here.

use gms::config::QualityThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Id,
}

impl Language {
    /// Cycle to the next language
    pub fn next(self) -> Self {
        match self {
            Self::En => Self::Id,
            Self::Id => Self::En,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Id => "id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "en" | "english" => Some(Self::En),
            "id" | "indonesian" | "bahasa" => Some(Self::Id),
            _ => None,
        }
    }
}

/// User preferences
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Prefs {
    pub language: Option<Language>,
    /// Selected theme name
    pub theme: Option<String>,
    /// Last recent-window size
    pub window_size: Option<usize>,
    /// Overrides for the quality rating thresholds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityThresholds>,
}

impl Prefs {
    /// Get config file path: ~/.config/gms/config.toml
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gms").join("config.toml"))
    }

    /// Load preferences from disk (returns default if missing/invalid)
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save preferences to disk
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefs_default() {
        let prefs = Prefs::default();
        assert!(prefs.language.is_none());
        assert!(prefs.theme.is_none());
        assert!(prefs.window_size.is_none());
        assert!(prefs.quality.is_none());
    }

    #[test]
    fn test_prefs_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gms").join("config.toml");
        let prefs = Prefs {
            language: Some(Language::Id),
            theme: Some("nord".to_string()),
            window_size: Some(120),
            quality: None,
        };
        prefs.save_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("language = \"id\""));
        assert!(!text.contains("quality"));

        let loaded = Prefs::load_from(&path);
        assert_eq!(loaded.language, Some(Language::Id));
        assert_eq!(loaded.theme.as_deref(), Some("nord"));
        assert_eq!(loaded.window_size, Some(120));
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "language = 42\n[[[").unwrap();
        assert!(Prefs::load_from(&path).language.is_none());
        assert!(Prefs::load_from(&dir.path().join("missing.toml")).theme.is_none());
    }

    #[test]
    fn test_partial_quality_override() {
        let toml_str = r#"
            [quality]
            excellent_avg_ms = 25.0
        "#;
        let loaded: Prefs = toml::from_str(toml_str).unwrap();
        let quality = loaded.quality.unwrap();
        assert_eq!(quality.excellent_avg_ms, 25.0);
        assert_eq!(quality.good_avg_ms, QualityThresholds::default().good_avg_ms);
    }

    #[test]
    fn test_language_cycling_and_names() {
        assert_eq!(Language::En.next(), Language::Id);
        assert_eq!(Language::Id.next(), Language::En);
        assert_eq!(Language::from_name("ID"), Some(Language::Id));
        assert_eq!(Language::from_name("fr"), None);
        assert_eq!(Language::default().label(), "en");
    }
}
