use crate::core::error::ValidationError;
use crate::core::i18n::Locale;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.yml";
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Optional theme steering the scenario ideas.
    #[serde(default)]
    pub theme: Option<String>,

    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    /// Gemini `HarmBlockThreshold` applied to every harm category,
    /// e.g. `BLOCK_ONLY_HIGH`. Service defaults apply when unset.
    #[serde(default)]
    pub safety_threshold: Option<String>,

    #[serde(default)]
    pub models: ModelConfig,

    #[serde(default)]
    pub images: ImageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_ideas_model")]
    pub ideas: String,
    #[serde(default = "default_scenario_model")]
    pub scenario: String,
    #[serde(default = "default_scenario_model")]
    pub improve: String,
    #[serde(default = "default_image_model")]
    pub image: String,
    #[serde(default = "default_fallback_image_model")]
    pub fallback_image: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            ideas: default_ideas_model(),
            scenario: default_scenario_model(),
            improve: default_scenario_model(),
            image: default_image_model(),
            fallback_image: default_fallback_image_model(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Upper bound on simultaneous image requests. Unbounded when unset.
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: default_aspect_ratio(),
            mime_type: default_mime_type(),
            concurrency: None,
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_ideas_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_scenario_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}
fn default_fallback_image_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}
fn default_aspect_ratio() -> String {
    "16:9".to_string()
}
fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            output_folder: default_output(),
            language: default_language(),
            theme: None,
            request_timeout_seconds: None,
            safety_threshold: None,
            models: ModelConfig::default(),
            images: ImageConfig::default(),
        }
    }
}

impl Config {
    /// Loads `config.yml` from the working directory, falling back to
    /// defaults when it does not exist. The API key from the environment
    /// wins over the file.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            log::info!("{} not found, using defaults", path.display());
            Config::default()
        };

        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        {
            config.api_key = Some(key);
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }

    pub fn locale(&self) -> Result<Locale, ValidationError> {
        self.language.parse()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
language: fr
models:
  scenario: gemini-2.5-flash
images:
  concurrency: 2
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.locale().unwrap(), Locale::Fr);
        assert_eq!(config.models.scenario, "gemini-2.5-flash");
        assert_eq!(config.models.ideas, "gemini-2.5-flash");
        assert_eq!(config.models.image, "imagen-4.0-generate-001");
        assert_eq!(config.images.aspect_ratio, "16:9");
        assert_eq!(config.images.concurrency, Some(2));
        assert_eq!(config.output_folder, "output");
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");

        let config = Config {
            language: "de".to_string(),
            theme: Some("bots".to_string()),
            ..Config::default()
        };
        config.save_to(&path)?;

        let loaded = Config::from_yaml(&fs::read_to_string(&path)?)?;
        assert_eq!(loaded.language, "de");
        assert_eq!(loaded.theme.as_deref(), Some("bots"));
        Ok(())
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let config = Config {
            language: "xx".to_string(),
            ..Config::default()
        };
        assert!(config.locale().is_err());
    }
}
