//! Runtime configuration.
//!
//! Layered lowest to highest: built-in defaults, `topicsmith.toml` in the
//! project directory, environment variables (with `.env` support), CLI
//! flags. `OPENAI_API_KEY` is the one mandatory value; the defaults point
//! at DeepSeek's OpenAI-compatible endpoint.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const CONFIG_FILE: &str = "topicsmith.toml";

/// Fully-resolved configuration the rest of the crate consumes.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub output_dir: PathBuf,
    pub verbose: bool,
}

/// The optional on-disk config file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// CLI-level overrides, applied on top of file and environment values.
#[derive(Debug, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    /// Resolve configuration for `project_dir`, loading `.env` if present.
    pub fn load(project_dir: &Path, overrides: Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = ConfigFile::load(project_dir)?;
        Self::resolve(file, EnvValues::capture(), overrides, project_dir)
    }

    fn resolve(
        file: ConfigFile,
        env: EnvValues,
        overrides: Overrides,
        project_dir: &Path,
    ) -> Result<Self> {
        let Some(api_key) = env.api_key.filter(|k| !k.trim().is_empty()) else {
            bail!(
                "OPENAI_API_KEY is not set.\n\
                 Create a .env file with OPENAI_API_KEY=your_key_here.\n\
                 Any OpenAI-compatible service works (OpenAI, DeepSeek, ...)."
            );
        };

        let base_url = env
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = overrides
            .model
            .or(env.model)
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let output_dir = overrides
            .output_dir
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            project_dir.join(output_dir)
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            output_dir,
            verbose: overrides.verbose,
        })
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                self.output_dir.display()
            )
        })
    }
}

struct EnvValues {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl EnvValues {
    fn capture() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: std::env::var("OPENAI_API_BASE").ok(),
            model: std::env::var("MODEL_NAME").ok(),
        }
    }
}

/// Starter config file contents for `config init`.
pub fn starter_config() -> String {
    format!(
        "# topicsmith configuration\n\
         # base_url = \"{DEFAULT_BASE_URL}\"\n\
         # model = \"{DEFAULT_MODEL}\"\n\
         # output_dir = \"{DEFAULT_OUTPUT_DIR}\"\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_key() -> EnvValues {
        EnvValues {
            api_key: Some("sk-test".to_string()),
            base_url: None,
            model: None,
        }
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let env = EnvValues {
            api_key: None,
            base_url: None,
            model: None,
        };
        let err = Config::resolve(
            ConfigFile::default(),
            env,
            Overrides::default(),
            Path::new("/tmp"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_fatal() {
        let env = EnvValues {
            api_key: Some("   ".to_string()),
            base_url: None,
            model: None,
        };
        assert!(
            Config::resolve(
                ConfigFile::default(),
                env,
                Overrides::default(),
                Path::new("/tmp")
            )
            .is_err()
        );
    }

    #[test]
    fn test_defaults_apply_when_nothing_set() {
        let config = Config::resolve(
            ConfigFile::default(),
            env_with_key(),
            Overrides::default(),
            Path::new("/project"),
        )
        .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.output_dir, Path::new("/project/output"));
    }

    #[test]
    fn test_env_beats_file_and_cli_beats_env() {
        let file = ConfigFile {
            base_url: Some("https://file.example/v1".to_string()),
            model: Some("file-model".to_string()),
            output_dir: None,
        };
        let env = EnvValues {
            api_key: Some("sk-test".to_string()),
            base_url: Some("https://env.example/v1".to_string()),
            model: Some("env-model".to_string()),
        };
        let overrides = Overrides {
            model: Some("cli-model".to_string()),
            output_dir: None,
            verbose: false,
        };
        let config = Config::resolve(file, env, overrides, Path::new("/p")).unwrap();
        assert_eq!(config.base_url, "https://env.example/v1");
        assert_eq!(config.model, "cli-model");
    }

    #[test]
    fn test_config_file_parses_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "model = \"my-model\"\n").unwrap();
        let file = ConfigFile::load(dir.path()).unwrap();
        assert_eq!(file.model.as_deref(), Some("my-model"));
        assert!(file.base_url.is_none());
    }

    #[test]
    fn test_config_file_missing_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load(dir.path()).unwrap();
        assert!(file.model.is_none());
    }

    #[test]
    fn test_config_file_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "model = [not toml").unwrap();
        assert!(ConfigFile::load(dir.path()).is_err());
    }

    #[test]
    fn test_absolute_output_dir_is_kept() {
        let file = ConfigFile {
            base_url: None,
            model: None,
            output_dir: Some(PathBuf::from("/var/strategies")),
        };
        let config = Config::resolve(file, env_with_key(), Overrides::default(), Path::new("/p"))
            .unwrap();
        assert_eq!(config.output_dir, Path::new("/var/strategies"));
    }

    #[test]
    fn test_ensure_output_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_key: "sk".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            output_dir: dir.path().join("a/b"),
            verbose: false,
        };
        config.ensure_output_dir().unwrap();
        assert!(config.output_dir.is_dir());
    }
}
