use anyhow::{Context, Result, bail};
use log::debug;
use prompt_classifier::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CONFIG_PATH_ENV: &str = "IMAGEDIT_CONFIG";
pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";
pub const PORT_ENV: &str = "IMAGEDIT_PORT";

const DEFAULT_CONFIG_FILE: &str = "imagedit.toml";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    pub server: Server,
    pub classifier: ClassifierConfig,
    pub adjustment: Adjustment,
    pub background_remover: BackgroundRemoval,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Server {
    #[derivative(Default(value = "\"0.0.0.0\".to_string()"))]
    pub host: String,

    #[derivative(Default(value = "8000"))]
    pub port: u16,

    #[derivative(Default(value = "PathBuf::from(\"uploads\")"))]
    pub upload_dir: PathBuf,

    #[derivative(Default(value = "PathBuf::from(\"processed\")"))]
    pub processed_dir: PathBuf,

    #[derivative(Default(value = "10"))]
    pub max_file_size_mb: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Adjustment {
    // lowest multiplier a "decrease" action may produce
    #[derivative(Default(value = "0.1"))]
    pub decrease_floor: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct BackgroundRemoval {
    #[derivative(Default(value = "\"u2net.onnx\".to_string()"))]
    pub model: String,

    #[derivative(Default(value = "PathBuf::from(\"models/u2net.onnx\")"))]
    pub model_path: PathBuf,
}

impl Server {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit(&self) -> usize {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Config {
    /// Path of the config file: `$IMAGEDIT_CONFIG`, or `imagedit.toml` in
    /// the working directory.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads the config file, applies environment overrides and creates the
    /// storage directories.
    ///
    /// A missing file is created with defaults. A file that fails to parse is
    /// copied to `<path>.bak` and replaced with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_file(path.as_ref())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        config.create_dirs()?;

        debug!("{:?}", config.redacted());
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(mut c) => {
                    c.config_path = path.to_path_buf();
                    Ok(c)
                }
                Err(e) => {
                    log::warn!("parse {} failed, restoring defaults: {e}", path.display());

                    if let Some(bak_file) = path.as_os_str().to_str() {
                        _ = fs::copy(path, format!("{bak_file}.bak"));
                    }

                    Self::write_default(path)
                }
            },
            Err(_) => Self::write_default(path),
        }
    }

    fn write_default(path: &Path) -> Result<Self> {
        let config = Self {
            config_path: path.to_path_buf(),
            is_first_run: true,
            ..Default::default()
        };

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        match toml::to_string_pretty(&config) {
            Ok(text) => fs::write(path, text)
                .with_context(|| format!("write {} failed", path.display()))?,
            Err(e) => bail!("convert config to toml format failed. {e:?}"),
        }

        Ok(config)
    }

    /// Applies `HUGGINGFACE_API_KEY` and `IMAGEDIT_PORT` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty()) {
            self.classifier.api_key = api_key.trim().to_string();
        }

        if let Some(port) = lookup(PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("ignore invalid {PORT_ENV}={port}: {e}"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;

        if !(0.0..=1.0).contains(&self.adjustment.decrease_floor) {
            bail!(
                "adjustment.decrease_floor {} is outside [0, 1]",
                self.adjustment.decrease_floor
            );
        }

        if self.server.max_file_size_mb == 0 {
            bail!("server.max_file_size_mb must be greater than 0");
        }

        Ok(())
    }

    fn create_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.server.upload_dir)
            .with_context(|| format!("create {} failed", self.server.upload_dir.display()))?;
        fs::create_dir_all(&self.server.processed_dir)
            .with_context(|| format!("create {} failed", self.server.processed_dir.display()))?;
        Ok(())
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.classifier.api_key.is_empty() {
            config.classifier.api_key = "***".to_string();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.addr(), "0.0.0.0:8000");
        assert_eq!(config.server.body_limit(), 10 * 1024 * 1024);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.server.processed_dir, PathBuf::from("processed"));
        assert_eq!(config.adjustment.decrease_floor, 0.1);
        assert_eq!(config.background_remover.model, "u2net.onnx");
        assert_eq!(config.classifier.confidence_threshold, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("imagedit.toml");

        let config = Config::load_file(&path).unwrap();
        assert!(config.is_first_run);
        assert!(path.exists());

        let reloaded = Config::load_file(&path).unwrap();
        assert!(!reloaded.is_first_run);
        assert_eq!(reloaded.server.port, 8000);
        assert_eq!(reloaded.classifier.labels, config.classifier.labels);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imagedit.toml");
        fs::write(
            &path,
            "[server]\nport = 9000\n\n[classifier]\nconfidence_threshold = 0.5\n",
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.classifier.confidence_threshold, 0.5);
        assert_eq!(config.classifier.max_retries, 3);
        assert_eq!(config.adjustment.decrease_floor, 0.1);
    }

    #[test]
    fn test_broken_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imagedit.toml");
        fs::write(&path, "[server\nport = ").unwrap();

        let config = Config::load_file(&path).unwrap();
        assert!(config.is_first_run);
        assert_eq!(config.server.port, 8000);

        let backup = dir.path().join("imagedit.toml.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "[server\nport = ");
        assert!(toml::from_str::<Config>(&fs::read_to_string(&path).unwrap()).is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            (API_KEY_ENV, " hf_secret "),
            (PORT_ENV, "8123"),
        ]);

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.classifier.api_key, "hf_secret");
        assert_eq!(config.server.port, 8123);

        let mut config = Config::default();
        config.apply_env(|key| (key == PORT_ENV).then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8000);
        assert!(config.classifier.api_key.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_floor() {
        let mut config = Config::default();
        config.adjustment.decrease_floor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_hides_api_key() {
        let mut config = Config::default();
        config.classifier.api_key = "hf_secret".to_string();
        assert_eq!(config.redacted().classifier.api_key, "***");
    }
}
