//! Configuration (layered: code > env > `compass.toml`).

use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{CompassError, Result};
use crate::model::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::tools::calendar::DEFAULT_CALENDAR_BASE_URL;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;
pub const DEFAULT_MAX_AUTO_ITERATIONS: usize = 16;
pub const DEFAULT_GREETING: &str =
    "I am Signal. I am here to help you filter the noise. How is your alignment today?";
pub const CONFIG_FILE_NAME: &str = "compass.toml";

/// Per-session knobs.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Suggestions kept from one model reply.
    #[builder(default = DEFAULT_MAX_SUGGESTIONS)]
    pub max_suggestions: usize,
    /// Model calls allowed in one turn before it is aborted.
    #[builder(default = DEFAULT_MAX_AUTO_ITERATIONS)]
    pub max_auto_iterations: usize,
    /// First model message of every session.
    #[builder(default = DEFAULT_GREETING.to_string(), into)]
    pub greeting: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Contents of `compass.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub gemini_api_key: Option<String>,
    pub model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub calendar_token: Option<String>,
    pub calendar_base_url: Option<String>,
    pub max_suggestions: Option<usize>,
    pub max_auto_iterations: Option<usize>,
    pub greeting: Option<String>,
    pub state_path: Option<PathBuf>,
    pub journal_path: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| CompassError::Configuration(e.to_string()))
    }

    /// Read `path`. A missing file is an error only when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(Self::default())
            }
            Err(err) => Err(CompassError::Configuration(format!(
                "cannot read {}: {err}",
                path.display()
            ))),
        }
    }
}

/// Resolved configuration for the engine and the CLI.
#[derive(Clone, PartialEq)]
pub struct CompassConfig {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub gemini_base_url: String,
    pub calendar_token: Option<String>,
    pub calendar_base_url: String,
    pub session: SessionConfig,
    pub state_path: Option<PathBuf>,
    pub journal_path: Option<PathBuf>,
}

impl std::fmt::Debug for CompassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompassConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| ".."))
            .field("model", &self.model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("calendar_token", &self.calendar_token.as_ref().map(|_| ".."))
            .field("calendar_base_url", &self.calendar_base_url)
            .field("session", &self.session)
            .field("state_path", &self.state_path)
            .field("journal_path", &self.journal_path)
            .finish()
    }
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            calendar_token: None,
            calendar_base_url: DEFAULT_CALENDAR_BASE_URL.to_string(),
            session: SessionConfig::default(),
            state_path: None,
            journal_path: None,
        }
    }
}

impl CompassConfig {
    /// Load `.env`, then the config file, then overlay process env vars.
    ///
    /// With no explicit path the default location is used and may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let file = match path {
            Some(path) => FileConfig::load(path, true)?,
            None => match default_config_path() {
                Some(path) => FileConfig::load(&path, false)?,
                None => FileConfig::default(),
            },
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge `file` under the variables returned by `env`.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let max_suggestions = match env("COMPASS_MAX_SUGGESTIONS") {
            Some(raw) => parse_count("COMPASS_MAX_SUGGESTIONS", &raw)?,
            None => file.max_suggestions.unwrap_or(DEFAULT_MAX_SUGGESTIONS),
        };
        let max_auto_iterations = match env("COMPASS_MAX_AUTO_ITERATIONS") {
            Some(raw) => parse_count("COMPASS_MAX_AUTO_ITERATIONS", &raw)?,
            None => file.max_auto_iterations.unwrap_or(DEFAULT_MAX_AUTO_ITERATIONS),
        };
        if max_auto_iterations == 0 {
            return Err(CompassError::Configuration(
                "max_auto_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            gemini_api_key: env("GEMINI_API_KEY")
                .or_else(|| env("GOOGLE_API_KEY"))
                .or(file.gemini_api_key),
            model: env("COMPASS_MODEL").or(file.model).unwrap_or(defaults.model),
            gemini_base_url: env("COMPASS_GEMINI_BASE_URL")
                .or(file.gemini_base_url)
                .unwrap_or(defaults.gemini_base_url),
            calendar_token: env("GOOGLE_CALENDAR_TOKEN").or(file.calendar_token),
            calendar_base_url: env("COMPASS_CALENDAR_BASE_URL")
                .or(file.calendar_base_url)
                .unwrap_or(defaults.calendar_base_url),
            session: SessionConfig {
                max_suggestions,
                max_auto_iterations,
                greeting: file.greeting.unwrap_or(defaults.session.greeting),
            },
            state_path: file.state_path,
            journal_path: file.journal_path,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// The API key, or a configuration error naming the variables to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.gemini_api_key.as_deref().ok_or_else(|| {
            CompassError::Configuration(
                "set GEMINI_API_KEY (or GOOGLE_API_KEY) or gemini_api_key in compass.toml"
                    .to_string(),
            )
        })
    }
}

/// `~/.compass/compass.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".compass").join(CONFIG_FILE_NAME))
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| CompassError::Configuration(format!("{key} must be a whole number, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.max_suggestions, 3);
        assert_eq!(config.max_auto_iterations, 16);
        assert!(config.greeting.starts_with("I am Signal."));
    }

    #[test]
    fn builder_overrides_single_fields() {
        let config = SessionConfig::builder().max_auto_iterations(2).build();
        assert_eq!(config.max_auto_iterations, 2);
        assert_eq!(config.max_suggestions, DEFAULT_MAX_SUGGESTIONS);
    }

    #[test]
    fn env_wins_over_file() {
        let file = FileConfig {
            model: Some("file-model".into()),
            gemini_api_key: Some("file-key".into()),
            max_suggestions: Some(5),
            ..Default::default()
        };

        let config = CompassConfig::resolve(
            file,
            env_of(&[("COMPASS_MODEL", "env-model"), ("GOOGLE_API_KEY", "google-key")]),
        )
        .unwrap();

        assert_eq!(config.model, "env-model");
        assert_eq!(config.gemini_api_key.as_deref(), Some("google-key"));
        assert_eq!(config.session.max_suggestions, 5);
    }

    #[test]
    fn gemini_key_preferred_over_google_key() {
        let config = CompassConfig::resolve(
            FileConfig::default(),
            env_of(&[("GEMINI_API_KEY", "g1"), ("GOOGLE_API_KEY", "g2")]),
        )
        .unwrap();
        assert_eq!(config.require_api_key().unwrap(), "g1");
    }

    #[test]
    fn bad_numbers_are_configuration_errors() {
        let err = CompassConfig::resolve(
            FileConfig::default(),
            env_of(&[("COMPASS_MAX_AUTO_ITERATIONS", "lots")]),
        )
        .unwrap_err();
        assert!(matches!(err, CompassError::Configuration(_)));

        let zero = CompassConfig::resolve(
            FileConfig::default(),
            env_of(&[("COMPASS_MAX_AUTO_ITERATIONS", "0")]),
        );
        assert!(zero.is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = CompassConfig::default().with_api_key("secret");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(FileConfig::from_toml("modle = \"typo\"").is_err());
        let file = FileConfig::from_toml("model = \"gemini-pro\"\nmax_suggestions = 2").unwrap();
        assert_eq!(file.max_suggestions, Some(2));
    }
}
