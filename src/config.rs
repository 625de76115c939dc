use crate::error::{Error, Result};
use crate::estimator::CostMetric;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_SETTINGS_FILE: &str = "llm-relay.toml";
const DEFAULT_MAX_RESPONSE_TOKENS: u32 = 1750;

/// Mapping from a language code to a model identifier.
///
/// Loaded once at startup from the `[models]` table and never mutated.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry(HashMap<String, String>);

impl ModelRegistry {
    /// Resolves a language code to its model identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLanguage`] listing the configured codes.
    pub fn model_for(&self, language: &str) -> Result<&str> {
        self.0.get(language).map(String::as_str).ok_or_else(|| {
            let mut known: Vec<&str> = self.0.keys().map(String::as_str).collect();
            known.sort_unstable();
            Error::UnknownLanguage {
                language: language.to_string(),
                known: known.join(", "),
            }
        })
    }

    /// Returns true if no languages are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert("en".to_string(), "gpt-3.5-turbo".to_string());
        Self(models)
    }
}

/// Mapping from a symbolic color name to a terminal escape sequence.
///
/// Same lifecycle as [`ModelRegistry`]: loaded once, read-only thereafter.
/// Unknown color names paint nothing, so missing entries degrade to plain
/// text instead of failing.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ColorPalette(HashMap<String, String>);

impl ColorPalette {
    /// Returns the escape sequence for a color name, or "" if unconfigured.
    #[must_use]
    pub fn code(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    /// Wraps a message in the named color and the reset sequence.
    #[must_use]
    pub fn paint(&self, name: &str, message: &str) -> String {
        format!("{}{}{}", self.code(name), message, self.code("reset"))
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        let mut colors = HashMap::new();
        colors.insert("info".to_string(), "\x1b[32m".to_string());
        colors.insert("error".to_string(), "\x1b[31m".to_string());
        colors.insert("assistant".to_string(), "\x1b[36m".to_string());
        colors.insert("reset".to_string(), "\x1b[0m".to_string());
        Self(colors)
    }
}

/// Settings for the llm-relay pipeline, loaded from a TOML file.
///
/// Every field has a default, so an absent or partial settings file is fine.
/// Constructed once in `main` and passed by reference into every component
/// that needs it; never accessed as ambient global state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// API credential, inline. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable to read the API credential from.
    pub api_key_env: String,

    /// Base URL of the completion endpoint.
    pub base_url: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Response length cap per completion request.
    pub max_response_tokens: u32,

    /// Metric used by dry-run cost estimation.
    pub cost_metric: CostMetric,

    /// Worker pool size for the batch completion path.
    /// Defaults to the host's available parallelism when unset.
    pub max_workers: Option<usize>,

    /// Language code to model identifier mapping.
    pub models: ModelRegistry,

    /// Color name to terminal escape sequence mapping.
    pub colors: ColorPalette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_tokens: DEFAULT_MAX_RESPONSE_TOKENS,
            cost_metric: CostMetric::Words,
            max_workers: None,
            models: ModelRegistry::default(),
            colors: ColorPalette::default(),
        }
    }
}

impl Settings {
    /// Loads settings with a fallback chain.
    ///
    /// An explicit path must exist and parse. Otherwise `llm-relay.toml` in
    /// the working directory is used if present, and built-in defaults apply
    /// when no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed,
    /// or if the loaded settings fail validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = if let Some(path) = path {
            Self::load_from_file(path)?
        } else {
            let local = Path::new(DEFAULT_SETTINGS_FILE);
            if local.exists() {
                Self::load_from_file(local)?
            } else {
                tracing::debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: Self = toml::from_str(&content)?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty, the timeout is zero, the
    /// response cap is zero, or no models are configured.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base-url must not be empty"));
        }

        if self.timeout_ms == 0 {
            return Err(Error::config("timeout-ms must be greater than 0"));
        }

        if self.max_response_tokens == 0 {
            return Err(Error::config("max-response-tokens must be greater than 0"));
        }

        if self.models.is_empty() {
            return Err(Error::config(
                "no language models configured; add a [models] table",
            ));
        }

        if let Some(0) = self.max_workers {
            return Err(Error::config("max-workers must be greater than 0"));
        }

        Ok(())
    }

    /// Resolves the API credential: inline value first, then environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when neither source yields a key.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                return Ok(key.clone());
            }
        }

        std::env::var(&self.api_key_env).map_err(|_| {
            Error::config(format!(
                "API key not found. Set api-key in the settings file or the {} environment variable.",
                self.api_key_env
            ))
        })
    }

    /// Returns the effective worker pool size.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .unwrap_or_else(crate::dispatch::default_workers)
            .max(1)
    }
}
