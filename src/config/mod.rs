//! Runtime settings read from the environment.
//!
//! The binary loads a `.env` file first (via `dotenvy`), then calls
//! [`Settings::from_env`]. CLI flags override what is read here.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::completion::TextCompletion;
use crate::completion::anthropic::AnthropicCompletion;
use crate::completion::mock::MockCompletion;
use crate::completion::openai::OpenAiCompletion;
use crate::consts::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENROUTER_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::Result;
use crate::search::serpapi::SerpApiSearch;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const SERPAPI_API_KEY: &str = "SERPAPI_API_KEY";
pub const PROVIDER_VAR: &str = "PROMPTLINE_PROVIDER";
pub const MODEL_VAR: &str = "PROMPTLINE_MODEL";
pub const TEMPERATURE_VAR: &str = "PROMPTLINE_TEMPERATURE";

/// Which language-model backend runs the tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Provider {
    #[default]
    Openai,
    Openrouter,
    Anthropic,
    /// Echoes each prompt back; needs no network.
    Mock,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Openai => DEFAULT_OPENAI_MODEL,
            Provider::Openrouter => DEFAULT_OPENROUTER_MODEL,
            Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Provider::Mock => "echo",
        }
    }

    /// Environment variable holding this provider's key.
    pub fn key_var(self) -> Option<&'static str> {
        match self {
            Provider::Openai => Some(OPENAI_API_KEY),
            Provider::Openrouter => Some(OPENROUTER_API_KEY),
            Provider::Anthropic => Some(ANTHROPIC_API_KEY),
            Provider::Mock => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Openai => "openai",
            Provider::Openrouter => "openrouter",
            Provider::Anthropic => "anthropic",
            Provider::Mock => "mock",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::Openai),
            "openrouter" => Ok(Provider::Openrouter),
            "anthropic" => Ok(Provider::Anthropic),
            "mock" => Ok(Provider::Mock),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: Provider,
    pub model: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            openai_api_key: None,
            openrouter_api_key: None,
            anthropic_api_key: None,
            serpapi_api_key: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset;
    /// unparsable values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let provider = match get(PROVIDER_VAR).map(|v| v.parse::<Provider>()) {
            Some(Ok(provider)) => provider,
            Some(Err(e)) => {
                warn!("{PROVIDER_VAR}: {e}, using {}", defaults.provider);
                defaults.provider
            }
            None => defaults.provider,
        };

        let temperature = match get(TEMPERATURE_VAR).map(|v| v.trim().parse::<f32>()) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                warn!("{TEMPERATURE_VAR}: {e}, using {}", defaults.temperature);
                defaults.temperature
            }
            None => defaults.temperature,
        };

        Self {
            provider,
            model: get(MODEL_VAR),
            temperature,
            timeout: defaults.timeout,
            openai_api_key: get(OPENAI_API_KEY),
            openrouter_api_key: get(OPENROUTER_API_KEY),
            anthropic_api_key: get(ANTHROPIC_API_KEY),
            serpapi_api_key: get(SERPAPI_API_KEY),
        }
    }

    /// The model to use: explicit choice or the provider default.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// The key for the active provider, if it needs one and has one.
    pub fn provider_key(&self) -> Option<&str> {
        match self.provider {
            Provider::Openai => self.openai_api_key.as_deref(),
            Provider::Openrouter => self.openrouter_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
            Provider::Mock => None,
        }
    }

    /// Credentials the current setup will need but does not have.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if let Some(var) = self.provider.key_var()
            && self.provider_key().is_none()
        {
            missing.push(var);
        }
        if self.serpapi_api_key.is_none() {
            missing.push(SERPAPI_API_KEY);
        }
        missing
    }

    /// Construct the text-completion backend for the active provider.
    /// A missing key is not an error here; the first call reports it.
    pub fn completion(&self) -> Result<Box<dyn TextCompletion>> {
        let key = self.provider_key().map(str::to_string);
        let model = self.model();
        Ok(match self.provider {
            Provider::Openai => Box::new(OpenAiCompletion::openai(
                key,
                model,
                self.temperature,
                self.timeout,
            )?),
            Provider::Openrouter => Box::new(OpenAiCompletion::openrouter(
                key,
                model,
                self.temperature,
                self.timeout,
            )?),
            Provider::Anthropic => Box::new(AnthropicCompletion::new(
                key,
                model,
                self.temperature,
                self.timeout,
            )?),
            Provider::Mock => Box::new(MockCompletion::echo()),
        })
    }

    pub fn search(&self) -> Result<SerpApiSearch> {
        SerpApiSearch::new(self.serpapi_api_key.clone(), self.timeout)
    }
}
