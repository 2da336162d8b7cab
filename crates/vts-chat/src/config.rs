//! Settings read from the environment.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;

use vts_chat_gemini_model::{GeminiConfig, GeminiConfigBuilder};

/// Holds the API credential of the chat model.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// An invalid or missing setting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    key: &'static str,
    reason: &'static str,
}

impl ConfigError {
    /// The offending variable.
    #[inline]
    pub fn key(&self) -> &str {
        self.key
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.key, self.reason)
    }
}

impl StdError for ConfigError {}

/// Everything the front end needs to start a session.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Credential for the chat model.
    pub api_key: String,
    /// Overrides the default model name.
    pub model: Option<String>,
    /// Overrides the API endpoint, mostly for proxies.
    pub base_url: Option<String>,
    /// Where `response.txt` and `response.mp3` are written.
    pub output_dir: PathBuf,
    /// Command used to play the audio artifact.
    pub audio_player: Option<String>,
    /// Whether replies are revealed with the typing cadence.
    pub typing_effect: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_dir", &self.output_dir)
            .field("audio_player", &self.audio_player)
            .field("typing_effect", &self.typing_effect)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => warn!("ignoring .env: {err}"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_key = non_empty(API_KEY_VAR).ok_or(ConfigError {
            key: API_KEY_VAR,
            reason: "is not set",
        })?;
        let typing_effect = match non_empty("VTS_TYPING_EFFECT").as_deref() {
            None => true,
            Some(value) => parse_switch(value).ok_or(ConfigError {
                key: "VTS_TYPING_EFFECT",
                reason: "must be on or off",
            })?,
        };

        Ok(Self {
            api_key,
            model: non_empty("VTS_MODEL"),
            base_url: non_empty("GEMINI_BASE_URL"),
            output_dir: non_empty("VTS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            audio_player: non_empty("VTS_AUDIO_PLAYER"),
            typing_effect,
        })
    }

    /// Provider settings derived from this configuration.
    pub fn gemini_config(&self) -> GeminiConfig {
        let mut builder = GeminiConfigBuilder::with_api_key(&self.api_key);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
