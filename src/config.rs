use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub audio: AudioSettings,
    pub dictation: DictationConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Websocket base, e.g. "wss://api.example.com/v1/server"
    pub ws_url: String,
    /// REST base for the note endpoints
    pub http_url: String,
    /// Bearer credential; prefer the AMBIENT_SCRIBE_API__API_KEY
    /// environment variable over the file for anything non-local
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub frame_duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct DictationConfig {
    pub locale: String,
    pub explicit_punctuation: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("AMBIENT_SCRIBE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
