use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, path::PathBuf, time::Duration};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_AUDIO_DIR: &str = "audio";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CLASSIFIER_URL: &str = "https://api-inference.huggingface.co/models/xbgoose/hubert-large-speech-emotion-recognition-russian-dusha-finetuned";
pub const ENV_HUGGINGFACE_TOKEN: &str = "HUGGINGFACE_TOKEN";
pub const ENV_HOST: &str = "STRESS_HOST";
pub const ENV_PORT: &str = "STRESS_PORT";
pub const ENV_AUDIO_DIR: &str = "STRESS_AUDIO_DIR";
pub const ENV_CLASSIFIER_URL: &str = "STRESS_CLASSIFIER_URL";
pub const ENV_SERIALIZE_CLASSIFIER: &str = "STRESS_SERIALIZE_CLASSIFIER";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(**redacted**)")
    }
}

/// Directory the fetcher writes downloaded audio into.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageDir(PathBuf);

impl StorageDir {
    pub fn new<P: Into<PathBuf>>(value: P) -> Result<Self, ConfigError> {
        let p = value.into();
        if p.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStorageDir);
        }
        Ok(Self(p))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Default for StorageDir {
    fn default() -> Self {
        Self(PathBuf::from(DEFAULT_AUDIO_DIR))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub token: Option<ApiToken>,
    /// Route every classify call through a single critical section.
    pub serialize: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CLASSIFIER_URL.to_owned(),
            token: None,
            serialize: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub storage: StorageDir,
    pub fetch_timeout: Duration,
    pub classifier: ClassifierConfig,
}

impl ServiceConfig {
    pub fn bind_addr(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
        if port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidHost(host.to_owned()))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            storage: StorageDir::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            classifier: ClassifierConfig::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api token must not be empty")]
    EmptyToken,
    #[error("storage directory must not be empty")]
    EmptyStorageDir,
    #[error("port must be > 0")]
    ZeroPort,
    #[error("invalid bind host: {0}")]
    InvalidHost(String),
    #[error("invalid boolean value for {key}: {value}")]
    InvalidBool { key: String, value: String },
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_token(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiToken>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiToken::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiToken::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

/// Accepts `true`/`1`/`t` (any case) as true and `false`/`0`/`f`/empty as false.
pub fn resolve_bool(
    cli_value: Option<bool>,
    env_key: &str,
    env: &impl Env,
    default: bool,
) -> Result<bool, ConfigError> {
    if let Some(v) = cli_value {
        return Ok(v);
    }
    let Some(raw) = env.var(env_key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "t" => Ok(true),
        "false" | "0" | "f" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: env_key.to_owned(),
            value: raw,
        }),
    }
}
