//! Application configuration.
//!
//! Every field has a default, so an absent or partial `yatube.toml` is fine.
//! Environment variables override the file:
//!
//! * `YATUBE_CONFIG` path of the TOML file, `yatube.toml` by default;
//! * `YATUBE_LISTEN` listen address;
//! * `YATUBE_SESSION_SECRET` session signing secret.
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use yatube_core::NewGroup;

/// Shortest accepted session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 64;

/// Errors raised while loading the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`Config`].
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top level configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Feed and cache settings.
    pub feed: FeedConfig,
    /// Session and password settings.
    pub auth: AuthConfig,
    /// Uploaded media settings.
    pub media: MediaConfig,
    /// Groups created at start when missing.
    pub groups: Vec<NewGroup>,
}

/// `[server]`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub listen: String,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_owned(),
        }
    }
}

/// `[feed]`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct FeedConfig {
    /// Posts on one feed page.
    pub posts_per_page: usize,
    /// Seconds a rendered index page stays cached.
    pub index_cache_ttl_secs: u64,
    /// Maximum number of cached index pages.
    pub index_cache_capacity: u64,
}
impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            posts_per_page: yatube_core::POSTS_PER_PAGE,
            index_cache_ttl_secs: 20,
            index_cache_capacity: 1000,
        }
    }
}

/// `[auth]`
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Session cookie signing secret. When empty a random secret is
    /// generated at start and sessions do not survive a restart.
    pub session_secret: String,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 iteration count.
    pub hash_iterations: u32,
}
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"..")
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .finish()
    }
}
impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            hash_memory_kib: argon2::Params::DEFAULT_M_COST,
            hash_iterations: argon2::Params::DEFAULT_T_COST,
        }
    }
}

/// `[media]`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory uploaded images are stored in and served from.
    pub root: PathBuf,
}
impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("media"),
        }
    }
}

impl Config {
    /// Loads the file named by `YATUBE_CONFIG` and applies environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("YATUBE_CONFIG").unwrap_or_else(|_| "yatube.toml".to_owned());
        let mut config = Self::load(Path::new(&path))?;
        if let Ok(listen) = env::var("YATUBE_LISTEN") {
            config.server.listen = listen;
        }
        if let Ok(secret) = env::var("YATUBE_SESSION_SECRET") {
            config.auth.session_secret = secret;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.posts_per_page == 0 {
            return Err(ConfigError::Invalid(
                "feed.posts_per_page must be greater than zero".to_owned(),
            ));
        }
        if !self.auth.session_secret.is_empty()
            && self.auth.session_secret.len() < MIN_SECRET_LEN
        {
            return Err(ConfigError::Invalid(format!(
                "auth.session_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.auth.hash_iterations == 0 {
            return Err(ConfigError::Invalid(
                "auth.hash_iterations must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// The session secret, generating a random one when none is configured.
    #[must_use]
    pub fn session_secret(&self) -> Vec<u8> {
        if self.auth.session_secret.is_empty() {
            tracing::warn!("no session secret configured, sessions will not survive a restart");
            (0..4)
                .flat_map(|_| uuid::Uuid::new_v4().simple().to_string().into_bytes())
                .collect()
        } else {
            self.auth.session_secret.clone().into_bytes()
        }
    }
}
