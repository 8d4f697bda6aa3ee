use std::{
    fs::read_to_string,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use derive_getters::Getters;
use log::debug;
use serde::Deserialize;

use crate::{
    config::{ConfigError, default_location},
    remote::AccountTier,
};

// Public test credentials of the official desktop client.
const TEST_APP_ID: i32 = 17349;
const TEST_APP_HASH: &str = "344583e45741c457fe1862106095a5eb";

const ORDINARY_WINDOW: NonZeroUsize = NonZeroUsize::new(200).expect("200 is not zero");
const ELEVATED_WINDOW: NonZeroUsize = NonZeroUsize::new(400).expect("400 is not zero");

#[derive(Debug, Deserialize, Getters)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "bridge_cmd")]
    bridge_cmd: String,
    #[serde(default = "directory")]
    directory: PathBuf,
    #[serde(default = "extension")]
    extension: String,
    #[getter(skip)]
    #[serde(default)]
    window_size: WindowSizes,
    #[getter(skip)]
    #[serde(default)]
    app_id: Option<i32>,
    #[getter(skip)]
    #[serde(default)]
    app_hash: Option<String>,
}

/// Listing window per account tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowSizes {
    ordinary: NonZeroUsize,
    elevated: NonZeroUsize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    app_id: i32,
    app_hash: String,
}

impl Config {
    /// Loads `file`, or the default location if none is given. A missing
    /// default file yields the default configuration.
    pub fn load_from_file(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = if let Some(file) = file {
            file.to_path_buf()
        } else {
            let file = default_location()?;
            if !file.try_exists().map_err(|source| ConfigError::Read {
                path: file.clone(),
                source,
            })? {
                debug!("no config file at {}, using defaults", file.display());
                return Ok(Self::default());
            }
            file
        };

        debug!("loading config from {}", file.display());
        let contents = read_to_string(&file).map_err(|source| ConfigError::Read {
            path: file.clone(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: file,
            source: Box::new(source),
        })?;
        config.credentials()?;

        Ok(config)
    }

    pub fn window_size(&self) -> WindowSizes {
        self.window_size
    }

    /// Configured API credentials, or the test credentials if none are set.
    pub fn credentials(&self) -> Result<ApiCredentials, ConfigError> {
        match (self.app_id, &self.app_hash) {
            (Some(app_id), Some(app_hash)) => ApiCredentials::new(app_id, app_hash),
            (None, None) => Ok(ApiCredentials::default()),
            _ => Err(ConfigError::PartialCredentials),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_cmd: bridge_cmd(),
            directory: directory(),
            extension: extension(),
            window_size: WindowSizes::default(),
            app_id: None,
            app_hash: None,
        }
    }
}

impl WindowSizes {
    pub fn for_tier(self, tier: AccountTier) -> NonZeroUsize {
        match tier {
            AccountTier::Ordinary => self.ordinary,
            AccountTier::Elevated => self.elevated,
        }
    }
}

impl Default for WindowSizes {
    fn default() -> Self {
        Self {
            ordinary: ORDINARY_WINDOW,
            elevated: ELEVATED_WINDOW,
        }
    }
}

impl ApiCredentials {
    pub fn new(app_id: i32, app_hash: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            app_id,
            app_hash: parse_app_hash(app_hash)?,
        })
    }

    pub fn app_id(&self) -> i32 {
        self.app_id
    }

    pub fn app_hash(&self) -> &str {
        &self.app_hash
    }
}

impl Default for ApiCredentials {
    fn default() -> Self {
        Self {
            app_id: TEST_APP_ID,
            app_hash: TEST_APP_HASH.to_string(),
        }
    }
}

/// Accepts exactly 32 hexadecimal characters.
pub fn parse_app_hash(value: &str) -> Result<String, ConfigError> {
    if value.len() == 32 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidAppHash)
    }
}

fn bridge_cmd() -> String {
    format!("{}-bridge", env!("CARGO_PKG_NAME"))
}

fn directory() -> PathBuf {
    PathBuf::from("gifs")
}

fn extension() -> String {
    "mp4".to_string()
}
