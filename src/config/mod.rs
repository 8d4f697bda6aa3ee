mod savedexport;

use std::{
    env,
    ffi::OsString,
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub use savedexport::{ApiCredentials, Config, WindowSizes, parse_app_hash};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    #[error("app_id and app_hash must be set together")]
    PartialCredentials,
    #[error("app hash must be 32 hexadecimal characters")]
    InvalidAppHash,
    #[error("neither {0} nor HOME is set")]
    NoHome(&'static str),
    #[error("could not create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
}

/// `$XDG_CONFIG_HOME/savedexport/config.toml`
pub fn default_location() -> Result<PathBuf, ConfigError> {
    Ok(xdg_dir("XDG_CONFIG_HOME", ".config")?
        .join(env!("CARGO_PKG_NAME"))
        .join("config.toml"))
}

/// Location of the persisted session, with its parent directory created.
pub fn session_file() -> Result<PathBuf, ConfigError> {
    let data_dir = xdg_dir("XDG_DATA_HOME", ".local/share")?.join(env!("CARGO_PKG_NAME"));
    ensure_dir(&data_dir)?;
    Ok(data_dir.join("tg.session"))
}

pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn xdg_dir(variable: &'static str, fallback: &str) -> Result<PathBuf, ConfigError> {
    resolve_xdg_dir(env::var_os(variable), env::var_os("HOME"), fallback)
        .ok_or(ConfigError::NoHome(variable))
}

fn resolve_xdg_dir(
    xdg: Option<OsString>,
    home: Option<OsString>,
    fallback: &str,
) -> Option<PathBuf> {
    // XDG only allows absolute paths
    match xdg.map(PathBuf::from) {
        Some(dir) if dir.is_absolute() => Some(dir),
        _ => home
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(fallback)),
    }
}
