use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::MirtarbaseError;
use crate::store::DataDir;

pub const MIRTARBASE_VERSION: &str = "6.1";

pub const CONNECTION_ENV: &str = "MIRTARBASE_CONNECTION";
pub const SOURCE_ENV: &str = "MIRTARBASE_SOURCE";

pub fn default_source_url() -> String {
    format!(
        "http://mirtarbase.mbc.nctu.edu.tw/cache/download/{MIRTARBASE_VERSION}/miRTarBase_MTI.xlsx"
    )
}

/// Contents of the optional `config.json`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub hgnc_url: Option<String>,
    #[serde(default)]
    pub xref_dir: Option<String>,
}

/// Values supplied on the command line; these win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub connection: Option<String>,
    pub source: Option<String>,
}

/// Values read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub connection: Option<String>,
    pub source: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            connection: read_env(CONNECTION_ENV),
            source: read_env(SOURCE_ENV),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: String,
    pub source: String,
    pub hgnc_url: Option<String>,
    pub xref_dir: Utf8PathBuf,
    pub data_dir: DataDir,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.config_dir().join("mirtarbase").join("config.json"))
    }

    /// Reads a config file. A missing default file is not an error; an explicit
    /// path that does not exist is.
    pub fn load(path: Option<&str>) -> Result<Config, MirtarbaseError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => match Self::default_config_path() {
                Some(path) => path,
                None => return Ok(Config::default()),
            },
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MirtarbaseError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| MirtarbaseError::ConfigParse(err.to_string()))
    }

    pub fn resolve(
        config_path: Option<&str>,
        overrides: Overrides,
    ) -> Result<Settings, MirtarbaseError> {
        let config = Self::load(config_path)?;
        let data_dir = DataDir::new()?;
        Ok(Self::resolve_with(
            overrides,
            Environment::from_process(),
            config,
            data_dir,
        ))
    }

    /// Applies precedence: explicit argument, then environment, then config
    /// file, then built-in defaults under the data directory.
    pub fn resolve_with(
        overrides: Overrides,
        env: Environment,
        config: Config,
        data_dir: DataDir,
    ) -> Settings {
        let connection = overrides
            .connection
            .or(env.connection)
            .or(config.connection)
            .unwrap_or_else(|| data_dir.default_connection());
        let source = overrides
            .source
            .or(env.source)
            .or(config.source)
            .unwrap_or_else(default_source_url);
        let xref_dir = config
            .xref_dir
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| data_dir.xref_dir());

        Settings {
            connection,
            source,
            hgnc_url: config.hgnc_url,
            xref_dir,
            data_dir,
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
