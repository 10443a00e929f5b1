use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub mod access;

pub use access::{get_access, Credentials};

/// Connection details for one named data source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    /// Database holding the source's data
    pub database: String,
    /// Name of the source's line in the access file
    pub access_key: String,
    #[serde(default = "default_true")]
    pub ssl: bool,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub access_file: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Access file {path} not found or has incorrect permissions. Access denied.")]
    AccessDenied { path: PathBuf },
    #[error("Data source name {0} not found in access file. Access denied.")]
    SourceNotFound(String),
    #[error("Malformed access file line {line}: {reason}")]
    MalformedAccessLine { line: usize, reason: String },
    #[error("Database {0} not found")]
    UnknownSource(String),
}

/// Built-in LBNL-hosted sources
pub fn builtin_sources() -> BTreeMap<String, SourceConfig> {
    let mut sources = BTreeMap::new();
    sources.insert(
        "wifi".to_string(),
        SourceConfig {
            host: "eln-data-store.lbl.gov".to_string(),
            port: 9003,
            database: "wifi".to_string(),
            access_key: "wifi".to_string(),
            ssl: true,
            verify_ssl: true,
        },
    );
    sources.insert(
        "building59".to_string(),
        SourceConfig {
            host: "mpcdata.lbl.gov".to_string(),
            port: 8086,
            database: "dhblum".to_string(),
            access_key: "IDBC".to_string(),
            ssl: true,
            verify_ssl: true,
        },
    );
    sources
}

impl AppConfig {
    /// Load configuration from DAQ_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DAQ_CONFIG").unwrap_or_else(|_| "daq.toml".to_string());
        Self::from_path(path)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Look up a source, configured entries taking precedence over built-ins
    pub fn source(&self, name: &str) -> Result<SourceConfig, ConfigError> {
        self.sources
            .get(name)
            .cloned()
            .or_else(|| builtin_sources().remove(name))
            .ok_or_else(|| ConfigError::UnknownSource(name.to_string()))
    }

    /// Access file path: DAQ_ACCESS_FILE, then the config, then `access.config`
    pub fn access_file_path(&self) -> PathBuf {
        std::env::var("DAQ_ACCESS_FILE")
            .ok()
            .or_else(|| self.access_file.clone())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("access.config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_building59() {
        let cfg = AppConfig::default();
        let src = cfg.source("building59").unwrap();
        assert_eq!(src.host, "mpcdata.lbl.gov");
        assert_eq!(src.port, 8086);
        assert_eq!(src.database, "dhblum");
        assert_eq!(src.access_key, "IDBC");
        assert!(src.ssl && src.verify_ssl);

        let wifi = cfg.source("wifi").unwrap();
        assert_eq!(wifi.port, 9003);
        assert_eq!(wifi.database, "wifi");
    }

    #[test]
    fn unknown_source() {
        let cfg = AppConfig::default();
        assert!(matches!(
            cfg.source("building90"),
            Err(ConfigError::UnknownSource(_))
        ));
    }

    #[test]
    fn toml_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daq.toml");
        fs::write(
            &path,
            r#"
access_file = "/etc/daq/access.config"
timeout_secs = 30

[sources.building59]
host = "localhost"
port = 8086
database = "test59"
access_key = "local"
ssl = false
"#,
        )
        .unwrap();

        let cfg = AppConfig::from_path(&path).unwrap();
        assert_eq!(cfg.timeout_secs, Some(30));
        assert_eq!(cfg.access_file.as_deref(), Some("/etc/daq/access.config"));
        let src = cfg.source("building59").unwrap();
        assert_eq!(src.host, "localhost");
        assert!(!src.ssl);
        assert!(src.verify_ssl);
        // untouched built-in still resolves
        assert_eq!(cfg.source("wifi").unwrap().host, "eln-data-store.lbl.gov");
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::from_path(dir.path().join("nope.toml")).unwrap();
        assert!(cfg.sources.is_empty());
        assert!(cfg.timeout_secs.is_none());
    }

    #[test]
    fn invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daq.toml");
        fs::write(&path, "sources = [").unwrap();
        assert!(matches!(
            AppConfig::from_path(&path),
            Err(ConfigError::Toml(_))
        ));
    }
}
