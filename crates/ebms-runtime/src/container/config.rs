//! # Core Configuration
//!
//! Selects the implementation of every pluggable component and where
//! P-Modes are loaded from.
//!
//! ## Sources
//!
//! 1. Defaults (in-memory store and repository, basic validator)
//! 2. Optional JSON file named by `EBMS_CONFIG`
//! 3. Environment overrides (`EBMS_HOST_ID`, `EBMS_PMODE_STORE`,
//!    `EBMS_PMODE_VALIDATOR`, `EBMS_PMODE_DIR`, `EBMS_REPOSITORY`,
//!    `EBMS_PRIVATE_KEYS`, `EBMS_CERTIFICATES`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const IN_MEMORY: &str = "in-memory";
pub const BASIC_VALIDATOR: &str = "basic";
pub const ACCEPT_ALL_VALIDATOR: &str = "accept-all";

/// Complete core configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub host_id: HostId,
    pub pmodes: PModeConfig,
    pub storage: StorageConfig,
    pub credentials: CredentialsConfig,
}

/// Right-hand side of generated message ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub String);

impl Default for HostId {
    fn default() -> Self {
        Self("ebms.localhost".into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PModeConfig {
    pub store: String,
    pub validator: String,
    /// Directory with one JSON document per P-Mode, loaded at startup.
    pub directory: Option<PathBuf>,
}

impl Default for PModeConfig {
    fn default() -> Self {
        Self {
            store: IN_MEMORY.into(),
            validator: BASIC_VALIDATOR.into(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub repository: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            repository: IN_MEMORY.into(),
        }
    }
}

/// Key aliases the validator may assume to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// alias -> private key password
    pub private_keys: BTreeMap<String, String>,
    pub certificates: Vec<String>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown {component} implementation '{name}'")]
    UnknownImplementation {
        component: &'static str,
        name: String,
    },

    #[error("Host id must not be empty")]
    EmptyHostId,

    #[error("P-Mode directory {0} does not exist")]
    PModeDirectoryMissing(PathBuf),

    #[error("Malformed value '{value}' for {variable}")]
    MalformedVariable { variable: &'static str, value: String },

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CoreConfig {
    /// Defaults, then the `EBMS_CONFIG` file if set, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os("EBMS_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host_id) = lookup("EBMS_HOST_ID") {
            self.host_id = HostId(host_id);
        }
        if let Some(store) = lookup("EBMS_PMODE_STORE") {
            self.pmodes.store = store;
        }
        if let Some(validator) = lookup("EBMS_PMODE_VALIDATOR") {
            self.pmodes.validator = validator;
        }
        if let Some(dir) = lookup("EBMS_PMODE_DIR") {
            self.pmodes.directory = Some(PathBuf::from(dir));
        }
        if let Some(repository) = lookup("EBMS_REPOSITORY") {
            self.storage.repository = repository;
        }

        // alias:password pairs, comma separated
        if let Some(keys) = lookup("EBMS_PRIVATE_KEYS") {
            for pair in keys.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (alias, password) =
                    pair.split_once(':').ok_or_else(|| ConfigError::MalformedVariable {
                        variable: "EBMS_PRIVATE_KEYS",
                        value: pair.to_string(),
                    })?;
                self.credentials
                    .private_keys
                    .insert(alias.to_string(), password.to_string());
            }
        }
        if let Some(aliases) = lookup("EBMS_CERTIFICATES") {
            self.credentials.certificates.extend(
                aliases
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(())
    }

    /// Rejects unknown implementation names and unusable settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_id.0.trim().is_empty() {
            return Err(ConfigError::EmptyHostId);
        }
        expect_one_of("P-Mode store", &self.pmodes.store, &[IN_MEMORY])?;
        expect_one_of(
            "P-Mode validator",
            &self.pmodes.validator,
            &[BASIC_VALIDATOR, ACCEPT_ALL_VALIDATOR],
        )?;
        expect_one_of("message unit repository", &self.storage.repository, &[IN_MEMORY])?;

        if let Some(dir) = &self.pmodes.directory {
            if !dir.is_dir() {
                return Err(ConfigError::PModeDirectoryMissing(dir.clone()));
            }
        }
        Ok(())
    }
}

fn expect_one_of(component: &'static str, name: &str, known: &[&str]) -> Result<(), ConfigError> {
    if known.contains(&name) {
        Ok(())
    } else {
        Err(ConfigError::UnknownImplementation {
            component,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.pmodes.store, IN_MEMORY);
        assert_eq!(config.pmodes.validator, BASIC_VALIDATOR);
        assert_eq!(config.storage.repository, IN_MEMORY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = CoreConfig::default();
        config
            .apply_overrides(env(&[
                ("EBMS_HOST_ID", "gw.example"),
                ("EBMS_PMODE_VALIDATOR", "accept-all"),
                ("EBMS_PRIVATE_KEYS", "ours:secret, backup:other"),
                ("EBMS_CERTIFICATES", "partner-a,partner-b"),
            ]))
            .unwrap();

        assert_eq!(config.host_id, HostId("gw.example".into()));
        assert_eq!(config.pmodes.validator, ACCEPT_ALL_VALIDATOR);
        assert_eq!(config.credentials.private_keys.get("ours").map(String::as_str), Some("secret"));
        assert_eq!(config.credentials.private_keys.len(), 2);
        assert_eq!(config.credentials.certificates, vec!["partner-a", "partner-b"]);
    }

    #[test]
    fn test_malformed_private_keys() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_overrides(env(&[("EBMS_PRIVATE_KEYS", "no-password")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedVariable { .. }));
    }

    #[test]
    fn test_unknown_implementation_rejected() {
        let mut config = CoreConfig::default();
        config.storage.repository = "postgres".into();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown message unit repository implementation 'postgres'"
        );
    }

    #[test]
    fn test_missing_pmode_directory_rejected() {
        let mut config = CoreConfig::default();
        config.pmodes.directory = Some(PathBuf::from("/nonexistent/ebms/pmodes"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PModeDirectoryMissing(_))
        ));
    }

    #[test]
    fn test_partial_json_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("core.json");
        std::fs::write(&path, r#"{ "pmodes": { "validator": "accept-all" } }"#).unwrap();

        let config = CoreConfig::from_file(&path).unwrap();
        assert_eq!(config.pmodes.validator, ACCEPT_ALL_VALIDATOR);
        assert_eq!(config.pmodes.store, IN_MEMORY);
        assert_eq!(config.host_id, HostId::default());
    }
}
