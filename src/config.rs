//! Provider configuration
//!
//! Values are layered: built-in defaults, then an optional configuration
//! file, then `K8S_CRD_PROVIDER__*` environment variables
//! (e.g. `K8S_CRD_PROVIDER__LOGGING__LEVEL=debug`).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;

/// Default configuration file, read when present in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "k8s-crd-provider.yaml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "K8S_CRD_PROVIDER";

/// Provider configuration
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Configuration {
    /// Prefix of every resource type name
    #[serde(default = "default_type_prefix")]
    pub type_prefix: String,

    /// Register the CRDs that ship with the provider
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    /// Extra CRD files or directories
    #[serde(default)]
    pub crd_paths: Vec<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            type_prefix: default_type_prefix(),
            include_builtin: true,
            crd_paths: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_type_prefix() -> String {
    "k8s".to_string()
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output logs in JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Configuration {
    /// Load configuration, reading `path` (which must exist) or the default file if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .set_default("type_prefix", default_type_prefix())?
            .set_default("include_builtin", true)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("crd_paths")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_default_impl() {
        let loaded: Configuration = serde_yaml::from_str("{}").unwrap();
        assert_eq!(loaded, Configuration::default());
    }

    #[test]
    fn loads_an_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "type_prefix: crd\ninclude_builtin: false\ncrd_paths: [/etc/crds]\nlogging:\n  json: true"
        )
        .unwrap();

        let config = Configuration::load(Some(file.path())).unwrap();
        assert_eq!(config.type_prefix, "crd");
        assert!(!config.include_builtin);
        assert_eq!(config.crd_paths, vec![PathBuf::from("/etc/crds")]);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn environment_overrides_the_file() {
        let prefix = "K8S_CRD_PROVIDER_ENV_TEST";
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "type_prefix: file\nlogging:\n  level: warn").unwrap();

        std::env::set_var(format!("{}__TYPE_PREFIX", prefix), "crd");
        std::env::set_var(format!("{}__INCLUDE_BUILTIN", prefix), "false");
        std::env::set_var(format!("{}__CRD_PATHS", prefix), "/a,/b");
        std::env::set_var(format!("{}__LOGGING__JSON", prefix), "true");

        let config = Configuration::load_with_prefix(Some(file.path()), prefix).unwrap();
        assert_eq!(config.type_prefix, "crd");
        assert!(!config.include_builtin);
        assert_eq!(
            config.crd_paths,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Configuration::load(Some(Path::new("/definitely/not/here.yaml"))).is_err());
    }
}
