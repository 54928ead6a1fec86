use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::module::api::{ApiRegistry, PartialProviderConfig};
use crate::module::storage::IconStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Accept icon names without provider and prefix
    #[serde(default)]
    pub simple_names: bool,

    /// Seed for the fallback host order, random when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Extra API providers, keyed by provider name
    #[serde(default)]
    pub providers: BTreeMap<String, PartialProviderConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            simple_names: false,
            seed: None,
            providers: BTreeMap::new(),
        }
    }
}

impl ResolverConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: ResolverConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Register providers and storage options
    ///
    /// # Returns
    /// Number of providers that were accepted
    pub fn apply(&self, registry: &ApiRegistry, store: &IconStore) -> usize {
        store.allow_simple_names(Some(self.simple_names));

        let mut accepted = 0;
        for (provider, partial) in &self.providers {
            if registry.set_config(provider, partial.clone()) {
                accepted += 1;
            } else {
                tracing::warn!("Provider '{}' has no hosts, ignored", provider);
            }
        }
        accepted
    }
}

pub static CONFIG: OnceLock<ResolverConfig> = OnceLock::new();

/// Load the config file into [`CONFIG`]
///
/// A missing file yields the defaults.
pub fn read_config(path: impl AsRef<Path>) -> anyhow::Result<&'static ResolverConfig> {
    let path = path.as_ref();
    let config = if path.exists() {
        ResolverConfig::from_file(path)?
    } else {
        ResolverConfig::default()
    };

    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
log_level = "debug"
simple_names = true
seed = 7

[providers.custom]
resources = ["https://icons.example.com", "https://backup.example.com"]
rotate = 300
max_url = 1000

[providers.broken]
path = "/v2/"
"#
        )
        .unwrap();

        let config = ResolverConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_dir, "logs");
        assert!(config.simple_names);
        assert_eq!(config.seed, Some(7));

        let registry = ApiRegistry::with_seed(1);
        let store = IconStore::new();
        assert_eq!(config.apply(&registry, &store), 1);
        assert!(store.allow_simple_names(None));

        let custom = registry.get_config("custom").unwrap();
        assert_eq!(custom.resources.len(), 2);
        assert_eq!(custom.rotate, 300);
        assert_eq!(custom.max_url, 1000);
        assert_eq!(custom.timeout, 5000);
        assert!(registry.get_config("broken").is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "log_level = [").unwrap();
        assert!(ResolverConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_defaults() {
        let config: ResolverConfig = toml::from_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(!config.simple_names);
        assert!(config.providers.is_empty());
    }
}
