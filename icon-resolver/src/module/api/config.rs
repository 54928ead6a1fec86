///! Per-provider API configuration registry
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use super::redundancy::Redundancy;

/// Primary API host of the default provider
pub const PRIMARY_API_HOST: &str = "https://api.iconify.design";

/// Fallback hosts of the default provider, permuted once per registry
pub const FALLBACK_API_HOSTS: &[&str] = &["https://api.simplesvg.com", "https://api.unisvg.com"];

const DEFAULT_PATH: &str = "/";
const DEFAULT_MAX_URL: usize = 500;
const DEFAULT_ROTATE_MS: u64 = 750;
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_LIMIT: u32 = 2;

/// Provider configuration as supplied by the user, every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialProviderConfig {
    /// Candidate API hosts
    #[serde(default, alias = "hosts")]
    pub resources: Option<Vec<String>>,

    /// Root path, after the host and before the prefix
    #[serde(default)]
    pub path: Option<String>,

    /// URL length limit
    #[serde(default, rename = "maxURL", alias = "max_url")]
    pub max_url: Option<usize>,

    /// Milliseconds before the next host is raced against a slow one
    #[serde(default)]
    pub rotate: Option<u64>,

    /// Milliseconds before a single attempt is given up
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Attempts per host
    #[serde(default)]
    pub limit: Option<u32>,

    /// Permute host order once when the config is registered
    #[serde(default)]
    pub random: Option<bool>,

    /// Index of the first host to try
    #[serde(default)]
    pub index: Option<usize>,
}

impl PartialProviderConfig {
    pub fn with_resources<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: Some(resources.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}

/// Fully resolved provider configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderConfig {
    pub resources: Vec<String>,
    pub path: String,
    pub max_url: usize,
    pub rotate: u64,
    pub timeout: u64,
    pub limit: u32,
    pub random: bool,
    pub index: usize,
}

impl ProviderConfig {
    /// Merge a partial config over the defaults
    ///
    /// Returns `None` when no hosts are given. Zero values count as unset.
    pub fn from_partial(source: &PartialProviderConfig) -> Option<Self> {
        let resources = source.resources.as_ref().filter(|hosts| !hosts.is_empty())?;
        let non_zero_u64 = |value: Option<u64>, default: u64| value.filter(|v| *v > 0).unwrap_or(default);

        Some(Self {
            resources: resources.clone(),
            path: source.path.clone().unwrap_or_else(|| DEFAULT_PATH.to_string()),
            max_url: source.max_url.filter(|v| *v > 0).unwrap_or(DEFAULT_MAX_URL),
            rotate: non_zero_u64(source.rotate, DEFAULT_ROTATE_MS),
            timeout: non_zero_u64(source.timeout, DEFAULT_TIMEOUT_MS),
            limit: source.limit.filter(|v| *v > 0).unwrap_or(DEFAULT_LIMIT),
            random: source.random == Some(true),
            index: source.index.unwrap_or(0),
        })
    }

    pub fn rotate_duration(&self) -> Duration {
        Duration::from_millis(self.rotate)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Start index clamped into the host list
    pub fn start_index(&self) -> usize {
        self.index % self.resources.len()
    }

    /// Length of the longest configured host
    pub fn longest_host(&self) -> usize {
        self.resources.iter().map(String::len).max().unwrap_or(0)
    }
}

/// Fallback hosts in an order derived from `seed`
pub fn fallback_hosts(seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hosts: Vec<String> = FALLBACK_API_HOSTS.iter().map(|h| h.to_string()).collect();
    hosts.shuffle(&mut rng);
    hosts
}

/// Host list of the default provider for a given seed
pub fn default_provider_hosts(seed: u64) -> Vec<String> {
    let mut hosts = vec![PRIMARY_API_HOST.to_string()];
    hosts.extend(fallback_hosts(seed));
    hosts
}

/// Registry of provider configs and their live redundancy state
pub struct ApiRegistry {
    providers: RwLock<HashMap<String, Arc<Redundancy>>>,
    rng: Mutex<StdRng>,
}

impl ApiRegistry {
    /// Empty registry; `random` configs are shuffled from entropy
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Empty registry with reproducible host shuffling
    pub fn with_seed(seed: u64) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Registry with the default provider (`""`) installed
    ///
    /// The fallback host order is derived from `seed`.
    pub fn with_default_provider(seed: u64) -> Self {
        let registry = Self::with_seed(seed);
        registry.set_config("", PartialProviderConfig::with_resources(default_provider_hosts(seed)));
        registry
    }

    /// Process-wide registry with the default provider installed
    pub fn global() -> &'static ApiRegistry {
        static GLOBAL: OnceLock<ApiRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| ApiRegistry::with_default_provider(rand::random()))
    }

    /// Register the config for `provider`
    ///
    /// # Returns
    /// `false` when the config has no hosts; the previous config is kept
    pub fn set_config(&self, provider: &str, partial: PartialProviderConfig) -> bool {
        let Some(mut config) = ProviderConfig::from_partial(&partial) else {
            debug!("Ignoring config for provider '{}': no hosts", provider);
            return false;
        };

        if config.random {
            config.resources.shuffle(&mut *self.rng.lock());
        }

        info!(
            "Registered API provider '{}' with {} host(s)",
            provider,
            config.resources.len()
        );
        let redundancy = Arc::new(Redundancy::new(provider, config));
        self.providers.write().insert(provider.to_string(), redundancy);
        true
    }

    pub fn get_config(&self, provider: &str) -> Option<Arc<ProviderConfig>> {
        self.providers
            .read()
            .get(provider)
            .map(|redundancy| redundancy.config().clone())
    }

    /// Live redundancy state for `provider`
    pub fn redundancy(&self, provider: &str) -> Option<Arc<Redundancy>> {
        self.providers.read().get(provider).cloned()
    }

    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::new()
    }
}
