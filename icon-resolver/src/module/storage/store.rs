use icon_common::{FullIcon, IconData, IconName, IconSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::bucket::{IconBucket, IconLookup};
use crate::module::icon_set::{add_icon_set, parse_icon_set, validate_icon_set};

type BucketKey = (String, String);

/// In-memory icon storage, one bucket per (provider, prefix)
///
/// Buckets are created on first access and live as long as the store.
#[derive(Debug, Default)]
pub struct IconStore {
    buckets: RwLock<IndexMap<BucketKey, Arc<RwLock<IconBucket>>>>,
    simple_names: AtomicBool,
}

impl IconStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide store for callers that do not pass one around
    pub fn global() -> &'static IconStore {
        static GLOBAL: OnceLock<IconStore> = OnceLock::new();
        GLOBAL.get_or_init(IconStore::new)
    }

    /// Query or set whether names without provider and prefix are accepted
    pub fn allow_simple_names(&self, allow: Option<bool>) -> bool {
        if let Some(allow) = allow {
            self.simple_names.store(allow, Ordering::Release);
        }
        self.simple_names.load(Ordering::Acquire)
    }

    pub fn simple_names(&self) -> bool {
        self.simple_names.load(Ordering::Acquire)
    }

    /// Parse a name using the store's simple names setting
    pub fn parse_name(&self, name: &str) -> Option<IconName> {
        IconName::parse(name, true, self.simple_names())
    }

    /// Bucket for (provider, prefix), created when missing
    pub fn bucket(&self, provider: &str, prefix: &str) -> Arc<RwLock<IconBucket>> {
        let key = (provider.to_string(), prefix.to_string());
        if let Some(bucket) = self.buckets.read().get(&key) {
            return bucket.clone();
        }

        self.buckets
            .write()
            .entry(key)
            .or_insert_with(|| Arc::new(RwLock::new(IconBucket::new(provider, prefix))))
            .clone()
    }

    fn existing_bucket(&self, provider: &str, prefix: &str) -> Option<Arc<RwLock<IconBucket>>> {
        self.buckets
            .read()
            .get(&(provider.to_string(), prefix.to_string()))
            .cloned()
    }

    /// Look up a parsed name
    pub fn lookup(&self, icon: &IconName) -> IconLookup {
        self.bucket(&icon.provider, &icon.prefix).read().get(&icon.name)
    }

    /// Look up a name string
    ///
    /// # Returns
    /// `None` when the name cannot be parsed
    pub fn get_icon_data(&self, name: &str) -> Option<IconLookup> {
        let icon = self.parse_name(name)?;
        Some(self.lookup(&icon))
    }

    pub fn icon_exists(&self, name: &str) -> bool {
        matches!(self.get_icon_data(name), Some(IconLookup::Found(_)))
    }

    /// Icon with every attribute resolved
    pub fn get_icon(&self, name: &str) -> Option<FullIcon> {
        match self.get_icon_data(name)? {
            IconLookup::Found(data) => Some(data.to_full()),
            _ => None,
        }
    }

    /// Add a single icon by name
    pub fn add_icon(&self, name: &str, data: IconData) -> bool {
        let Some(icon) = self.parse_name(name) else {
            debug!("Rejected icon with invalid name '{}'", name);
            return false;
        };
        self.bucket(&icon.provider, &icon.prefix)
            .write()
            .put(&icon.name, data)
    }

    /// Mark a name as absent upstream
    pub fn mark_missing(&self, icon: &IconName) {
        self.bucket(&icon.provider, &icon.prefix)
            .write()
            .mark_missing(&icon.name);
    }

    /// Add every icon of an icon set
    ///
    /// Provider is `provider`, else the set's own provider, else `""`.
    ///
    /// # Returns
    /// `true` if at least one icon was stored
    pub fn add_collection(&self, set: &IconSet, provider: Option<&str>) -> bool {
        let provider = provider
            .map(str::to_string)
            .or_else(|| set.provider.clone())
            .unwrap_or_default();

        if self.simple_names() && provider.is_empty() && set.prefix.is_empty() {
            return self.add_simple_collection(set);
        }

        if !IconName::new(provider.as_str(), set.prefix.as_str(), "a").is_valid(false) {
            warn!(
                "Rejected icon set with invalid provider/prefix '{}:{}'",
                provider, set.prefix
            );
            return false;
        }

        let bucket = self.bucket(&provider, &set.prefix);
        let added = add_icon_set(&mut bucket.write(), set);
        !added.is_empty()
    }

    /// Simple names: each icon is stored under the name lookups parse it to
    fn add_simple_collection(&self, set: &IconSet) -> bool {
        let mut added = false;

        parse_icon_set(set, |name, data| match data {
            Some(data) => added |= self.add_icon(name, data),
            None => match self.parse_name(name) {
                Some(icon) => self.mark_missing(&icon),
                None => debug!("Ignored missing icon with invalid name '{}'", name),
            },
        });
        added
    }

    /// Validate a raw JSON payload, then add it
    pub fn add_collection_json(&self, value: &Value, provider: Option<&str>) -> bool {
        match validate_icon_set(value) {
            Ok(set) => self.add_collection(&set, provider),
            Err(e) => {
                warn!("Rejected icon set: {}", e);
                false
            }
        }
    }

    /// Stored icon names
    ///
    /// With both `provider` and `prefix` the bucket's bare names are returned.
    /// Otherwise every matching bucket is listed with full names, in the
    /// order buckets were created.
    pub fn list_icons(&self, provider: Option<&str>, prefix: Option<&str>) -> Vec<String> {
        if let (Some(provider), Some(prefix)) = (provider, prefix) {
            return self
                .existing_bucket(provider, prefix)
                .map(|bucket| bucket.read().names())
                .unwrap_or_default();
        }

        let buckets: Vec<Arc<RwLock<IconBucket>>> = self
            .buckets
            .read()
            .iter()
            .filter(|((bucket_provider, bucket_prefix), _)| {
                provider.is_none_or(|p| p == bucket_provider)
                    && prefix.is_none_or(|p| p == bucket_prefix)
            })
            .map(|(_, bucket)| bucket.clone())
            .collect();

        buckets
            .iter()
            .flat_map(|bucket| {
                let bucket = bucket.read();
                bucket
                    .names()
                    .into_iter()
                    .map(|name| IconName::new(bucket.provider(), bucket.prefix(), name).to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
