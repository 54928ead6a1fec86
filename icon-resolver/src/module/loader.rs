///! Icon loader: answers from storage first and fetches the rest from the API
use futures::future::join_all;
use icon_common::{FullIcon, IconName};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LoadError, QueryError};
use crate::module::api::{
    build_icon_queries, ApiRegistry, IconTransport, IconsQuery, QueryOptions, Redundancy,
};
use crate::module::icon_set::add_icon_set;
use crate::module::storage::{IconLookup, IconStore};

/// Outcome of a batch load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Icons available in storage
    pub loaded: Vec<IconName>,
    /// Icons the API reported as absent
    pub missing: Vec<IconName>,
    /// Icons that could not be determined, retry later
    pub pending: Vec<IconName>,
    /// Names that could not be parsed
    pub invalid: Vec<String>,
}

/// Icon lookups backed by the redundant API
pub struct IconLoader {
    store: Arc<IconStore>,
    registry: Arc<ApiRegistry>,
    transport: Arc<dyn IconTransport>,
    options: QueryOptions,
}

impl IconLoader {
    pub fn new(
        store: Arc<IconStore>,
        registry: Arc<ApiRegistry>,
        transport: Arc<dyn IconTransport>,
    ) -> Self {
        Self {
            store,
            registry,
            transport,
            options: QueryOptions::default(),
        }
    }

    /// Options passed to every redundant query
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<IconStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ApiRegistry> {
        &self.registry
    }

    /// Make sure every name is either stored, known missing or reported pending
    ///
    /// Names already known to storage cause no network traffic.
    pub async fn load_icons<S: AsRef<str>>(&self, names: &[S]) -> LoadReport {
        let mut report = LoadReport::default();
        let mut requested = BTreeSet::new();

        for name in names {
            match self.store.parse_name(name.as_ref()) {
                Some(icon) => {
                    requested.insert(icon);
                }
                None => report.invalid.push(name.as_ref().to_string()),
            }
        }

        // Unknown names grouped by (provider, prefix)
        let mut to_fetch: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
        for icon in &requested {
            if self.store.lookup(icon) == IconLookup::Unknown {
                to_fetch
                    .entry((icon.provider.clone(), icon.prefix.clone()))
                    .or_default()
                    .push(icon.name.clone());
            }
        }

        if !to_fetch.is_empty() {
            debug!("Fetching icons from {} icon set(s)", to_fetch.len());
            let fetches = to_fetch
                .into_iter()
                .map(|((provider, prefix), names)| async move {
                    self.fetch_icon_set(&provider, &prefix, names).await
                });
            join_all(fetches).await;
        }

        for icon in requested {
            match self.store.lookup(&icon) {
                IconLookup::Found(_) => report.loaded.push(icon),
                IconLookup::Missing => report.missing.push(icon),
                IconLookup::Unknown => report.pending.push(icon),
            }
        }

        report
    }

    /// Load a single icon
    pub async fn load_icon(&self, name: &str) -> Result<FullIcon, LoadError> {
        let icon = self
            .store
            .parse_name(name)
            .ok_or_else(|| LoadError::InvalidName(name.to_string()))?;

        self.load_icons(&[name]).await;

        match self.store.lookup(&icon) {
            IconLookup::Found(data) => Ok(data.to_full()),
            IconLookup::Missing => Err(LoadError::NotFound(icon.to_string())),
            IconLookup::Unknown => Err(LoadError::Unavailable(icon.to_string())),
        }
    }

    async fn fetch_icon_set(&self, provider: &str, prefix: &str, names: Vec<String>) {
        if prefix.is_empty() {
            debug!(
                "Icons without prefix cannot be fetched: {}",
                names.join(", ")
            );
            return;
        }

        let Some(redundancy) = self.registry.redundancy(provider) else {
            warn!("No API config for provider '{}'", provider);
            return;
        };

        let queries = build_icon_queries(redundancy.config(), provider, prefix, &names);
        let runs = queries
            .into_iter()
            .map(|query| self.run_query(&redundancy, query));
        join_all(runs).await;
    }

    async fn run_query(&self, redundancy: &Redundancy, query: IconsQuery) {
        let query = Arc::new(query);
        let config = redundancy.config().clone();
        let transport = self.transport.clone();

        let result = redundancy
            .query_with(self.options, |host, cancel| {
                let transport = transport.clone();
                let config = config.clone();
                let query = query.clone();
                async move { transport.fetch(&host, &config, &query, cancel).await }
            })
            .await;

        let bucket = self.store.bucket(&query.provider, &query.prefix);
        match result {
            Ok(success) => {
                let mut bucket = bucket.write();
                let added = add_icon_set(&mut bucket, &success.data);
                let mut missing = 0;
                for name in &query.icons {
                    if !bucket.has(name) {
                        bucket.mark_missing(name);
                        missing += 1;
                    }
                }
                info!(
                    "Loaded {} icon(s) for {} from {} ({} missing, {} attempts)",
                    added.len(),
                    bucket.label(),
                    success.host,
                    missing,
                    success.attempts
                );
            }
            Err(QueryError::NotFound { host, reason }) => {
                let mut bucket = bucket.write();
                for name in &query.icons {
                    bucket.mark_missing(name);
                }
                info!(
                    "{} reported {} icon(s) of {} as missing: {}",
                    host,
                    query.icons.len(),
                    bucket.label(),
                    reason
                );
            }
            Err(e @ QueryError::Exhausted { .. }) => {
                warn!(
                    "Could not load {} icon(s) for provider '{}', prefix '{}': {}",
                    query.icons.len(),
                    query.provider,
                    query.prefix,
                    e
                );
            }
        }
    }
}
