use icon_resolver::config;
use icon_resolver::module::api::{ApiRegistry, HttpTransport};
use icon_resolver::module::loader::IconLoader;
use icon_resolver::module::storage::IconStore;

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

const CONFIG_ENV: &str = "ICON_RESOLVER_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::read_config(&config_path)?;

    // Initialize logging
    let _logging_guard =
        icon_resolver::logging::init_logging(&config.log_dir, "icon-resolver", &config.log_level)?;

    let names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        tracing::warn!("Usage: icon-resolver <prefix:name>...");
        return Ok(());
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    let registry = Arc::new(ApiRegistry::with_default_provider(seed));
    let store = Arc::new(IconStore::new());
    let providers = config.apply(&registry, &store);
    tracing::info!(
        "Resolver ready: {} custom provider(s), simple names {}",
        providers,
        if store.simple_names() { "on" } else { "off" }
    );

    let transport = Arc::new(HttpTransport::new()?);
    let loader = IconLoader::new(store.clone(), registry, transport);

    let report = loader.load_icons(&names).await;

    let icons: BTreeMap<String, _> = report
        .loaded
        .iter()
        .filter_map(|icon| {
            let name = icon.to_string();
            store.get_icon(&name).map(|full| (name, full))
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&icons)?);

    for name in &report.invalid {
        tracing::warn!("Invalid icon name: {}", name);
    }
    for icon in &report.missing {
        tracing::info!("Icon does not exist: {}", icon);
    }
    for icon in &report.pending {
        tracing::warn!("Icon could not be loaded, try again later: {}", icon);
    }

    Ok(())
}
