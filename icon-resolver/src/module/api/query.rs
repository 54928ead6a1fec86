///! Icon API query building
use serde::Serialize;

use super::config::ProviderConfig;

/// One API request: a batch of icon names from a single icon set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconsQuery {
    pub provider: String,
    pub prefix: String,
    pub icons: Vec<String>,
}

impl IconsQuery {
    /// Path and query string, to be appended to a host
    pub fn path(&self, config: &ProviderConfig) -> String {
        format!(
            "{}{}",
            url_base(config, &self.prefix),
            encode_names(&self.icons)
        )
    }

    /// Full URL for `host`
    pub fn url(&self, host: &str, config: &ProviderConfig) -> String {
        format!("{}{}", host.trim_end_matches('/'), self.path(config))
    }
}

fn url_base(config: &ProviderConfig, prefix: &str) -> String {
    format!("{}{}.json?icons=", config.path, prefix)
}

fn encode_names(names: &[String]) -> String {
    names
        .iter()
        .map(|name| urlencoding::encode(name).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split `names` into queries whose URLs stay under `config.max_url`
///
/// The longest configured host is used for the length check, so every host
/// can serve every query. A single name that does not fit on its own still
/// gets a query of its own.
pub fn build_icon_queries(
    config: &ProviderConfig,
    provider: &str,
    prefix: &str,
    names: &[String],
) -> Vec<IconsQuery> {
    let base = config.longest_host() + url_base(config, prefix).len();
    let budget = config.max_url.saturating_sub(base);

    let mut queries = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut length = 0usize;

    for name in names {
        let encoded = urlencoding::encode(name).len();
        // Separator before every name except the first
        let added = if current.is_empty() { encoded } else { encoded + 1 };

        if !current.is_empty() && length + added > budget {
            queries.push(IconsQuery {
                provider: provider.to_string(),
                prefix: prefix.to_string(),
                icons: std::mem::take(&mut current),
            });
            length = 0;
        }

        length += if current.is_empty() { encoded } else { encoded + 1 };
        current.push(name.clone());
    }

    if !current.is_empty() {
        queries.push(IconsQuery {
            provider: provider.to_string(),
            prefix: prefix.to_string(),
            icons: current,
        });
    }

    queries
}
