///! Icon API access: provider configs, host redundancy, queries and transport
pub mod config;
pub mod query;
pub mod redundancy;
pub mod transport;

pub use config::{
    default_provider_hosts, fallback_hosts, ApiRegistry, PartialProviderConfig, ProviderConfig,
};
pub use query::{build_icon_queries, IconsQuery};
pub use redundancy::{AttemptOutcome, QueryOptions, QuerySuccess, Redundancy};
pub use transport::{HttpTransport, IconTransport};
