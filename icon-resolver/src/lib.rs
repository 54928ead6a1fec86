///! Icon resolver
///!
///! Resolves icon definitions by name from in-memory storage and fetches the
///! missing ones from redundant API hosts.
pub mod config;
pub mod error;
pub mod logging;
pub mod module;

pub use error::{IconSetError, LoadError, QueryError};
pub use module::api::{ApiRegistry, HttpTransport, IconTransport, PartialProviderConfig};
pub use module::loader::{IconLoader, LoadReport};
pub use module::storage::{IconBucket, IconLookup, IconStore};
