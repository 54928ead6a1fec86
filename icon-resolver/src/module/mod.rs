///! Icon resolution modules
///!
///! ## Main Components
///! - `api`: provider configs, host redundancy, API queries and transport
///! - `storage`: icon buckets and the store surface
///! - `icon_set`: payload validation, parsing and ingestion
///! - `loader`: store lookups backed by API fetches
pub mod api;
pub mod icon_set;
pub mod loader;
pub mod storage;
