///! In-memory icon storage
///!
///! Icons are grouped into buckets keyed by (provider, prefix). Each bucket
///! keeps the resolved definitions plus the names the API reported missing,
///! so those are not requested again.
mod bucket;
mod store;

pub use bucket::{IconBucket, IconLookup};
pub use store::IconStore;
