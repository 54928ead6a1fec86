///! Icon set payloads: validation, parsing and ingestion into a bucket
mod parse;
mod validate;

pub use parse::{parse_icon_set, resolve_alias};
pub use validate::{check_icon_set_shape, quickly_validate, validate_icon_set};

use icon_common::IconSet;
use tracing::debug;

use crate::module::storage::IconBucket;

/// Store every entry of `set` in `bucket`
///
/// Icons and aliases are `put`, `not_found` names become missing markers.
/// Icons that fail validation are skipped individually.
///
/// # Returns
/// Names of the icons that were stored
pub fn add_icon_set(bucket: &mut IconBucket, set: &IconSet) -> Vec<String> {
    let mut added = Vec::new();
    let mut rejected = 0usize;

    parse_icon_set(set, |name, data| match data {
        Some(data) => {
            if bucket.put(name, data) {
                added.push(name.to_string());
            } else {
                rejected += 1;
            }
        }
        None => bucket.mark_missing(name),
    });

    if set.last_modified.is_some() {
        bucket.set_last_modified(set.last_modified);
    }

    debug!(
        "Ingested '{}' into {}: {} stored, {} rejected",
        set.prefix,
        bucket.label(),
        added.len(),
        rejected
    );
    added
}
