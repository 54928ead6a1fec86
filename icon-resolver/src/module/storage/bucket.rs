use icon_common::{validate_fragment, IconData};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of looking up a name in a bucket
#[derive(Debug, Clone, PartialEq)]
pub enum IconLookup {
    /// Known and present
    Found(Arc<IconData>),
    /// Known to be absent upstream, do not fetch again
    Missing,
    /// Never looked up, a fetch may find it
    Unknown,
}

impl IconLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, IconLookup::Found(_))
    }

    pub fn data(&self) -> Option<&Arc<IconData>> {
        match self {
            IconLookup::Found(data) => Some(data),
            _ => None,
        }
    }
}

/// Icons of one (provider, prefix) pair
///
/// A name is never both stored and marked missing.
#[derive(Debug, Clone, Default)]
pub struct IconBucket {
    provider: String,
    prefix: String,
    icons: IndexMap<String, Arc<IconData>>,
    missing: HashSet<String>,
    last_modified: Option<u64>,
}

impl IconBucket {
    pub fn new(provider: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Human readable bucket name for logs
    pub fn label(&self) -> String {
        format!("'{}:{}'", self.provider, self.prefix)
    }

    pub fn has(&self, name: &str) -> bool {
        self.icons.contains_key(name)
    }

    pub fn get(&self, name: &str) -> IconLookup {
        if let Some(data) = self.icons.get(name) {
            IconLookup::Found(data.clone())
        } else if self.missing.contains(name) {
            IconLookup::Missing
        } else {
            IconLookup::Unknown
        }
    }

    /// Store an icon, replacing any previous definition or missing marker
    ///
    /// # Returns
    /// `false` without changing anything when the name or data is invalid
    pub fn put(&mut self, name: &str, data: IconData) -> bool {
        if !validate_fragment(name) || !data.is_renderable() {
            return false;
        }
        self.missing.remove(name);
        self.icons.insert(name.to_string(), Arc::new(data));
        true
    }

    /// Remember that upstream does not have `name`
    ///
    /// Stored definitions take precedence and are never demoted.
    pub fn mark_missing(&mut self, name: &str) {
        if !self.icons.contains_key(name) {
            self.missing.insert(name.to_string());
        }
    }

    /// Stored names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.icons.keys().cloned().collect()
    }

    pub fn missing_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.missing.iter().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn last_modified(&self) -> Option<u64> {
        self.last_modified
    }

    pub fn set_last_modified(&mut self, value: Option<u64>) {
        self.last_modified = value;
    }
}
