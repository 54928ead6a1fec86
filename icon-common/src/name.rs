use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Legal characters for provider, prefix and icon name fragments
static FRAGMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid fragment pattern"));

/// Check a single name fragment (provider, prefix or name)
pub fn validate_fragment(value: &str) -> bool {
    FRAGMENT_PATTERN.is_match(value)
}

/// Icon name split into its provider, prefix and name parts
///
/// Accepted string forms:
/// * `@provider:prefix:name`
/// * `provider:prefix:name`
/// * `prefix:name`
/// * `prefix-name` (split at the first dash)
/// * `name`, only when simple names are allowed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconName {
    pub provider: String,
    pub prefix: String,
    pub name: String,
}

impl IconName {
    pub fn new(
        provider: impl Into<String>,
        prefix: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    /// Parse an icon name string
    ///
    /// # Arguments
    /// * `value` - Icon name as written by the user
    /// * `validate` - Reject names with illegal fragments
    /// * `allow_simple` - Accept bare names without provider and prefix
    ///
    /// # Returns
    /// `None` for anything that cannot be parsed, never panics
    pub fn parse(value: &str, validate: bool, allow_simple: bool) -> Option<Self> {
        let mut parts: Vec<&str> = value.split(':').collect();
        let mut provider = "";

        if value.starts_with('@') {
            if parts.len() < 2 || parts.len() > 3 {
                return None;
            }
            let first = parts.remove(0);
            provider = &first[1..];
        }

        if parts.is_empty() || parts.len() > 3 {
            return None;
        }

        if parts.len() > 1 {
            // provider:prefix:name or prefix:name
            let name = parts.pop()?;
            let prefix = parts.pop()?;
            if let Some(&explicit) = parts.first() {
                provider = explicit;
            }
            let result = Self::new(provider, prefix, name);
            return (!validate || result.is_valid(false)).then_some(result);
        }

        let single = parts[0];
        if let Some((prefix, name)) = single.split_once('-') {
            let result = Self::new(provider, prefix, name);
            return (!validate || result.is_valid(false)).then_some(result);
        }

        if allow_simple && provider.is_empty() {
            let result = Self::new("", "", single);
            return (!validate || result.is_valid(true)).then_some(result);
        }

        None
    }

    /// Check every fragment of the name
    ///
    /// Provider may be empty. Prefix may only be empty when `allow_simple` is set.
    pub fn is_valid(&self, allow_simple: bool) -> bool {
        (self.provider.is_empty() || validate_fragment(&self.provider))
            && ((allow_simple && self.prefix.is_empty()) || validate_fragment(&self.prefix))
            && validate_fragment(&self.name)
    }
}

impl fmt::Display for IconName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.provider.is_empty() {
            write!(f, "@{}:", self.provider)?;
        }
        if !self.prefix.is_empty() {
            write!(f, "{}:", self.prefix)?;
        }
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefix_and_name() {
        let icon = IconName::parse("mdi:home", true, false).unwrap();
        assert_eq!(icon, IconName::new("", "mdi", "home"));

        let icon = IconName::parse("mdi-light:account-alert", true, false).unwrap();
        assert_eq!(icon, IconName::new("", "mdi-light", "account-alert"));
    }

    #[test]
    fn test_parse_with_provider() {
        let icon = IconName::parse("@custom:mdi:home", true, false).unwrap();
        assert_eq!(icon, IconName::new("custom", "mdi", "home"));

        let icon = IconName::parse("custom:mdi:home", true, false).unwrap();
        assert_eq!(icon, IconName::new("custom", "mdi", "home"));

        // Provider with dash form
        let icon = IconName::parse("@custom:mdi-home", true, false).unwrap();
        assert_eq!(icon, IconName::new("custom", "mdi", "home"));
    }

    #[test]
    fn test_parse_dash_form() {
        let icon = IconName::parse("fa-solid-home", true, false).unwrap();
        assert_eq!(icon, IconName::new("", "fa", "solid-home"));
    }

    #[test]
    fn test_simple_names() {
        assert!(IconName::parse("home", true, false).is_none());

        let icon = IconName::parse("home", true, true).unwrap();
        assert_eq!(icon, IconName::new("", "", "home"));

        // Provider without prefix is never simple
        assert!(IconName::parse("@custom:home", true, true).is_none());
    }

    #[test]
    fn test_malformed_names() {
        for value in [
            "",
            ":",
            "mdi:",
            ":home",
            "a:b:c:d",
            "@a",
            "@a:b:c:d",
            "MDI:home",
            "mdi:Home",
            "mdi:home--alt",
            "mdi:home_alt",
        ] {
            assert!(
                IconName::parse(value, true, false).is_none(),
                "{:?} should not parse",
                value
            );
        }
    }

    #[test]
    fn test_parse_without_validation() {
        let icon = IconName::parse("MDI:Home", false, false).unwrap();
        assert_eq!(icon.prefix, "MDI");
        assert!(!icon.is_valid(false));
    }

    #[test]
    fn test_display() {
        assert_eq!(IconName::new("", "mdi", "home").to_string(), "mdi:home");
        assert_eq!(IconName::new("x", "mdi", "home").to_string(), "@x:mdi:home");
        assert_eq!(IconName::new("", "", "home").to_string(), "home");
    }
}
