use icon_common::{IconData, IconProps, IconSet};
use tracing::debug;

/// Longest alias chain that is followed before giving up
const MAX_ALIAS_DEPTH: usize = 36;

/// Icon with the set-level dimensions filled in
fn with_set_defaults(set: &IconSet, icon: &IconData) -> IconData {
    let props = IconProps {
        left: icon.props.left.or(set.defaults.left),
        top: icon.props.top.or(set.defaults.top),
        width: icon.props.width.or(set.defaults.width),
        height: icon.props.height.or(set.defaults.height),
        ..icon.props.clone()
    };
    IconData {
        body: icon.body.clone(),
        props,
    }
}

/// Follow an alias to its icon, combining transformations along the way
///
/// Returns `None` for broken or circular chains.
pub fn resolve_alias(set: &IconSet, name: &str) -> Option<IconData> {
    let mut chain = Vec::new();
    let mut current = name;

    let root = loop {
        if let Some(icon) = set.icons.get(current) {
            break icon;
        }
        let alias = set.aliases.get(current)?;
        if chain.len() >= MAX_ALIAS_DEPTH {
            debug!("Alias chain for '{}' is too deep", name);
            return None;
        }
        chain.push(&alias.props);
        current = &alias.parent;
    };

    let mut data = with_set_defaults(set, root);
    // Apply from the alias closest to the icon outwards
    for props in chain.into_iter().rev() {
        data.props = data.props.merged_with(props);
    }
    Some(data)
}

/// Walk every entry of an icon set
///
/// `callback` receives each icon and resolved alias with `Some(data)`, and
/// each name the API reported missing with `None`. Returns every name that
/// was passed to the callback.
pub fn parse_icon_set<F>(set: &IconSet, mut callback: F) -> Vec<String>
where
    F: FnMut(&str, Option<IconData>),
{
    let mut names = Vec::new();

    for name in &set.not_found {
        callback(name, None);
        names.push(name.clone());
    }

    for (name, icon) in &set.icons {
        callback(name, Some(with_set_defaults(set, icon)));
        names.push(name.clone());
    }

    for name in set.aliases.keys() {
        if set.icons.contains_key(name) {
            continue;
        }
        match resolve_alias(set, name) {
            Some(data) => {
                callback(name, Some(data));
                names.push(name.clone());
            }
            None => debug!("Skipping unresolvable alias '{}:{}'", set.prefix, name),
        }
    }

    names
}
