use icon_common::IconSet;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::IconSetError;

const NUMERIC_PROPS: &[&str] = &["left", "top", "width", "height"];
const BOOLEAN_PROPS: &[&str] = &["hFlip", "vFlip"];

/// Check optional icon attributes for the right JSON types
fn check_props(entry: &Map<String, Value>) -> Result<(), String> {
    for key in NUMERIC_PROPS {
        if let Some(value) = entry.get(*key) {
            if !value.is_number() {
                return Err(format!("'{}' must be a number", key));
            }
        }
    }
    if let Some(value) = entry.get("rotate") {
        if !(value.is_i64() || value.is_u64()) {
            return Err("'rotate' must be an integer".to_string());
        }
    }
    for key in BOOLEAN_PROPS {
        if let Some(value) = entry.get(*key) {
            if !value.is_boolean() {
                return Err(format!("'{}' must be a boolean", key));
            }
        }
    }
    Ok(())
}

/// Structural check of a raw icon set, without decoding it
///
/// Every problem rejects the whole payload.
pub fn check_icon_set_shape(value: &Value) -> Result<(), IconSetError> {
    let data = value.as_object().ok_or(IconSetError::NotAnObject)?;

    if !data.get("prefix").is_some_and(Value::is_string) {
        return Err(IconSetError::InvalidField("prefix"));
    }
    if data.get("provider").is_some_and(|v| !v.is_string()) {
        return Err(IconSetError::InvalidField("provider"));
    }
    if data.get("lastModified").is_some_and(|v| !v.is_u64()) {
        return Err(IconSetError::InvalidField("lastModified"));
    }
    for key in NUMERIC_PROPS {
        if data.get(*key).is_some_and(|v| !v.is_number()) {
            return Err(IconSetError::InvalidField(*key));
        }
    }

    let icons = data
        .get("icons")
        .and_then(Value::as_object)
        .ok_or(IconSetError::InvalidField("icons"))?;
    for (name, icon) in icons {
        let invalid = |reason: String| IconSetError::InvalidIcon {
            name: name.clone(),
            reason,
        };
        let entry = icon
            .as_object()
            .ok_or_else(|| invalid("not an object".to_string()))?;
        if !entry.get("body").is_some_and(Value::is_string) {
            return Err(invalid("missing body".to_string()));
        }
        check_props(entry).map_err(invalid)?;
    }

    if let Some(aliases) = data.get("aliases") {
        let aliases = aliases
            .as_object()
            .ok_or(IconSetError::InvalidField("aliases"))?;
        for (name, alias) in aliases {
            let invalid = |reason: String| IconSetError::InvalidAlias {
                name: name.clone(),
                reason,
            };
            let entry = alias
                .as_object()
                .ok_or_else(|| invalid("not an object".to_string()))?;
            if !entry.get("parent").is_some_and(Value::is_string) {
                return Err(invalid("missing parent".to_string()));
            }
            check_props(entry).map_err(invalid)?;
        }
    }

    if let Some(not_found) = data.get("not_found") {
        let valid = not_found
            .as_array()
            .is_some_and(|names| names.iter().all(Value::is_string));
        if !valid {
            return Err(IconSetError::InvalidField("not_found"));
        }
    }

    Ok(())
}

/// Boolean form of [`check_icon_set_shape`]
pub fn quickly_validate(value: &Value) -> bool {
    check_icon_set_shape(value).is_ok()
}

/// Check the shape of a raw payload, then decode it
pub fn validate_icon_set(value: &Value) -> Result<IconSet, IconSetError> {
    check_icon_set_shape(value)?;
    Ok(IconSet::deserialize(value)?)
}
