use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default icon width when neither the icon nor its set declares one
pub const DEFAULT_ICON_WIDTH: f64 = 16.0;

/// Default icon height when neither the icon nor its set declares one
pub const DEFAULT_ICON_HEIGHT: f64 = 16.0;

/// Optional geometry and transformation attributes
///
/// Shared by icons and aliases. `rotate` counts quarter turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<i32>,

    #[serde(default, rename = "hFlip", skip_serializing_if = "Option::is_none")]
    pub h_flip: Option<bool>,

    #[serde(default, rename = "vFlip", skip_serializing_if = "Option::is_none")]
    pub v_flip: Option<bool>,
}

impl IconProps {
    /// Apply `child` on top of `self`
    ///
    /// Dimensions are replaced, rotations add up and flips toggle.
    pub fn merged_with(&self, child: &IconProps) -> IconProps {
        let rotate = match (self.rotate, child.rotate) {
            (None, None) => None,
            // Quarter turns are reduced first so arbitrary input cannot overflow
            (a, b) => Some((a.unwrap_or(0).rem_euclid(4) + b.unwrap_or(0).rem_euclid(4)) % 4),
        };
        let flip = |outer: Option<bool>, inner: Option<bool>| match (outer, inner) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(false) != b.unwrap_or(false)),
        };

        IconProps {
            left: child.left.or(self.left),
            top: child.top.or(self.top),
            width: child.width.or(self.width),
            height: child.height.or(self.height),
            rotate,
            h_flip: flip(self.h_flip, child.h_flip),
            v_flip: flip(self.v_flip, child.v_flip),
        }
    }

    /// True when every declared dimension is a finite number
    pub fn has_finite_dimensions(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .into_iter()
            .flatten()
            .all(f64::is_finite)
    }
}

/// Icon definition as stored: body plus the attributes that were declared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconData {
    pub body: String,

    #[serde(flatten)]
    pub props: IconProps,
}

impl IconData {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            props: IconProps::default(),
        }
    }

    /// Minimal shape check: renderable body and sane numbers
    pub fn is_renderable(&self) -> bool {
        !self.body.trim().is_empty() && self.props.has_finite_dimensions()
    }

    /// Resolve every attribute to its default when absent
    pub fn to_full(&self) -> FullIcon {
        FullIcon {
            body: self.body.clone(),
            left: self.props.left.unwrap_or(0.0),
            top: self.props.top.unwrap_or(0.0),
            width: self.props.width.unwrap_or(DEFAULT_ICON_WIDTH),
            height: self.props.height.unwrap_or(DEFAULT_ICON_HEIGHT),
            rotate: self.props.rotate.unwrap_or(0).rem_euclid(4),
            h_flip: self.props.h_flip.unwrap_or(false),
            v_flip: self.props.v_flip.unwrap_or(false),
        }
    }
}

/// Icon definition with every attribute resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullIcon {
    pub body: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotate: i32,
    #[serde(rename = "hFlip")]
    pub h_flip: bool,
    #[serde(rename = "vFlip")]
    pub v_flip: bool,
}

impl From<&IconData> for FullIcon {
    fn from(data: &IconData) -> Self {
        data.to_full()
    }
}

/// Alias entry: another name for `parent`, optionally transformed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconAlias {
    pub parent: String,

    #[serde(flatten)]
    pub props: IconProps,
}

/// Icon set payload, as served by the icon API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconSet {
    pub prefix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    pub icons: BTreeMap<String, IconData>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, IconAlias>,

    /// Names the API confirmed as absent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_found: Vec<String>,

    #[serde(default, rename = "lastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,

    /// Set-level defaults for icons that do not declare their own
    #[serde(flatten)]
    pub defaults: IconProps,
}

impl IconSet {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper used by loaders and tests
    pub fn with_icon(mut self, name: impl Into<String>, data: IconData) -> Self {
        self.icons.insert(name.into(), data);
        self
    }
}
