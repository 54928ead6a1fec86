///! Shared icon types: name syntax, icon data and icon set payloads.
///!
///! Nothing in here performs I/O; the resolver crate builds storage,
///! scheduling and transport on top of these types.

pub mod name;
pub mod types;

pub use name::{IconName, validate_fragment};
pub use types::{
    FullIcon, IconAlias, IconData, IconProps, IconSet, DEFAULT_ICON_HEIGHT, DEFAULT_ICON_WIDTH,
};
