//! Build-host integration: source markers and emitted assets.

mod asset;
pub mod marker;

pub use asset::SpriteAsset;
pub use marker::{Marker, find_markers, is_contained_name, rewrite};
