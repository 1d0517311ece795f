//! svgstore - combine svg icons into content-addressed sprites.
//!
//! - [`sprite`] - discover → normalize → assemble → hash
//! - [`registry`] - register during a build, reconcile and emit at its end
//! - [`host`] - `__svg__` markers and emitted assets
//! - [`config`] - `svgstore.toml`

pub mod cli;
pub mod config;
pub mod host;
pub mod logger;
pub mod registry;
pub mod sprite;
pub mod utils;
