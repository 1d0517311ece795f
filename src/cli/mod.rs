//! Command-line interface module.

mod args;
pub mod build;
pub mod sprite;

pub use args::{BuildArgs, Cli, Commands, SpriteArgs};
