//! Small helpers shared by the CLI and the pipeline.

mod plural;

pub use plural::{plural_count, plural_s};
