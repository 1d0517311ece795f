//! Sprite assembly and caching engine.
//!
//! # Modules
//!
//! - [`discover`]: glob resolution with canonical (sorted) ordering
//! - [`normalize`]: icon markup → embeddable fragment
//! - [`optimize`]: pluggable shape optimizer (usvg-backed by default)
//! - [`assemble`]: fragment list → sprite document
//! - [`hash`]: content-addressed output naming
//! - [`engine`]: the pipeline tying the above together
//!
//! # Architecture
//!
//! ```text
//! SpriteRequest { base, pattern, name }
//!         │
//!         ▼
//!    ┌──────────┐
//!    │ discover │ ──► sorted absolute paths
//!    └────┬─────┘
//!         ▼
//!    ┌───────────┐
//!    │ normalize │ ──► Fragment { id, viewBox, inner } (parallel, order kept)
//!    └────┬──────┘
//!         ▼
//!    ┌──────────┐
//!    │ assemble │ ──► document text
//!    └────┬─────┘
//!         ▼
//!    ┌──────┐
//!    │ hash │ ──► final name
//!    └──────┘
//! ```

pub mod assemble;
pub mod discover;
pub mod engine;
pub mod error;
pub mod hash;
pub mod normalize;
pub mod optimize;

pub use assemble::{BuiltinLayout, FileLayout, Renderer, RootAttributes};
pub use discover::{discover, discover_async};
pub use engine::{DEFAULT_PATTERN, IdentifierCollision, Sprite, SpriteEngine, SpriteRequest};
pub use error::{Result, SpriteError};
pub use hash::hash_name;
pub use normalize::{Fragment, normalize};
pub use optimize::{OptimizeOptions, Optimizer, UsvgOptimizer};
