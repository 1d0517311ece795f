//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// svgstore: combine svg icons into content-addressed sprites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: svgstore.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve `__svg__` markers in source files and emit their sprites
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Build a single sprite from a directory of icons
    #[command(visible_alias = "s")]
    Sprite {
        #[command(flatten)]
        args: SpriteArgs,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Source files to scan for sprite markers
    #[arg(value_name = "SOURCE", required = true, value_hint = clap::ValueHint::FilePath)]
    pub sources: Vec<PathBuf>,

    /// Output directory for rewritten sources and sprites
    #[arg(short, long, default_value = "dist", value_hint = clap::ValueHint::DirPath)]
    pub out: PathBuf,
}

/// Sprite command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct SpriteArgs {
    /// Directory the glob is resolved against
    #[arg(value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Glob selecting the icons (default: /**/*.svg)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Naming pattern, `[hash]` is replaced by the content hash
    #[arg(short, long)]
    pub name: Option<String>,

    /// Write the sprite into this directory instead of only reporting it
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out: Option<PathBuf>,
}
