//! svgstore command-line entry point.

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};

use svgstore::cli::{Cli, Commands, build::build_sources, sprite::build_one};
use svgstore::config::SpriteConfig;
use svgstore::log;
use svgstore::logger::set_verbose;
use svgstore::sprite::SpriteEngine;
use svgstore::utils::plural_count;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    set_verbose(cli.verbose);

    let config = SpriteConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let root = config.root.clone();
    let engine = SpriteEngine::new(config).context("Failed to initialize sprite engine")?;

    match &cli.command {
        Commands::Build { args } => {
            let summary = build_sources(engine, args, &root)?;
            log!(
                "build";
                "emitted {} into {}",
                plural_count(summary.sprites.len(), "sprite"),
                args.out.display()
            );
            Ok(())
        }
        Commands::Sprite { args } => build_one(&engine, args).map(|_| ()),
    }
}
