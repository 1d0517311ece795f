//! `sprite` command: assemble one directory of icons.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;

use super::SpriteArgs;
use crate::host::is_contained_name;
use crate::log;
use crate::sprite::{Sprite, SpriteEngine};
use crate::utils::plural_count;

/// Build the sprite for `args.dir`, writing it when `--out` is given.
///
/// Returns the sprite and the path it was written to, if any.
pub fn build_one(engine: &SpriteEngine, args: &SpriteArgs) -> Result<(Sprite, Option<PathBuf>)> {
    let mut request = engine.request(&args.dir, args.path.as_deref());
    if let Some(name) = &args.name {
        if !is_contained_name(name) {
            bail!("Sprite name `{name}` must be a relative path inside the output directory");
        }
        request.name.clone_from(name);
    }

    let sprite = engine
        .build(&request)
        .with_context(|| format!("Failed to build sprite from {}", args.dir.display()))?;

    let written = match &args.out {
        Some(out) => {
            let path = out.join(&sprite.name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, &sprite.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Some(path)
        }
        None => None,
    };

    log!(
        "sprite";
        "{} ({}, {} bytes)",
        sprite.name,
        plural_count(sprite.ids.len(), "icon"),
        sprite.content.len()
    );
    if !sprite.skipped.is_empty() {
        log!("warning"; "{} skipped", plural_count(sprite.skipped.len(), "icon"));
    }
    Ok((sprite, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpriteConfig;
    use tempfile::TempDir;

    fn icons() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("home.svg"), r#"<svg viewBox="0 0 10 10"><path d="M0 0"/></svg>"#).unwrap();
        fs::write(dir.path().join("nested/star.svg"), r#"<svg viewBox="0 0 24 24"/>"#).unwrap();
        dir
    }

    fn args(dir: &TempDir) -> SpriteArgs {
        SpriteArgs {
            dir: dir.path().to_path_buf(),
            path: None,
            name: None,
            out: None,
        }
    }

    fn engine() -> SpriteEngine {
        SpriteEngine::new(SpriteConfig::default()).unwrap()
    }

    #[test]
    fn test_build_without_output() {
        let dir = icons();
        let (sprite, written) = build_one(&engine(), &args(&dir)).unwrap();
        assert_eq!(sprite.ids, vec!["icon-home", "icon-star"]);
        assert!(sprite.name.starts_with("sprite."));
        assert!(written.is_none());
    }

    #[test]
    fn test_path_and_name_overrides() {
        let dir = icons();
        let out = TempDir::new().unwrap();
        let args = SpriteArgs {
            path: Some("/*.svg".into()),
            name: Some("icons.svg".into()),
            out: Some(out.path().join("dist")),
            ..args(&dir)
        };

        let (sprite, written) = build_one(&engine(), &args).unwrap();
        assert_eq!(sprite.ids, vec!["icon-home"]);
        let written = written.unwrap();
        assert_eq!(written, out.path().join("dist/icons.svg"));
        assert_eq!(fs::read_to_string(written).unwrap(), sprite.content);
    }

    #[test]
    fn test_name_override_must_stay_inside_output() {
        let dir = icons();
        let args = SpriteArgs {
            name: Some("../up.svg".into()),
            ..args(&dir)
        };
        assert!(build_one(&engine(), &args).is_err());
    }

    #[test]
    fn test_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let args = SpriteArgs {
            dir: dir.path().join("missing"),
            path: None,
            name: None,
            out: None,
        };
        assert!(build_one(&engine(), &args).is_err());
    }
}
