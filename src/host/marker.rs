//! Sprite markers in source files.
//!
//! A source module asks for a sprite with a declaration like
//!
//! ```text
//! const __svg__ = { path: './icons/**/*.svg', name: 'icons.[hash].svg' };
//! ```
//!
//! [`find_markers`] extracts these, and [`rewrite`] replaces each
//! declarator with `__svg__ = { filename: "<final name>" }` once the
//! sprite name is known.

use std::ops::Range;
use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

/// Identifier that marks a sprite request.
pub const MARKER_IDENT: &str = "__svg__";

/// Glob used when a marker has no `path`.
pub const DEFAULT_MARKER_PATH: &str = "/**/*.svg";

/// Naming pattern used when a marker has no `name`.
pub const DEFAULT_MARKER_NAME: &str = "[hash].sprite.svg";

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:var|let|const)\s+(?P<decl>__svg__\s*=\s*\{(?P<body>[^{}]*)\})").unwrap()
});

static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]?(?P<key>\w+)['"]?\s*:\s*(?:'(?P<sq>[^']*)'|"(?P<dq>[^"]*)"|`(?P<bt>[^`]*)`)"#)
        .unwrap()
});

/// One sprite marker found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Byte range of `__svg__ = { … }` (declaration keyword excluded).
    pub range: Range<usize>,
    /// Glob relative to the source file's directory.
    pub path: String,
    /// Naming pattern.
    pub name: String,
}

/// Find every sprite marker in `source`, in source order.
pub fn find_markers(source: &str) -> Vec<Marker> {
    DECLARATION
        .captures_iter(source)
        .filter_map(|caps| {
            let decl = caps.name("decl")?;
            let body = caps.name("body")?.as_str();

            let mut marker = Marker {
                range: decl.range(),
                path: DEFAULT_MARKER_PATH.to_string(),
                name: DEFAULT_MARKER_NAME.to_string(),
            };
            for prop in PROPERTY.captures_iter(body) {
                let Some(value) = ["sq", "dq", "bt"].iter().find_map(|g| prop.name(g)) else {
                    continue;
                };
                match &prop["key"] {
                    "path" => marker.path = value.as_str().to_string(),
                    "name" => marker.name = value.as_str().to_string(),
                    _ => {}
                }
            }
            Some(marker)
        })
        .collect()
}

/// Whether a sprite name stays inside the output directory: relative,
/// non-empty, no `..`.
pub fn is_contained_name(name: &str) -> bool {
    let path = Path::new(name);
    path.components().any(|c| matches!(c, Component::Normal(_)))
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Replacement text for a resolved marker.
pub fn replacement(file_name: &str) -> String {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"{MARKER_IDENT} = {{ filename: "{escaped}" }}"#)
}

/// Substitute every `(range, file name)` pair into `source`.
///
/// Ranges must not overlap; they may be given in any order.
pub fn rewrite(source: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut sorted: Vec<&(Range<usize>, String)> = replacements.iter().collect();
    sorted.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, file_name) in sorted {
        out.push_str(&source[cursor..range.start]);
        out.push_str(&replacement(file_name));
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_marker_with_fields() {
        let src = "import x from 'y';\nconst __svg__ = { path: './icons/**/*.svg', name: \"icons.[hash].svg\" };\n";
        let markers = find_markers(src);
        assert_eq!(markers.len(), 1);

        let m = &markers[0];
        assert_eq!(m.path, "./icons/**/*.svg");
        assert_eq!(m.name, "icons.[hash].svg");
        assert!(src[m.range.clone()].starts_with("__svg__ ="));
        assert!(src[m.range.clone()].ends_with('}'));
    }

    #[test]
    fn test_find_marker_defaults() {
        let markers = find_markers("var __svg__ = {};");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].path, DEFAULT_MARKER_PATH);
        assert_eq!(markers[0].name, DEFAULT_MARKER_NAME);
    }

    #[test]
    fn test_ignores_other_identifiers() {
        assert!(find_markers("const __svg = { path: 'a' };").is_empty());
        assert!(find_markers("const my__svg__ = {};").is_empty());
        assert!(find_markers("__svg__ = {};").is_empty());
    }

    #[test]
    fn test_multiple_markers_and_unknown_keys() {
        let src = "let __svg__ = { path: '/a/*.svg', extra: 'x' };\nlet __svg__ = { 'name': `b.svg` };";
        let markers = find_markers(src);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].path, "/a/*.svg");
        assert_eq!(markers[0].name, DEFAULT_MARKER_NAME);
        assert_eq!(markers[1].name, "b.svg");
    }

    #[test]
    fn test_rewrite() {
        let src = "var __svg__ = { path: '/icons/*.svg' };\nconsole.log(__svg__);\n";
        let markers = find_markers(src);
        let out = rewrite(src, &[(markers[0].range.clone(), "abc.sprite.svg".to_string())]);
        assert_eq!(
            out,
            "var __svg__ = { filename: \"abc.sprite.svg\" };\nconsole.log(__svg__);\n"
        );
    }

    #[test]
    fn test_replacement_escapes_string_literal() {
        assert_eq!(
            replacement(r#"a\b"c.svg"#),
            r#"__svg__ = { filename: "a\\b\"c.svg" }"#
        );
    }

    #[test]
    fn test_contained_names() {
        assert!(is_contained_name("sprite.svg"));
        assert!(is_contained_name("img/[hash].svg"));
        assert!(is_contained_name("./img/a.svg"));
        assert!(!is_contained_name("../escaped.svg"));
        assert!(!is_contained_name("img/../../x.svg"));
        assert!(!is_contained_name("/etc/x.svg"));
        assert!(!is_contained_name(""));
        assert!(!is_contained_name("."));
    }

    #[test]
    fn test_rewrite_out_of_order() {
        let src = "var __svg__ = {}; var __svg__ = {};";
        let markers = find_markers(src);
        let out = rewrite(
            src,
            &[
                (markers[1].range.clone(), "2.svg".to_string()),
                (markers[0].range.clone(), "1.svg".to_string()),
            ],
        );
        assert_eq!(
            out,
            r#"var __svg__ = { filename: "1.svg" }; var __svg__ = { filename: "2.svg" };"#
        );
    }
}
