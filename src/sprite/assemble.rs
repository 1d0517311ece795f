//! Sprite document assembly.
//!
//! A [`Renderer`] turns the ordered fragments plus root attributes into
//! the final document. Two layouts ship with the crate:
//!
//! - [`BuiltinLayout`]: `<svg ATTRS><symbol …>…</symbol>…</svg>`
//! - [`FileLayout`]: a user template with `{{ attributes }}` and
//!   `{{ symbols }}` placeholders, read once at construction

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use super::error::{Result, SpriteError};
use super::normalize::{Fragment, escape_attr};

/// Attributes placed on the sprite's root element, in key order.
pub type RootAttributes = BTreeMap<String, String>;

const ATTRIBUTES_PLACEHOLDER: &str = "{{ attributes }}";
const SYMBOLS_PLACEHOLDER: &str = "{{ symbols }}";

/// Renders a sprite document. Must be a pure function of its inputs.
pub trait Renderer: Send + Sync {
    fn render(&self, fragments: &[Fragment], attributes: &RootAttributes) -> Result<String>;
}

/// Render the root attribute list (leading space included when non-empty).
pub fn render_attributes(attributes: &RootAttributes) -> String {
    let mut out = String::new();
    for (key, value) in attributes {
        let _ = write!(out, r#" {}="{}""#, key, escape_attr(value));
    }
    out
}

/// Render one fragment as a `<symbol>` element.
pub fn render_symbol(out: &mut String, fragment: &Fragment) {
    let _ = write!(out, r#"<symbol id="{}""#, escape_attr(&fragment.id));
    if !fragment.view_box.is_empty() {
        let _ = write!(out, r#" viewBox="{}""#, escape_attr(&fragment.view_box));
    }
    for (key, value) in &fragment.attributes {
        let _ = write!(out, r#" {}="{}""#, key, escape_attr(value));
    }
    out.push('>');
    out.push_str(&fragment.inner);
    out.push_str("</symbol>");
}

fn render_symbols(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        render_symbol(&mut out, fragment);
    }
    out
}

/// Default layout: a bare root `<svg>` holding one `<symbol>` per icon.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLayout;

impl Renderer for BuiltinLayout {
    fn render(&self, fragments: &[Fragment], attributes: &RootAttributes) -> Result<String> {
        let symbols = render_symbols(fragments);
        Ok(format!(
            "<svg{}>{}</svg>",
            render_attributes(attributes),
            symbols
        ))
    }
}

/// User-supplied layout template.
#[derive(Debug, Clone)]
pub struct FileLayout {
    source: String,
}

impl FileLayout {
    /// Read and check the template.
    ///
    /// The `{{ symbols }}` placeholder is required; `{{ attributes }}` is optional.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| SpriteError::Template {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_source(path, source)
    }

    pub fn from_source(path: &Path, source: String) -> Result<Self> {
        if !source.contains(SYMBOLS_PLACEHOLDER) {
            return Err(SpriteError::Template {
                path: path.to_path_buf(),
                message: format!("missing `{SYMBOLS_PLACEHOLDER}` placeholder"),
            });
        }
        Ok(Self { source })
    }
}

impl Renderer for FileLayout {
    fn render(&self, fragments: &[Fragment], attributes: &RootAttributes) -> Result<String> {
        // Symbols last so markup inside icons is never scanned for placeholders
        Ok(self
            .source
            .replace(ATTRIBUTES_PLACEHOLDER, &render_attributes(attributes))
            .replace(SYMBOLS_PLACEHOLDER, &render_symbols(fragments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: &str, inner: &str) -> Fragment {
        Fragment {
            id: id.to_string(),
            view_box: "0 0 10 10".to_string(),
            attributes: Vec::new(),
            inner: inner.to_string(),
        }
    }

    fn attrs() -> RootAttributes {
        RootAttributes::from([
            ("xmlns".to_string(), "http://www.w3.org/2000/svg".to_string()),
            ("style".to_string(), "position:absolute; width: 0; height: 0".to_string()),
        ])
    }

    #[test]
    fn test_builtin_layout() {
        let doc = BuiltinLayout
            .render(&[fragment("icon-a", "<path/>"), fragment("icon-b", "")], &attrs())
            .unwrap();
        assert_eq!(
            doc,
            concat!(
                r#"<svg style="position:absolute; width: 0; height: 0" xmlns="http://www.w3.org/2000/svg">"#,
                r#"<symbol id="icon-a" viewBox="0 0 10 10"><path/></symbol>"#,
                r#"<symbol id="icon-b" viewBox="0 0 10 10"></symbol>"#,
                "</svg>"
            )
        );
    }

    #[test]
    fn test_builtin_layout_empty() {
        let doc = BuiltinLayout.render(&[], &RootAttributes::new()).unwrap();
        assert_eq!(doc, "<svg></svg>");
    }

    #[test]
    fn test_symbol_escapes_and_carries_attributes() {
        let mut frag = fragment("icon-\"q\"", "");
        frag.view_box.clear();
        frag.attributes = vec![("fill".into(), "none".into()), ("data-x".into(), "a<b".into())];

        let mut out = String::new();
        render_symbol(&mut out, &frag);
        assert_eq!(
            out,
            r#"<symbol id="icon-&quot;q&quot;" fill="none" data-x="a&lt;b"></symbol>"#
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let frags = [fragment("icon-a", "<path/>")];
        let a = BuiltinLayout.render(&frags, &attrs()).unwrap();
        let b = BuiltinLayout.render(&frags, &attrs()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_file_layout() {
        let layout = FileLayout::from_source(
            Path::new("layout.svg"),
            "<svg{{ attributes }}>\n<defs>{{ symbols }}</defs>\n</svg>\n".to_string(),
        )
        .unwrap();
        let doc = layout
            .render(&[fragment("icon-a", "<path/>")], &RootAttributes::from([("a".into(), "1".into())]))
            .unwrap();
        assert_eq!(
            doc,
            "<svg a=\"1\">\n<defs><symbol id=\"icon-a\" viewBox=\"0 0 10 10\"><path/></symbol></defs>\n</svg>\n"
        );
    }

    #[test]
    fn test_file_layout_requires_symbols() {
        let err = FileLayout::from_source(Path::new("bad.svg"), "<svg/>".to_string()).unwrap_err();
        assert!(matches!(err, SpriteError::Template { .. }));
    }

    #[test]
    fn test_file_layout_load_missing() {
        let err = FileLayout::load(Path::new("/nonexistent/layout.svg")).unwrap_err();
        assert!(err.to_string().contains("layout.svg"));
    }
}
