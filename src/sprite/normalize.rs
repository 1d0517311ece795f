//! Icon normalization.
//!
//! Turns one standalone svg file into a [`Fragment`] that can be embedded
//! as a `<symbol>` inside the sprite:
//!
//! - prolog, DOCTYPE, processing instructions and comments are dropped
//! - namespace declarations are removed at every depth, together with
//!   elements and attributes in foreign namespaces (`sketch:*`, `rdf:*`, ...)
//! - internal ids are scoped to the symbol (`g` → `icon-home-g`) along with
//!   every `url(#g)` / `href="#g"` reference to them
//! - the root `viewBox` and presentation attributes are kept
//! - everything between `<svg>` and `</svg>` becomes the inner markup
//!
//! Anything but whitespace, comments and PIs after the root is an error.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};
use rustc_hash::FxHashSet;

use super::error::{Result, SpriteError};
use super::optimize::{OptimizeOptions, Optimizer};

/// Root attributes that describe the standalone document rather than the shape.
const DOCUMENT_ATTRS: &[&str] = &["id", "width", "height", "viewBox", "version", "x", "y"];

/// Prefixes that stay bound inside the sprite (`xlink` is declared on its root).
const KEPT_PREFIXES: &[&str] = &["xml", "xlink"];

static URL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(\s*#([^)\s]+)\s*\)").unwrap());

/// One icon's embeddable representation inside a sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Symbol id: prefix + file stem.
    pub id: String,
    /// Root `viewBox`, empty if the icon had none.
    pub view_box: String,
    /// Root presentation attributes carried onto the symbol (unescaped values).
    pub attributes: Vec<(String, String)>,
    /// Markup between the root tags.
    pub inner: String,
}

/// Derive the symbol id for an icon file: `prefix + file stem`.
pub fn identifier(prefix: &str, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!("{prefix}{stem}")
}

/// Normalize one icon's markup into a [`Fragment`].
///
/// `path` is used for the identifier and for error messages. When an
/// optimizer is given, the whole document is passed through it first; an
/// optimized root without `viewBox` gets `0 0 width height`.
pub fn normalize(
    content: &str,
    prefix: &str,
    path: &Path,
    optimizer: Option<(&dyn Optimizer, &OptimizeOptions)>,
) -> Result<Fragment> {
    let id = identifier(prefix, path);

    let optimized;
    let content = match optimizer {
        Some((optimizer, options)) => {
            let unscaled = drop_root_size(content, path)?;
            optimized = optimizer
                .optimize(&unscaled, options)
                .map_err(|e| SpriteError::Optimize {
                    path: path.to_path_buf(),
                    message: format!("{e:#}"),
                })?;
            optimized.as_str()
        }
        None => content,
    };

    let root = extract_root(content, &id, path)?;
    let view_box = match (&root.width, &root.height) {
        (Some(w), Some(h)) if root.view_box.is_empty() && optimizer.is_some() => {
            format!("0 0 {w} {h}")
        }
        _ => root.view_box,
    };

    Ok(Fragment {
        id,
        view_box,
        attributes: root.attributes,
        inner: root.inner,
    })
}

#[derive(Debug, Default)]
struct Root {
    view_box: String,
    width: Option<String>,
    height: Option<String>,
    attributes: Vec<(String, String)>,
    inner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prolog,
    Root,
    Epilog,
}

fn extract_root(content: &str, id: &str, path: &Path) -> Result<Root> {
    let local_ids = collect_ids(content);

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut writer = Writer::new(Vec::new());
    let mut root = Root::default();
    let mut phase = Phase::Prolog;
    let mut depth = 0usize;
    // Depth at which a foreign-namespace subtree started
    let mut skip: Option<usize> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            SpriteError::parse(path, format!("{e} at byte {}", reader.error_position()))
        })?;

        match (phase, event) {
            (Phase::Epilog, Event::Eof) => break,
            (Phase::Prolog, Event::Eof) => return Err(SpriteError::parse(path, "no root element")),
            (Phase::Root, Event::Eof) => {
                return Err(SpriteError::parse(path, "unexpected end of document"));
            }

            (_, Event::Comment(_) | Event::PI(_)) => {}
            (_, Event::Text(t)) if phase != Phase::Root && is_blank(&t) => {}

            (Phase::Prolog, Event::Decl(_) | Event::DocType(_)) => {}
            (Phase::Prolog, Event::Start(e)) => {
                root = read_root(&e, path)?;
                phase = Phase::Root;
            }
            (Phase::Prolog, Event::Empty(e)) => {
                root = read_root(&e, path)?;
                phase = Phase::Epilog;
            }
            (Phase::Prolog, _) => {
                return Err(SpriteError::parse(path, "content before root element"));
            }
            (Phase::Epilog, _) => {
                return Err(SpriteError::parse(path, "content after root element"));
            }

            (Phase::Root, Event::Decl(_) | Event::DocType(_)) => {}
            (Phase::Root, Event::End(_)) if depth == 0 => phase = Phase::Epilog,
            (Phase::Root, Event::Start(e)) => {
                depth += 1;
                if skip.is_none() && is_foreign(&element_name(&e, path)?) {
                    skip = Some(depth);
                }
                if skip.is_none() {
                    let e = scope_element(&e, &local_ids, id, path)?;
                    write(&mut writer, Event::Start(e), path)?;
                }
            }
            (Phase::Root, Event::Empty(e)) => {
                if skip.is_none() && !is_foreign(&element_name(&e, path)?) {
                    let e = scope_element(&e, &local_ids, id, path)?;
                    write(&mut writer, Event::Empty(e), path)?;
                }
            }
            (Phase::Root, Event::End(e)) => {
                if skip.is_none() {
                    write(&mut writer, Event::End(e), path)?;
                } else if skip == Some(depth) {
                    skip = None;
                }
                depth -= 1;
            }
            (Phase::Root, other) => {
                if skip.is_none() {
                    write(&mut writer, other, path)?;
                }
            }
        }
    }

    root.inner = String::from_utf8(writer.into_inner())
        .map_err(|e| SpriteError::parse(path, e.to_string()))?;
    Ok(root)
}

/// Read `viewBox`, size and presentation attributes from the root element.
fn read_root(e: &BytesStart<'_>, path: &Path) -> Result<Root> {
    if e.local_name().as_ref() != b"svg" {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        return Err(SpriteError::parse(
            path,
            format!("root element is <{name}>, expected <svg>"),
        ));
    }

    let mut root = Root::default();
    for attr in e.attributes() {
        let (key, value) = decode_attr(attr, path)?;
        match key {
            "viewBox" => root.view_box = value.split_whitespace().collect::<Vec<_>>().join(" "),
            "width" => root.width = Some(value.trim().to_string()),
            "height" => root.height = Some(value.trim().to_string()),
            _ if is_presentation_attr(key) => root.attributes.push((key.to_string(), value)),
            _ => {}
        }
    }
    Ok(root)
}

/// Rebuild an inner element: namespace and foreign attributes dropped,
/// local id references scoped to the symbol.
fn scope_element(
    e: &BytesStart<'_>,
    local_ids: &FxHashSet<String>,
    id: &str,
    path: &Path,
) -> Result<BytesStart<'static>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let (key, value) = decode_attr(attr, path)?;
        if is_namespace_attr(key) || is_foreign(key) {
            continue;
        }
        let value = scope_reference(key, value, local_ids, id);
        attrs.push((key.to_string(), value));
    }

    let mut out = BytesStart::new(element_name(e, path)?);
    out.extend_attributes(attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(out)
}

fn scope_reference(key: &str, value: String, local_ids: &FxHashSet<String>, id: &str) -> String {
    match key {
        "id" if local_ids.contains(&value) => format!("{id}-{value}"),
        "href" | "xlink:href" => match value.strip_prefix('#') {
            Some(target) if local_ids.contains(target) => format!("#{id}-{target}"),
            _ => value,
        },
        _ if value.contains("url(") => URL_REF
            .replace_all(&value, |caps: &Captures<'_>| {
                if local_ids.contains(&caps[1]) {
                    format!("url(#{id}-{})", &caps[1])
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned(),
        _ => value,
    }
}

/// Ids declared below the root. Stops quietly at the first syntax error;
/// the extraction pass reports it.
fn collect_ids(content: &str) -> FxHashSet<String> {
    let mut reader = Reader::from_str(content);
    let mut ids = FxHashSet::default();
    let mut seen_root = false;

    while let Ok(event) = reader.read_event() {
        let e = match event {
            Event::Start(e) | Event::Empty(e) => e,
            Event::Eof => break,
            _ => continue,
        };
        if !std::mem::replace(&mut seen_root, true) {
            continue;
        }
        if let Ok(Some(attr)) = e.try_get_attribute("id")
            && let Ok(value) = attr.unescape_value()
        {
            ids.insert(value.into_owned());
        }
    }
    ids
}

/// Drop root `width`/`height` when a `viewBox` is present so the optimizer
/// keeps the icon in its own user units.
fn drop_root_size(content: &str, path: &Path) -> Result<String> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::new());
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            SpriteError::parse(path, format!("{e} at byte {}", reader.error_position()))
        })?;
        let event = match event {
            Event::Eof => break,
            Event::Start(e) if !seen_root => {
                seen_root = true;
                Event::Start(without_size(&e))
            }
            Event::Empty(e) if !seen_root => {
                seen_root = true;
                Event::Empty(without_size(&e))
            }
            other => other,
        };
        write(&mut writer, event, path)?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| SpriteError::parse(path, e.to_string()))
}

fn without_size(e: &BytesStart<'_>) -> BytesStart<'static> {
    let attrs: Vec<Attribute<'_>> = e.attributes().with_checks(false).flatten().collect();
    let has_view_box = attrs.iter().any(|a| a.key.as_ref() == b"viewBox");

    let mut out = e.to_owned();
    if has_view_box {
        out.clear_attributes();
        out.extend_attributes(
            attrs
                .into_iter()
                .filter(|a| !matches!(a.key.as_ref(), b"width" | b"height")),
        );
    }
    out
}

fn decode_attr<'a>(
    attr: std::result::Result<Attribute<'a>, quick_xml::events::attributes::AttrError>,
    path: &Path,
) -> Result<(&'a str, String)> {
    let attr = attr.map_err(|err| SpriteError::parse(path, err.to_string()))?;
    let key =
        std::str::from_utf8(attr.key.0).map_err(|err| SpriteError::parse(path, err.to_string()))?;
    let raw = std::str::from_utf8(&attr.value)
        .map_err(|err| SpriteError::parse(path, err.to_string()))?;
    let value = unescape(raw)
        .map_err(|err| SpriteError::parse(path, err.to_string()))?
        .into_owned();
    Ok((key, value))
}

fn element_name(e: &BytesStart<'_>, path: &Path) -> Result<String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|err| SpriteError::parse(path, err.to_string()))
}

fn is_presentation_attr(key: &str) -> bool {
    key != "xmlns" && !key.contains(':') && !DOCUMENT_ATTRS.contains(&key)
}

fn is_namespace_attr(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

/// Prefixed name whose namespace is not declared on the sprite root.
fn is_foreign(name: &str) -> bool {
    name.split_once(':')
        .is_some_and(|(prefix, _)| !KEPT_PREFIXES.contains(&prefix))
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>, path: &Path) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| SpriteError::parse(path, e.to_string()))
}

/// Escape an attribute value for output.
pub(crate) fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::NsReader;
    use quick_xml::name::ResolveResult;

    fn norm(content: &str) -> Result<Fragment> {
        normalize(content, "icon-", Path::new("/icons/home.svg"), None)
    }

    #[test]
    fn test_identifier_strips_extension() {
        assert_eq!(identifier("icon-", Path::new("/a/b/home.svg")), "icon-home");
        assert_eq!(identifier("", Path::new("arrow.left.svg")), "arrow.left");
    }

    #[test]
    fn test_same_basename_in_different_dirs_collides() {
        let a = identifier("icon-", Path::new("foo/a.svg"));
        let b = identifier("icon-", Path::new("bar/a.svg"));
        assert_eq!(a, "icon-a");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_basic() {
        let frag = norm(r#"<svg viewBox="0 0 10 10"><path d="M0 0h10"/></svg>"#).unwrap();
        assert_eq!(frag.id, "icon-home");
        assert_eq!(frag.view_box, "0 0 10 10");
        assert_eq!(frag.inner, r#"<path d="M0 0h10"/>"#);
        assert!(frag.attributes.is_empty());
    }

    #[test]
    fn test_normalize_strips_prolog_and_namespaces() {
        let svg = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<!-- Generator: Sketch -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="24" height="24" viewBox="0 0 24 24" fill="none"><g xmlns:sketch="http://www.bohemiancoding.com/sketch/ns" id="g1"><circle r="2"/></g></svg>"#;

        let frag = norm(svg).unwrap();
        assert_eq!(frag.view_box, "0 0 24 24");
        assert_eq!(frag.attributes, vec![("fill".to_string(), "none".to_string())]);
        assert_eq!(frag.inner, r#"<g id="icon-home-g1"><circle r="2"/></g>"#);
        assert!(!frag.inner.contains("xmlns"));
    }

    #[test]
    fn test_foreign_namespaces_are_dropped() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:sketch="http://www.bohemiancoding.com/sketch/ns" xmlns:xlink="http://www.w3.org/1999/xlink" sketch:version="3" viewBox="0 0 4 4"><metadata><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description/></rdf:RDF></metadata><g sketch:type="MSPage" fill="red"><sketch:extra/><use xlink:href="#dot"/><circle id="dot" r="1"/></g></svg>"##;

        let frag = norm(svg).unwrap();
        assert!(frag.attributes.is_empty());
        assert_eq!(
            frag.inner,
            r##"<metadata></metadata><g fill="red"><use xlink:href="#icon-home-dot"/><circle id="icon-home-dot" r="1"/></g>"##
        );

        // Every remaining prefix resolves once wrapped in a sprite root
        let doc = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><symbol>{}</symbol></svg>"#,
            frag.inner
        );
        let mut reader = NsReader::from_str(&doc);
        loop {
            match reader.read_event().unwrap() {
                Event::Eof => break,
                Event::Start(e) | Event::Empty(e) => {
                    let (ns, _) = reader.resolve_element(e.name());
                    assert!(!matches!(ns, ResolveResult::Unknown(_)), "unbound element prefix");
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        let (ns, _) = reader.resolve_attribute(attr.key);
                        assert!(!matches!(ns, ResolveResult::Unknown(_)), "unbound attribute prefix");
                    }
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_internal_ids_are_scoped() {
        let svg = r##"<svg viewBox="0 0 2 2"><defs><linearGradient id="g"/></defs><rect fill="url(#g)" stroke="url(#other)" href="#g"/></svg>"##;
        let frag = norm(svg).unwrap();
        assert_eq!(
            frag.inner,
            r##"<defs><linearGradient id="icon-home-g"/></defs><rect fill="url(#icon-home-g)" stroke="url(#other)" href="#icon-home-g"/>"##
        );
    }

    #[test]
    fn test_normalize_keeps_text_and_entities() {
        let frag = norm(r#"<svg viewBox="0 0 1 1"><title>A &amp; B</title></svg>"#).unwrap();
        assert_eq!(frag.inner, "<title>A &amp; B</title>");
    }

    #[test]
    fn test_normalize_empty_root() {
        let frag = norm(r#"<svg viewBox="0 0 1 1"/>"#).unwrap();
        assert_eq!(frag.view_box, "0 0 1 1");
        assert!(frag.inner.is_empty());
    }

    #[test]
    fn test_trailing_comments_and_whitespace_are_fine() {
        let frag = norm("<svg viewBox=\"0 0 1 1\"><path/></svg>\n<!-- end -->\n").unwrap();
        assert_eq!(frag.inner, "<path/>");
    }

    #[test]
    fn test_missing_viewbox_is_empty() {
        let frag = norm("<svg><rect/></svg>").unwrap();
        assert_eq!(frag.view_box, "");
    }

    #[test]
    fn test_malformed_is_parse_error() {
        assert!(norm(r#"<svg viewBox="0 0 1 1"><path></svg>"#).unwrap_err().is_parse());
        assert!(norm(r#"<svg viewBox="0 0 1 1"><path/>"#).unwrap_err().is_parse());
        assert!(norm("").unwrap_err().is_parse());
        assert!(norm("not markup").unwrap_err().is_parse());
        assert!(norm(r#"<svg viewBox="0 0 1 1"><path/></svg><g><oops"#).unwrap_err().is_parse());
        assert!(norm("<svg/><svg/>").unwrap_err().is_parse());
        assert!(norm("<svg></svg>trailing").unwrap_err().is_parse());
    }

    #[test]
    fn test_non_svg_root_is_parse_error() {
        let err = norm("<html><body/></html>").unwrap_err();
        assert!(err.to_string().contains("expected <svg>"));
    }

    struct SizedRect;

    impl Optimizer for SizedRect {
        fn optimize(&self, markup: &str, _: &OptimizeOptions) -> anyhow::Result<String> {
            Ok(markup.replace("<rect/>", "<rect width=\"1\"/>"))
        }
    }

    #[test]
    fn test_optimizer_runs_before_extraction() {
        let options = OptimizeOptions::default();
        let frag = normalize(
            r#"<svg viewBox="0 0 1 1"><rect/></svg>"#,
            "i-",
            Path::new("box.svg"),
            Some((&SizedRect, &options)),
        )
        .unwrap();
        assert_eq!(frag.id, "i-box");
        assert_eq!(frag.view_box, "0 0 1 1");
        assert_eq!(frag.inner, r#"<rect width="1"/>"#);
    }

    /// Stands in for an optimizer that flattens `viewBox` into the root size.
    struct Flatten;

    impl Optimizer for Flatten {
        fn optimize(&self, markup: &str, _: &OptimizeOptions) -> anyhow::Result<String> {
            assert!(!markup.contains("width=\"48\""));
            Ok(r#"<svg width="24" height="24"><path d="M0 0"/></svg>"#.to_string())
        }
    }

    #[test]
    fn test_optimized_root_without_viewbox_uses_size() {
        let options = OptimizeOptions::default();
        let frag = normalize(
            r#"<svg width="48" height="48" viewBox="0 0 24 24"><path d="M0 0"/></svg>"#,
            "icon-",
            Path::new("home.svg"),
            Some((&Flatten, &options)),
        )
        .unwrap();
        assert_eq!(frag.view_box, "0 0 24 24");
    }

    #[test]
    fn test_drop_root_size_keeps_sizes_without_viewbox() {
        let path = Path::new("a.svg");
        let sized = r#"<svg width="2" height="3" viewBox="0 0 1 1"><g width="9"/></svg>"#;
        assert_eq!(
            drop_root_size(sized, path).unwrap(),
            r#"<svg viewBox="0 0 1 1"><g width="9"/></svg>"#
        );
        assert_eq!(
            drop_root_size(r#"<svg width="2" height="3"/>"#, path).unwrap(),
            r#"<svg width="2" height="3"/>"#
        );
    }
}
