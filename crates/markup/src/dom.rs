//! Markup DOM
//!
//! Lenient HTML fragment reader built on quick-xml. Produces a small
//! element/text tree that the translators walk; void elements never take
//! children and stray end tags are ignored.

use std::ops::Range;

use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use prodoc_core::{ProDocError, Result};

/// Elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "br", "img", "hr", "input", "meta", "link", "source", "wbr", "col", "area", "embed",
];

/// Markup node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Whitespace-only text
    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

/// Markup element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Byte range of the element in the source
    pub span: Range<usize>,
}

impl Element {
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Attribute value (names compare case-insensitively)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Declaration from the inline `style` attribute
    pub fn style(&self, property: &str) -> Option<String> {
        let style = self.attr("style")?;
        style_declarations(style)
            .into_iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Element children, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Visible text content
    pub fn text(&self) -> String {
        let mut out = String::new();
        push_text(&self.children, &mut out);
        out
    }
}

fn push_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if element.is("br") => out.push('\n'),
            Node::Element(element) => push_text(&element.children, out),
        }
    }
}

/// Split a `style` attribute into `(property, value)` pairs
pub fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

/// Pixel value of a CSS length such as `400px` or `400`
pub fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|n| *n >= 0.0).map(|n| n.round() as u32)
}

/// Resolve character references, keeping the raw text when it is not
/// well-formed (bare ampersands are common in pasted markup)
pub fn decode_entities(raw: &str) -> String {
    let decoded = unescape_with(raw, |entity| match entity {
        "nbsp" => Some("\u{a0}"),
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "hellip" => Some("\u{2026}"),
        "mdash" => Some("\u{2014}"),
        "ndash" => Some("\u{2013}"),
        "laquo" => Some("\u{ab}"),
        "raquo" => Some("\u{bb}"),
        _ => None,
    });
    match decoded {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Parse an HTML fragment into nodes
pub fn parse_fragment(source: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(source);
    reader.check_end_names(false);

    let mut roots: Vec<Node> = Vec::new();
    let mut open: Vec<Element> = Vec::new();

    loop {
        let start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let element = start_element(e, start);
                if VOID_ELEMENTS.contains(&element.name.as_str()) {
                    let mut element = element;
                    element.span.end = reader.buffer_position();
                    attach(&mut open, &mut roots, Node::Element(element));
                } else {
                    open.push(element);
                }
            }
            Ok(Event::Empty(ref e)) => {
                let mut element = start_element(e, start);
                element.span.end = reader.buffer_position();
                attach(&mut open, &mut roots, Node::Element(element));
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                let end = reader.buffer_position();
                match open.iter().rposition(|element| element.name == name) {
                    Some(depth) => {
                        while open.len() > depth {
                            if let Some(mut element) = open.pop() {
                                element.span.end = end;
                                attach(&mut open, &mut roots, Node::Element(element));
                            }
                        }
                    }
                    None => debug!("Ignoring stray end tag </{}>", name),
                }
            }
            Ok(Event::Text(ref e)) => {
                let raw = String::from_utf8_lossy(e);
                attach(&mut open, &mut roots, Node::Text(decode_entities(&raw)));
            }
            Ok(Event::CData(ref e)) => {
                let raw = String::from_utf8_lossy(e).into_owned();
                attach(&mut open, &mut roots, Node::Text(raw));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ProDocError::Markup(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    while let Some(mut element) = open.pop() {
        element.span.end = source.len();
        attach(&mut open, &mut roots, Node::Element(element));
    }

    Ok(roots)
}

fn start_element(e: &BytesStart<'_>, start: usize) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .html_attributes()
        .filter_map(|attr| attr.ok())
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&attr.value));
            (key, value)
        })
        .collect();

    Element {
        name,
        attrs,
        children: Vec::new(),
        span: start..start,
    }
}

fn attach(open: &mut [Element], roots: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(source: &str) -> Element {
        parse_fragment(source)
            .unwrap()
            .into_iter()
            .find_map(|node| match node {
                Node::Element(element) => Some(element),
                Node::Text(_) => None,
            })
            .unwrap()
    }

    #[test]
    fn test_nested_elements() {
        let p = first("<p>a <strong>b</strong> c</p>");
        assert_eq!(p.name, "p");
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.text(), "a b c");
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let p = first("<p>one<br>two<img src=\"x.png\">three</p>");
        let names: Vec<&str> = p.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["br", "img"]);
        assert_eq!(p.text(), "one\ntwothree");
    }

    #[test]
    fn test_attributes_and_style() {
        let a = first("<A HREF=\"https://x.test/?a=1&amp;b=2\" target=_blank style=\"color: red; Text-Align: center\">x</A>");
        assert_eq!(a.name, "a");
        assert_eq!(a.attr("href"), Some("https://x.test/?a=1&b=2"));
        assert_eq!(a.attr("target"), Some("_blank"));
        assert_eq!(a.style("text-align").as_deref(), Some("center"));
    }

    #[test]
    fn test_valueless_attribute() {
        let frame = first("<iframe src=\"u\" allowfullscreen></iframe>");
        assert!(frame.has_attr("allowfullscreen"));
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a&nbsp;b &lt;c&gt;"), "a\u{a0}b <c>");
        assert_eq!(decode_entities("R&D"), "R&D");
        assert_eq!(decode_entities("&#65;"), "A");
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let nodes = parse_fragment("<div><p>open</div></span>tail").unwrap();
        assert_eq!(nodes.len(), 2);
        let div = nodes[0].as_element().unwrap();
        assert_eq!(div.elements().next().unwrap().text(), "open");
        assert_eq!(nodes[1], Node::Text("tail".into()));
    }

    #[test]
    fn test_span_covers_source() {
        let source = "<p>x</p><div class=\"box\">raw</div>";
        let nodes = parse_fragment(source).unwrap();
        let div = nodes[1].as_element().unwrap();
        assert_eq!(&source[div.span.clone()], "<div class=\"box\">raw</div>");
    }

    #[test]
    fn test_px() {
        assert_eq!(parse_px("400px"), Some(400));
        assert_eq!(parse_px(" 12.6 px"), Some(13));
        assert_eq!(parse_px("auto"), None);
    }
}
