//! In-memory element tree the widget mounts into.
//!
//! [`Document`] is a small arena of elements: enough of a DOM to create
//! nodes, look them up with CSS selectors, set inline styles and serialize
//! the result back to HTML. Host pages are read with `scraper`; everything
//! after that happens on the arena.
//!
//! # Selectors
//!
//! [`Document::query_selector`] accepts anything `scraper::Selector` parses:
//! combinators, attribute selectors, selector lists and structural
//! pseudo-classes. Matching runs on a `scraper` copy of the attached tree.
//!
//! ```text
//! #news-widget
//! .sidebar > .news
//! div[data-widget=news]
//! aside div:first-child
//! ```

use ego_tree::{NodeId, Tree};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Handle to an element of a [`Document`].
///
/// Handles are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// A child slot of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Child {
    Element(ElementId),
    Text(String),
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    children: Vec<Child>,
    parent: Option<ElementId>,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An element tree rooted at `<html>`.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ElementData>,
    root: ElementId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty page: `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            root: ElementId(0),
        };
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.append_child(html, head);
        doc.append_child(html, body);
        doc.root = html;
        doc
    }

    /// An empty page whose body holds a single `<div id="{id}">`.
    pub fn with_container(id: &str) -> Self {
        let mut doc = Self::new();
        let div = doc.create_element("div");
        doc.set_attr(div, "id", id);
        let body = doc.body();
        doc.append_child(body, div);
        doc
    }

    /// Build a document from HTML source.
    ///
    /// Parsing is lenient: missing `<html>`, `<head>` or `<body>` are
    /// synthesized. Comments and doctypes are dropped; `style` attributes are
    /// split into inline style properties.
    pub fn parse_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Document {
            nodes: Vec::new(),
            root: ElementId(0),
        };
        doc.root = doc.import(html.root_element());
        doc
    }

    fn import(&mut self, element: ElementRef<'_>) -> ElementId {
        let value = element.value();
        let id = self.create_element(value.name());
        for (name, attr) in value.attrs() {
            if name.eq_ignore_ascii_case("style") {
                for (prop, val) in parse_style_attr(attr) {
                    self.set_style(id, &prop, &val);
                }
            } else {
                self.set_attr(id, name, attr);
            }
        }

        for child in element.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                let child_id = self.import(child_el);
                self.append_child(id, child_id);
            } else if let Some(text) = child.value().as_text() {
                let text: &str = text;
                self.append_text(id, text);
            }
        }
        id
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The `<body>` element, created on demand.
    pub fn body(&mut self) -> ElementId {
        if let Some(id) = self.child_elements(self.root).find(|&c| self.tag(c) == "body") {
            return id;
        }
        let id = self.create_element("body");
        self.append_child(self.root, id);
        id
    }

    /// Whether `id` was created by this document.
    pub fn contains(&self, id: ElementId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.nodes.push(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            styles: Vec::new(),
            children: Vec::new(),
            parent: None,
        });
        ElementId(self.nodes.len() - 1)
    }

    /// Lower-case tag name.
    pub fn tag(&self, id: ElementId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes[id.0].parent
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        set_ordered(&mut self.nodes[id.0].attrs, name, value);
    }

    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        get_ordered(&self.nodes[id.0].attrs, name)
    }

    /// Set an inline style property, replacing an existing value in place.
    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        let property = property.trim().to_ascii_lowercase();
        set_ordered(&mut self.nodes[id.0].styles, property, value.trim());
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        get_ordered(&self.nodes[id.0].styles, property)
    }

    /// Inline styles in the order they were first set.
    pub fn styles(&self, id: ElementId) -> &[(String, String)] {
        &self.nodes[id.0].styles
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0]
                .children
                .retain(|c| *c != Child::Element(child));
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(Child::Element(child));
    }

    /// Append a text node.
    pub fn append_text(&mut self, parent: ElementId, text: &str) {
        self.nodes[parent.0].children.push(Child::Text(text.to_string()));
    }

    /// Remove every child of `id`.
    pub fn clear_children(&mut self, id: ElementId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            if let Child::Element(c) = child {
                self.nodes[c.0].parent = None;
            }
        }
    }

    /// Element children of `id`, in order.
    pub fn child_elements(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes[id.0].children.iter().filter_map(|c| match c {
            Child::Element(e) => Some(*e),
            Child::Text(_) => None,
        })
    }

    /// Concatenated text of `id` and all its descendants.
    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        for child in &self.nodes[id.0].children {
            match child {
                Child::Text(t) => out.push_str(t),
                Child::Element(e) => self.collect_text(*e, out),
            }
        }
    }

    /// First element matching `selector`, in document order.
    ///
    /// A selector that does not parse matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<ElementId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// Every attached element matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(selector, error = ?e, "Selector did not parse");
                return Vec::new();
            }
        };
        let (html, ids) = self.to_scraper();
        html.select(&parsed)
            .filter_map(|el| ids.get(&el.id()).copied())
            .collect()
    }

    /// Copy the attached tree into a `scraper` document.
    ///
    /// Nodes are appended in document order, so `Html::select` yields
    /// matches in that order too.
    fn to_scraper(&self) -> (Html, HashMap<NodeId, ElementId>) {
        let mut html = Html::new_document();
        let mut ids = HashMap::new();
        let document = html.tree.root().id();
        self.mirror_into(&mut html.tree, document, self.root, &mut ids);
        (html, ids)
    }

    fn mirror_into(
        &self,
        tree: &mut Tree<Node>,
        parent: NodeId,
        id: ElementId,
        ids: &mut HashMap<NodeId, ElementId>,
    ) {
        let Some(mut parent_node) = tree.get_mut(parent) else {
            return;
        };
        let node_id = parent_node
            .append(Node::Element(self.scraper_element(id)))
            .id();
        ids.insert(node_id, id);

        for child in &self.nodes[id.0].children {
            match child {
                Child::Element(c) => self.mirror_into(tree, node_id, *c, ids),
                Child::Text(t) => {
                    if let Some(mut node) = tree.get_mut(node_id) {
                        node.append(Node::Text(Text {
                            text: StrTendril::from_slice(t),
                        }));
                    }
                }
            }
        }
    }

    fn scraper_element(&self, id: ElementId) -> Element {
        let node = &self.nodes[id.0];
        let mut attrs: Vec<Attribute> = node
            .attrs
            .iter()
            .map(|(name, value)| attribute(name, value))
            .collect();
        if let Some(style) = self.style_attr(id) {
            attrs.push(attribute("style", &style));
        }
        let name = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(node.tag.as_str()),
        );
        Element::new(name, attrs)
    }

    fn style_attr(&self, id: ElementId) -> Option<String> {
        let styles = &self.nodes[id.0].styles;
        (!styles.is_empty()).then(|| {
            styles
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; ")
        })
    }

    /// Serialized children of `id`.
    pub fn inner_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    /// Serialized `id`, including its own tag.
    pub fn outer_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_element(id, &mut out);
        out
    }

    /// The whole page, with a doctype.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.write_element(self.root, &mut out);
        out.push('\n');
        out
    }

    fn write_element(&self, id: ElementId, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push('<');
        out.push_str(&node.tag);
        for (name, value) in &node.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
        if let Some(style) = self.style_attr(id) {
            let _ = write!(out, " style=\"{}\"", escape_attr(&style));
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&node.tag.as_str()) {
            return;
        }
        self.write_children(id, out);
        let _ = write!(out, "</{}>", node.tag);
    }

    fn write_children(&self, id: ElementId, out: &mut String) {
        let raw = RAW_TEXT_ELEMENTS.contains(&self.nodes[id.0].tag.as_str());
        for child in &self.nodes[id.0].children {
            match child {
                Child::Text(t) if raw => out.push_str(t),
                Child::Text(t) => out.push_str(&escape_text(t)),
                Child::Element(e) => self.write_element(*e, out),
            }
        }
    }
}

fn set_ordered(entries: &mut Vec<(String, String)>, key: String, value: &str) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => entries.push((key, value.to_string())),
    }
}

fn get_ordered<'a>(entries: &'a [(String, String)], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn parse_style_attr(attr: &str) -> Vec<(String, String)> {
    attr.split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            (!prop.is_empty()).then(|| (prop.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse_html(
            r#"<!DOCTYPE html>
<html><head><title>Host</title><style>a > b { color: red; }</style></head>
<body>
  <main class="page wide">
    <div id="news" class="widget" style="color: red; margin:0">old</div>
    <aside><div class="widget small"></div></aside>
  </main>
</body></html>"#,
        )
    }

    #[test]
    fn test_new_document_shape() {
        let mut doc = Document::new();
        assert_eq!(doc.tag(doc.root()), "html");
        let body = doc.body();
        assert_eq!(doc.tag(body), "body");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head></head><body></body></html>\n"
        );
    }

    #[test]
    fn test_with_container() {
        let doc = Document::with_container("news-widget");
        let id = doc.query_selector("#news-widget").unwrap();
        assert_eq!(doc.tag(id), "div");
        assert_eq!(doc.parent(id).map(|p| doc.tag(p)), Some("body"));
    }

    #[test]
    fn test_parse_html_imports_styles_and_text() {
        let doc = sample();
        let news = doc.query_selector("#news").unwrap();
        assert_eq!(doc.style(news, "color"), Some("red"));
        assert_eq!(doc.style(news, "margin"), Some("0"));
        assert_eq!(doc.attr(news, "style"), None);
        assert_eq!(doc.text_content(news), "old");
    }

    #[test]
    fn test_selectors() {
        let doc = sample();
        let news = doc.query_selector("#news").unwrap();
        assert_eq!(doc.query_selector("#news"), Some(news));
        assert_eq!(doc.query_selector("div#news.widget"), Some(news));
        assert_eq!(doc.query_selector(".widget"), Some(news));
        assert_eq!(doc.query_selector("main .widget"), Some(news));
        assert_eq!(doc.query_selector_all(".widget").len(), 2);
        assert_eq!(doc.query_selector_all("aside .widget.small").len(), 1);
        assert_eq!(doc.query_selector("main.page.wide"), doc.query_selector("main"));
        assert_eq!(doc.query_selector("aside #news"), None);
        assert_eq!(doc.query_selector("#missing"), None);
        assert_eq!(doc.query_selector(""), None);
        assert_eq!(doc.query_selector("div[[oops"), None);
        assert_eq!(doc.query_selector("body > main"), doc.query_selector("main"));
        assert_eq!(doc.query_selector("*"), Some(doc.root()));
    }

    #[test]
    fn test_full_css_selectors() {
        let doc = Document::parse_html(
            r#"<body><aside class="sidebar"><div class="news" data-widget="news"></div><p></p></aside></body>"#,
        );
        let news = doc.query_selector(".news").unwrap();
        for selector in [
            ".sidebar > .news",
            "[data-widget=news]",
            "div[data-widget]",
            "#nope, .news",
            "aside div:first-child",
            "aside > :empty",
        ] {
            assert_eq!(doc.query_selector(selector), Some(news), "{}", selector);
        }
        assert_eq!(doc.query_selector("body > .news"), None);
        assert_eq!(doc.query_selector("div:not(.news)"), None);
    }

    #[test]
    fn test_selectors_see_arena_changes() {
        let mut doc = Document::with_container("news-widget");
        let container = doc.query_selector("#news-widget").unwrap();
        let card = doc.create_element("div");
        doc.set_attr(card, "class", "card");
        doc.set_style(card, "display", "flex");
        assert_eq!(doc.query_selector(".card"), None);

        doc.append_child(container, card);
        assert_eq!(doc.query_selector("#news-widget > .card"), Some(card));
        assert_eq!(doc.query_selector(r#"[style*="flex"]"#), Some(card));

        doc.clear_children(container);
        assert_eq!(doc.query_selector(".card"), None);
    }

    #[test]
    fn test_set_style_replaces_in_place() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_style(div, "width", "10px");
        doc.set_style(div, "height", "auto");
        doc.set_style(div, "width", "20px");
        assert_eq!(
            doc.styles(div),
            &[
                ("width".to_string(), "20px".to_string()),
                ("height".to_string(), "auto".to_string())
            ]
        );
        assert_eq!(
            doc.outer_html(div),
            r#"<div style="width: 20px; height: auto"></div>"#
        );
    }

    #[test]
    fn test_clear_and_append() {
        let mut doc = sample();
        let news = doc.query_selector("#news").unwrap();
        doc.clear_children(news);
        assert_eq!(doc.inner_html(news), "");

        let p = doc.create_element("p");
        doc.append_text(p, "hi");
        doc.append_child(news, p);
        assert_eq!(doc.inner_html(news), "<p>hi</p>");
        assert_eq!(doc.parent(p), Some(news));

        doc.clear_children(news);
        assert_eq!(doc.parent(p), None);
        assert!(doc.contains(p));
    }

    #[test]
    fn test_append_child_moves_node() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let c = doc.create_element("span");
        doc.append_child(a, c);
        doc.append_child(b, c);
        assert_eq!(doc.child_elements(a).count(), 0);
        assert_eq!(doc.parent(c), Some(b));
    }

    #[test]
    fn test_serialization_escapes() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        doc.set_attr(a, "href", "https://x.test/?a=1&b=\"2\"");
        doc.append_text(a, "<script>alert(1)</script> & more");
        assert_eq!(
            doc.outer_html(a),
            "<a href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\">&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</a>"
        );
    }

    #[test]
    fn test_void_and_raw_text_elements() {
        let doc = sample();
        let html = doc.to_html();
        assert!(html.contains("<style>a > b { color: red; }</style>"));

        let mut doc = Document::new();
        let img = doc.create_element("img");
        doc.set_attr(img, "src", "a.jpg");
        assert_eq!(doc.outer_html(img), r#"<img src="a.jpg">"#);
    }
}
