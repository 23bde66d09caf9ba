//! XML loading into the owned element tree.
//!
//! Documents are parsed with `roxmltree`, which resolves namespaces strictly:
//! every prefix, including `use:` and `event:`, must be declared with an
//! `xmlns:` attribute. Qualified names are kept exactly as written in the
//! source so namespaces can look attributes up by their spelling
//! (`event:schema`), even when several prefixes share one URI.

use roxmltree::Node;

use crate::element::Element;
use crate::error::Result;

/// A parsed document: the root element plus its source location, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
    source: Option<String>,
}

impl Document {
    /// Wrap an already-built root element.
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self { root, source: None }
    }

    /// Record where the document came from (file path, URL).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The document root element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Where the document was loaded from.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Parse XML text into a [`Document`].
///
/// # Errors
/// Returns `XmlParse` for malformed XML or undeclared prefixes.
///
/// # Examples
/// ```
/// use scxml_extensions::element::ElementHandle;
/// use scxml_extensions::xml::parse_document;
///
/// let xml = r#"<env:get xmlns:env="urn:scxml-ext:env" name="HOME" location="home"/>"#;
/// let doc = parse_document(xml).unwrap();
/// assert_eq!(doc.root().tag_name(), "env:get");
/// assert_eq!(doc.root().local_name(), "get");
/// assert_eq!(doc.root().namespace_uri(), Some("urn:scxml-ext:env"));
/// ```
pub fn parse_document(text: &str) -> Result<Document> {
    let doc = roxmltree::Document::parse(text)?;
    Ok(Document::new(convert_element(text, doc.root_element())))
}

/// Qualified tag name of a node as written in `text`, e.g. `env:get`.
///
/// `text` must be the source `node` was parsed from.
pub fn qualified_tag_name(text: &str, node: Node<'_, '_>) -> String {
    text.get(node.range().start..)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| {
            rest.split(|c: char| c.is_whitespace() || c == '/' || c == '>')
                .next()
        })
        .filter(|name| !name.is_empty())
        .map_or_else(
            || {
                let tag = node.tag_name();
                qualify(node, tag.namespace(), tag.name())
            },
            str::to_string,
        )
}

/// Rebuild `prefix:local` from the namespace scope.
///
/// Only used when the source text is unavailable: several prefixes may be
/// bound to one URI, so the scope cannot say which one was written.
fn qualify(node: Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn convert_element(text: &str, node: Node<'_, '_>) -> Element {
    let mut element = Element::new(qualified_tag_name(text, node));
    if let Some(uri) = node.tag_name().namespace() {
        element = element.in_namespace(uri);
    }

    for attr in node.attributes() {
        let name = text
            .get(attr.range_qname())
            .map_or_else(|| qualify(node, attr.namespace(), attr.name()), str::to_string);
        element.set_attribute(name, attr.value());
    }

    for child in node.children().filter(|c| c.is_element()) {
        element.push_child(convert_element(text, child));
    }

    element
}
