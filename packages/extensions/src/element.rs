//! Element tree consumed by namespace modules.
//!
//! Namespaces only see elements through [`ElementHandle`], so hosts with
//! their own document model can implement it directly. [`Element`] is the
//! owned tree produced by [`crate::xml::parse_document`] and used throughout
//! the tests.

/// Read-only view of a document element.
pub trait ElementHandle {
    /// Qualified tag name as written, e.g. `env:get`.
    fn tag_name(&self) -> &str;

    /// Namespace URI the element belongs to, if any.
    fn namespace_uri(&self) -> Option<&str>;

    /// Attribute value by qualified name, `None` when absent.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// All attributes as `(qualified name, value)` in document order.
    fn attributes(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_>;

    /// Child elements in document order.
    fn child_elements(&self) -> Box<dyn Iterator<Item = &dyn ElementHandle> + '_>;

    /// Tag name without its prefix.
    fn local_name(&self) -> &str {
        local_part(self.tag_name())
    }
}

/// Strip a `prefix:` from a qualified name.
pub fn local_part(qualified: &str) -> &str {
    qualified
        .split_once(':')
        .map_or(qualified, |(_, local)| local)
}

/// Owned element with qualified attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    tag_name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element without namespace, attributes or children.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Self::default()
        }
    }

    /// Set the namespace URI.
    #[must_use]
    pub fn in_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    /// Add an attribute, replacing an existing one with the same name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Append a child in place.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Direct children.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Depth-first iterator over this element and all descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

impl ElementHandle for Element {
    fn tag_name(&self) -> &str {
        &self.tag_name
    }

    fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        Box::new(
            self.attributes
                .iter()
                .map(|(n, v)| (n.as_str(), v.as_str())),
        )
    }

    fn child_elements(&self) -> Box<dyn Iterator<Item = &dyn ElementHandle> + '_> {
        Box::new(self.children.iter().map(|c| c as &dyn ElementHandle))
    }
}
