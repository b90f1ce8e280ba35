//! XML element tree

use indexmap::IndexMap;

/// Parsed XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute insertion; a repeated name replaces the value in place
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Direct child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Direct child elements with the given tag name, in document order
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Self> + 'n
    where
        'a: 'n,
    {
        self.child_elements().filter(move |child| child.name == name)
    }

    /// Concatenated direct text content, `None` when the element has no text nodes
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for node in &self.children {
            if let Node::Text(value) = node {
                text.get_or_insert_with(String::new).push_str(value);
            }
        }
        text
    }

    /// Whether any direct text node contains non-whitespace characters
    pub fn has_significant_text(&self) -> bool {
        self.children.iter().any(|node| match node {
            Node::Text(value) => !value.trim().is_empty(),
            Node::Element(_) => false,
        })
    }

    /// Self-closing form: no children and therefore no text
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
