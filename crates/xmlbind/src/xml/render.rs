//! Element tree to markup text

use std::borrow::Cow;

use crate::xml::model::{Document, Element, Node};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Output options for the renderer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Spaces per nesting level for element-only content (0 renders compact)
    pub indent: usize,
    /// Emit an XML declaration before the root element
    pub declaration: bool,
}

impl Config {
    /// Compact output without declaration
    pub const fn compact() -> Self {
        Self {
            indent: 0,
            declaration: false,
        }
    }

    /// Indented output with declaration
    pub const fn pretty(indent: usize) -> Self {
        Self {
            indent,
            declaration: true,
        }
    }
}

/// Deterministic XML writer
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    config: Config,
}

impl Renderer {
    pub const fn new() -> Self {
        Self::with_config(Config::compact())
    }

    pub const fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn render(&self, element: &Element) -> String {
        let mut output = String::new();
        if self.config.declaration {
            output.push_str(DECLARATION);
            output.push('\n');
        }
        self.write_element(element, 0, &mut output);
        if self.config.indent > 0 {
            output.push('\n');
        }
        output
    }

    pub fn render_document(&self, document: &Document) -> String {
        self.render(&document.root)
    }

    fn write_element(&self, element: &Element, depth: usize, output: &mut String) {
        output.push('<');
        output.push_str(&element.name);

        for (key, value) in &element.attributes {
            output.push(' ');
            output.push_str(key);
            output.push_str("=\"");
            output.push_str(&escape_attribute(value));
            output.push('"');
        }

        if element.children.is_empty() {
            output.push_str("/>");
            return;
        }
        output.push('>');

        // mixed and text content is written verbatim so no whitespace is introduced
        let indented = self.config.indent > 0
            && element
                .children
                .iter()
                .all(|child| matches!(child, Node::Element(_)));

        for child in &element.children {
            if indented {
                self.newline(depth + 1, output);
            }
            match child {
                Node::Element(child) => self.write_element(child, depth + 1, output),
                Node::Text(text) => output.push_str(&escape_text(text)),
            }
        }

        if indented {
            self.newline(depth, output);
        }
        output.push_str("</");
        output.push_str(&element.name);
        output.push('>');
    }

    fn newline(&self, depth: usize, output: &mut String) {
        output.push('\n');
        output.extend(std::iter::repeat(' ').take(depth * self.config.indent));
    }
}

/// Escape character data
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape(input, false)
}

/// Escape an attribute value, including whitespace that parsing would normalize
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    escape(input, true)
}

fn escape(input: &str, attribute: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| {
        matches!(c, '&' | '<' | '>' | '"' | '\'' | '\r')
            || (attribute && matches!(c, '\t' | '\n'))
    };
    if !input.contains(needs_escape) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' if attribute => escaped.push_str("&#9;"),
            '\n' if attribute => escaped.push_str("&#10;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
