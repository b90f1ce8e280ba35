//! xmlbind - Bind XML documents to typed object graphs and back
//!
//! # Quick Start
//!
//! ```
//! use xmlbind::{FieldDescriptor, Registry, ScalarType, TypeDeclaration};
//! # fn main() -> Result<(), xmlbind::Error> {
//! let registry = Registry::new();
//! registry.declare(
//!     TypeDeclaration::new("person")
//!         .field(FieldDescriptor::attribute("age", ScalarType::Integer))
//!         .field(FieldDescriptor::child("name", ScalarType::String)),
//! );
//!
//! let document = xmlbind::parse(r#"<person age="30"><name>Ada</name></person>"#)?;
//! let person = xmlbind::bind(&document.root, "person", &registry)?;
//! assert_eq!(person.read().get_str("name"), Some("Ada"));
//!
//! person.write().set("age", 31_i64);
//! let element = xmlbind::unbind(&person, "person", &registry)?;
//! assert_eq!(
//!     xmlbind::render(&element),
//!     r#"<person age="31"><name>Ada</name></person>"#
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Location, Pos, Result};

pub mod path;
pub use path::Path;

pub mod lexer;

pub mod xml;
pub use xml::{Document, Element, Node, Parser, ParserConfig, RenderConfig, Renderer};

pub mod object;
pub use object::{Object, ObjectRef, Scalar, ScalarType, Value};

pub mod descriptor;
pub use descriptor::{
    BindingKind, FieldDescriptor, ItemKind, Registry, TypeDeclaration, TypeDescriptor, ValueKind,
};

pub mod bind;
pub use bind::{bind, bind_with_options, unbind, unbind_with_options, Options as BindOptions};

pub mod typed;
pub use typed::{from_element, from_file, from_xml_str, to_element, to_xml_string, Fields, XmlType};

/// Parse markup text into a document
pub fn parse(text: &str) -> Result<Document> {
    Parser::new(text.as_bytes()).parse()
}

/// Parse markup bytes, validating UTF-8
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    Parser::new(bytes).parse()
}

/// Parse with custom configuration
pub fn parse_with_config(text: &str, config: ParserConfig) -> Result<Document> {
    Parser::with_config(text.as_bytes(), config).parse()
}

/// Render an element tree compactly
pub fn render(element: &Element) -> String {
    Renderer::new().render(element)
}

/// Render with custom configuration
pub fn render_with_config(element: &Element, config: RenderConfig) -> String {
    Renderer::with_config(config).render(element)
}
