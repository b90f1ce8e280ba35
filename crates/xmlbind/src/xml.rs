//! XML element tree, parser and renderer

pub mod model;
pub mod parser;
pub mod render;

pub use model::{Document, Element, Node};
pub use parser::{Config as ParserConfig, Parser};
pub use render::{escape_attribute, escape_text, Config as RenderConfig, Renderer};
