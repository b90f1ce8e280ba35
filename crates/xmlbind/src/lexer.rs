//! Byte-level scanning support for the markup parser

pub mod cursor;

pub use cursor::Cursor;
