//! XML tree builder

use indexmap::IndexMap;

use crate::error::{Error, Pos, Result};
use crate::lexer::Cursor;
use crate::xml::model::{Document, Element, Node};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Drop whitespace-only text nodes instead of preserving them
    pub trim_whitespace: bool,
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trim_whitespace: false,
            max_depth: 128,
            max_size: 10 * 1024 * 1024, // 10 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            trim_whitespace: false,
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Same limits, with whitespace-only text nodes dropped
    pub const fn trimmed(mut self) -> Self {
        self.trim_whitespace = true;
        self
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    input: &'a [u8],
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            input,
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        if self.config.max_size > 0 && self.input.len() > self.config.max_size {
            return Err(Error::malformed(
                Pos::new(0, 1, 1),
                format!("input exceeds maximum size of {} bytes", self.config.max_size),
            ));
        }
        if let Err(err) = std::str::from_utf8(self.input) {
            let offset = err.valid_up_to();
            return Err(Error::malformed(pos_at(self.input, offset), "invalid utf-8"));
        }

        if self.cursor.starts_with(BOM) {
            self.cursor.skip_invisible(BOM.len());
        }

        self.parse_prolog()?;

        if self.cursor.is_eof() {
            return Err(self.error_here("empty document"));
        }
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here("expected root element"));
        }

        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here("content after root element"));
        }

        Ok(Document { root })
    }

    fn parse_prolog(&mut self) -> Result<()> {
        if self.cursor.starts_with(b"<?xml") && self.cursor.peek(5).is_some_and(is_whitespace) {
            self.parse_declaration()?;
        }

        loop {
            self.skip_misc()?;
            if self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Skip whitespace, comments and processing instructions
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<()> {
        self.cursor.advance_by(5);
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"?>") {
                self.cursor.advance_by(2);
                return Ok(());
            }
            if self.cursor.is_eof() {
                return Err(self.error_here("unterminated xml declaration"));
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if name == "encoding" && !is_utf8_label(&value) {
                return Err(Error::malformed(
                    pos,
                    format!("unsupported encoding `{value}`, expected UTF-8"),
                ));
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        let start = self.cursor.position();
        self.expect_byte(b'<')?;

        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::malformed(
                start,
                format!("maximum depth of {} exceeded", self.config.max_depth),
            ));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            self.depth -= 1;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        loop {
            if self.cursor.starts_with(b"</") {
                let close_pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::malformed(
                        close_pos,
                        format!("mismatched closing tag: expected </{name}>, found </{close_name}>"),
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<![CDATA[") {
                let text = self.parse_cdata()?;
                push_text(&mut children, text);
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("unexpected markup declaration"));
            } else if self.cursor.current() == Some(b'<') {
                let child = self.parse_element()?;
                children.push(Node::Element(child));
            } else if self.cursor.is_eof() {
                return Err(Error::malformed(
                    start,
                    format!("unterminated element <{name}>"),
                ));
            } else {
                let text = self.parse_text()?;
                if !(self.config.trim_whitespace && text.trim().is_empty()) {
                    push_text(&mut children, text);
                }
            }
        }

        self.depth -= 1;
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let separated = self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) if !separated => {
                    return Err(self.error_here("expected whitespace between attributes"));
                }
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input")),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::malformed(pos, format!("duplicate attribute `{name}`")));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let mut bytes = Vec::new();
        loop {
            match self.cursor.current() {
                Some(b) if b == quote => {
                    self.cursor.advance();
                    return self.utf8_string(bytes);
                }
                Some(b'<') => return Err(self.error_here("`<` in attribute value")),
                Some(b'&') => self.parse_reference(&mut bytes)?,
                // attribute value normalization
                Some(b'\t' | b'\n' | b'\r') => {
                    if self.cursor.starts_with(b"\r\n") {
                        self.cursor.advance();
                    }
                    bytes.push(b' ');
                    self.cursor.advance();
                }
                Some(b) => {
                    bytes.push(b);
                    self.cursor.advance();
                }
                None => return Err(self.error_here("unterminated attribute value")),
            }
        }
    }

    fn parse_text(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        while let Some(b) = self.cursor.current() {
            match b {
                b'<' => break,
                b'&' => self.parse_reference(&mut bytes)?,
                // line-end normalization
                b'\r' => {
                    self.cursor.advance();
                    self.cursor.consume(b'\n');
                    bytes.push(b'\n');
                }
                _ => {
                    bytes.push(b);
                    self.cursor.advance();
                }
            }
        }
        self.utf8_string(bytes)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = self.cursor.slice_from(start).to_vec();
                self.cursor.advance_by(3);
                return self.utf8_string(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated CDATA section"))
    }

    /// Decode `&name;` or `&#...;` at the cursor into `out`
    fn parse_reference(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let pos = self.cursor.position();
        self.cursor.advance();

        let start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                Some(b';') => break,
                Some(b) if is_name_char(b) || b == b'#' => self.cursor.advance(),
                _ => return Err(Error::malformed(pos, "unterminated entity reference")),
            }
        }
        let entity = self.cursor.slice_from(start);
        self.cursor.advance();

        let decoded = match entity {
            b"amp" => Some('&'),
            b"lt" => Some('<'),
            b"gt" => Some('>'),
            b"quot" => Some('"'),
            b"apos" => Some('\''),
            _ => match entity.strip_prefix(b"#") {
                Some(numeric) => decode_char_reference(numeric),
                None => {
                    let name = String::from_utf8_lossy(entity);
                    return Err(Error::malformed(pos, format!("unknown entity `&{name};`")));
                }
            },
        };

        match decoded {
            Some(ch) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                Ok(())
            }
            None => Err(Error::malformed(pos, "invalid character reference")),
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(self.error_here("invalid name")),
            None => return Err(self.error_here("expected name")),
        }
        while self.cursor.current().is_some_and(is_name_char) {
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start).to_vec();
        self.utf8_string(raw)
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.cursor.advance_by(4);
        self.skip_until(b"-->", "unterminated comment")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        if self.cursor.starts_with(b"<?xml") && self.cursor.peek(5).is_some_and(is_whitespace) {
            return Err(self.error_here("xml declaration is only allowed at the start"));
        }
        self.cursor.advance_by(2);
        self.skip_until(b"?>", "unterminated processing instruction")
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let pos = self.cursor.position();
        let mut in_subset = false;
        let mut quote = None;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => in_subset = true,
                (None, b']') => in_subset = false,
                (None, b'>') if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(Error::malformed(pos, "unterminated DOCTYPE"))
    }

    fn skip_until(&mut self, pattern: &[u8], message: &str) -> Result<()> {
        let pos = self.cursor.position();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(Error::malformed(pos, message))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            let found = match self.cursor.current() {
                Some(b) => format!("`{}`", char::from(b)),
                None => "end of input".to_string(),
            };
            Err(self.error_here(&format!("expected `{}`, found {found}", char::from(expected))))
        }
    }

    fn utf8_string(&self, bytes: Vec<u8>) -> Result<String> {
        String::from_utf8(bytes).map_err(|_| self.error_here("invalid utf-8"))
    }

    fn error_here(&self, message: &str) -> Error {
        Error::malformed(self.cursor.position(), message)
    }
}

/// Text and CDATA that follow each other form one text node
fn push_text(children: &mut Vec<Node>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(previous)) = children.last_mut() {
        previous.push_str(&text);
    } else {
        children.push(Node::Text(text));
    }
}

fn pos_at(input: &[u8], offset: usize) -> Pos {
    let prefix = input.get(..offset).unwrap_or_default();
    let line = prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    // columns count characters, as the cursor does; a leading BOM has none
    let mut col = prefix
        .get(line_start..)
        .unwrap_or_default()
        .iter()
        .filter(|&&b| b & 0xC0 != 0x80)
        .count();
    if line_start == 0 && prefix.starts_with(BOM) {
        col = col.saturating_sub(1);
    }
    Pos::new(
        offset,
        u32::try_from(line + 1).unwrap_or(u32::MAX),
        u32::try_from(col + 1).unwrap_or(u32::MAX),
    )
}

/// Whether `name` is a tag or attribute name the parser accepts
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes.next().is_some_and(is_name_start) && bytes.all(is_name_char)
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}

fn decode_char_reference(numeric: &[u8]) -> Option<char> {
    let text = std::str::from_utf8(numeric).ok()?;
    let code = match text.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => text.parse::<u32>().ok()?,
    };
    char::from_u32(code).filter(|&ch| is_xml_char(ch))
}

fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r') || (ch >= ' ' && !matches!(ch, '\u{FFFE}' | '\u{FFFF}'))
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

const fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

const fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}
