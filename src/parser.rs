//! XML parser
//!
//! Non-validating, non-destructive recursive-descent parser. The tree
//! it builds borrows names and raw values straight out of the source
//! buffer; entity expansion happens later, on first read of a value.
//!
//! Behavior is driven by a [`ParseFlags`] bit set. Each flag toggles a
//! behavior relative to the default, so flags can simply be or-ed
//! together; `FASTEST` and `FULL` are the two presets.

use std::borrow::Cow;
use std::ops::{BitOr, BitOrAssign};

use crate::core::{chartab, entities, Cursor};
use crate::dom::namespace;
use crate::dom::node::{NodeId, NodeKind};
use crate::dom::Document;
use crate::error::{Error, Result};

/// Parse-behavior flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseFlags(u32);

impl ParseFlags {
    /// Default behavior; all other flags negate some part of it.
    pub const DEFAULT: ParseFlags = ParseFlags(0);
    /// Do not create data nodes; element values are still set.
    pub const NO_DATA_NODES: ParseFlags = ParseFlags(0x1);
    /// Do not mirror the first data node into the parent element value.
    pub const NO_ELEMENT_VALUES: ParseFlags = ParseFlags(0x2);
    /// Do not translate entity references on value reads.
    pub const NO_ENTITY_TRANSLATION: ParseFlags = ParseFlags(0x8);
    /// Emit the low 8 bits of numeric references as a single byte
    /// instead of UTF-8.
    pub const NO_UTF8: ParseFlags = ParseFlags(0x10);
    /// Create a declaration node for `<?xml ...?>`.
    pub const DECLARATION_NODE: ParseFlags = ParseFlags(0x20);
    /// Create comment nodes.
    pub const COMMENT_NODES: ParseFlags = ParseFlags(0x40);
    /// Create a doctype node.
    pub const DOCTYPE_NODE: ParseFlags = ParseFlags(0x80);
    /// Create processing-instruction nodes.
    pub const PI_NODES: ParseFlags = ParseFlags(0x100);
    /// Require closing tag names to match opening tag names.
    pub const VALIDATE_CLOSING_TAGS: ParseFlags = ParseFlags(0x200);
    /// Trim leading and trailing whitespace of data values.
    pub const TRIM_WHITESPACE: ParseFlags = ParseFlags(0x400);
    /// Condense whitespace runs in data values to a single space.
    pub const NORMALIZE_WHITESPACE: ParseFlags = ParseFlags(0x800);
    /// Parse only the opening tag of the root element, then stop.
    pub const OPEN_ONLY: ParseFlags = ParseFlags(0x1000);
    /// Parse a single top-level construct and stop.
    pub const PARSE_ONE: ParseFlags = ParseFlags(0x2000);
    /// Run namespace and duplicate-attribute checks during the parse.
    pub const VALIDATE_XMLNS: ParseFlags = ParseFlags(0x4000);

    /// Fastest useful parse: no data nodes.
    pub const FASTEST: ParseFlags = ParseFlags(Self::NO_DATA_NODES.0);
    /// Largest amount of extracted data, plus full validation.
    pub const FULL: ParseFlags = ParseFlags(
        Self::DECLARATION_NODE.0
            | Self::COMMENT_NODES.0
            | Self::DOCTYPE_NODE.0
            | Self::PI_NODES.0
            | Self::VALIDATE_CLOSING_TAGS.0
            | Self::VALIDATE_XMLNS.0,
    );

    /// True if any flag in `other` is set in `self`.
    #[inline]
    pub fn has(self, other: ParseFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ParseFlags {
    type Output = ParseFlags;

    fn bitor(self, rhs: ParseFlags) -> ParseFlags {
        ParseFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ParseFlags {
    fn bitor_assign(&mut self, rhs: ParseFlags) {
        self.0 |= rhs.0;
    }
}

impl<'buf> Document<'buf> {
    /// Parse a whole buffer into a new document.
    ///
    /// The buffer is never written to; it must outlive the document.
    /// More than one top-level element is a parse error.
    pub fn parse(text: &'buf [u8], flags: ParseFlags) -> Result<Document<'buf>> {
        Ok(Self::parse_partial(text, flags, None)?.0)
    }

    /// Parse a (possibly partial) buffer, honoring [`ParseFlags::OPEN_ONLY`]
    /// and [`ParseFlags::PARSE_ONE`], and return the byte offset just
    /// past the last consumed byte.
    ///
    /// For `PARSE_ONE`, `outer` supplies the enclosing stream document:
    /// the namespace declarations in scope at its root are copied onto
    /// this document's document node, so prefixes bound by the outer
    /// open tag resolve inside the fragment. The borrow of `outer` ends
    /// when this returns.
    pub fn parse_partial(
        text: &'buf [u8],
        flags: ParseFlags,
        outer: Option<&Document<'buf>>,
    ) -> Result<(Document<'buf>, usize)> {
        let mut doc = Document::new();
        doc.flags = flags;
        if let Some(outer) = outer {
            adopt_outer_bindings(&mut doc, outer)?;
        }
        let mut parser = Parser {
            cur: Cursor::new(text),
            flags,
            doc: &mut doc,
        };
        parser.parse_document()?;
        let consumed = parser.cur.pos();
        Ok((doc, consumed))
    }
}

/// Copy the namespace declarations in scope at `outer`'s root element
/// onto `doc`'s document node. Innermost binding wins per name; values
/// still borrowed from the shared source buffer stay borrowed.
fn adopt_outer_bindings<'buf>(doc: &mut Document<'buf>, outer: &Document<'buf>) -> Result<()> {
    let root = match outer.root_element() {
        Ok(root) => root.id(),
        Err(_) => return Ok(()),
    };

    let mut seen: Vec<Vec<u8>> = Vec::new();
    let mut cur = Some(root);
    while let Some(id) = cur {
        let mut next_attr = outer.node(id).first_attr;
        while let Some(attr) = next_attr {
            let name = outer.attr(attr).name.clone();
            let is_binding =
                name.as_ref() == b"xmlns" || name.as_ref().starts_with(b"xmlns:");
            if is_binding && !seen.iter().any(|n| n.as_slice() == name.as_ref()) {
                seen.push(name.as_ref().to_vec());
                let value = outer.attr_value_cow(attr)?;
                let copied = doc.alloc_attribute(name, value);
                doc.append_attribute(NodeId::DOCUMENT, copied);
            }
            next_attr = outer.attr(attr).next_attr;
        }
        cur = outer.node(id).parent;
    }
    Ok(())
}

struct Parser<'a, 'buf> {
    cur: Cursor<'buf>,
    flags: ParseFlags,
    doc: &'a mut Document<'buf>,
}

impl<'a, 'buf> Parser<'a, 'buf> {
    /// Classify an error by the byte under the cursor: end of buffer
    /// reads as NUL and reports as an eof error.
    fn error(&self, message: &'static str) -> Error {
        if self.cur.peek() == 0 {
            Error::Eof { message }
        } else {
            Error::Parse {
                message,
                offset: self.cur.pos(),
            }
        }
    }

    fn parse_document(&mut self) -> Result<()> {
        self.parse_bom();

        let mut have_root = false;
        loop {
            self.cur.skip_whitespace();
            if self.cur.peek() == 0 {
                break;
            }
            if self.cur.peek() != b'<' {
                return Err(self.error("expected <"));
            }
            self.cur.bump();

            let open_only = self.flags.has(ParseFlags::OPEN_ONLY);
            if let Some(node) = self.parse_node(NodeId::DOCUMENT, open_only)? {
                if self.doc.node(node).kind == NodeKind::Element {
                    if have_root {
                        return Err(self.error("more than one root element"));
                    }
                    have_root = true;
                    if self.flags.has(ParseFlags::OPEN_ONLY)
                        || self.flags.has(ParseFlags::PARSE_ONE)
                    {
                        break;
                    }
                }
            }
        }

        if self.doc.node(NodeId::DOCUMENT).first_child.is_none() {
            return Err(self.error("no root element"));
        }
        Ok(())
    }

    /// Skip a UTF-8 byte-order mark, if present.
    fn parse_bom(&mut self) {
        self.cur.eat(&[0xEF, 0xBB, 0xBF]);
    }

    /// Dispatch on the byte after `<`, parse one construct, and attach
    /// whatever node it produces to `parent`.
    fn parse_node(&mut self, parent: NodeId, open_only: bool) -> Result<Option<NodeId>> {
        match self.cur.peek() {
            b'?' => {
                self.cur.bump();
                if (self.cur.at(0) | 0x20) == b'x'
                    && (self.cur.at(1) | 0x20) == b'm'
                    && (self.cur.at(2) | 0x20) == b'l'
                    && chartab::WHITESPACE[self.cur.at(3) as usize]
                {
                    self.cur.advance(4);
                    self.parse_xml_declaration(parent)
                } else {
                    self.parse_pi(parent)
                }
            }
            b'!' => {
                if self.cur.at(1) == b'-' && self.cur.at(2) == b'-' {
                    self.cur.advance(3);
                    return self.parse_comment(parent);
                }
                if self.cur.starts_with(b"![CDATA[") {
                    self.cur.advance(8);
                    return self.parse_cdata(parent);
                }
                if self.cur.starts_with(b"!DOCTYPE")
                    && chartab::WHITESPACE[self.cur.at(8) as usize]
                {
                    self.cur.advance(9);
                    return self.parse_doctype(parent);
                }
                // Unrecognized <!...>; skip it whole.
                self.cur.bump();
                while self.cur.peek() != b'>' {
                    if self.cur.peek() == 0 {
                        return Err(self.error("unexpected end of data"));
                    }
                    self.cur.bump();
                }
                self.cur.bump();
                Ok(None)
            }
            _ => self.parse_element(parent, open_only).map(Some),
        }
    }

    /// `<?xml ...?>`, cursor past `xml `.
    fn parse_xml_declaration(&mut self, parent: NodeId) -> Result<Option<NodeId>> {
        if !self.flags.has(ParseFlags::DECLARATION_NODE) {
            while !(self.cur.at(0) == b'?' && self.cur.at(1) == b'>') {
                if self.cur.peek() == 0 {
                    return Err(self.error("unexpected end of data"));
                }
                self.cur.bump();
            }
            self.cur.advance(2);
            return Ok(None);
        }

        let declaration = self.doc.alloc_node(NodeKind::Declaration);
        self.doc.append_child(parent, declaration);
        self.cur.skip_whitespace();
        self.parse_node_attributes(declaration)?;
        if !self.cur.eat(b"?>") {
            return Err(self.error("expected ?>"));
        }
        Ok(Some(declaration))
    }

    /// `<?target body?>`, cursor past `?`.
    fn parse_pi(&mut self, parent: NodeId) -> Result<Option<NodeId>> {
        if !self.flags.has(ParseFlags::PI_NODES) {
            while !(self.cur.at(0) == b'?' && self.cur.at(1) == b'>') {
                if self.cur.peek() == 0 {
                    return Err(self.error("unexpected end of data"));
                }
                self.cur.bump();
            }
            self.cur.advance(2);
            return Ok(None);
        }

        let name_start = self.cur.pos();
        self.cur.skip(&chartab::NODE_NAME);
        if self.cur.pos() == name_start {
            return Err(self.error("expected PI target"));
        }
        let name = self.cur.slice(name_start, self.cur.pos());

        self.cur.skip_whitespace();
        let value_start = self.cur.pos();
        while !(self.cur.at(0) == b'?' && self.cur.at(1) == b'>') {
            if self.cur.peek() == 0 {
                return Err(self.error("unexpected end of data"));
            }
            self.cur.bump();
        }
        let value = self.cur.slice(value_start, self.cur.pos());
        self.cur.advance(2);

        let pi = self.doc.alloc_node(NodeKind::Pi);
        {
            let node = self.doc.node_mut(pi);
            node.name = Cow::Borrowed(name);
            node.raw_value = value;
        }
        self.doc.append_child(parent, pi);
        Ok(Some(pi))
    }

    /// `<!--...-->`, cursor past `!--`.
    fn parse_comment(&mut self, parent: NodeId) -> Result<Option<NodeId>> {
        let value_start = self.cur.pos();
        while !(self.cur.at(0) == b'-' && self.cur.at(1) == b'-' && self.cur.at(2) == b'>') {
            if self.cur.peek() == 0 {
                return Err(self.error("unexpected end of data"));
            }
            self.cur.bump();
        }
        let value = self.cur.slice(value_start, self.cur.pos());
        self.cur.advance(3);

        if !self.flags.has(ParseFlags::COMMENT_NODES) {
            return Ok(None);
        }
        let comment = self.doc.alloc_node(NodeKind::Comment);
        self.doc.node_mut(comment).raw_value = value;
        self.doc.append_child(parent, comment);
        Ok(Some(comment))
    }

    /// `<![CDATA[...]]>`, cursor past `![CDATA[`.
    fn parse_cdata(&mut self, parent: NodeId) -> Result<Option<NodeId>> {
        let value_start = self.cur.pos();
        while !(self.cur.at(0) == b']' && self.cur.at(1) == b']' && self.cur.at(2) == b'>') {
            if self.cur.peek() == 0 {
                return Err(self.error("unexpected end of data"));
            }
            self.cur.bump();
        }
        let value = self.cur.slice(value_start, self.cur.pos());
        self.cur.advance(3);

        if self.flags.has(ParseFlags::NO_DATA_NODES) {
            return Ok(None);
        }
        let cdata = self.doc.alloc_node(NodeKind::CData);
        self.doc.node_mut(cdata).raw_value = value;
        self.doc.append_child(parent, cdata);
        Ok(Some(cdata))
    }

    /// `<!DOCTYPE ...>`, cursor past `!DOCTYPE `. The bracketed internal
    /// subset is matched by `[`/`]` depth counting.
    fn parse_doctype(&mut self, parent: NodeId) -> Result<Option<NodeId>> {
        let value_start = self.cur.pos();
        loop {
            match self.cur.peek() {
                b'>' => break,
                b'[' => {
                    self.cur.bump();
                    let mut depth = 1usize;
                    while depth > 0 {
                        match self.cur.peek() {
                            b'[' => depth += 1,
                            b']' => depth -= 1,
                            0 => return Err(self.error("unexpected end of data")),
                            _ => {}
                        }
                        self.cur.bump();
                    }
                }
                0 => return Err(self.error("unexpected end of data")),
                _ => self.cur.bump(),
            }
        }
        let value = self.cur.slice(value_start, self.cur.pos());
        self.cur.bump(); // '>'

        if !self.flags.has(ParseFlags::DOCTYPE_NODE) {
            return Ok(None);
        }
        let doctype = self.doc.alloc_node(NodeKind::Doctype);
        self.doc.node_mut(doctype).raw_value = value;
        self.doc.append_child(parent, doctype);
        Ok(Some(doctype))
    }

    /// An element, cursor on the first byte of its qualified name.
    fn parse_element(&mut self, parent: NodeId, open_only: bool) -> Result<NodeId> {
        let element = self.doc.alloc_node(NodeKind::Element);
        // Linked in before the body parses, so namespace lookups during
        // immediate validation can walk a live ancestor chain.
        self.doc.append_child(parent, element);

        let qname_start = self.cur.pos();
        self.cur.skip(&chartab::ELEMENT_NAME);
        if self.cur.pos() == qname_start {
            return Err(self.error("expected element name or prefix"));
        }
        if self.cur.peek() == b':' {
            let prefix = self.cur.slice(qname_start, self.cur.pos());
            self.cur.bump();
            let name_start = self.cur.pos();
            self.cur.skip(&chartab::NODE_NAME);
            if self.cur.pos() == name_start {
                return Err(self.error("expected element local name"));
            }
            let name = self.cur.slice(name_start, self.cur.pos());
            let node = self.doc.node_mut(element);
            node.prefix = Cow::Borrowed(prefix);
            node.name = Cow::Borrowed(name);
        } else {
            let name = self.cur.slice(qname_start, self.cur.pos());
            self.doc.node_mut(element).name = Cow::Borrowed(name);
        }
        let qname = self.cur.slice(qname_start, self.cur.pos());

        self.cur.skip_whitespace();
        self.parse_node_attributes(element)?;

        // All attributes observed; this is the earliest point namespace
        // validation can run.
        if self.flags.has(ParseFlags::VALIDATE_XMLNS) {
            namespace::validate_shallow(self.doc, element)?;
        }

        match self.cur.peek() {
            b'>' => {
                self.cur.bump();
                if !open_only {
                    let contents_start = self.cur.pos();
                    let contents_end = self.parse_node_contents(element, qname)?;
                    if contents_end > contents_start {
                        let node = self.doc.node_mut(element);
                        node.contents = self.cur.slice(contents_start, contents_end);
                        node.clean = true;
                    }
                }
            }
            b'/' => {
                self.cur.bump();
                if self.cur.peek() != b'>' {
                    return Err(self.error("expected >"));
                }
                self.cur.bump();
                if open_only {
                    return Err(self.error("open_only, but closed"));
                }
            }
            _ => return Err(self.error("expected >")),
        }

        Ok(element)
    }

    /// Body of an element: children and data until the matching close
    /// tag. Returns the offset of the `<` of the close tag.
    fn parse_node_contents(&mut self, element: NodeId, qname: &'buf [u8]) -> Result<usize> {
        loop {
            // Keep the pre-whitespace cursor; data capture backs up to
            // it when trimming is off.
            let before_ws = self.cur;
            self.cur.skip_whitespace();
            let mut next = self.cur.peek();

            // Data capture already leaves the cursor on the byte after
            // the run, so loop without re-skipping whitespace.
            loop {
                match next {
                    b'<' => {
                        if self.cur.at(1) == b'/' {
                            let contents_end = self.cur.pos();
                            self.cur.advance(2);
                            let closing_start = self.cur.pos();
                            self.cur.skip(&chartab::NODE_NAME);
                            if self.flags.has(ParseFlags::VALIDATE_CLOSING_TAGS)
                                && self.cur.slice(closing_start, self.cur.pos()) != qname
                            {
                                return Err(self.error("invalid closing tag name"));
                            }
                            self.cur.skip_whitespace();
                            if self.cur.peek() != b'>' {
                                return Err(self.error("expected >"));
                            }
                            self.cur.bump();
                            return Ok(contents_end);
                        }
                        self.cur.bump();
                        self.parse_node(element, false)?;
                        break;
                    }
                    0 => return Err(self.error("unexpected end of data")),
                    _ => {
                        next = self.parse_and_append_data(element, before_ws)?;
                    }
                }
            }
        }
    }

    /// PCDATA run. Records the raw slice, optionally creates a data
    /// node, and mirrors the first run into the element's value.
    /// Returns the byte that ended the run.
    fn parse_and_append_data(&mut self, element: NodeId, before_ws: Cursor<'buf>) -> Result<u8> {
        if !self.flags.has(ParseFlags::TRIM_WHITESPACE) {
            self.cur = before_ws;
        }

        let value_start = self.cur.pos();
        self.cur.skip(&chartab::TEXT_PURE_NO_WS);
        let mut encoded = false;
        if chartab::TEXT[self.cur.peek() as usize] {
            encoded = true;
            self.cur.skip(&chartab::TEXT);
        }
        let raw = self.cur.slice(value_start, self.cur.pos());
        let pure = !encoded && entities::is_pure_data(raw, self.flags);

        if !self.flags.has(ParseFlags::NO_DATA_NODES) {
            let data = self.doc.alloc_node(NodeKind::Data);
            {
                let node = self.doc.node_mut(data);
                node.raw_value = raw;
                if pure {
                    let _ = node.decoded.set(Cow::Borrowed(raw));
                }
            }
            self.doc.append_child(element, data);
        }

        if !self.flags.has(ParseFlags::NO_ELEMENT_VALUES)
            && self.doc.node(element).raw_value.is_empty()
        {
            let node = self.doc.node_mut(element);
            node.raw_value = raw;
            if pure {
                let _ = node.decoded.set(Cow::Borrowed(raw));
            }
        }

        Ok(self.cur.peek())
    }

    /// Attribute list: `name='value'` pairs until a non-name byte.
    fn parse_node_attributes(&mut self, node: NodeId) -> Result<()> {
        while chartab::ATTRIBUTE_NAME[self.cur.peek() as usize] {
            let name_start = self.cur.pos();
            self.cur.bump();
            self.cur.skip(&chartab::ATTRIBUTE_NAME);
            let name = self.cur.slice(name_start, self.cur.pos());

            let attr = self.doc.alloc_attr_raw(name);
            self.doc.append_attribute(node, attr);

            self.cur.skip_whitespace();
            if self.cur.peek() != b'=' {
                return Err(self.error("expected ="));
            }
            self.cur.bump();
            self.cur.skip_whitespace();

            let quote = self.cur.peek();
            if quote != b'\'' && quote != b'"' {
                return Err(self.error("expected ' or \""));
            }
            self.cur.bump();

            let value_start = self.cur.pos();
            self.cur.skip(chartab::attr_data(quote));
            let raw = self.cur.slice(value_start, self.cur.pos());
            {
                let record = self.doc.attr_mut(attr);
                record.raw_value = raw;
                record.quote = quote;
            }

            if self.cur.peek() != quote {
                return Err(self.error("expected ' or \""));
            }
            self.cur.bump();
            self.cur.skip_whitespace();
        }
        Ok(())
    }
}
