//! Node and attribute records
//!
//! Compact records stored in the document arena and addressed by id.
//! Sibling/child/attribute chains are doubly linked through `Option`al
//! ids; parent links are back-references, never ownership.

use std::borrow::Cow;
use std::cell::OnceCell;

/// Identifier of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node itself.
    pub const DOCUMENT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of an attribute in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub(crate) u32);

impl AttrId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Every node kind the parser produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root. Name and value are empty.
    Document,
    /// An element. Name holds the local name; value mirrors the first
    /// data child unless that was disabled at parse time.
    Element,
    /// Character data. Value holds the text.
    Data,
    /// A CDATA section. Value holds the text, markup uninterpreted.
    CData,
    /// A comment. Value holds the comment text.
    Comment,
    /// The XML declaration. Parameters live in the attributes.
    Declaration,
    /// A DOCTYPE. Value holds everything after `<!DOCTYPE `.
    Doctype,
    /// A processing instruction. Name holds the target, value the body.
    Pi,
    /// Pre-rendered XML emitted verbatim by the printer.
    Literal,
}

/// Text owned by either the source buffer or the document.
pub(crate) type Text<'buf> = Cow<'buf, [u8]>;

/// A node record.
///
/// `raw_value` and `contents` always point into the source buffer; the
/// decoded value and the resolved namespace are computed on first read
/// and then owned by the record (document lifetime).
#[derive(Debug)]
pub(crate) struct NodeData<'buf> {
    pub(crate) kind: NodeKind,
    pub(crate) prefix: Text<'buf>,
    pub(crate) name: Text<'buf>,
    pub(crate) raw_value: &'buf [u8],
    /// Lazy decoded value. `None` = never examined; `Borrowed` equal to
    /// `raw_value` by pointer = examined, nothing to expand; anything
    /// else = a transformed value.
    pub(crate) decoded: OnceCell<Text<'buf>>,
    /// Lazy resolved namespace URI for this node's prefix.
    pub(crate) xmlns: OnceCell<Text<'buf>>,
    /// Verbatim inner XML captured at parse time; printable while clean.
    pub(crate) contents: &'buf [u8],
    /// Unchanged since parsing, so `contents` is still good.
    pub(crate) clean: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) first_attr: Option<AttrId>,
    pub(crate) last_attr: Option<AttrId>,
}

impl<'buf> NodeData<'buf> {
    pub(crate) fn new(kind: NodeKind) -> Self {
        NodeData {
            kind,
            prefix: Cow::Borrowed(b""),
            name: Cow::Borrowed(b""),
            raw_value: b"",
            decoded: OnceCell::new(),
            xmlns: OnceCell::new(),
            contents: b"",
            clean: false,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            first_attr: None,
            last_attr: None,
        }
    }

    /// True when the cached decoded value is exactly the raw slice,
    /// meaning the printer may copy the raw bytes through.
    pub(crate) fn decoded_is_raw(&self) -> bool {
        match self.decoded.get() {
            Some(Cow::Borrowed(s)) => {
                s.as_ptr() == self.raw_value.as_ptr() && s.len() == self.raw_value.len()
            }
            _ => false,
        }
    }

    /// Replace the decoded value, detaching it from the raw slice.
    pub(crate) fn store_value(&mut self, value: Text<'buf>) {
        self.decoded.take();
        let _ = self.decoded.set(value);
        self.raw_value = b"";
    }
}

/// An attribute record. The name keeps its raw qualified form
/// (`prefix:local`); the quote character seen at parse time drives the
/// printer's verbatim fast path.
#[derive(Debug)]
pub(crate) struct AttrData<'buf> {
    pub(crate) name: Text<'buf>,
    pub(crate) raw_value: &'buf [u8],
    pub(crate) decoded: OnceCell<Text<'buf>>,
    pub(crate) xmlns: OnceCell<Text<'buf>>,
    /// `'` or `"` as captured at parse time, 0 for built attributes.
    pub(crate) quote: u8,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_attr: Option<AttrId>,
    pub(crate) next_attr: Option<AttrId>,
}

impl<'buf> AttrData<'buf> {
    pub(crate) fn new(name: Text<'buf>) -> Self {
        AttrData {
            name,
            raw_value: b"",
            decoded: OnceCell::new(),
            xmlns: OnceCell::new(),
            quote: 0,
            parent: None,
            prev_attr: None,
            next_attr: None,
        }
    }

    pub(crate) fn decoded_is_raw(&self) -> bool {
        match self.decoded.get() {
            Some(Cow::Borrowed(s)) => {
                s.as_ptr() == self.raw_value.as_ptr() && s.len() == self.raw_value.len()
            }
            _ => false,
        }
    }

    pub(crate) fn store_value(&mut self, value: Text<'buf>) {
        self.decoded.take();
        let _ = self.decoded.set(value);
        self.raw_value = b"";
    }

    /// The part of the name before the first `:`, or empty.
    pub(crate) fn prefix(&self) -> &[u8] {
        match memchr::memchr(b':', &self.name) {
            Some(colon) => &self.name[..colon],
            None => b"",
        }
    }

    /// The part of the name after the first `:`, or the whole name.
    pub(crate) fn local_name(&self) -> &[u8] {
        match memchr::memchr(b':', &self.name) {
            Some(colon) => &self.name[colon + 1..],
            None => &self.name,
        }
    }
}
