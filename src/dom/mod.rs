//! Document model
//!
//! The tree the parser builds: a document-owned arena of nodes and
//! attributes, navigated through copyable handles.

pub mod document;
pub mod namespace;
pub mod node;

pub use document::{Attr, Attributes, Children, Descendants, Document, Node};
pub use namespace::ns;
pub use node::{AttrId, NodeId, NodeKind};

use std::borrow::Cow;

/// Conversion into text a document can hold: either a slice borrowed
/// from the source buffer or an owned string that lives as long as the
/// document.
pub trait IntoText<'buf> {
    /// Perform the conversion.
    fn into_text(self) -> Cow<'buf, [u8]>;
}

impl<'buf> IntoText<'buf> for &'buf [u8] {
    fn into_text(self) -> Cow<'buf, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<'buf, const N: usize> IntoText<'buf> for &'buf [u8; N] {
    fn into_text(self) -> Cow<'buf, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<'buf> IntoText<'buf> for &'buf str {
    fn into_text(self) -> Cow<'buf, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl<'buf> IntoText<'buf> for Vec<u8> {
    fn into_text(self) -> Cow<'buf, [u8]> {
        Cow::Owned(self)
    }
}

impl<'buf> IntoText<'buf> for String {
    fn into_text(self) -> Cow<'buf, [u8]> {
        Cow::Owned(self.into_bytes())
    }
}

impl<'buf> IntoText<'buf> for Cow<'buf, [u8]> {
    fn into_text(self) -> Cow<'buf, [u8]> {
        self
    }
}
