//! quickdom - zero-copy XML DOM with namespaces and a small XPath
//!
//! An in-memory XML parser and document model built for three things:
//!
//! - **Zero-copy parsing**: names, prefixes and raw values are
//!   sub-slices of the caller's buffer; entity expansion is deferred
//!   until a value is first read, and pure values never allocate.
//! - **Namespace-aware navigation**: prefixes resolve lazily against
//!   the ancestor chain, with the `xml`/`xmlns` prefixes reserved, and
//!   lookups can filter by `{namespace, local-name}`.
//! - **Lossless round-tripping**: the parser never writes to the source
//!   buffer, each element remembers its verbatim contents, and the
//!   printer reuses raw slices for anything that was never transformed.
//!
//! Parsing modes for XML streams (an opening tag alone, then one
//! stanza at a time) and a small XPath engine round out the API.
//!
//! ```
//! use quickdom::{print, Document, ParseFlags, PrintFlags};
//!
//! let text = b"<m:note xmlns:m='urn:memo'>call &amp; response</m:note>";
//! let doc = Document::parse(text, ParseFlags::DEFAULT).unwrap();
//!
//! let note = doc.root_element().unwrap();
//! assert_eq!(note.name(), b"note");
//! assert_eq!(note.xmlns().unwrap(), b"urn:memo");
//! assert_eq!(note.value().unwrap(), b"call & response");
//!
//! let mut out = Vec::new();
//! print::print(&mut out, note, PrintFlags::NO_INDENTING).unwrap();
//! assert_eq!(out.as_slice(), text.as_slice());
//! ```

pub mod core;
pub mod dom;
pub mod error;
pub mod parser;
pub mod print;
pub mod xpath;

pub use dom::{
    ns, Attr, AttrId, Attributes, Children, Descendants, Document, IntoText, Node, NodeId,
    NodeKind,
};
pub use error::{Error, Result};
pub use parser::ParseFlags;
pub use print::PrintFlags;
pub use xpath::{Path, PathCache};
