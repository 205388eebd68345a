//! XML printer
//!
//! Serializes a node (and its subtree) to an appending byte sink,
//! dispatching on node kind. Values that were never transformed by the
//! decoder are copied straight from the source buffer; transformed
//! values are entity-escaped on the way out.
//!
//! With indenting on (the default), nested elements get one tab per
//! level and a newline after every printed node; `NO_INDENTING`
//! switches the printer to byte-faithful output and enables the clean
//! contents fast path.

use memchr::memchr;

use crate::core::entities;
use crate::dom::{Attr, Document, Node, NodeKind};
use crate::error::Result;

/// Print-behavior flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintFlags(u32);

impl PrintFlags {
    /// Indent with tabs and break lines between nodes.
    pub const DEFAULT: PrintFlags = PrintFlags(0);
    /// Suppress all indenting; required for byte-faithful round-trips.
    pub const NO_INDENTING: PrintFlags = PrintFlags(0x1);

    /// True if any flag in `other` is set in `self`.
    #[inline]
    pub fn has(self, other: PrintFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for PrintFlags {
    type Output = PrintFlags;

    fn bitor(self, rhs: PrintFlags) -> PrintFlags {
        PrintFlags(self.0 | rhs.0)
    }
}

/// Serialize `node` and its subtree into `out`.
pub fn print(out: &mut Vec<u8>, node: Node<'_, '_>, flags: PrintFlags) -> Result<()> {
    print_node(out, node, flags, 0)
}

/// Serialize a whole document into `out`.
pub fn print_document(out: &mut Vec<u8>, doc: &Document<'_>, flags: PrintFlags) -> Result<()> {
    print_node(out, doc.document_node(), flags, 0)
}

/// Serialize `node` into a fresh buffer.
pub fn print_to_vec(node: Node<'_, '_>, flags: PrintFlags) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    print(&mut out, node, flags)?;
    Ok(out)
}

fn print_node(out: &mut Vec<u8>, node: Node<'_, '_>, flags: PrintFlags, indent: usize) -> Result<()> {
    match node.kind() {
        NodeKind::Document => {
            for child in node.children() {
                print_node(out, child, flags, indent)?;
            }
            return Ok(());
        }
        NodeKind::Element => print_element(out, node, flags, indent)?,
        NodeKind::Data => {
            fill_indent(out, flags, indent);
            print_value(out, node)?;
        }
        NodeKind::CData => {
            fill_indent(out, flags, indent);
            out.extend_from_slice(b"<![CDATA[");
            out.extend_from_slice(node.value()?);
            out.extend_from_slice(b"]]>");
        }
        NodeKind::Declaration => {
            fill_indent(out, flags, indent);
            out.extend_from_slice(b"<?xml");
            print_attributes(out, node)?;
            out.extend_from_slice(b"?>");
        }
        NodeKind::Comment => {
            fill_indent(out, flags, indent);
            out.extend_from_slice(b"<!--");
            out.extend_from_slice(node.value()?);
            out.extend_from_slice(b"-->");
        }
        NodeKind::Doctype => {
            fill_indent(out, flags, indent);
            out.extend_from_slice(b"<!DOCTYPE ");
            out.extend_from_slice(node.value()?);
            out.push(b'>');
        }
        NodeKind::Pi => {
            fill_indent(out, flags, indent);
            out.extend_from_slice(b"<?");
            out.extend_from_slice(node.name());
            out.push(b' ');
            out.extend_from_slice(node.value()?);
            out.extend_from_slice(b"?>");
        }
        NodeKind::Literal => {
            fill_indent(out, flags, indent);
            out.extend_from_slice(node.value()?);
        }
    }

    if !flags.has(PrintFlags::NO_INDENTING) {
        out.push(b'\n');
    }
    Ok(())
}

fn print_element(
    out: &mut Vec<u8>,
    node: Node<'_, '_>,
    flags: PrintFlags,
    indent: usize,
) -> Result<()> {
    fill_indent(out, flags, indent);
    out.push(b'<');
    print_qname(out, node);
    print_attributes(out, node)?;

    // Childless and valueless prints as a self-closing tag.
    if node.value()?.is_empty() && node.first_child().is_none() {
        out.extend_from_slice(b"/>");
        return Ok(());
    }
    out.push(b'>');

    if node.clean() && flags.has(PrintFlags::NO_INDENTING) {
        // Untouched since parse: the captured inner XML is still exact.
        out.extend_from_slice(node.contents());
    } else {
        match node.first_child() {
            None => print_value(out, node)?,
            Some(child) if child.next_sibling().is_none() && child.kind() == NodeKind::Data => {
                // A sole data child prints inline, without indenting.
                print_value(out, child)?;
            }
            Some(_) => {
                if !flags.has(PrintFlags::NO_INDENTING) {
                    out.push(b'\n');
                }
                for child in node.children() {
                    print_node(out, child, flags, indent + 1)?;
                }
                fill_indent(out, flags, indent);
            }
        }
    }

    out.extend_from_slice(b"</");
    print_qname(out, node);
    out.push(b'>');
    Ok(())
}

fn print_qname(out: &mut Vec<u8>, node: Node<'_, '_>) {
    if !node.prefix().is_empty() {
        out.extend_from_slice(node.prefix());
        out.push(b':');
    }
    out.extend_from_slice(node.name());
}

/// A node value: raw slice while untransformed, escaped otherwise.
fn print_value(out: &mut Vec<u8>, node: Node<'_, '_>) -> Result<()> {
    if !node.value_decoded() {
        out.extend_from_slice(node.raw_value());
    } else {
        entities::escape_into(out, node.value()?, 0);
    }
    Ok(())
}

fn print_attributes(out: &mut Vec<u8>, node: Node<'_, '_>) -> Result<()> {
    for attr in node.attributes() {
        // Nameless attributes print only while their raw value is empty.
        if attr.name().is_empty() && !attr.raw_value().is_empty() {
            continue;
        }
        out.push(b' ');
        out.extend_from_slice(attr.name());
        out.push(b'=');
        print_attribute_value(out, attr)?;
    }
    Ok(())
}

fn print_attribute_value(out: &mut Vec<u8>, attr: Attr<'_, '_>) -> Result<()> {
    if attr.quote() != 0 && !attr.value_decoded() {
        // Untransformed: the raw slice between the original quotes is
        // still exact.
        out.push(attr.quote());
        out.extend_from_slice(attr.raw_value());
        out.push(attr.quote());
        return Ok(());
    }

    // Double quotes unless the value holds a `"` and no `'`; either
    // way the delimiter's opposite stays literal.
    let value = attr.value()?;
    if memchr(b'"', value).is_some() && memchr(b'\'', value).is_none() {
        out.push(b'\'');
        entities::escape_into(out, value, b'"');
        out.push(b'\'');
    } else {
        out.push(b'"');
        entities::escape_into(out, value, b'\'');
        out.push(b'"');
    }
    Ok(())
}

fn fill_indent(out: &mut Vec<u8>, flags: PrintFlags, indent: usize) {
    if !flags.has(PrintFlags::NO_INDENTING) {
        out.extend(std::iter::repeat(b'\t').take(indent));
    }
}
