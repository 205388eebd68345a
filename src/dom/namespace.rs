//! Namespace resolution
//!
//! Prefix→URI lookup walks from a node toward the root looking for the
//! matching `xmlns`/`xmlns:prefix` attribute by its raw name. Results
//! are cached per node. The `xml` and `xmlns` prefixes short-circuit to
//! their fixed URIs before any walk, so deeply nested documents never
//! pay for them.

use std::borrow::Cow;

use crate::dom::document::Document;
use crate::dom::node::{AttrId, NodeId, NodeKind, Text};
use crate::error::{Error, Result};

/// Well-known namespace URIs.
pub mod ns {
    /// Fixed URI bound to the `xml` prefix.
    pub const XML: &[u8] = b"http://www.w3.org/XML/1998/namespace";
    /// Fixed URI bound to the `xmlns` prefix.
    pub const XMLNS: &[u8] = b"http://www.w3.org/2000/xmlns/";
}

/// Resolved namespace of a node's own prefix, cached on the node.
/// Empty for unprefixed nodes with no default namespace in scope.
pub(crate) fn element_xmlns<'a, 'buf>(doc: &'a Document<'buf>, id: NodeId) -> Result<&'a [u8]> {
    if let Some(uri) = doc.node(id).xmlns.get() {
        return Ok(uri.as_ref());
    }
    let prefix = doc.node(id).prefix.clone();
    let uri = lookup(doc, id, prefix.as_ref(), false)?;
    Ok(doc.node(id).xmlns.get_or_init(|| uri).as_ref())
}

/// Resolved namespace of an attribute, cached on the attribute.
/// An unprefixed attribute is in no namespace at all.
pub(crate) fn attr_xmlns<'a, 'buf>(doc: &'a Document<'buf>, id: AttrId) -> Result<&'a [u8]> {
    if let Some(uri) = doc.attr(id).xmlns.get() {
        return Ok(uri.as_ref());
    }
    let attr = doc.attr(id);
    let prefix = attr.prefix();
    let uri = if prefix.is_empty() {
        Cow::Borrowed(b"" as &[u8])
    } else {
        let prefix = prefix.to_vec();
        match attr.parent {
            Some(element) => lookup(doc, element, &prefix, true)?,
            None => {
                return Err(Error::AttrXmlnsUnbound {
                    prefix: String::from_utf8_lossy(&prefix).into_owned(),
                })
            }
        }
    };
    Ok(doc.attr(id).xmlns.get_or_init(|| uri).as_ref())
}

/// Walk `start` and its ancestors for the binding of `prefix`.
fn lookup<'buf>(
    doc: &Document<'buf>,
    start: NodeId,
    prefix: &[u8],
    attribute: bool,
) -> Result<Text<'buf>> {
    if prefix == b"xml" {
        return Ok(Cow::Borrowed(ns::XML));
    }
    if prefix == b"xmlns" {
        return Ok(Cow::Borrowed(ns::XMLNS));
    }

    let mut attr_name = Vec::with_capacity(6 + prefix.len());
    attr_name.extend_from_slice(b"xmlns");
    if !prefix.is_empty() {
        attr_name.push(b':');
        attr_name.extend_from_slice(prefix);
    }

    let mut cur = Some(start);
    while let Some(id) = cur {
        let mut next_attr = doc.node(id).first_attr;
        while let Some(attr) = next_attr {
            if doc.attr(attr).name.as_ref() == attr_name.as_slice() {
                return doc.attr_value_cow(attr);
            }
            next_attr = doc.attr(attr).next_attr;
        }
        cur = doc.node(id).parent;
    }

    if prefix.is_empty() {
        return Ok(Cow::Borrowed(b""));
    }
    let prefix = String::from_utf8_lossy(prefix).into_owned();
    if attribute {
        Err(Error::AttrXmlnsUnbound { prefix })
    } else {
        Err(Error::ElementXmlnsUnbound { prefix })
    }
}

/// Recursive well-formedness check: resolve the namespace of the node
/// and each attribute, and reject attribute pairs with identical raw
/// names or identical (local name, namespace) pairs.
pub(crate) fn validate(doc: &Document<'_>, id: NodeId) -> Result<()> {
    validate_shallow(doc, id)?;
    let mut next = doc.node(id).first_child;
    while let Some(child) = next {
        validate(doc, child)?;
        next = doc.node(child).next_sibling;
    }
    Ok(())
}

/// The per-element part of [`validate`]; the parser runs this as soon as
/// an element's attributes have all been observed.
pub(crate) fn validate_shallow(doc: &Document<'_>, id: NodeId) -> Result<()> {
    if doc.node(id).kind == NodeKind::Element {
        element_xmlns(doc, id)?;
    }

    let mut next = doc.node(id).first_attr;
    while let Some(attr) = next {
        attr_xmlns(doc, attr)?;

        let mut earlier = doc.node(id).first_attr;
        while let Some(other) = earlier {
            if other == attr {
                break;
            }
            let a = doc.attr(attr);
            let b = doc.attr(other);
            if a.name == b.name {
                return Err(Error::DuplicateAttribute {
                    name: String::from_utf8_lossy(&a.name).into_owned(),
                });
            }
            if a.local_name() == b.local_name() && attr_xmlns(doc, attr)? == attr_xmlns(doc, other)?
            {
                return Err(Error::DuplicateAttribute {
                    name: String::from_utf8_lossy(&a.name).into_owned(),
                });
            }
            earlier = doc.attr(other).next_attr;
        }
        next = doc.attr(attr).next_attr;
    }
    Ok(())
}
