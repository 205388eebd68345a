//! Document arena and tree access
//!
//! The document owns every node and attribute in two append-only
//! arenas; ids index into them and the tree is expressed entirely as id
//! links. Read-only navigation goes through the copyable [`Node`] and
//! [`Attr`] handles; mutation goes through `&mut Document` methods.
//!
//! Lazy work (value decoding, namespace resolution) is cached behind
//! interior mutability, so any number of read-only traversals can share
//! one document within a thread.

use std::borrow::Cow;

use crate::core::entities;
use crate::dom::namespace;
use crate::dom::node::{AttrData, AttrId, NodeData, NodeId, NodeKind, Text};
use crate::dom::IntoText;
use crate::error::{Error, Result};
use crate::parser::ParseFlags;

/// Node slots reserved up front by [`Document::new`].
pub const NODE_ARENA_RESERVE: usize = 256;
/// Attribute slots reserved up front by [`Document::new`].
pub const ATTR_ARENA_RESERVE: usize = 64;

/// An XML document: the arena behind a tree of nodes, itself a node of
/// kind [`NodeKind::Document`] with id [`NodeId::DOCUMENT`].
///
/// The lifetime parameter is the source buffer the document was parsed
/// from; raw values and unexpanded names borrow from it.
#[derive(Debug)]
pub struct Document<'buf> {
    pub(crate) nodes: Vec<NodeData<'buf>>,
    pub(crate) attrs: Vec<AttrData<'buf>>,
    pub(crate) flags: ParseFlags,
}

impl<'buf> Document<'buf> {
    /// An empty document: just the document node.
    pub fn new() -> Self {
        Self::with_capacity(NODE_ARENA_RESERVE, ATTR_ARENA_RESERVE)
    }

    /// An empty document with explicit arena reservations.
    pub fn with_capacity(nodes: usize, attrs: usize) -> Self {
        let mut doc = Document {
            nodes: Vec::with_capacity(nodes.max(1)),
            attrs: Vec::with_capacity(attrs),
            flags: ParseFlags::DEFAULT,
        };
        doc.nodes.push(NodeData::new(NodeKind::Document));
        doc
    }

    /// The flag set this document was parsed with (the decoder needs it).
    #[inline]
    pub fn parse_flags(&self) -> ParseFlags {
        self.flags
    }

    /// Handle on the document node.
    #[inline]
    pub fn document_node(&self) -> Node<'_, 'buf> {
        Node {
            doc: self,
            id: NodeId::DOCUMENT,
        }
    }

    /// Handle on an arbitrary node id.
    #[inline]
    pub fn get(&self, id: NodeId) -> Node<'_, 'buf> {
        debug_assert!(id.index() < self.nodes.len());
        Node { doc: self, id }
    }

    /// Handle on an arbitrary attribute id.
    #[inline]
    pub fn get_attr(&self, id: AttrId) -> Attr<'_, 'buf> {
        debug_assert!(id.index() < self.attrs.len());
        Attr { doc: self, id }
    }

    /// The first element child of the document node.
    pub fn root_element(&self) -> Result<Node<'_, 'buf>> {
        let mut next = self.node(NodeId::DOCUMENT).first_child;
        while let Some(id) = next {
            if self.node(id).kind == NodeKind::Element {
                return Ok(self.get(id));
            }
            next = self.node(id).next_sibling;
        }
        Err(Error::NoSuchNode)
    }

    /// Drop every node and attribute and reset to an empty document.
    /// Ids handed out earlier are invalidated.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.attrs.clear();
        self.nodes.push(NodeData::new(NodeKind::Document));
    }

    /// Walk the whole tree resolving namespaces and checking for
    /// duplicate attributes.
    pub fn validate(&self) -> Result<()> {
        let mut next = self.node(NodeId::DOCUMENT).first_child;
        while let Some(id) = next {
            namespace::validate(self, id)?;
            next = self.node(id).next_sibling;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Arena allocation
    // ------------------------------------------------------------------

    /// Allocate a detached node of the given kind.
    pub fn alloc_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Allocate a detached element. The name is taken as the local name;
    /// use [`Document::set_prefix`] for a qualified element.
    pub fn alloc_element(&mut self, name: impl IntoText<'buf>) -> NodeId {
        let id = self.alloc_node(NodeKind::Element);
        self.nodes[id.index()].name = name.into_text();
        id
    }

    /// Allocate a detached data node with a value.
    pub fn alloc_data(&mut self, value: impl IntoText<'buf>) -> NodeId {
        let id = self.alloc_node(NodeKind::Data);
        self.nodes[id.index()].store_value(value.into_text());
        id
    }

    /// Allocate a detached attribute with a value.
    pub fn alloc_attribute(
        &mut self,
        name: impl IntoText<'buf>,
        value: impl IntoText<'buf>,
    ) -> AttrId {
        let id = AttrId(self.attrs.len() as u32);
        let mut attr = AttrData::new(name.into_text());
        attr.store_value(value.into_text());
        self.attrs.push(attr);
        id
    }

    pub(crate) fn alloc_attr_raw(&mut self, name: &'buf [u8]) -> AttrId {
        let id = AttrId(self.attrs.len() as u32);
        self.attrs.push(AttrData::new(Cow::Borrowed(name)));
        id
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &NodeData<'buf> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData<'buf> {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn attr(&self, id: AttrId) -> &AttrData<'buf> {
        &self.attrs[id.index()]
    }

    #[inline]
    pub(crate) fn attr_mut(&mut self, id: AttrId) -> &mut AttrData<'buf> {
        &mut self.attrs[id.index()]
    }

    // ------------------------------------------------------------------
    // Lazy value decoding
    // ------------------------------------------------------------------

    pub(crate) fn node_value(&self, id: NodeId) -> Result<&[u8]> {
        let node = self.node(id);
        if let Some(v) = node.decoded.get() {
            return Ok(v.as_ref());
        }
        let computed = match node.kind {
            NodeKind::Element | NodeKind::Data => {
                entities::decode_data(node.raw_value, self.flags)?
            }
            _ => Cow::Borrowed(node.raw_value),
        };
        Ok(node.decoded.get_or_init(|| computed).as_ref())
    }

    pub(crate) fn attr_value(&self, id: AttrId) -> Result<&[u8]> {
        let attr = self.attr(id);
        if let Some(v) = attr.decoded.get() {
            return Ok(v.as_ref());
        }
        let computed = entities::decode_attr(attr.raw_value, attr.quote, self.flags)?;
        Ok(attr.decoded.get_or_init(|| computed).as_ref())
    }

    /// Decoded attribute value as an owning-capable cow: `Borrowed` when
    /// it still points into the source buffer. Used by the namespace
    /// resolver to cache a URI on another record.
    pub(crate) fn attr_value_cow(&self, id: AttrId) -> Result<Text<'buf>> {
        self.attr_value(id)?;
        match self.attr(id).decoded.get() {
            Some(cow) => Ok(cow.clone()),
            None => Ok(Cow::Borrowed(b"")),
        }
    }

    // ------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------

    /// Mark a node modified: it loses its clean contents, and so does
    /// every ancestor up to the document.
    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = self.node_mut(n);
            node.clean = false;
            cur = node.parent;
        }
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// Set a node's value. On an element the value is mirrored into the
    /// first data child, if there is one.
    pub fn set_value(&mut self, id: NodeId, value: impl IntoText<'buf>) {
        let value = value.into_text();
        if self.node(id).kind == NodeKind::Element {
            let mut next = self.node(id).first_child;
            while let Some(child) = next {
                if self.node(child).kind == NodeKind::Data {
                    self.node_mut(child).store_value(value.clone());
                    self.mark_dirty(child);
                    break;
                }
                next = self.node(child).next_sibling;
            }
        }
        self.node_mut(id).store_value(value);
        self.mark_dirty(id);
    }

    /// Set a node's (local) name.
    pub fn set_name(&mut self, id: NodeId, name: impl IntoText<'buf>) {
        self.node_mut(id).name = name.into_text();
        self.mark_dirty(id);
    }

    /// Set a node's prefix.
    pub fn set_prefix(&mut self, id: NodeId, prefix: impl IntoText<'buf>) {
        let node = self.node_mut(id);
        node.prefix = prefix.into_text();
        node.xmlns.take();
        self.mark_dirty(id);
    }

    /// Change a node's kind.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.node_mut(id).kind = kind;
        self.mark_dirty(id);
    }

    /// Set an attribute's value.
    pub fn set_attr_value(&mut self, id: AttrId, value: impl IntoText<'buf>) {
        self.attr_mut(id).store_value(value.into_text());
        if let Some(parent) = self.attr(id).parent {
            self.mark_dirty(parent);
        }
    }

    /// Set an attribute's (qualified) name.
    pub fn set_attr_name(&mut self, id: AttrId, name: impl IntoText<'buf>) {
        let attr = self.attr_mut(id);
        attr.name = name.into_text();
        attr.xmlns.take();
        if let Some(parent) = self.attr(id).parent {
            self.mark_dirty(parent);
        }
    }

    // ------------------------------------------------------------------
    // Child list surgery
    // ------------------------------------------------------------------

    /// Prepend a detached node as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        debug_assert!(self.node(child).kind != NodeKind::Document);
        self.mark_dirty(parent);
        let old_first = self.node(parent).first_child;
        match old_first {
            Some(first) => {
                self.node_mut(child).next_sibling = Some(first);
                self.node_mut(first).prev_sibling = Some(child);
            }
            None => {
                self.node_mut(child).next_sibling = None;
                self.node_mut(parent).last_child = Some(child);
            }
        }
        self.node_mut(parent).first_child = Some(child);
        let child_node = self.node_mut(child);
        child_node.parent = Some(parent);
        child_node.prev_sibling = None;
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        debug_assert!(self.node(child).kind != NodeKind::Document);
        self.mark_dirty(parent);
        let old_last = self.node(parent).last_child;
        match old_last {
            Some(last) => {
                self.node_mut(child).prev_sibling = Some(last);
                self.node_mut(last).next_sibling = Some(child);
            }
            None => {
                self.node_mut(child).prev_sibling = None;
                self.node_mut(parent).first_child = Some(child);
            }
        }
        self.node_mut(parent).last_child = Some(child);
        let child_node = self.node_mut(child);
        child_node.parent = Some(parent);
        child_node.next_sibling = None;
    }

    /// Insert a detached node before `before` (or append when `before`
    /// is `None`).
    pub fn insert_child_before(&mut self, parent: NodeId, before: Option<NodeId>, child: NodeId) {
        match before {
            None => self.append_child(parent, child),
            Some(b) if Some(b) == self.node(parent).first_child => {
                self.prepend_child(parent, child)
            }
            Some(b) => {
                debug_assert_eq!(self.node(b).parent, Some(parent));
                self.mark_dirty(parent);
                let prev = self.node(b).prev_sibling;
                self.node_mut(child).prev_sibling = prev;
                self.node_mut(child).next_sibling = Some(b);
                if let Some(p) = prev {
                    self.node_mut(p).next_sibling = Some(child);
                }
                self.node_mut(b).prev_sibling = Some(child);
                self.node_mut(child).parent = Some(parent);
            }
        }
    }

    /// Detach and return the first child of `parent`.
    pub fn remove_first_child(&mut self, parent: NodeId) -> Option<NodeId> {
        let child = self.node(parent).first_child?;
        self.mark_dirty(parent);
        let next = self.node(child).next_sibling;
        self.node_mut(parent).first_child = next;
        match next {
            Some(n) => self.node_mut(n).prev_sibling = None,
            None => self.node_mut(parent).last_child = None,
        }
        self.node_mut(child).parent = None;
        Some(child)
    }

    /// Detach and return the last child of `parent`.
    pub fn remove_last_child(&mut self, parent: NodeId) -> Option<NodeId> {
        let child = self.node(parent).last_child?;
        self.mark_dirty(parent);
        let prev = self.node(child).prev_sibling;
        self.node_mut(parent).last_child = prev;
        match prev {
            Some(p) => self.node_mut(p).next_sibling = None,
            None => self.node_mut(parent).first_child = None,
        }
        self.node_mut(child).parent = None;
        Some(child)
    }

    /// Detach a specific child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(child).parent != Some(parent) {
            return;
        }
        if self.node(parent).first_child == Some(child) {
            self.remove_first_child(parent);
        } else if self.node(parent).last_child == Some(child) {
            self.remove_last_child(parent);
        } else {
            self.mark_dirty(parent);
            let prev = self.node(child).prev_sibling;
            let next = self.node(child).next_sibling;
            if let Some(p) = prev {
                self.node_mut(p).next_sibling = next;
            }
            if let Some(n) = next {
                self.node_mut(n).prev_sibling = prev;
            }
            self.node_mut(child).parent = None;
        }
    }

    /// Detach all children of `parent` (attributes stay).
    pub fn remove_all_children(&mut self, parent: NodeId) {
        if self.node(parent).first_child.is_none() {
            return;
        }
        self.mark_dirty(parent);
        let mut next = self.node(parent).first_child;
        while let Some(child) = next {
            next = self.node(child).next_sibling;
            self.node_mut(child).parent = None;
        }
        self.node_mut(parent).first_child = None;
        self.node_mut(parent).last_child = None;
    }

    // ------------------------------------------------------------------
    // Attribute list surgery
    // ------------------------------------------------------------------

    /// Prepend a detached attribute to an element.
    pub fn prepend_attribute(&mut self, element: NodeId, attr: AttrId) {
        debug_assert!(self.attr(attr).parent.is_none());
        self.mark_dirty(element);
        let old_first = self.node(element).first_attr;
        match old_first {
            Some(first) => {
                self.attr_mut(attr).next_attr = Some(first);
                self.attr_mut(first).prev_attr = Some(attr);
            }
            None => {
                self.attr_mut(attr).next_attr = None;
                self.node_mut(element).last_attr = Some(attr);
            }
        }
        self.node_mut(element).first_attr = Some(attr);
        let record = self.attr_mut(attr);
        record.parent = Some(element);
        record.prev_attr = None;
    }

    /// Append a detached attribute to an element.
    pub fn append_attribute(&mut self, element: NodeId, attr: AttrId) {
        debug_assert!(self.attr(attr).parent.is_none());
        self.mark_dirty(element);
        let old_last = self.node(element).last_attr;
        match old_last {
            Some(last) => {
                self.attr_mut(attr).prev_attr = Some(last);
                self.attr_mut(last).next_attr = Some(attr);
            }
            None => {
                self.attr_mut(attr).prev_attr = None;
                self.node_mut(element).first_attr = Some(attr);
            }
        }
        self.node_mut(element).last_attr = Some(attr);
        let record = self.attr_mut(attr);
        record.parent = Some(element);
        record.next_attr = None;
    }

    /// Insert a detached attribute before `before` (or append).
    pub fn insert_attribute_before(
        &mut self,
        element: NodeId,
        before: Option<AttrId>,
        attr: AttrId,
    ) {
        match before {
            None => self.append_attribute(element, attr),
            Some(b) if Some(b) == self.node(element).first_attr => {
                self.prepend_attribute(element, attr)
            }
            Some(b) => {
                debug_assert_eq!(self.attr(b).parent, Some(element));
                self.mark_dirty(element);
                let prev = self.attr(b).prev_attr;
                self.attr_mut(attr).prev_attr = prev;
                self.attr_mut(attr).next_attr = Some(b);
                if let Some(p) = prev {
                    self.attr_mut(p).next_attr = Some(attr);
                }
                self.attr_mut(b).prev_attr = Some(attr);
                self.attr_mut(attr).parent = Some(element);
            }
        }
    }

    /// Detach and return the first attribute of an element.
    pub fn remove_first_attribute(&mut self, element: NodeId) -> Option<AttrId> {
        let attr = self.node(element).first_attr?;
        self.mark_dirty(element);
        let next = self.attr(attr).next_attr;
        self.node_mut(element).first_attr = next;
        match next {
            Some(n) => self.attr_mut(n).prev_attr = None,
            None => self.node_mut(element).last_attr = None,
        }
        self.attr_mut(attr).parent = None;
        Some(attr)
    }

    /// Detach and return the last attribute of an element.
    pub fn remove_last_attribute(&mut self, element: NodeId) -> Option<AttrId> {
        let attr = self.node(element).last_attr?;
        self.mark_dirty(element);
        let prev = self.attr(attr).prev_attr;
        self.node_mut(element).last_attr = prev;
        match prev {
            Some(p) => self.attr_mut(p).next_attr = None,
            None => self.node_mut(element).first_attr = None,
        }
        self.attr_mut(attr).parent = None;
        Some(attr)
    }

    /// Detach a specific attribute from an element.
    pub fn remove_attribute(&mut self, element: NodeId, attr: AttrId) {
        if self.attr(attr).parent != Some(element) {
            return;
        }
        if self.node(element).first_attr == Some(attr) {
            self.remove_first_attribute(element);
        } else if self.node(element).last_attr == Some(attr) {
            self.remove_last_attribute(element);
        } else {
            self.mark_dirty(element);
            let prev = self.attr(attr).prev_attr;
            let next = self.attr(attr).next_attr;
            if let Some(p) = prev {
                self.attr_mut(p).next_attr = next;
            }
            if let Some(n) = next {
                self.attr_mut(n).prev_attr = prev;
            }
            self.attr_mut(attr).parent = None;
        }
    }

    /// Detach all attributes of an element.
    pub fn remove_all_attributes(&mut self, element: NodeId) {
        if self.node(element).first_attr.is_none() {
            return;
        }
        self.mark_dirty(element);
        let mut next = self.node(element).first_attr;
        while let Some(attr) = next {
            next = self.attr(attr).next_attr;
            self.attr_mut(attr).parent = None;
        }
        self.node_mut(element).first_attr = None;
        self.node_mut(element).last_attr = None;
    }

    // ------------------------------------------------------------------
    // Element building helpers
    // ------------------------------------------------------------------

    /// Append a new element child named `name`.
    pub fn append_element(&mut self, parent: NodeId, name: impl IntoText<'buf>) -> NodeId {
        let child = self.alloc_element(name);
        self.append_child(parent, child);
        child
    }

    /// Prepend a new element child named `name`.
    pub fn prepend_element(&mut self, parent: NodeId, name: impl IntoText<'buf>) -> NodeId {
        let child = self.alloc_element(name);
        self.prepend_child(parent, child);
        child
    }

    /// Append a new element named in Clarke notation `{xmlns}local`.
    ///
    /// When the parent already lives in `xmlns`, the parent's prefix is
    /// inherited; otherwise the element is unprefixed and carries an
    /// `xmlns` attribute binding the namespace.
    pub fn append_element_ns(
        &mut self,
        parent: NodeId,
        xmlns: impl IntoText<'buf>,
        local: impl IntoText<'buf>,
    ) -> Result<NodeId> {
        let child = self.alloc_element_ns(parent, xmlns.into_text(), local.into_text())?;
        self.append_child(parent, child);
        Ok(child)
    }

    /// Prepend a new element named in Clarke notation `{xmlns}local`.
    pub fn prepend_element_ns(
        &mut self,
        parent: NodeId,
        xmlns: impl IntoText<'buf>,
        local: impl IntoText<'buf>,
    ) -> Result<NodeId> {
        let child = self.alloc_element_ns(parent, xmlns.into_text(), local.into_text())?;
        self.prepend_child(parent, child);
        Ok(child)
    }

    /// Insert a new element named in Clarke notation before `before`.
    pub fn insert_element_ns_before(
        &mut self,
        parent: NodeId,
        before: Option<NodeId>,
        xmlns: impl IntoText<'buf>,
        local: impl IntoText<'buf>,
    ) -> Result<NodeId> {
        let child = self.alloc_element_ns(parent, xmlns.into_text(), local.into_text())?;
        self.insert_child_before(parent, before, child);
        Ok(child)
    }

    fn alloc_element_ns(
        &mut self,
        parent: NodeId,
        xmlns: Text<'buf>,
        local: Text<'buf>,
    ) -> Result<NodeId> {
        let parent_ns = namespace::element_xmlns(self, parent)?.to_vec();
        if xmlns.as_ref() != parent_ns.as_slice() {
            let child = self.alloc_element(local);
            let attr = self.alloc_attribute(Cow::Borrowed(b"xmlns".as_slice()), xmlns);
            self.append_attribute(child, attr);
            Ok(child)
        } else {
            let prefix = self.node(parent).prefix.clone();
            let child = self.alloc_element(local);
            if !prefix.is_empty() {
                self.node_mut(child).prefix = prefix;
            }
            Ok(child)
        }
    }

    // ------------------------------------------------------------------
    // Cloning
    // ------------------------------------------------------------------

    /// Clone a subtree from another document into this document's
    /// arena, returning the detached clone.
    ///
    /// With `share_strings`, strings still borrowed from the source
    /// buffer are shared; strings owned by the source document are
    /// always copied, so the clone never outlives what it points at.
    pub fn clone_node(
        &mut self,
        source: &Document<'buf>,
        src: NodeId,
        share_strings: bool,
    ) -> Result<NodeId> {
        let copy = |text: &Text<'buf>| -> Text<'buf> {
            match text {
                Cow::Borrowed(b) if share_strings => Cow::Borrowed(b),
                other => Cow::Owned(other.as_ref().to_vec()),
            }
        };

        let src_node = source.node(src);
        let result = self.alloc_node(src_node.kind);
        {
            let name = copy(&src_node.name);
            let prefix = copy(&src_node.prefix);
            let node = self.node_mut(result);
            node.name = name;
            node.prefix = prefix;
        }
        let value = source.node_value(src)?;
        if !value.is_empty() {
            let value = copy(match source.node(src).decoded.get() {
                Some(cow) => cow,
                None => &Cow::Borrowed(b"" as &[u8]),
            });
            self.node_mut(result).store_value(value);
        }

        let mut next_child = source.node(src).first_child;
        while let Some(child) = next_child {
            let cloned = self.clone_node(source, child, share_strings)?;
            self.append_child(result, cloned);
            next_child = source.node(child).next_sibling;
        }

        let mut next_attr = source.node(src).first_attr;
        while let Some(attr) = next_attr {
            source.attr_value(attr)?;
            let name = copy(&source.attr(attr).name);
            let value = copy(match source.attr(attr).decoded.get() {
                Some(cow) => cow,
                None => &Cow::Borrowed(b"" as &[u8]),
            });
            let cloned = self.alloc_attribute(name, value);
            self.append_attribute(result, cloned);
            next_attr = source.attr(attr).next_attr;
        }

        Ok(result)
    }
}

impl Default for Document<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ======================================================================
// Read-only handles
// ======================================================================

/// A copyable read-only handle on a node.
#[derive(Clone, Copy)]
pub struct Node<'a, 'buf> {
    pub(crate) doc: &'a Document<'buf>,
    pub(crate) id: NodeId,
}

impl<'a, 'buf> Node<'a, 'buf> {
    /// The node's id in its document.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The owning document.
    #[inline]
    pub fn document(&self) -> &'a Document<'buf> {
        self.doc
    }

    #[inline]
    fn data(&self) -> &'a NodeData<'buf> {
        self.doc.node(self.id)
    }

    /// Kind of this node.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    /// Local name (never contains `:`).
    #[inline]
    pub fn name(&self) -> &'a [u8] {
        self.data().name.as_ref()
    }

    /// Namespace prefix, possibly empty.
    #[inline]
    pub fn prefix(&self) -> &'a [u8] {
        self.data().prefix.as_ref()
    }

    /// The value's source sub-slice, unexpanded.
    #[inline]
    pub fn raw_value(&self) -> &'buf [u8] {
        self.data().raw_value
    }

    /// Entity-expanded (and whitespace-processed) value; decoded on
    /// first call and cached for the document's lifetime.
    pub fn value(&self) -> Result<&'a [u8]> {
        self.doc.node_value(self.id)
    }

    /// True once a decode actually transformed the value, i.e. the
    /// printer must re-escape it rather than copy the raw slice.
    pub fn value_decoded(&self) -> bool {
        let data = self.data();
        data.decoded.get().is_some() && !data.decoded_is_raw()
    }

    /// Verbatim inner XML captured at parse time. Only meaningful while
    /// [`Node::clean`] holds.
    #[inline]
    pub fn contents(&self) -> &'buf [u8] {
        self.data().contents
    }

    /// True while this subtree is unmodified since parsing.
    #[inline]
    pub fn clean(&self) -> bool {
        self.data().clean
    }

    /// Resolved namespace URI for this node's prefix (cached).
    pub fn xmlns(&self) -> Result<&'a [u8]> {
        namespace::element_xmlns(self.doc, self.id)
    }

    /// Parent node, if attached.
    pub fn parent(&self) -> Option<Node<'a, 'buf>> {
        self.data().parent.map(|id| self.doc.get(id))
    }

    /// First child, regardless of name.
    pub fn first_child(&self) -> Option<Node<'a, 'buf>> {
        self.data().first_child.map(|id| self.doc.get(id))
    }

    /// Last child, regardless of name.
    pub fn last_child(&self) -> Option<Node<'a, 'buf>> {
        self.data().last_child.map(|id| self.doc.get(id))
    }

    /// Next sibling, regardless of name.
    pub fn next_sibling(&self) -> Option<Node<'a, 'buf>> {
        self.data().next_sibling.map(|id| self.doc.get(id))
    }

    /// Previous sibling, regardless of name.
    pub fn prev_sibling(&self) -> Option<Node<'a, 'buf>> {
        self.data().prev_sibling.map(|id| self.doc.get(id))
    }

    /// First child matching a name and/or namespace filter.
    ///
    /// A `None` namespace with a name present defaults to "same
    /// namespace as me"; an empty component is a wildcard.
    pub fn first_child_where(
        &self,
        name: Option<&[u8]>,
        xmlns: Option<&[u8]>,
    ) -> Result<Option<Node<'a, 'buf>>> {
        let ns = self.filter_ns(name, xmlns)?;
        self.scan(self.data().first_child, |n| n.next_sibling, name, &ns)
    }

    /// Last child matching a name and/or namespace filter.
    pub fn last_child_where(
        &self,
        name: Option<&[u8]>,
        xmlns: Option<&[u8]>,
    ) -> Result<Option<Node<'a, 'buf>>> {
        let ns = self.filter_ns(name, xmlns)?;
        self.scan(self.data().last_child, |n| n.prev_sibling, name, &ns)
    }

    /// Next sibling matching a name and/or namespace filter.
    pub fn next_sibling_where(
        &self,
        name: Option<&[u8]>,
        xmlns: Option<&[u8]>,
    ) -> Result<Option<Node<'a, 'buf>>> {
        let ns = self.filter_ns(name, xmlns)?;
        self.scan(self.data().next_sibling, |n| n.next_sibling, name, &ns)
    }

    /// Previous sibling matching a name and/or namespace filter.
    pub fn prev_sibling_where(
        &self,
        name: Option<&[u8]>,
        xmlns: Option<&[u8]>,
    ) -> Result<Option<Node<'a, 'buf>>> {
        let ns = self.filter_ns(name, xmlns)?;
        self.scan(self.data().prev_sibling, |n| n.prev_sibling, name, &ns)
    }

    /// Resolve the effective namespace filter: explicit wins, otherwise
    /// a named lookup borrows this node's own namespace.
    fn filter_ns(&self, name: Option<&[u8]>, xmlns: Option<&[u8]>) -> Result<Vec<u8>> {
        match xmlns {
            Some(ns) => Ok(ns.to_vec()),
            None if name.is_some_and(|n| !n.is_empty()) => Ok(self.xmlns()?.to_vec()),
            None => Ok(Vec::new()),
        }
    }

    fn scan(
        &self,
        start: Option<NodeId>,
        step: impl Fn(&NodeData<'buf>) -> Option<NodeId>,
        name: Option<&[u8]>,
        ns: &[u8],
    ) -> Result<Option<Node<'a, 'buf>>> {
        let name = name.unwrap_or(b"");
        let mut next = start;
        while let Some(id) = next {
            let candidate = self.doc.get(id);
            let name_ok = name.is_empty() || candidate.name() == name;
            if name_ok && (ns.is_empty() || candidate.xmlns()? == ns) {
                return Ok(Some(candidate));
            }
            next = step(self.doc.node(id));
        }
        Ok(None)
    }

    /// First attribute, regardless of name.
    pub fn first_attribute(&self) -> Option<Attr<'a, 'buf>> {
        self.data().first_attr.map(|id| self.doc.get_attr(id))
    }

    /// Last attribute, regardless of name.
    pub fn last_attribute(&self) -> Option<Attr<'a, 'buf>> {
        self.data().last_attr.map(|id| self.doc.get_attr(id))
    }

    /// First attribute matching a raw name and/or namespace filter;
    /// empty components are wildcards.
    pub fn first_attribute_where(
        &self,
        name: Option<&[u8]>,
        xmlns: Option<&[u8]>,
    ) -> Result<Option<Attr<'a, 'buf>>> {
        let name = name.unwrap_or(b"");
        let ns = xmlns.unwrap_or(b"");
        let mut next = self.data().first_attr;
        while let Some(id) = next {
            let attr = self.doc.get_attr(id);
            let name_ok = name.is_empty() || attr.name() == name;
            if name_ok && (ns.is_empty() || attr.xmlns()? == ns) {
                return Ok(Some(attr));
            }
            next = self.doc.attr(id).next_attr;
        }
        Ok(None)
    }

    /// Iterate children in order.
    pub fn children(&self) -> Children<'a, 'buf> {
        Children {
            doc: self.doc,
            next: self.data().first_child,
        }
    }

    /// Iterate the subtree below this node in document (pre-)order,
    /// excluding the node itself.
    pub fn descendants(&self) -> Descendants<'a, 'buf> {
        Descendants {
            doc: self.doc,
            root: self.id,
            next: self.data().first_child,
        }
    }

    /// Iterate attributes in order.
    pub fn attributes(&self) -> Attributes<'a, 'buf> {
        Attributes {
            doc: self.doc,
            next: self.data().first_attr,
        }
    }

    /// Resolve namespaces and check attribute uniqueness for this node
    /// and everything below it.
    pub fn validate(&self) -> Result<()> {
        namespace::validate(self.doc, self.id)
    }
}

impl PartialEq for Node<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_, '_> {}

impl std::fmt::Debug for Node<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &String::from_utf8_lossy(self.name()))
            .finish()
    }
}

/// A copyable read-only handle on an attribute.
#[derive(Clone, Copy)]
pub struct Attr<'a, 'buf> {
    pub(crate) doc: &'a Document<'buf>,
    pub(crate) id: AttrId,
}

impl<'a, 'buf> Attr<'a, 'buf> {
    /// The attribute's id in its document.
    #[inline]
    pub fn id(&self) -> AttrId {
        self.id
    }

    #[inline]
    fn data(&self) -> &'a AttrData<'buf> {
        self.doc.attr(self.id)
    }

    /// Raw qualified name (`prefix:local` or just `local`).
    #[inline]
    pub fn name(&self) -> &'a [u8] {
        self.data().name.as_ref()
    }

    /// The part of the name before `:`, or empty.
    #[inline]
    pub fn prefix(&self) -> &'a [u8] {
        self.data().prefix()
    }

    /// The part of the name after `:`, or the whole name.
    #[inline]
    pub fn local_name(&self) -> &'a [u8] {
        self.data().local_name()
    }

    /// The value's source sub-slice between the quotes, unexpanded.
    #[inline]
    pub fn raw_value(&self) -> &'buf [u8] {
        self.data().raw_value
    }

    /// Entity-expanded value; decoded on first call and cached.
    pub fn value(&self) -> Result<&'a [u8]> {
        self.doc.attr_value(self.id)
    }

    /// True once a decode actually transformed the value.
    pub fn value_decoded(&self) -> bool {
        let data = self.data();
        data.decoded.get().is_some() && !data.decoded_is_raw()
    }

    /// The quote character (`'` or `"`) captured at parse time, or 0 for
    /// attributes built by hand.
    #[inline]
    pub fn quote(&self) -> u8 {
        self.data().quote
    }

    /// Resolved namespace URI: empty for unprefixed attributes (they do
    /// not inherit the default namespace).
    pub fn xmlns(&self) -> Result<&'a [u8]> {
        namespace::attr_xmlns(self.doc, self.id)
    }

    /// The element this attribute sits on, if attached.
    pub fn element(&self) -> Option<Node<'a, 'buf>> {
        self.data().parent.map(|id| self.doc.get(id))
    }

    /// Next attribute in the element's list.
    pub fn next_attribute(&self) -> Option<Attr<'a, 'buf>> {
        self.data().next_attr.map(|id| self.doc.get_attr(id))
    }

    /// Previous attribute in the element's list.
    pub fn prev_attribute(&self) -> Option<Attr<'a, 'buf>> {
        self.data().prev_attr.map(|id| self.doc.get_attr(id))
    }
}

impl PartialEq for Attr<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Attr<'_, '_> {}

impl std::fmt::Debug for Attr<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attr")
            .field("id", &self.id)
            .field("name", &String::from_utf8_lossy(self.name()))
            .finish()
    }
}

// ======================================================================
// Iterators
// ======================================================================

/// Iterator over a node's children.
pub struct Children<'a, 'buf> {
    doc: &'a Document<'buf>,
    next: Option<NodeId>,
}

impl<'a, 'buf> Iterator for Children<'a, 'buf> {
    type Item = Node<'a, 'buf>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.doc.node(id).next_sibling;
        Some(self.doc.get(id))
    }
}

/// Pre-order iterator over a subtree, excluding its root.
pub struct Descendants<'a, 'buf> {
    doc: &'a Document<'buf>,
    root: NodeId,
    next: Option<NodeId>,
}

impl<'a, 'buf> Iterator for Descendants<'a, 'buf> {
    type Item = Node<'a, 'buf>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.following(id);
        Some(self.doc.get(id))
    }
}

impl Descendants<'_, '_> {
    fn following(&self, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.doc.node(id).first_child {
            return Some(child);
        }
        let mut cur = id;
        loop {
            if cur == self.root {
                return None;
            }
            if let Some(sibling) = self.doc.node(cur).next_sibling {
                return Some(sibling);
            }
            cur = self.doc.node(cur).parent?;
        }
    }
}

/// Iterator over an element's attributes.
pub struct Attributes<'a, 'buf> {
    doc: &'a Document<'buf>,
    next: Option<AttrId>,
}

impl<'a, 'buf> Iterator for Attributes<'a, 'buf> {
    type Item = Attr<'a, 'buf>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.doc.attr(id).next_attr;
        Some(self.doc.get_attr(id))
    }
}
