//! Path steps
//!
//! A compiled path is a chain of steps. Axis steps (`Root`, `Any`)
//! widen the candidate set; test steps filter the node at hand. Each
//! step may carry predicate sub-paths that must match at least once
//! beneath a candidate for it to pass.

use crate::dom::{Node, NodeKind};
use crate::error::Result;
use crate::xpath::Path;

/// What a single step matches, and what it gathers from.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    /// `/` — step down to children.
    Root,
    /// `//` — the node itself and every descendant.
    Any,
    /// A (possibly wildcard) element name test, optionally bound to a
    /// namespace URI resolved at compile time.
    Name {
        name: Vec<u8>,
        xmlns: Option<Vec<u8>>,
    },
    /// `text()='...'` — element whose decoded value equals the literal.
    Value(Vec<u8>),
    /// `namespace-uri()='...'` — element in the given namespace.
    Xmlns(Vec<u8>),
    /// `@name='...'` — element carrying a matching attribute.
    Attr {
        xmlns: Option<Vec<u8>>,
        name: Vec<u8>,
        value: Vec<u8>,
    },
}

/// One step of a compiled path.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub(crate) matcher: Matcher,
    /// `[...]` predicates attached to this step.
    pub(crate) contexts: Vec<Path>,
}

impl Step {
    pub(crate) fn new(matcher: Matcher) -> Self {
        Step {
            matcher,
            contexts: Vec::new(),
        }
    }

    /// Candidate nodes this step considers, relative to `node`.
    pub(crate) fn candidates<'a, 'buf>(
        &self,
        node: Node<'a, 'buf>,
    ) -> Box<dyn Iterator<Item = Node<'a, 'buf>> + 'a> {
        match self.matcher {
            Matcher::Root => Box::new(node.children()),
            Matcher::Any => Box::new(std::iter::once(node).chain(node.descendants())),
            _ => Box::new(std::iter::once(node)),
        }
    }

    /// Does `node` pass this step's test and all of its predicates?
    pub(crate) fn matches(&self, node: Node<'_, '_>) -> Result<bool> {
        if !matcher_matches(&self.matcher, node)? {
            return Ok(false);
        }
        for context in &self.contexts {
            if context.first(node)?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn matcher_matches(matcher: &Matcher, node: Node<'_, '_>) -> Result<bool> {
    match matcher {
        Matcher::Root | Matcher::Any => Ok(matches!(
            node.kind(),
            NodeKind::Document | NodeKind::Element
        )),

        Matcher::Name { name, xmlns } => {
            if node.kind() != NodeKind::Element {
                return Ok(false);
            }
            if let Some(uri) = xmlns {
                if node.xmlns()? != uri.as_slice() {
                    return Ok(false);
                }
            }
            Ok(name == b"*" || node.name() == name.as_slice())
        }

        Matcher::Value(value) => {
            Ok(node.kind() == NodeKind::Element && node.value()? == value.as_slice())
        }

        Matcher::Xmlns(uri) => {
            Ok(node.kind() == NodeKind::Element && node.xmlns()? == uri.as_slice())
        }

        Matcher::Attr { xmlns, name, value } => {
            if node.kind() != NodeKind::Element {
                return Ok(false);
            }
            for attr in node.attributes() {
                let name_ok = match xmlns {
                    Some(uri) => {
                        (name == b"*" || attr.local_name() == name.as_slice())
                            && attr.xmlns()? == uri.as_slice()
                    }
                    None => name == b"*" || attr.name() == name.as_slice(),
                };
                if name_ok {
                    // The first name match decides.
                    return Ok(attr.value()? == value.as_slice());
                }
            }
            Ok(false)
        }
    }
}
