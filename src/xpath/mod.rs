//! XPath subset
//!
//! A compiled path evaluates as a lazy pull-sequence over the tree in
//! document order: nothing past the nodes the caller asks for is
//! visited. Matching can resolve namespaces, which can fail on unbound
//! prefixes, so the sequence yields `Result<Node>`.
//!
//! ```
//! use quickdom::{Document, ParseFlags};
//! use quickdom::xpath::Path;
//!
//! let doc = Document::parse(b"<a><b k='v'>hit</b><b>miss</b></a>",
//!                           ParseFlags::DEFAULT).unwrap();
//! let path = Path::parse("//b[@k='v']").unwrap();
//! let found = path.first(doc.document_node()).unwrap().unwrap();
//! assert_eq!(found.value().unwrap(), b"hit");
//! ```

mod cache;
mod parser;
pub(crate) mod steps;

pub use cache::PathCache;

use std::collections::HashMap;

use crate::dom::Node;
use crate::error::Result;
use crate::xpath::steps::Step;

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct Path {
    pub(crate) steps: Vec<Step>,
}

impl Path {
    /// Compile a path that uses no namespace prefixes.
    pub fn parse(expr: &str) -> Result<Path> {
        let empty = HashMap::new();
        parser::parse(expr, &empty)
    }

    /// Compile a path, resolving prefixes through `xmlns`. A prefix
    /// missing from the map fails the compile.
    pub fn parse_with(expr: &str, xmlns: &HashMap<String, String>) -> Result<Path> {
        parser::parse(expr, xmlns)
    }

    /// Lazily yield every match under `node`, in document order.
    pub fn all<'p, 'a, 'buf>(&'p self, node: Node<'a, 'buf>) -> Matches<'p, 'a, 'buf>
    where
        'a: 'p,
    {
        Matches {
            inner: eval(&self.steps, node),
        }
    }

    /// The first match under `node`, or `None`.
    pub fn first<'a, 'buf>(&self, node: Node<'a, 'buf>) -> Result<Option<Node<'a, 'buf>>> {
        match self.all(node).next() {
            Some(result) => result.map(Some),
            None => Ok(None),
        }
    }
}

/// Lazy sequence of path matches.
pub struct Matches<'p, 'a, 'buf> {
    inner: Box<dyn Iterator<Item = Result<Node<'a, 'buf>>> + 'p>,
}

impl<'p, 'a, 'buf> Iterator for Matches<'p, 'a, 'buf> {
    type Item = Result<Node<'a, 'buf>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Evaluate a step chain: gather candidates for the head step, filter
/// through its test and predicates, and recurse on the tail for each
/// survivor. An exhausted chain yields the node itself.
fn eval<'p, 'a, 'buf>(
    steps: &'p [Step],
    node: Node<'a, 'buf>,
) -> Box<dyn Iterator<Item = Result<Node<'a, 'buf>>> + 'p>
where
    'a: 'p,
{
    let Some((step, rest)) = steps.split_first() else {
        return Box::new(std::iter::once(Ok(node)));
    };

    let iter = step
        .candidates(node)
        .map(move |candidate| step.matches(candidate).map(|hit| (candidate, hit)))
        .filter_map(|checked| match checked {
            Ok((candidate, true)) => Some(Ok(candidate)),
            Ok((_, false)) => None,
            Err(err) => Some(Err(err)),
        })
        .flat_map(
            move |survivor| -> Box<dyn Iterator<Item = Result<Node<'a, 'buf>>> + 'p> {
                match survivor {
                    Ok(candidate) => eval(rest, candidate),
                    Err(err) => Box::new(std::iter::once(Err(err))),
                }
            },
        );
    Box::new(iter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::parser::ParseFlags;

    #[test]
    fn test_all_is_document_order() {
        let doc = Document::parse(
            b"<r><a><b i='1'/></a><b i='2'/><c><b i='3'/></c></r>",
            ParseFlags::DEFAULT,
        )
        .unwrap();
        let path = Path::parse("//b").unwrap();
        let order: Vec<Vec<u8>> = path
            .all(doc.document_node())
            .map(|n| {
                n.unwrap()
                    .first_attribute()
                    .unwrap()
                    .raw_value()
                    .to_vec()
            })
            .collect();
        assert_eq!(order, vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    }

    #[test]
    fn test_first_stops_early() {
        let doc =
            Document::parse(b"<r><x/><x/><x/></r>", ParseFlags::DEFAULT).unwrap();
        let path = Path::parse("//x").unwrap();
        let first = path.first(doc.document_node()).unwrap().unwrap();
        assert_eq!(first, doc.root_element().unwrap().first_child().unwrap());
    }

    #[test]
    fn test_absolute_path_from_document() {
        let doc = Document::parse(b"<a><b/></a>", ParseFlags::DEFAULT).unwrap();
        let path = Path::parse("/a/b").unwrap();
        assert!(path.first(doc.document_node()).unwrap().is_some());
        // The absolute path does not match deeper in the tree.
        let path = Path::parse("/b").unwrap();
        assert!(path.first(doc.document_node()).unwrap().is_none());
    }

    #[test]
    fn test_nested_predicates() {
        let doc = Document::parse(
            b"<r><item><meta ok='yes'/></item><item><meta ok='no'/></item></r>",
            ParseFlags::DEFAULT,
        )
        .unwrap();
        let path = Path::parse("//item[meta[@ok='yes']]").unwrap();
        let hits: Vec<_> = path
            .all(doc.document_node())
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0],
            doc.root_element().unwrap().first_child().unwrap()
        );
    }

    #[test]
    fn test_unbound_prefix_surfaces_during_match() {
        // The document's prefix never resolves; matching by namespace
        // forces resolution and must surface the failure.
        let doc = Document::parse(b"<p:a/>", ParseFlags::DEFAULT).unwrap();
        let path = Path::parse("//*[namespace-uri()='urn:x']").unwrap();
        let result: Result<Vec<_>> = path.all(doc.document_node()).collect();
        assert!(result.is_err());
    }
}
