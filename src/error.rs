//! Error taxonomy
//!
//! One crate-wide error enum. Parse errors carry the byte offset at which
//! the fault was detected; an error raised while the cursor sits on the
//! end-of-buffer NUL is reported as `Eof` instead.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Any error this crate can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed XML at a byte offset.
    #[error("{message} at offset {offset}")]
    Parse {
        /// Human-readable description ("expected >", "expected ;", ...).
        message: &'static str,
        /// Byte offset into the source buffer.
        offset: usize,
    },

    /// Malformed XML where the offending byte is the end of the buffer.
    #[error("{message}: unexpected end of data")]
    Eof {
        /// Human-readable description.
        message: &'static str,
    },

    /// An element name uses a prefix with no `xmlns:` binding in scope.
    #[error("unbound element prefix: {prefix}")]
    ElementXmlnsUnbound {
        /// The unbound prefix.
        prefix: String,
    },

    /// An attribute name uses a prefix with no `xmlns:` binding in scope.
    #[error("unbound attribute prefix: {prefix}")]
    AttrXmlnsUnbound {
        /// The unbound prefix.
        prefix: String,
    },

    /// Two attributes on one element share a raw name, or a
    /// (local name, namespace) pair.
    #[error("duplicate attribute: {name}")]
    DuplicateAttribute {
        /// The offending attribute name.
        name: String,
    },

    /// An optional node handle was required but absent.
    #[error("no such node")]
    NoSuchNode,

    /// An XPath expression failed to compile.
    #[error("invalid path: {0}")]
    Path(String),
}

impl Error {
    /// True for `Parse` and its `Eof` specialization.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Eof { .. })
    }

    /// True for the namespace/duplicate-attribute validation errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::ElementXmlnsUnbound { .. }
                | Error::AttrXmlnsUnbound { .. }
                | Error::DuplicateAttribute { .. }
        )
    }
}
