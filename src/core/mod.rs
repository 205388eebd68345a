//! Parser internals: byte classification, buffer cursor, entity codec.

pub mod chartab;
pub mod cursor;
pub mod entities;

pub use cursor::Cursor;
