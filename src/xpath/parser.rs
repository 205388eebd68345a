//! Path-string compiler
//!
//! Compiles the path grammar
//!
//! ```text
//! Path  := ('//' | '/')? Step ( '/' Step | '[' Path ']' )*
//! Step  := QName | '*' | '@' QName '=' Literal | '@*' '=' Literal
//!        | 'text()' '=' Literal | 'namespace-uri()' '=' Literal
//! ```
//!
//! into a step chain. `/` becomes a child-axis step and `//` a
//! descendant-or-self step; a path with no leading slash gets an
//! implicit `//` at the top level and an implicit child axis inside a
//! predicate. Prefixes in QNames resolve through the caller's map at
//! compile time; a missing prefix fails the compile.

use std::collections::HashMap;

use crate::core::entities;
use crate::error::{Error, Result};
use crate::parser::ParseFlags;
use crate::xpath::steps::{Matcher, Step};
use crate::xpath::Path;

pub(crate) fn parse(expr: &str, xmlns: &HashMap<String, String>) -> Result<Path> {
    if expr.is_empty() {
        return Err(Error::Path("path expression is empty".into()));
    }
    let mut view = expr;
    let mut path = Path { steps: Vec::new() };
    if !parse_inner(&mut view, &mut path, xmlns, true, false)? {
        while !view.is_empty() {
            if parse_inner(&mut view, &mut path, xmlns, false, false)? {
                break;
            }
        }
    }
    Ok(path)
}

/// Parse one segment of the path into `path`. Returns true when the
/// expression (or the enclosing predicate) has been fully consumed.
fn parse_inner(
    view: &mut &str,
    path: &mut Path,
    xmlns: &HashMap<String, String>,
    first: bool,
    inner: bool,
) -> Result<bool> {
    if let Some(rest) = view.strip_prefix("//") {
        path.steps.push(Step::new(Matcher::Any));
        *view = rest;
    } else if let Some(rest) = view.strip_prefix('/') {
        path.steps.push(Step::new(Matcher::Root));
        *view = rest;
    } else if first && !inner {
        // A relative top-level path searches the whole subtree.
        path.steps.push(Step::new(Matcher::Any));
    }

    let bytes = view.as_bytes();
    for i in 0..bytes.len() {
        let b = bytes[i];
        if (b == b'/' || b == b']') && i == 0 {
            return Err(Error::Path("empty step name".into()));
        }
        if (b == b'[' || b == b'/' || b == b']') && i != 0 {
            parse_step(&view[..i], path, xmlns, inner)?;
        }
        match b {
            b']' => {
                *view = &view[i + 1..];
                if !inner {
                    return Err(Error::Path("unexpected ] in path".into()));
                }
                return Ok(true);
            }
            b'[' => {
                *view = &view[i + 1..];
                let context = parse_context(view, xmlns)?;
                match path.steps.last_mut() {
                    Some(step) => step.contexts.push(context),
                    None => {
                        return Err(Error::Path("predicate before any step".into()));
                    }
                }
                return Ok(false);
            }
            b'/' => {
                *view = &view[i..];
                return Ok(false);
            }
            _ => {}
        }
    }

    if !view.is_empty() {
        parse_step(view, path, xmlns, inner)?;
        *view = "";
    }
    Ok(true)
}

/// Parse a bracketed predicate up to its closing `]`.
fn parse_context(view: &mut &str, xmlns: &HashMap<String, String>) -> Result<Path> {
    if view.is_empty() {
        return Err(Error::Path("predicate expression is empty".into()));
    }
    let mut context = Path { steps: Vec::new() };
    if !parse_inner(view, &mut context, xmlns, true, true)? {
        while !view.is_empty() {
            if parse_inner(view, &mut context, xmlns, false, true)? {
                break;
            }
        }
    }
    Ok(context)
}

/// Compile one step token into a matcher on the chain.
fn parse_step(
    token: &str,
    path: &mut Path,
    xmlns: &HashMap<String, String>,
    inner: bool,
) -> Result<()> {
    if let Some(rest) = token.strip_prefix('@') {
        let (name, rest) = if let Some(rest) = rest.strip_prefix('*') {
            ("*", rest)
        } else {
            let eq = rest
                .find('=')
                .ok_or_else(|| Error::Path(format!("attribute test needs a value: @{rest}")))?;
            (&rest[..eq], &rest[eq..])
        };
        if name.is_empty() {
            return Err(Error::Path("empty attribute name".into()));
        }
        let value = quoted_literal(rest)?;
        let matcher = match name.split_once(':') {
            Some((prefix, local)) => Matcher::Attr {
                xmlns: Some(prefix_lookup(xmlns, prefix)?),
                name: local.as_bytes().to_vec(),
                value,
            },
            None => Matcher::Attr {
                xmlns: None,
                name: name.as_bytes().to_vec(),
                value,
            },
        };
        path.steps.push(Step::new(matcher));
        return Ok(());
    }

    if let Some(rest) = token.strip_prefix("text()") {
        let value = quoted_literal(rest)?;
        path.steps.push(Step::new(Matcher::Value(value)));
        return Ok(());
    }

    if let Some(rest) = token.strip_prefix("namespace-uri()") {
        let value = quoted_literal(rest)?;
        path.steps.push(Step::new(Matcher::Xmlns(value)));
        return Ok(());
    }

    // A name test. Inside a predicate the first step implicitly walks
    // children of the candidate.
    if path.steps.is_empty() && inner {
        path.steps.push(Step::new(Matcher::Root));
    }
    let matcher = match token.split_once(':') {
        Some((prefix, local)) => Matcher::Name {
            name: local.as_bytes().to_vec(),
            xmlns: Some(prefix_lookup(xmlns, prefix)?),
        },
        None => Matcher::Name {
            name: token.as_bytes().to_vec(),
            xmlns: None,
        },
    };
    path.steps.push(Step::new(matcher));
    Ok(())
}

/// `='value'` or `="value"`, consumed exactly; entity references in the
/// literal are expanded.
fn quoted_literal(rest: &str) -> Result<Vec<u8>> {
    let rest = rest
        .strip_prefix('=')
        .ok_or_else(|| Error::Path(format!("expected = before value: {rest}")))?;
    let quote = rest
        .chars()
        .next()
        .filter(|&q| q == '\'' || q == '"')
        .ok_or_else(|| Error::Path(format!("expected quoted value: {rest}")))?;
    let body = &rest[1..];
    let end = body
        .find(quote)
        .ok_or_else(|| Error::Path(format!("unterminated value: {rest}")))?;
    if !body[end + 1..].is_empty() {
        return Err(Error::Path(format!(
            "trailing characters after value: {rest}"
        )));
    }
    let decoded = entities::decode_attr(body[..end].as_bytes(), quote as u8, ParseFlags::DEFAULT)?;
    Ok(decoded.into_owned())
}

fn prefix_lookup(xmlns: &HashMap<String, String>, prefix: &str) -> Result<Vec<u8>> {
    match xmlns.get(prefix) {
        Some(uri) => Ok(uri.as_bytes().to_vec()),
        None => Err(Error::Path(format!("unknown prefix: {prefix}"))),
    }
}
