// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Qualified method names: `name::(params):ret`.

use super::parser::{ParseError, ParseErrorKind};
use super::Signature;
use std::fmt;

/// A split `name::(params):ret` string. Every part is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Qualified {
    pub name: Option<String>,
    pub params: Option<Signature>,
    pub ret: Option<Signature>,
}

impl Qualified {
    /// `name::(params)` form used as the exact-match key of a method.
    #[must_use]
    pub fn key(name: &str, params: &Signature) -> String {
        format!("{}::({})", name, params)
    }
}

impl fmt::Display for Qualified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            f.write_str(name)?;
            if self.params.is_some() {
                f.write_str("::")?;
            }
        }
        if let Some(params) = &self.params {
            write!(f, "({})", params)?;
        }
        if let Some(ret) = &self.ret {
            write!(f, ":{}", ret)?;
        }
        Ok(())
    }
}

/// Split a qualified name into its name, parameter and return parts.
///
/// - `"add::(ii):i"` -> name `add`, params `ii`, ret `i`
/// - `"add::(ii)"` -> no return part
/// - `"(ii):i"` -> no name part
/// - `"add"` -> name only
pub fn split_qualified(text: &str) -> Result<Qualified, ParseError> {
    let (name, rest, offset) = match text.find("::") {
        Some(idx) => (Some(&text[..idx]), &text[idx + 2..], idx + 2),
        None if looks_like_signature(text) => (None, text, 0),
        None => {
            return Ok(Qualified {
                name: Some(text.to_owned()),
                ..Qualified::default()
            })
        }
    };

    if rest.is_empty() {
        return Ok(Qualified {
            name: name.map(str::to_owned),
            ..Qualified::default()
        });
    }

    let close = matching_paren(rest).map_err(|kind| ParseError {
        position: offset,
        kind,
    })?;
    let params = Signature::parse(&rest[1..close]).map_err(|e| ParseError {
        position: e.position + offset + 1,
        kind: e.kind,
    })?;

    let tail = &rest[close + 1..];
    let ret = match tail.strip_prefix(':') {
        Some(ret_text) => Some(Signature::parse(ret_text).map_err(|e| ParseError {
            position: e.position + offset + close + 2,
            kind: e.kind,
        })?),
        None if tail.is_empty() => None,
        None => {
            return Err(ParseError {
                position: offset + close + 1,
                kind: ParseErrorKind::UnknownCode(tail.chars().next().unwrap_or(' ')),
            })
        }
    };

    Ok(Qualified {
        name: name.map(str::to_owned),
        params: Some(params),
        ret,
    })
}

fn looks_like_signature(text: &str) -> bool {
    text.starts_with('(')
}

/// Index of the ')' closing the '(' at offset 0.
fn matching_paren(text: &str) -> Result<usize, ParseErrorKind> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'(') {
        let c = text.chars().next().unwrap_or(' ');
        return Err(ParseErrorKind::UnknownCode(c));
    }
    let mut depth = 0usize;
    let mut in_annotation = false;
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'<' => in_annotation = true,
            b'>' => in_annotation = false,
            _ if in_annotation => {}
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    Err(ParseErrorKind::Unterminated { open: '(' })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_form() {
        let q = split_qualified("add::(ii):i").expect("split");
        assert_eq!(q.name.as_deref(), Some("add"));
        assert_eq!(q.params.as_ref().map(|s| s.to_string()).as_deref(), Some("ii"));
        assert_eq!(q.ret.as_ref().map(|s| s.to_string()).as_deref(), Some("i"));
        assert_eq!(q.to_string(), "add::(ii):i");
    }

    #[test]
    fn test_missing_parts() {
        let q = split_qualified("add::((i)[s])").expect("split");
        assert_eq!(q.name.as_deref(), Some("add"));
        assert_eq!(q.params.map(|s| s.len()), Some(2));
        assert!(q.ret.is_none());

        let q = split_qualified("(s):v").expect("split");
        assert!(q.name.is_none());
        assert_eq!(q.ret.map(|s| s.to_string()).as_deref(), Some("v"));

        let q = split_qualified("ping").expect("split");
        assert_eq!(q.name.as_deref(), Some("ping"));
        assert!(q.params.is_none());
    }

    #[test]
    fn test_annotation_parens_ignored() {
        let q = split_qualified("f::((i)<P,x>)").expect("split");
        assert_eq!(q.params.map(|s| s.to_string()).as_deref(), Some("(i)<P,x>"));
    }

    #[test]
    fn test_malformed() {
        assert!(split_qualified("f::(ii").is_err());
        assert!(split_qualified("f::ii").is_err());
        assert!(split_qualified("f::(i)x").is_err());
        assert!(split_qualified("f::(q)").is_err());
    }

    #[test]
    fn test_key() {
        let params = Signature::parse("i[s]").expect("parse");
        assert_eq!(Qualified::key("go", &params), "go::(i[s])");
    }
}
