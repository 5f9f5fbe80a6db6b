// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive-descent parser for signature text.

use super::element::{code, Element, TupleElement};
use crate::config::MAX_SIGNATURE_DEPTH;
use std::fmt;

/// Why a signature failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Container opened with `open` never closed.
    Unterminated { open: char },
    /// Closing character with no matching opener.
    UnexpectedClose(char),
    /// Character that is not a type code.
    UnknownCode(char),
    /// `*` with no element before it.
    DanglingPointer,
    /// `[..]` or `{..}` with the wrong number of inner elements.
    ContainerArity {
        open: char,
        expected: usize,
        found: usize,
    },
    /// Broken `<Name,field,...>` annotation.
    MalformedAnnotation(String),
    /// Containers nested deeper than the parser accepts.
    TooDeep { max: usize },
}

/// Signature parse failure with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::Unterminated { open } => {
                write!(f, "unterminated '{}' opened at offset {}", open, self.position)
            }
            ParseErrorKind::UnexpectedClose(c) => {
                write!(f, "unexpected '{}' at offset {}", c, self.position)
            }
            ParseErrorKind::UnknownCode(c) => {
                write!(f, "unknown type code '{}' at offset {}", c, self.position)
            }
            ParseErrorKind::DanglingPointer => {
                write!(f, "pointer marker without element at offset {}", self.position)
            }
            ParseErrorKind::ContainerArity {
                open,
                expected,
                found,
            } => write!(
                f,
                "'{}' at offset {} needs {} element(s), found {}",
                open, self.position, expected, found
            ),
            ParseErrorKind::MalformedAnnotation(reason) => {
                write!(f, "malformed annotation at offset {}: {}", self.position, reason)
            }
            ParseErrorKind::TooDeep { max } => {
                write!(f, "nesting deeper than {} at offset {}", max, self.position)
            }
        }
    }
}

impl std::error::Error for ParseError {}

pub(crate) fn parse_elements(text: &str) -> Result<Vec<Element>, ParseError> {
    let mut parser = Parser {
        bytes: text.as_bytes(),
        pos: 0,
        depth: 0,
    };
    parser.sequence(None)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Parse elements until `closer` (left unconsumed) or end of input.
    /// `closer` carries the opener and its offset for error reporting.
    fn sequence(&mut self, closer: Option<(u8, u8, usize)>) -> Result<Vec<Element>, ParseError> {
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return match closer {
                        Some((open, _, at)) => Err(ParseError::new(
                            at,
                            ParseErrorKind::Unterminated {
                                open: char::from(open),
                            },
                        )),
                        None => Ok(elements),
                    };
                }
                Some(c) if closer.is_some_and(|(_, close, _)| close == c) => return Ok(elements),
                Some(code::POINTER) => {
                    return Err(ParseError::new(self.pos, ParseErrorKind::DanglingPointer));
                }
                Some(c @ (code::LIST_CLOSE | code::MAP_CLOSE | code::TUPLE_CLOSE)) => {
                    return Err(ParseError::new(
                        self.pos,
                        ParseErrorKind::UnexpectedClose(char::from(c)),
                    ));
                }
                Some(_) => elements.push(self.element()?),
            }
        }
    }

    fn element(&mut self) -> Result<Element, ParseError> {
        let start = self.pos;
        let c = self.bytes[start];
        self.pos += 1;

        let mut element = match c {
            code::LIST_OPEN => {
                let mut inner = self.container(start, code::LIST_OPEN, code::LIST_CLOSE, 1)?;
                Element::List(Box::new(inner.remove(0)))
            }
            code::MAP_OPEN => {
                let mut inner = self.container(start, code::MAP_OPEN, code::MAP_CLOSE, 2)?;
                let value = inner.remove(1);
                let key = inner.remove(0);
                Element::Map(Box::new(key), Box::new(value))
            }
            code::TUPLE_OPEN => {
                self.enter(start)?;
                let fields = self.sequence(Some((code::TUPLE_OPEN, code::TUPLE_CLOSE, start)))?;
                self.pos += 1;
                self.depth -= 1;
                let mut tuple = TupleElement::new(fields);
                if self.peek() == Some(code::ANNOTATION_OPEN) {
                    self.annotation(&mut tuple)?;
                }
                Element::Tuple(tuple)
            }
            other => Element::from_code(other).ok_or_else(|| {
                ParseError::new(start, ParseErrorKind::UnknownCode(char::from(other)))
            })?,
        };

        while self.peek() == Some(code::POINTER) {
            self.pos += 1;
            element = Element::Pointer(Box::new(element));
        }
        Ok(element)
    }

    fn container(
        &mut self,
        start: usize,
        open: u8,
        close: u8,
        arity: usize,
    ) -> Result<Vec<Element>, ParseError> {
        self.enter(start)?;
        let inner = self.sequence(Some((open, close, start)))?;
        self.pos += 1;
        self.depth -= 1;
        if inner.len() != arity {
            return Err(ParseError::new(
                start,
                ParseErrorKind::ContainerArity {
                    open: char::from(open),
                    expected: arity,
                    found: inner.len(),
                },
            ));
        }
        Ok(inner)
    }

    fn enter(&mut self, start: usize) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_SIGNATURE_DEPTH {
            return Err(ParseError::new(
                start,
                ParseErrorKind::TooDeep {
                    max: MAX_SIGNATURE_DEPTH,
                },
            ));
        }
        Ok(())
    }

    /// `<Name,field1,field2>` following a tuple.
    fn annotation(&mut self, tuple: &mut TupleElement) -> Result<(), ParseError> {
        let start = self.pos;
        let rest = &self.bytes[start + 1..];
        let len = rest
            .iter()
            .position(|&b| b == code::ANNOTATION_CLOSE)
            .ok_or_else(|| {
                ParseError::new(
                    start,
                    ParseErrorKind::MalformedAnnotation("missing '>'".into()),
                )
            })?;
        let body = std::str::from_utf8(&rest[..len]).map_err(|_| {
            ParseError::new(
                start,
                ParseErrorKind::MalformedAnnotation("not valid UTF-8".into()),
            )
        })?;
        self.pos = start + 1 + len + 1;

        let mut parts = body.split(',');
        let name = parts.next().unwrap_or_default();
        let field_names: Vec<String> = parts.map(str::to_owned).collect();

        if body.bytes().any(|b| b == code::ANNOTATION_OPEN) {
            return Err(ParseError::new(
                start,
                ParseErrorKind::MalformedAnnotation("nested '<'".into()),
            ));
        }
        if !field_names.is_empty() && field_names.len() != tuple.fields.len() {
            return Err(ParseError::new(
                start,
                ParseErrorKind::MalformedAnnotation(format!(
                    "{} field name(s) for {} field(s)",
                    field_names.len(),
                    tuple.fields.len()
                )),
            ));
        }
        if field_names.iter().any(String::is_empty) {
            return Err(ParseError::new(
                start,
                ParseErrorKind::MalformedAnnotation("empty field name".into()),
            ));
        }

        tuple.name = (!name.is_empty()).then(|| name.to_owned());
        tuple.field_names = field_names;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(text: &str) -> ParseErrorKind {
        parse_elements(text).expect_err("should fail").kind
    }

    #[test]
    fn test_inner_closer_not_taken_for_outer() {
        let elements = parse_elements("([i](s)){s[i]}").expect("parse");
        assert_eq!(elements.len(), 2);
        assert_eq!(
            elements[0],
            Element::tuple(vec![
                Element::list(Element::Int32),
                Element::tuple(vec![Element::String]),
            ])
        );
    }

    #[test]
    fn test_pointer_fuses_onto_container() {
        let elements = parse_elements("[i]*s**").expect("parse");
        assert_eq!(elements[0], Element::pointer(Element::list(Element::Int32)));
        assert_eq!(
            elements[1],
            Element::pointer(Element::pointer(Element::String))
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(kind_of("[i"), ParseErrorKind::Unterminated { open: '[' });
        assert_eq!(kind_of("(is"), ParseErrorKind::Unterminated { open: '(' });
        assert_eq!(kind_of("i]"), ParseErrorKind::UnexpectedClose(']'));
        assert_eq!(kind_of("(i]"), ParseErrorKind::UnexpectedClose(']'));
        assert_eq!(kind_of("q"), ParseErrorKind::UnknownCode('q'));
        assert_eq!(kind_of("*i"), ParseErrorKind::DanglingPointer);
        assert_eq!(kind_of("[*]"), ParseErrorKind::DanglingPointer);
        assert!(matches!(
            kind_of("{s}"),
            ParseErrorKind::ContainerArity { open: '{', expected: 2, found: 1 }
        ));
        assert!(matches!(
            kind_of("[]"),
            ParseErrorKind::ContainerArity { open: '[', expected: 1, found: 0 }
        ));
        assert!(matches!(kind_of("(i)<P,a,b>"), ParseErrorKind::MalformedAnnotation(_)));
        assert!(matches!(kind_of("(i)<P,a"), ParseErrorKind::MalformedAnnotation(_)));
    }

    #[test]
    fn test_error_positions() {
        let err = parse_elements("ii[s").expect_err("unterminated");
        assert_eq!(err.position, 2);
        let err = parse_elements("isx").expect_err("unknown");
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_SIGNATURE_DEPTH + 1) + "i" + &"]".repeat(MAX_SIGNATURE_DEPTH + 1);
        assert!(matches!(kind_of(&deep), ParseErrorKind::TooDeep { .. }));

        let ok = "[".repeat(MAX_SIGNATURE_DEPTH) + "i" + &"]".repeat(MAX_SIGNATURE_DEPTH);
        assert!(parse_elements(&ok).is_ok());
    }

    #[test]
    fn test_annotation_fields() {
        let elements = parse_elements("(is)<Person,age,name>").expect("parse");
        match &elements[0] {
            Element::Tuple(tuple) => {
                assert_eq!(tuple.name.as_deref(), Some("Person"));
                assert_eq!(tuple.field_names, vec!["age", "name"]);
            }
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_elements("").expect("empty is valid").is_empty());
    }
}
