// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Human-readable printing, implemented as a [`ValueVisitor`].

use super::visit::{FloatValue, IntValue, ValueVisitor};
use super::{ObjectRef, Value};
use std::fmt::{self, Write};

struct Printer<'a, 'b> {
    out: &'a mut fmt::Formatter<'b>,
}

impl Printer<'_, '_> {
    fn sequence<'v>(
        &mut self,
        open: char,
        close: char,
        items: impl Iterator<Item = &'v Value>,
    ) -> fmt::Result {
        self.out.write_char(open)?;
        for (i, item) in items.enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            item.accept(self)?;
        }
        self.out.write_char(close)
    }
}

impl ValueVisitor for Printer<'_, '_> {
    type Output = fmt::Result;

    fn visit_void(&mut self) -> fmt::Result {
        self.out.write_str("void")
    }

    fn visit_bool(&mut self, v: bool) -> fmt::Result {
        write!(self.out, "{}", v)
    }

    fn visit_int(&mut self, v: IntValue) -> fmt::Result {
        write!(self.out, "{}", v.as_i128())
    }

    fn visit_float(&mut self, v: FloatValue) -> fmt::Result {
        match v {
            FloatValue::F32(f) => write!(self.out, "{:?}", f),
            FloatValue::F64(f) => write!(self.out, "{:?}", f),
        }
    }

    fn visit_string(&mut self, v: &str) -> fmt::Result {
        write!(self.out, "{:?}", v)
    }

    fn visit_raw(&mut self, v: &[u8]) -> fmt::Result {
        write!(self.out, "<{} bytes>", v.len())
    }

    fn visit_list(&mut self, items: &[Value]) -> fmt::Result {
        self.sequence('[', ']', items.iter())
    }

    fn visit_map(&mut self, entries: &[(Value, Value)]) -> fmt::Result {
        self.out.write_char('{')?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            key.accept(self)?;
            self.out.write_str(": ")?;
            value.accept(self)?;
        }
        self.out.write_char('}')
    }

    fn visit_tuple(&mut self, fields: &[Value]) -> fmt::Result {
        self.sequence('(', ')', fields.iter())
    }

    fn visit_object(&mut self, object: ObjectRef) -> fmt::Result {
        write!(self.out, "object({}:{})", object.service, object.object)
    }

    fn visit_pointer(&mut self, target: Option<&Value>) -> fmt::Result {
        match target {
            Some(v) => {
                self.out.write_char('&')?;
                v.accept(self)
            }
            None => self.out.write_str("null"),
        }
    }

    fn visit_dynamic(&mut self, inner: &Value) -> fmt::Result {
        inner.accept(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut Printer { out: f })
    }
}
