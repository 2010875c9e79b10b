//! Human-readable rendering of field views.
//!
//! Messages render through the runtime's text format. Field views render
//! like host collections: `[a, b]` for repeated fields and `{k: v}` for
//! maps, with map entries in key order.

use std::fmt::Write;

use prost_reflect::{MapKey, Value};
use protoproxy_schema::ElementType;

/// Host-style rendering of one stored element.
pub(crate) fn element_repr(value: &Value, element: &ElementType) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::I32(i) => i.to_string(),
        Value::I64(i) => i.to_string(),
        Value::U32(u) => u.to_string(),
        Value::U64(u) => u.to_string(),
        Value::F32(f) => f.to_string(),
        Value::F64(f) => f.to_string(),
        Value::String(s) => quote_str(s),
        Value::Bytes(b) => quote_bytes(b),
        Value::EnumNumber(n) => match element {
            ElementType::Enum(desc) => match desc.get_value(*n) {
                Some(symbol) => symbol.name().to_owned(),
                None => n.to_string(),
            },
            _ => n.to_string(),
        },
        Value::Message(m) => m.to_text_format(),
        Value::List(items) => list_repr(items, element),
        Value::Map(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            map_repr(entries, element)
        }
    }
}

pub(crate) fn list_repr(items: &[Value], element: &ElementType) -> String {
    let parts: Vec<String> = items.iter().map(|v| element_repr(v, element)).collect();
    format!("[{}]", parts.join(", "))
}

/// `entries` must already be in key order.
pub(crate) fn map_repr<'a>(
    entries: impl IntoIterator<Item = (&'a MapKey, &'a Value)>,
    element: &ElementType,
) -> String {
    let parts: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}: {}", key_repr(k), element_repr(v, element)))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

fn key_repr(key: &MapKey) -> String {
    match key {
        MapKey::Bool(b) => b.to_string(),
        MapKey::I32(i) => i.to_string(),
        MapKey::I64(i) => i.to_string(),
        MapKey::U32(u) => u.to_string(),
        MapKey::U64(u) => u.to_string(),
        MapKey::String(s) => quote_str(s),
    }
}

/// Single-quoted string literal.
pub(crate) fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// `b'...'` byte literal.
pub(crate) fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literals() {
        assert_eq!(quote_str("k1"), "'k1'");
        assert_eq!(quote_str("it's"), "'it\\'s'");
        assert_eq!(quote_bytes(b"\x10\x05a"), "b'\\x10\\x05a'");
    }
}
