//! YAML edit scripts.
//!
//! A script is a list of operations applied in order:
//!
//! ```yaml
//! - { op: set, path: int_message.value, value: 6 }
//! - { op: append, path: repeated_int_value, value: 3 }
//! - { op: insert, path: repeated_int_value, index: 0, value: 1 }
//! - { op: delete, path: repeated_int_value, index: 1 }
//! - { op: put, path: string_int_map, key: k1, value: 5 }
//! - { op: remove, path: string_int_map, key: k1 }
//! - { op: clear, path: repeated_int_message }
//! ```
//!
//! Paths are dotted field names. An intermediate segment may select a
//! repeated message element (`repeated_int_message[0]`) or a map message
//! value (`int_message_map[3]`). Message values are written as YAML
//! mappings of their fields.

use protoproxy::{FromHost, HostValue, MessageProxy};
use protoproxy_schema::{ElementType, FieldKind, ScalarType};
use serde::Deserialize;
use serde_yaml::Value as Yaml;

use crate::CliError;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Op {
    Set { path: String, value: Yaml },
    Append { path: String, value: Yaml },
    Insert { path: String, index: usize, value: Yaml },
    Delete { path: String, index: usize },
    Put { path: String, key: Yaml, value: Yaml },
    Remove { path: String, key: Yaml },
    Clear { path: String },
}

pub fn parse(source: &[u8]) -> Result<Vec<Op>, CliError> {
    Ok(serde_yaml::from_slice(source)?)
}

pub fn apply(root: &MessageProxy, ops: &[Op]) -> Result<(), CliError> {
    for op in ops {
        log::debug!("applying {op:?}");
        match op {
            Op::Set { path, value } => {
                let (msg, field) = walk(root, path)?;
                set(&msg, field, value)?;
            }
            Op::Append { path, value } => {
                let (msg, field) = walk(root, path)?;
                let list = msg.repeated(field)?;
                if let ElementType::Message(_) = list.element_type() {
                    fill(&list.add_default()?, value)?;
                } else {
                    list.append(host(list.element_type(), value)?)?;
                }
            }
            Op::Insert { path, index, value } => {
                let (msg, field) = walk(root, path)?;
                let list = msg.repeated(field)?;
                let value = match list.element_type() {
                    ElementType::Message(desc) => {
                        let element = MessageProxy::new(desc.clone());
                        fill(&element, value)?;
                        HostValue::Message(element)
                    }
                    element => host(element, value)?,
                };
                list.insert(*index, value)?;
            }
            Op::Delete { path, index } => {
                let (msg, field) = walk(root, path)?;
                msg.repeated(field)?.delete(*index)?;
            }
            Op::Put { path, key, value } => {
                let (msg, field) = walk(root, path)?;
                let map = msg.map(field)?;
                let key = map_key(map.key_type(), key)?;
                if let ElementType::Message(_) = map.value_type() {
                    let entry = MessageProxy::from_host(map.get_or_create(key)?)?;
                    fill(&entry, value)?;
                } else {
                    map.set(key, host(map.value_type(), value)?)?;
                }
            }
            Op::Remove { path, key } => {
                let (msg, field) = walk(root, path)?;
                let map = msg.map(field)?;
                map.delete(map_key(map.key_type(), key)?)?;
            }
            Op::Clear { path } => {
                let (msg, field) = walk(root, path)?;
                msg.clear_field(field)?;
            }
        }
    }
    Ok(())
}

/// Resolve every segment but the last to a message; return it with the
/// last segment.
fn walk<'p>(root: &MessageProxy, path: &'p str) -> Result<(MessageProxy, &'p str), CliError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = match segments.pop() {
        Some(last) if !last.is_empty() => last,
        _ => return Err(CliError::Path(path.to_owned())),
    };
    let mut msg = root.clone();
    for segment in segments {
        msg = step(&msg, segment).ok_or_else(|| CliError::Path(path.to_owned()))??;
    }
    Ok((msg, last))
}

// `None` when the segment is malformed.
fn step(msg: &MessageProxy, segment: &str) -> Option<Result<MessageProxy, CliError>> {
    let Some((name, rest)) = segment.split_once('[') else {
        return Some(msg.message(segment).map_err(CliError::from));
    };
    let selector = rest.strip_suffix(']')?;
    let result = match msg.get_field(name) {
        Ok(HostValue::Repeated(list)) => {
            let index: usize = selector.parse().ok()?;
            list.get(index).and_then(MessageProxy::from_host)
        }
        Ok(HostValue::Map(map)) => {
            let key = map_key(map.key_type(), &Yaml::String(selector.to_owned())).ok()?;
            map.get_or_create(key).and_then(MessageProxy::from_host)
        }
        Ok(_) => return None,
        Err(e) => Err(e),
    };
    Some(result.map_err(CliError::from))
}

fn set(msg: &MessageProxy, field: &str, value: &Yaml) -> Result<(), CliError> {
    match msg.get_field(field)? {
        HostValue::Message(sub) => fill(&sub, value),
        HostValue::Repeated(list) => {
            let Yaml::Sequence(items) = value else {
                return Err(CliError::Value(format!("{field} expects a sequence")));
            };
            list.clear()?;
            for item in items {
                match list.element_type() {
                    ElementType::Message(_) => fill(&list.add_default()?, item)?,
                    element => list.append(host(element, item)?)?,
                }
            }
            Ok(())
        }
        HostValue::Map(_) => Err(CliError::Value(format!("use put to fill map {field}"))),
        _ => {
            let desc = msg
                .descriptor()
                .get_field_by_name(field)
                .ok_or_else(|| CliError::Path(field.to_owned()))?;
            let kind = FieldKind::of(&desc);
            msg.set_field(field, host(kind.element(), value)?)?;
            Ok(())
        }
    }
}

/// Set the fields of `msg` from a YAML mapping.
fn fill(msg: &MessageProxy, value: &Yaml) -> Result<(), CliError> {
    let Yaml::Mapping(fields) = value else {
        return Err(CliError::Value(format!(
            "{} expects a mapping of fields",
            msg.full_name()
        )));
    };
    for (name, value) in fields {
        let Yaml::String(name) = name else {
            return Err(CliError::Value(format!("field name {name:?} is not a string")));
        };
        set(msg, name, value)?;
    }
    Ok(())
}

/// Host value for a slot of type `element`. Strings name enum symbols for
/// enum slots and carry raw bytes for bytes slots.
fn host(element: &ElementType, value: &Yaml) -> Result<HostValue, CliError> {
    Ok(match value {
        Yaml::Null => HostValue::None,
        Yaml::Bool(b) => HostValue::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                HostValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                HostValue::UInt(u)
            } else {
                HostValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Yaml::String(s) => match element {
            ElementType::Enum(desc) => match desc.get_value_by_name(s) {
                Some(symbol) => HostValue::Enum(symbol),
                None => {
                    return Err(CliError::Value(format!(
                        "{} has no value named {s:?}",
                        desc.full_name()
                    )));
                }
            },
            ElementType::Scalar(ScalarType::Bytes) => HostValue::Bytes(s.clone().into_bytes()),
            _ => HostValue::Str(s.clone()),
        },
        Yaml::Sequence(items) => HostValue::List(
            items
                .iter()
                .map(|item| host(element, item))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(_) | Yaml::Tagged(_) => {
            return Err(CliError::Value(format!("cannot use {value:?} as {element}")));
        }
    })
}

fn map_key(key_type: ScalarType, value: &Yaml) -> Result<HostValue, CliError> {
    let element = ElementType::Scalar(key_type);
    match (key_type, value) {
        (ScalarType::String, Yaml::String(_)) | (_, Yaml::Number(_) | Yaml::Bool(_)) => {
            host(&element, value)
        }
        (ScalarType::Bool, Yaml::String(s)) => match s.as_str() {
            "true" => Ok(HostValue::Bool(true)),
            "false" => Ok(HostValue::Bool(false)),
            _ => Err(CliError::Value(format!("{s:?} is not a bool key"))),
        },
        (_, Yaml::String(s)) => {
            if let Ok(i) = s.parse::<i64>() {
                Ok(HostValue::Int(i))
            } else if let Ok(u) = s.parse::<u64>() {
                Ok(HostValue::UInt(u))
            } else {
                Err(CliError::Value(format!("{s:?} is not a {key_type} key")))
            }
        }
        _ => Err(CliError::Value(format!("{value:?} is not a {key_type} key"))),
    }
}
