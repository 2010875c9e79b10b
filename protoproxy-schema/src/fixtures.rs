//! Built-in demonstration schema.
//!
//! Equivalent to compiling:
//!
//! ```proto
//! syntax = "proto3";
//! package protoproxy.test;
//!
//! message IntMessage { int32 value = 1; }
//!
//! message TestMessage {
//!   enum TestEnum { ZERO = 0; ONE = 1; TWO = 2; }
//!   string string_value = 1;
//!   int32 int_value = 2;
//!   IntMessage int_message = 3;
//!   repeated int32 repeated_int_value = 4;
//!   repeated IntMessage repeated_int_message = 5;
//!   map<string, int32> string_int_map = 6;
//!   map<int32, IntMessage> int_message_map = 7;
//!   TestEnum enum_value = 8;
//!   repeated TestEnum repeated_enum_value = 9;
//!   double double_value = 10;
//!   float float_value = 11;
//!   bool bool_value = 12;
//!   bytes bytes_value = 13;
//!   int64 int64_value = 14;
//!   uint32 uint32_value = 15;
//!   uint64 uint64_value = 16;
//!   repeated string repeated_string_value = 17;
//!   map<string, TestEnum> string_enum_map = 18;
//! }
//! ```

use std::sync::OnceLock;

use prost_reflect::DescriptorPool;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions,
};

use crate::bridge::DescriptorBridge;
use crate::error::SchemaError;

pub const PACKAGE: &str = "protoproxy.test";
pub const INT_MESSAGE: &str = "protoproxy.test.IntMessage";
pub const TEST_MESSAGE: &str = "protoproxy.test.TestMessage";
pub const TEST_ENUM: &str = "protoproxy.test.TestMessage.TestEnum";

static POOL: OnceLock<DescriptorPool> = OnceLock::new();

/// The demonstration pool. Built once per process.
pub fn pool() -> Result<DescriptorPool, SchemaError> {
    if let Some(pool) = POOL.get() {
        return Ok(pool.clone());
    }
    let pool = DescriptorPool::from_file_descriptor_set(file_descriptor_set())?;
    Ok(POOL.get_or_init(|| pool).clone())
}

pub fn bridge() -> Result<DescriptorBridge, SchemaError> {
    Ok(DescriptorBridge::new(pool()?))
}

/// The raw descriptor set, e.g. for writing to disk.
pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![test_file()],
    }
}

fn test_file() -> FileDescriptorProto {
    let int_message = DescriptorProto {
        name: Some("IntMessage".into()),
        field: vec![scalar("value", 1, Type::Int32)],
        ..Default::default()
    };

    let test_enum = EnumDescriptorProto {
        name: Some("TestEnum".into()),
        value: ["ZERO", "ONE", "TWO"]
            .iter()
            .zip(0..)
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).into()),
                number: Some(number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let int_message_ty = ".protoproxy.test.IntMessage";
    let enum_ty = ".protoproxy.test.TestMessage.TestEnum";
    let test_message = DescriptorProto {
        name: Some("TestMessage".into()),
        field: vec![
            scalar("string_value", 1, Type::String),
            scalar("int_value", 2, Type::Int32),
            typed("int_message", 3, Type::Message, Label::Optional, int_message_ty),
            repeated("repeated_int_value", 4, Type::Int32),
            typed("repeated_int_message", 5, Type::Message, Label::Repeated, int_message_ty),
            typed(
                "string_int_map",
                6,
                Type::Message,
                Label::Repeated,
                ".protoproxy.test.TestMessage.StringIntMapEntry",
            ),
            typed(
                "int_message_map",
                7,
                Type::Message,
                Label::Repeated,
                ".protoproxy.test.TestMessage.IntMessageMapEntry",
            ),
            typed("enum_value", 8, Type::Enum, Label::Optional, enum_ty),
            typed("repeated_enum_value", 9, Type::Enum, Label::Repeated, enum_ty),
            scalar("double_value", 10, Type::Double),
            scalar("float_value", 11, Type::Float),
            scalar("bool_value", 12, Type::Bool),
            scalar("bytes_value", 13, Type::Bytes),
            scalar("int64_value", 14, Type::Int64),
            scalar("uint32_value", 15, Type::Uint32),
            scalar("uint64_value", 16, Type::Uint64),
            repeated("repeated_string_value", 17, Type::String),
            typed(
                "string_enum_map",
                18,
                Type::Message,
                Label::Repeated,
                ".protoproxy.test.TestMessage.StringEnumMapEntry",
            ),
        ],
        nested_type: vec![
            map_entry(
                "StringIntMapEntry",
                scalar("key", 1, Type::String),
                scalar("value", 2, Type::Int32),
            ),
            map_entry(
                "IntMessageMapEntry",
                scalar("key", 1, Type::Int32),
                typed("value", 2, Type::Message, Label::Optional, int_message_ty),
            ),
            map_entry(
                "StringEnumMapEntry",
                scalar("key", 1, Type::String),
                typed("value", 2, Type::Enum, Label::Optional, enum_ty),
            ),
        ],
        enum_type: vec![test_enum],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("protoproxy/test.proto".into()),
        package: Some(PACKAGE.into()),
        message_type: vec![int_message, test_message],
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

fn field(name: &str, number: i32, ty: Type, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    field(name, number, ty, Label::Optional)
}

fn repeated(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    field(name, number, ty, Label::Repeated)
}

fn typed(name: &str, number: i32, ty: Type, label: Label, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.into()),
        ..field(name, number, ty, label)
    }
}

fn map_entry(
    name: &str,
    key: FieldDescriptorProto,
    value: FieldDescriptorProto,
) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field: vec![key, value],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// lowerCamelCase, as protoc derives it.
fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::json_name;

    #[test]
    fn json_names() {
        assert_eq!(json_name("value"), "value");
        assert_eq!(json_name("string_int_map"), "stringIntMap");
    }
}
