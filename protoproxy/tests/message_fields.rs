mod common;

use prost_reflect::{DynamicMessage, MapKey, Value};
use protoproxy::{Error, ErrorKind, HostValue, MessageProxy, Ownership};
use protoproxy_schema::fixtures::{INT_MESSAGE, TEST_ENUM, TEST_MESSAGE};

#[test]
fn end_to_end_fields() {
    let msg = common::new_message(TEST_MESSAGE);
    msg.set_field("string_value", "test").unwrap();
    msg.set_field("int_value", 5).unwrap();
    msg.message("int_message").unwrap().set_field("value", 6).unwrap();

    assert_eq!(msg.get::<String>("string_value").unwrap(), "test");
    assert_eq!(msg.get::<i32>("int_value").unwrap(), 5);
    let sub = msg.message("int_message").unwrap();
    assert_eq!(sub.full_name(), INT_MESSAGE);
    assert_eq!(sub.ownership(), Ownership::Borrowed);
    assert_eq!(sub.get::<i32>("value").unwrap(), 6);

    sub.set_field("value", 7).unwrap();
    assert_eq!(msg.message("int_message").unwrap().get::<i32>("value").unwrap(), 7);
}

#[test]
fn scalar_round_trips() {
    let msg = common::new_message(TEST_MESSAGE);
    let cases: Vec<(&str, HostValue)> = vec![
        ("string_value", "héllo".into()),
        ("int_value", HostValue::Int(-42)),
        ("int64_value", HostValue::Int(i64::MIN)),
        ("uint32_value", HostValue::Int(u32::MAX as i64)),
        ("uint64_value", HostValue::UInt(u64::MAX)),
        ("double_value", HostValue::Float(2.25)),
        ("float_value", HostValue::Float(0.5)),
        ("bool_value", HostValue::Bool(true)),
        ("bytes_value", HostValue::Bytes(vec![0, 1, 0xff])),
    ];
    for (name, value) in cases {
        msg.set_field(name, value.clone()).unwrap();
        assert_eq!(msg.get_field(name).unwrap(), value, "field {name}");
    }
}

#[test]
fn wrong_scalar_kind_leaves_field_unchanged() {
    let msg = common::new_message(TEST_MESSAGE);
    msg.set_field("int_value", 5).unwrap();

    let err = msg.set_field("int_value", "5").unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(msg.get::<i32>("int_value").unwrap(), 5);

    assert!(msg.set_field("int_value", 1i64 << 40).is_err());
    assert!(msg.set_field("string_value", 5).is_err());
    assert!(msg.set_field("bool_value", 1).is_err());
    assert!(msg.set_field("uint32_value", -1).is_err());
    assert_eq!(msg.get::<i32>("int_value").unwrap(), 5);
}

#[test]
fn enum_fields() {
    let bridge = common::bridge();
    let test_enum = bridge.resolve_enum(TEST_ENUM).unwrap();
    let msg = common::new_message(TEST_MESSAGE);

    msg.set_field("enum_value", 2).unwrap();
    assert_eq!(msg.get::<i32>("enum_value").unwrap(), 2);

    let one = test_enum.get_value_by_name("ONE").unwrap();
    msg.set_field("enum_value", one).unwrap();
    assert_eq!(msg.get::<i32>("enum_value").unwrap(), 1);

    let err = msg.set_field("enum_value", 7).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert!(msg.set_field("enum_value", "ONE").is_err());
    assert_eq!(msg.get::<i32>("enum_value").unwrap(), 1);
}

#[test]
fn nonexistent_fields() {
    let msg = common::new_message(TEST_MESSAGE);
    let err = msg.get_field("invalid_field").unwrap_err();
    assert_eq!(
        err,
        Error::FieldNotFound {
            message: TEST_MESSAGE.into(),
            field: "invalid_field".into(),
        }
    );
    assert_eq!(err.kind(), ErrorKind::Attribute);
    assert!(matches!(
        msg.set_field("invalid_field", 5),
        Err(Error::FieldNotFound { .. })
    ));
}

#[test]
fn composite_fields_reject_assignment() {
    let msg = common::new_message(TEST_MESSAGE);
    let int_message = common::new_message(INT_MESSAGE);

    let cases: Vec<(&str, HostValue, &str)> = vec![
        ("int_message", int_message.clone().into(), "message"),
        ("int_message", common::native_int_message(1).into(), "message"),
        ("repeated_int_value", HostValue::List(vec![1.into()]), "repeated"),
        ("repeated_int_message", HostValue::List(vec![]), "repeated"),
        ("string_int_map", HostValue::Dict(vec![]), "map"),
        ("int_message_map", HostValue::None, "map"),
    ];
    for (name, value, category) in cases {
        let err = msg.set_field(name, value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Attribute, "field {name}");
        match err {
            Error::InvalidFieldAssignment { field, category: got, .. } => {
                assert_eq!(field, name);
                assert_eq!(got, category);
            }
            other => panic!("unexpected error for {name}: {other:?}"),
        }
    }
}

#[test]
fn presence_and_clearing() {
    let msg = common::new_message(TEST_MESSAGE);
    assert!(!msg.has_field("int_message").unwrap());
    msg.message("int_message").unwrap();
    assert!(msg.has_field("int_message").unwrap());

    msg.set_field("int_value", 3).unwrap();
    msg.clear_field("int_value").unwrap();
    assert_eq!(msg.get::<i32>("int_value").unwrap(), 0);

    msg.repeated("repeated_int_value").unwrap().append(1).unwrap();
    msg.clear().unwrap();
    assert!(!msg.has_field("int_message").unwrap());
    assert!(msg.repeated("repeated_int_value").unwrap().is_empty().unwrap());
}

#[test]
fn text_rendering_matches_native() {
    let msg = common::new_message(TEST_MESSAGE);
    msg.set_field("string_value", "test").unwrap();
    msg.set_field("int_value", 5).unwrap();
    msg.message("int_message").unwrap().set_field("value", 6).unwrap();
    msg.set_field("enum_value", 2).unwrap();
    msg.repeated("repeated_int_value").unwrap().extend([1, 2]).unwrap();
    msg.map("string_int_map").unwrap().set("k1", 5).unwrap();

    let mut native = DynamicMessage::new(common::descriptor(TEST_MESSAGE));
    native.set_field_by_name("string_value", Value::String("test".into()));
    native.set_field_by_name("int_value", Value::I32(5));
    native.set_field_by_name("int_message", Value::Message(common::native_int_message(6)));
    native.set_field_by_name("enum_value", Value::EnumNumber(2));
    native.set_field_by_name(
        "repeated_int_value",
        Value::List(vec![Value::I32(1), Value::I32(2)]),
    );
    native.set_field_by_name(
        "string_int_map",
        Value::Map([(MapKey::String("k1".into()), Value::I32(5))].into_iter().collect()),
    );

    assert_eq!(msg.to_string(), native.to_string());
    assert_eq!(
        msg.to_string(),
        concat!(
            r#"string_value:"test",int_value:5,int_message{value:6},"#,
            r#"repeated_int_value:[1,2],string_int_map:[{key:"k1",value:5}],"#,
            "enum_value:TWO",
        )
    );
    assert_eq!(HostValue::from(msg), HostValue::from(native));
}

#[test]
fn empty_sub_message_renders_braces() {
    let msg = common::new_message(TEST_MESSAGE);
    msg.message("int_message").unwrap();
    assert_eq!(msg.to_string(), "int_message{}");
}

#[test]
fn cleared_sub_message_view_reads_default() {
    let msg = common::new_message(TEST_MESSAGE);
    let sub = msg.message("int_message").unwrap();
    sub.set_field("value", 4).unwrap();

    msg.clear_field("int_message").unwrap();
    assert!(!msg.has_field("int_message").unwrap());
    assert!(!sub.has_field("value").unwrap());
    assert_eq!(sub.get::<i32>("value").unwrap(), 0);
    assert_eq!(sub.to_string(), "");
    assert_eq!(sub.serialize().unwrap(), Vec::<u8>::new());
    assert!(!msg.has_field("int_message").unwrap());

    // Writing through the view brings the field back.
    sub.set_field("value", 7).unwrap();
    assert!(msg.has_field("int_message").unwrap());
    assert_eq!(msg.to_string(), "int_message{value:7}");
}

#[test]
fn copy_from_and_bytes() {
    let source = common::new_message(TEST_MESSAGE);
    source.set_field("int_value", 9).unwrap();
    source.message("int_message").unwrap().set_field("value", 4).unwrap();

    let target = common::new_message(TEST_MESSAGE);
    target.set_field("string_value", "gone").unwrap();
    target.copy_from(&source.clone().into()).unwrap();
    assert_eq!(target.get::<String>("string_value").unwrap(), "");
    assert_eq!(target.get::<i32>("int_value").unwrap(), 9);

    let bytes = source.serialize().unwrap();
    let parsed = common::new_message(TEST_MESSAGE);
    parsed.parse_from_bytes(&bytes).unwrap();
    assert_eq!(parsed.to_string(), source.to_string());

    let merged = common::new_message(TEST_MESSAGE);
    merged.set_field("string_value", "kept").unwrap();
    merged.merge_from_bytes(&bytes).unwrap();
    assert_eq!(merged.get::<String>("string_value").unwrap(), "kept");
    assert_eq!(merged.get::<i32>("int_value").unwrap(), 9);

    let err = merged.merge_from_bytes(&[0xff, 0xff]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(merged.get::<String>("string_value").unwrap(), "kept");

    let wrong = common::new_message(INT_MESSAGE);
    assert!(matches!(
        target.copy_from(&wrong.into()),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn copy_from_self() {
    let msg = common::new_message(TEST_MESSAGE);
    msg.set_field("int_value", 1).unwrap();
    msg.copy_from(&msg.clone().into()).unwrap();
    assert_eq!(msg.get::<i32>("int_value").unwrap(), 1);
}

#[test]
fn field_names_in_number_order() {
    let msg = common::new_message(INT_MESSAGE);
    assert_eq!(msg.field_names(), vec!["value".to_owned()]);
    let names = common::new_message(TEST_MESSAGE).field_names();
    assert_eq!(names.first().map(String::as_str), Some("string_value"));
    assert_eq!(names.last().map(String::as_str), Some("string_enum_map"));
}

#[test]
fn typed_getters_reject_wrong_kind() {
    let msg = common::new_message(TEST_MESSAGE);
    assert!(matches!(
        msg.get::<String>("int_value"),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        msg.message("repeated_int_value"),
        Err(Error::TypeMismatch { .. })
    ));
    let _: MessageProxy = msg.message("int_message").unwrap();
}
