mod common;

use prost_reflect::{DynamicMessage, MapKey, Value};
use protoproxy::{Error, ErrorKind, HostValue};
use protoproxy_schema::fixtures::{TEST_ENUM, TEST_MESSAGE};

#[test]
fn string_int_map_rendering() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("string_int_map").unwrap();
    map.set("k2", 6).unwrap();
    map.set("k1", 5).unwrap();
    assert_eq!(map.to_string(), "{'k1': 5, 'k2': 6}");

    let mut native = DynamicMessage::new(common::descriptor(TEST_MESSAGE));
    native.set_field_by_name(
        "string_int_map",
        Value::Map(
            [
                (MapKey::String("k2".into()), Value::I32(6)),
                (MapKey::String("k1".into()), Value::I32(5)),
            ]
            .into_iter()
            .collect(),
        ),
    );
    assert_eq!(HostValue::from(msg.clone()), HostValue::from(native));

    // Entry order inside message text follows the runtime's map.
    let rendered = msg.to_string();
    assert_eq!(rendered, msg.snapshot().unwrap().to_string());
    assert!(
        rendered == r#"string_int_map:[{key:"k1",value:5},{key:"k2",value:6}]"#
            || rendered == r#"string_int_map:[{key:"k2",value:6},{key:"k1",value:5}]"#,
        "{rendered}"
    );
}

#[test]
fn map_views_compare_by_content() {
    let a = common::new_message(TEST_MESSAGE);
    let b = common::new_message(TEST_MESSAGE);
    let map_a: HostValue = a.map("string_int_map").unwrap().into();
    let map_b: HostValue = b.map("string_int_map").unwrap().into();
    assert_eq!(map_a, map_a);
    assert_eq!(map_a, map_b);

    a.map("string_int_map").unwrap().set("k", 1).unwrap();
    assert_ne!(map_a, map_b);
    b.map("string_int_map").unwrap().set("k", 1).unwrap();
    assert_eq!(map_a, map_b);
}

#[test]
fn scalar_map_operations() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("string_int_map").unwrap();
    assert_eq!(map.len().unwrap(), 0);
    assert_eq!(map.to_string(), "{}");

    map.set("a", 1).unwrap();
    assert!(map.contains("a").unwrap());
    assert_eq!(map.get_or_create("a").unwrap(), common::int(1));
    assert_eq!(map.get("missing").unwrap(), None);
    assert!(!map.contains("missing").unwrap());

    map.set("a", 2).unwrap();
    assert_eq!(map.get("a").unwrap(), Some(common::int(2)));
    assert_eq!(map.len().unwrap(), 1);

    map.delete("a").unwrap();
    assert!(!map.contains("a").unwrap());

    let err = map.delete("a").unwrap_err();
    assert!(matches!(err, Error::KeyNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Key);
}

#[test]
fn scalar_get_or_create_inserts_default() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("string_int_map").unwrap();
    assert_eq!(map.get_or_create("z").unwrap(), common::int(0));
    assert!(map.contains("z").unwrap());
}

#[test]
fn keys_and_items_in_key_order() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("string_int_map").unwrap();
    for (k, v) in [("c", 3), ("a", 1), ("b", 2)] {
        map.set(k, v).unwrap();
    }
    assert_eq!(
        map.keys().unwrap(),
        vec![HostValue::from("a"), "b".into(), "c".into()]
    );
    assert_eq!(
        map.items().unwrap(),
        vec![
            (HostValue::from("a"), common::int(1)),
            ("b".into(), common::int(2)),
            ("c".into(), common::int(3)),
        ]
    );
    map.clear().unwrap();
    assert!(map.is_empty().unwrap());
}

#[test]
fn wrong_key_kind() {
    let msg = common::new_message(TEST_MESSAGE);
    let strings = msg.map("string_int_map").unwrap();
    assert!(matches!(strings.set(1, 1), Err(Error::TypeMismatch { .. })));
    assert!(matches!(strings.set("k", "v"), Err(Error::TypeMismatch { .. })));

    let ints = msg.map("int_message_map").unwrap();
    assert!(matches!(ints.get_or_create(1.5), Err(Error::TypeMismatch { .. })));
    assert!(matches!(ints.get_or_create("1"), Err(Error::TypeMismatch { .. })));
    assert!(matches!(ints.contains("1"), Err(Error::TypeMismatch { .. })));
    assert_eq!(ints.len().unwrap(), 0);
}

#[test]
fn message_map_auto_vivifies() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("int_message_map").unwrap();
    assert!(!map.contains(3).unwrap());

    let entry = map.get_or_create(3).unwrap();
    assert!(map.contains(3).unwrap());
    assert_eq!(map.len().unwrap(), 1);

    let entry = entry.as_message().unwrap();
    entry.set_field("value", 9).unwrap();
    assert_eq!(
        map.get(3).unwrap().unwrap().as_message().unwrap().get::<i32>("value").unwrap(),
        9
    );
    assert_eq!(map.to_string(), "{3: value:9}");
    assert_eq!(msg.to_string(), "int_message_map:[{key:3,value{value:9}}]");
}

#[test]
fn message_map_rejects_assignment() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("int_message_map").unwrap();
    let err = map.set(1, common::native_int_message(1)).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidFieldAssignment {
            category: "message-valued map",
            ..
        }
    ));
    assert_eq!(map.len().unwrap(), 0);
}

#[test]
fn enum_valued_map() {
    let bridge = common::bridge();
    let test_enum = bridge.resolve_enum(TEST_ENUM).unwrap();
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("string_enum_map").unwrap();

    map.set("x", test_enum.get_value_by_name("ONE").unwrap()).unwrap();
    map.set("y", 2).unwrap();
    assert!(map.set("z", 9).is_err());
    assert_eq!(map.to_string(), "{'x': ONE, 'y': TWO}");
    assert_eq!(map.get("x").unwrap(), Some(common::int(1)));
}

#[test]
fn deleted_entry_view_does_not_recreate_on_read() {
    let msg = common::new_message(TEST_MESSAGE);
    let map = msg.map("int_message_map").unwrap();
    let entry = map.get_or_create(1).unwrap();
    let entry = entry.as_message().unwrap();
    entry.set_field("value", 4).unwrap();

    map.delete(1).unwrap();
    assert!(!map.contains(1).unwrap());
    let err = entry.get_field("value").unwrap_err();
    assert_eq!(err, Error::KeyNotFound("1".into()));
    assert_eq!(err.kind(), ErrorKind::Key);
    assert!(entry.has_field("value").is_err());
    let _ = entry.to_string();
    assert!(!map.contains(1).unwrap());
    assert_eq!(map.len().unwrap(), 0);

    // Writing through the view creates the entry again.
    entry.set_field("value", 2).unwrap();
    assert!(map.contains(1).unwrap());
    assert_eq!(msg.to_string(), "int_message_map:[{key:1,value{value:2}}]");
}
