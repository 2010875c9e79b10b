#![allow(dead_code)]

use prost_reflect::{DynamicMessage, MessageDescriptor, Value};
use protoproxy::{HostValue, MessageArg, MessageProxy, NativeReturn, SharedMessage};
use protoproxy_schema::DescriptorBridge;
use protoproxy_schema::fixtures::{self, INT_MESSAGE, TEST_MESSAGE};

pub fn bridge() -> DescriptorBridge {
    fixtures::bridge().unwrap()
}

pub fn descriptor(name: &str) -> MessageDescriptor {
    bridge().resolve_message(name).unwrap()
}

pub fn new_message(name: &str) -> MessageProxy {
    MessageProxy::new(descriptor(name))
}

/// A native IntMessage holding `value`.
pub fn native_int_message(value: i32) -> DynamicMessage {
    let desc = descriptor(INT_MESSAGE);
    let mut msg = DynamicMessage::new(desc.clone());
    msg.set_field_by_name("value", Value::I32(value));
    msg
}

// Native functions as a binding layer would expose them.

pub fn make_int_message(value: i32) -> NativeReturn {
    NativeReturn::Value(native_int_message(value))
}

pub fn make_test_message() -> NativeReturn {
    NativeReturn::Value(DynamicMessage::new(descriptor(TEST_MESSAGE)))
}

pub fn make_unique_int_message(value: i32) -> NativeReturn {
    NativeReturn::Unique(Box::new(native_int_message(value)))
}

/// Reads the `value` field of an IntMessage argument.
pub fn check_int_message(arg: MessageArg, expected: i32) -> bool {
    arg.into_proxy().get::<i32>("value").unwrap() == expected
}

/// Sets the `value` field of an IntMessage argument.
pub fn mutate_int_message(arg: MessageArg, value: i32) {
    arg.into_proxy().set_field("value", value).unwrap();
}

/// Type name of any message argument.
pub fn check_abstract_message(arg: MessageArg) -> String {
    arg.into_proxy().full_name().to_owned()
}

thread_local! {
    static INT_MESSAGE_SINGLETON: SharedMessage = SharedMessage::new(native_int_message(0));
}

pub fn int_message_singleton() -> SharedMessage {
    INT_MESSAGE_SINGLETON.with(SharedMessage::clone)
}

pub fn get_int_message_ref() -> NativeReturn {
    NativeReturn::Reference(int_message_singleton())
}

pub fn get_int_message_raw_ptr() -> NativeReturn {
    NativeReturn::Pointer(int_message_singleton())
}

pub fn singleton_value() -> i32 {
    int_message_singleton()
        .borrow()
        .get_field_by_name("value")
        .and_then(|v| v.as_i32())
        .unwrap()
}

pub fn int(i: i64) -> HostValue {
    HostValue::Int(i)
}
