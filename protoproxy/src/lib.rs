//! Proxy views over reflective protobuf messages.
//!
//! A [`MessageProxy`] forwards field reads and writes to a
//! [`prost_reflect::DynamicMessage`] without copying it into host values.
//! Repeated and map fields are exposed as [`RepeatedFieldProxy`] and
//! [`MapFieldProxy`] views. Every view keeps the proxy it came from alive, so
//! a child view stays usable after the caller drops the parent.
//!
//! Host values ([`HostValue`]) cross into typed field storage through the
//! [`convert`] rules, and the [`cast`] and [`boundary`] modules handle moving
//! messages between wrapped and native form.
//!
//! ```no_run
//! use protoproxy::cast;
//! use protoproxy_schema::fixtures;
//!
//! let bridge = fixtures::bridge()?;
//! let msg = cast::make_wrapped(&bridge, fixtures::TEST_MESSAGE.into())?;
//! msg.set_field("int_value", 5)?;
//! msg.message("int_message")?.set_field("value", 6)?;
//! msg.map("string_int_map")?.set("k1", 5)?;
//! println!("{msg}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod boundary;
pub mod cast;
pub mod convert;
mod error;
mod handle;
mod map;
mod message;
mod repeated;
mod text;
mod value;

pub use boundary::{Conversion, Expected, MessageArg, NativeReturn, bind_message};
pub use cast::Classification;
pub use error::{Error, ErrorKind, Result};
pub use handle::{Ownership, SharedMessage};
pub use map::MapFieldProxy;
pub use message::MessageProxy;
pub use repeated::{Iter, RepeatedFieldProxy};
pub use value::{FromHost, HostValue};
