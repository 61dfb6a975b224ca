//! Schema-driven codec for the [protobuf](https://protobuf.dev) wire format.
//!
//! Messages are plain Rust structs that describe their fields with a static
//! [`FieldDescriptor`](codec::FieldDescriptor) table. Encoding is two-pass:
//! the exact size is computed first so the output is written into a single
//! allocation. Decoding operates on one complete in-memory buffer and either
//! returns a fully populated message or a [`DecodeError`](error::DecodeError).
//!
//! ```
//! use protowire::codec::ProtoMessage;
//! use protowire::proxy::{Id, ProxyMessage};
//!
//! let msg = ProxyMessage::new("hi", Some(Id::new(vec![1, 2, 3], "tcp://localhost:3000", vec![9])));
//! let encoded = msg.encode_to_vec();
//! assert_eq!(encoded.len(), msg.encoded_len());
//!
//! let decoded = ProxyMessage::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(clippy::as_conversions)]

extern crate alloc;

pub mod codec;
pub mod config;
pub mod error;
pub mod leb128;
pub mod proxy;
pub mod wire;

mod util;

pub use codec::ProtoMessage;
pub use config::DecodeConfig;
pub use error::{DecodeError, EncodeError};
