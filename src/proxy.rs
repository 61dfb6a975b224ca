//! Messages of the `messages` protobuf package used by the proxy example.
//!
//! ```proto
//! message ID {
//!     bytes publicKey = 1;
//!     string address = 2;
//!     bytes id = 3;
//! }
//!
//! message ProxyMessage {
//!     string message = 1;
//!     ID destination = 2;
//! }
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::codec::{
    encode_field, encoded_field_len, fields_are_ascending, FieldDescriptor, FieldMismatch,
    ProtoDecode, ProtoMessage,
};
use crate::config::DecodeContext;
use crate::error::DecodeError;

/// Identity of a peer: its public key, network address and opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Id {
    pub public_key: Vec<u8>,
    pub address: String,
    pub id: Vec<u8>,
}

impl Id {
    pub const PUBLIC_KEY: FieldDescriptor = FieldDescriptor::bytes("publicKey", 1);
    pub const ADDRESS: FieldDescriptor = FieldDescriptor::string("address", 2);
    pub const ID: FieldDescriptor = FieldDescriptor::bytes("id", 3);

    pub fn new(
        public_key: impl Into<Vec<u8>>,
        address: impl Into<String>,
        id: impl Into<Vec<u8>>,
    ) -> Self {
        Id {
            public_key: public_key.into(),
            address: address.into(),
            id: id.into(),
        }
    }

    /// Returns the first field that differs from `other`, if any.
    pub fn verbose_eq(&self, other: &Id) -> Result<(), FieldMismatch> {
        let mismatch = |field: &FieldDescriptor| FieldMismatch {
            message: Self::NAME,
            field: field.name,
        };

        if self.public_key != other.public_key {
            return Err(mismatch(&Self::PUBLIC_KEY));
        }
        if self.address != other.address {
            return Err(mismatch(&Self::ADDRESS));
        }
        if self.id != other.id {
            return Err(mismatch(&Self::ID));
        }
        Ok(())
    }
}

const _: () = assert!(fields_are_ascending(Id::FIELDS));

impl ProtoMessage for Id {
    const NAME: &'static str = "messages.ID";
    const FIELDS: &'static [FieldDescriptor] = &[Self::PUBLIC_KEY, Self::ADDRESS, Self::ID];

    fn merge_field<B: bytes::Buf>(
        &mut self,
        field: &'static FieldDescriptor,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match field.number {
            1 => Vec::<u8>::decode_into(buf, &mut self.public_key, field, ctx),
            2 => String::decode_into(buf, &mut self.address, field, ctx),
            3 => Vec::<u8>::decode_into(buf, &mut self.id, field, ctx),
            _ => unreachable!("unknown fields are skipped"),
        }
    }

    fn encode_raw<B: bytes::BufMut>(&self, buf: &mut B) {
        encode_field(&Self::PUBLIC_KEY, &self.public_key, buf);
        encode_field(&Self::ADDRESS, &self.address, buf);
        encode_field(&Self::ID, &self.id, buf);
    }

    fn encoded_len(&self) -> usize {
        encoded_field_len(&Self::PUBLIC_KEY, &self.public_key)
            + encoded_field_len(&Self::ADDRESS, &self.address)
            + encoded_field_len(&Self::ID, &self.id)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&ID{{PublicKey:{},", DisplayBytes(&self.public_key))?;
        write!(f, "Address:{},", self.address)?;
        write!(f, "Id:{},}}", DisplayBytes(&self.id))
    }
}

/// A text payload routed to an optional destination peer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxyMessage {
    pub message: String,
    pub destination: Option<Id>,
}

impl ProxyMessage {
    pub const MESSAGE: FieldDescriptor = FieldDescriptor::string("message", 1);
    pub const DESTINATION: FieldDescriptor = FieldDescriptor::message("destination", 2);

    pub fn new(message: impl Into<String>, destination: Option<Id>) -> Self {
        ProxyMessage {
            message: message.into(),
            destination,
        }
    }

    pub fn destination(&self) -> Option<&Id> {
        self.destination.as_ref()
    }

    /// Returns the first field that differs from `other`, if any. Differences
    /// inside `destination` are reported against `messages.ID`.
    pub fn verbose_eq(&self, other: &ProxyMessage) -> Result<(), FieldMismatch> {
        if self.message != other.message {
            return Err(FieldMismatch {
                message: Self::NAME,
                field: Self::MESSAGE.name,
            });
        }
        match (&self.destination, &other.destination) {
            (None, None) => Ok(()),
            (Some(ours), Some(theirs)) => ours.verbose_eq(theirs),
            _ => Err(FieldMismatch {
                message: Self::NAME,
                field: Self::DESTINATION.name,
            }),
        }
    }
}

const _: () = assert!(fields_are_ascending(ProxyMessage::FIELDS));
static_assertions::assert_impl_all!(Id: Send, Sync);
static_assertions::assert_impl_all!(ProxyMessage: Send, Sync);

impl ProtoMessage for ProxyMessage {
    const NAME: &'static str = "messages.ProxyMessage";
    const FIELDS: &'static [FieldDescriptor] = &[Self::MESSAGE, Self::DESTINATION];

    fn merge_field<B: bytes::Buf>(
        &mut self,
        field: &'static FieldDescriptor,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match field.number {
            1 => String::decode_into(buf, &mut self.message, field, ctx),
            2 => Option::<Id>::decode_into(buf, &mut self.destination, field, ctx),
            _ => unreachable!("unknown fields are skipped"),
        }
    }

    fn encode_raw<B: bytes::BufMut>(&self, buf: &mut B) {
        encode_field(&Self::MESSAGE, &self.message, buf);
        encode_field(&Self::DESTINATION, &self.destination, buf);
    }

    fn encoded_len(&self) -> usize {
        encoded_field_len(&Self::MESSAGE, &self.message)
            + encoded_field_len(&Self::DESTINATION, &self.destination)
    }
}

impl fmt::Display for ProxyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&ProxyMessage{{Message:{},", self.message)?;
        match &self.destination {
            Some(destination) => write!(f, "Destination:{destination},}}"),
            None => write!(f, "Destination:nil,}}"),
        }
    }
}

/// Formats bytes as a space separated list of decimal values, e.g. `[1 2 3]`.
struct DisplayBytes<'a>(&'a [u8]);

impl fmt::Display for DisplayBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte}")?;
        }
        f.write_str("]")
    }
}
