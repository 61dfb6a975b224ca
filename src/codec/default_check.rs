//! Default value checking for protobuf types.
//!
//! In proto3, fields with default values are not encoded.

use alloc::string::String;
use alloc::vec::Vec;

use super::ProtoMessage;

/// Trait for efficiently checking if a value is the protobuf default.
///
/// This is more efficient than `self == Default::default()` because it avoids
/// creating a temporary default value for comparison.
pub trait IsProtoDefault {
    /// Returns true if this value is the protobuf default value.
    fn is_proto_default(&self) -> bool;
}

impl IsProtoDefault for String {
    #[inline(always)]
    fn is_proto_default(&self) -> bool {
        self.is_empty()
    }
}

impl IsProtoDefault for Vec<u8> {
    #[inline(always)]
    fn is_proto_default(&self) -> bool {
        self.is_empty()
    }
}

// An absent embedded message is the default, a present but empty one is not.
impl<M: ProtoMessage> IsProtoDefault for Option<M> {
    #[inline(always)]
    fn is_proto_default(&self) -> bool {
        self.is_none()
    }
}
