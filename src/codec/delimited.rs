//! Length-delimited protobuf types (bytes, string).
//!
//! Decoded values always own a fresh copy of their payload, nothing borrows
//! from the input buffer once decoding returns.

use alloc::string::String;
use alloc::vec::Vec;

use super::{FieldDescriptor, ProtoDecode, ProtoEncode, ProtoType};
use crate::config::DecodeContext;
use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::util::{unlikely, CastFrom};
use crate::wire::WireType;

/// Reads a length prefix followed by that many bytes into `dst`, replacing
/// its previous contents.
#[inline]
fn read_len_prefixed<B: bytes::Buf>(buf: &mut B, dst: &mut Vec<u8>) -> Result<(), DecodeError> {
    let len = crate::wire::decode_len(buf)?;
    if unlikely(buf.remaining() < len) {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }

    // It's possible for a field to show up multiple times in an encoded
    // payload, the last one wins.
    dst.clear();
    dst.resize(len, 0);
    buf.copy_to_slice(&mut dst[..]);
    Ok(())
}

#[inline]
fn encode_len_prefixed<B: bytes::BufMut>(data: &[u8], buf: &mut B) {
    u64::cast_from(data.len()).encode_leb128(buf);
    buf.put_slice(data);
}

#[inline]
fn encoded_len_prefixed_len(len: usize) -> usize {
    u64::cast_from(len).encoded_leb128_len() + len
}

impl ProtoType for Vec<u8> {
    const WIRE_TYPE: WireType = WireType::Len;
}

impl ProtoDecode for Vec<u8> {
    #[inline]
    fn decode_into<B: bytes::Buf>(
        buf: &mut B,
        dst: &mut Self,
        _field: &'static FieldDescriptor,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        read_len_prefixed(buf, dst)
    }
}

impl ProtoEncode for Vec<u8> {
    #[inline]
    fn encode<B: bytes::BufMut>(&self, buf: &mut B) {
        encode_len_prefixed(self, buf);
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        encoded_len_prefixed_len(self.len())
    }
}

impl ProtoType for String {
    const WIRE_TYPE: WireType = WireType::Len;
}

impl ProtoDecode for String {
    #[inline]
    fn decode_into<B: bytes::Buf>(
        buf: &mut B,
        dst: &mut Self,
        field: &'static FieldDescriptor,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let mut data = Vec::new();
        read_len_prefixed(buf, &mut data)?;
        *dst = String::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8 { field: field.name })?;
        Ok(())
    }
}

impl ProtoEncode for String {
    #[inline]
    fn encode<B: bytes::BufMut>(&self, buf: &mut B) {
        encode_len_prefixed(self.as_bytes(), buf);
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        encoded_len_prefixed_len(self.len())
    }
}
