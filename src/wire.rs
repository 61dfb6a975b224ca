//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).
//!
//! Field keys, length prefixes, and skipping over fields we don't know about.

use core::num::NonZeroU32;

use crate::config::DecodeContext;
use crate::error::{DecodeError, IllegalTagReason};
use crate::leb128::LebCodec;
use crate::util::{likely, unlikely, CastFrom};

/// Minimum value of a protobuf field number.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;
/// Maximum value of a protobuf field number.
pub const MAXIMUM_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// A decoded protobuf field key containing a wire type and field number.
///
/// The layout mirrors the protobuf wire format:
/// * Bits 0-2: wire type (0-5)
/// * Bits 3-31: field number (1 to 2^29-1)
///
/// Since field numbers start at 1, the minimum raw value is 8 (`1 << 3`),
/// guaranteeing the value is always non-zero.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ProtoKey(NonZeroU32);

static_assertions::assert_eq_size!(ProtoKey, Option<ProtoKey>);

#[allow(clippy::as_conversions)]
impl ProtoKey {
    /// Creates a new [`ProtoKey`] from a raw key value, validating the wire
    /// type and field number.
    #[inline(always)]
    fn try_from_raw(raw_key: u64) -> Result<Self, DecodeError> {
        let wire_type = WireType::try_from_val((raw_key & 0b111) as u8)?;

        let field_number = raw_key >> 3;
        if unlikely(field_number == 0) {
            return Err(DecodeError::illegal_tag(IllegalTagReason::ZeroFieldNumber));
        }
        if unlikely(field_number > u64::from(MAXIMUM_FIELD_NUMBER)) {
            return Err(DecodeError::illegal_tag(
                IllegalTagReason::FieldNumberOutOfRange,
            ));
        }

        Ok(Self::new(wire_type, field_number as u32))
    }

    /// Creates a key from its parts.
    ///
    /// # Panics
    ///
    /// If `field_number` is outside `1..=2^29-1`.
    pub fn new(wire_type: WireType, field_number: u32) -> Self {
        assert!(
            (MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER).contains(&field_number),
            "field number {field_number} out of range"
        );
        let raw = (field_number << 3) | u32::from(wire_type.into_val());
        match NonZeroU32::new(raw) {
            Some(raw) => Self(raw),
            None => unreachable!("field number is at least 1"),
        }
    }

    /// Returns the [`WireType`] component of this key.
    #[inline(always)]
    pub fn wire_type(self) -> WireType {
        match WireType::try_from_val((self.0.get() & 0b111) as u8) {
            Ok(wire_type) => wire_type,
            Err(_) => unreachable!("wire type validated during construction"),
        }
    }

    /// Returns the field number component of this key.
    #[inline(always)]
    pub const fn field_number(self) -> u32 {
        self.0.get() >> 3
    }

    /// Decomposes this key into its [`WireType`] and field number components.
    #[inline(always)]
    pub fn into_parts(self) -> (WireType, u32) {
        (self.wire_type(), self.field_number())
    }

    /// The raw varint value of this key.
    #[inline(always)]
    pub const fn into_raw(self) -> u32 {
        self.0.get()
    }
}

impl core::fmt::Debug for ProtoKey {
    #[cold]
    #[inline(never)]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProtoKey")
            .field("wire_type", &self.wire_type())
            .field("field_number", &self.field_number())
            .finish()
    }
}

/// Encodes the provided field number and wire type as a protobuf field key.
///
/// See <https://protobuf.dev/programming-guides/encoding>
/// under the "Message Structure" section.
#[inline(always)]
pub fn encode_key<B: bytes::BufMut>(wire_type: WireType, field_number: u32, buf: &mut B) {
    debug_assert!((MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER).contains(&field_number));
    let key = (field_number << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// Returns the encoded length of a field key (field number + wire type).
#[inline(always)]
pub fn encoded_key_len(field_number: u32) -> usize {
    // The wire type only occupies the low 3 bits, so it never changes the length.
    (field_number << 3).encoded_leb128_len()
}

/// Decodes the key from a protobuf encoded message.
///
/// Rejects wire types 6 and 7 and field numbers outside `1..=2^29-1`. An
/// [`WireType::EGroup`] key is returned as-is, it's up to the caller to decide
/// whether a group can be closed at this point.
#[inline]
pub fn decode_key<B: bytes::Buf>(buf: &mut B) -> Result<ProtoKey, DecodeError> {
    let chunk = buf.chunk();

    // Single byte keys cover field numbers 1 through 15, the common case.
    let raw = if likely(!chunk.is_empty() && chunk[0] < 0x80) {
        let raw = u64::from(chunk[0]);
        buf.advance(1);
        raw
    } else {
        u64::decode_leb128_buf(buf)?.0
    };

    ProtoKey::try_from_raw(raw)
}

/// Decodes the length prefix for a length-delimited field.
///
/// Fails with [`DecodeError::InvalidLength`] if the prefix is negative when
/// viewed as a signed 64-bit length, or doesn't fit in a `usize`. Checking the
/// length against the remaining bytes is left to the caller.
#[inline(always)]
pub fn decode_len<B: bytes::Buf>(buf: &mut B) -> Result<usize, DecodeError> {
    let chunk = buf.chunk();
    // Fast path, most lengths fit in one byte (< 128).
    if likely(!chunk.is_empty() && chunk[0] < 0x80) {
        let len = usize::cast_from(chunk[0]);
        buf.advance(1);
        return Ok(len);
    }

    let (len, _) = u64::decode_leb128_buf(buf)?;
    if unlikely(i64::try_from(len).is_err()) {
        return Err(DecodeError::InvalidLength { value: len });
    }
    usize::try_from(len).map_err(|_| DecodeError::InvalidLength { value: len })
}

/// Skips over a field value based on its wire type.
///
/// Protobuf supports backwards and forwards compatibility by skipping fields
/// we don't know about. We "skip" a field by advancing our buffer past it.
/// Deprecated groups are skipped recursively until their matching end-group
/// key, each level of nesting spending one level of `ctx`'s depth budget.
pub fn skip_field<B: bytes::Buf>(
    wire_type: WireType,
    buf: &mut B,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            // Read and discard the varint (decode_leb128_buf advances the buffer)
            u64::decode_leb128_buf(buf)?;
            return Ok(());
        }
        WireType::I64 => 8,
        WireType::I32 => 4,
        WireType::Len => {
            let len = decode_len(buf)?;
            if unlikely(buf.remaining() < len) {
                return Err(DecodeError::InvalidLength {
                    value: u64::cast_from(len),
                });
            }
            len
        }
        WireType::SGroup => return skip_group(buf, ctx.enter_recursion()?),
        WireType::EGroup => {
            return Err(DecodeError::illegal_tag(
                IllegalTagReason::UnexpectedEndGroup,
            ));
        }
    };

    if unlikely(buf.remaining() < skip_len) {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    buf.advance(skip_len);
    Ok(())
}

/// Skips the fields of a group whose start key has already been consumed,
/// up to and including the closing end-group key.
fn skip_group<B: bytes::Buf>(buf: &mut B, ctx: DecodeContext) -> Result<(), DecodeError> {
    loop {
        if unlikely(!buf.has_remaining()) {
            return Err(DecodeError::UnterminatedGroup);
        }
        match decode_key(buf)?.wire_type() {
            WireType::EGroup => return Ok(()),
            wire_type => skip_field(wire_type, buf, ctx)?,
        }
    }
}

/// Denotes the type of a field in an encoded protobuf message.
///
/// Protobuf messages are a series of key-value pairs. When encoded each key-value pair
/// is turned into a record consisting of a field number, a [`WireType`], and a payload.
/// The [`WireType`] indicates how large the proceeding payload is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`, `bool`, `enum`.
    Varint = 0,
    /// 64-bit integer.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Variable length field.
    ///
    /// Used for: `string`, `bytes`, `message`, packed `repeated` fields.
    Len = 2,
    /// Group start (deprecated, skip only).
    SGroup = 3,
    /// Group end (deprecated, skip only).
    EGroup = 4,
    /// 32-bit integer.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

static_assertions::assert_eq_size!(WireType, u8);

// Compile-time check that our discriminants match the wire format.
//
// If someone reorders the enum, this will fail to compile.
#[allow(clippy::as_conversions)]
const _: () = {
    assert!(WireType::Varint as u8 == 0);
    assert!(WireType::I64 as u8 == 1);
    assert!(WireType::Len as u8 == 2);
    assert!(WireType::SGroup as u8 == 3);
    assert!(WireType::EGroup as u8 == 4);
    assert!(WireType::I32 as u8 == 5);
};

#[allow(clippy::as_conversions)]
impl WireType {
    /// Try to decode a [`WireType`] from the provided raw value.
    #[inline(always)]
    const fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            _ => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline(always)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;
    use proptest::prelude::*;

    use crate::config::{DecodeConfig, DecodeContext};
    use crate::error::{DecodeError, IllegalTagReason};
    use crate::leb128::LebCodec;
    use crate::wire::{
        decode_key, decode_len, encode_key, encoded_key_len, skip_field, ProtoKey, WireType,
        MAXIMUM_FIELD_NUMBER, MINIMUM_FIELD_NUMBER,
    };

    fn key_bytes(wire_type: WireType, field_number: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_key(wire_type, field_number, &mut buf);
        buf
    }

    #[test]
    fn proptest_key_roundtrips() {
        fn arb_field_number() -> impl Strategy<Value = u32> {
            MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER
        }

        fn arb_wiretype() -> impl Strategy<Value = WireType> {
            (0..=5u8).prop_map(|val| WireType::try_from(val).expect("known valid"))
        }

        fn test(field_number: u32, wire_type: WireType) {
            let buf = key_bytes(wire_type, field_number);
            assert_eq!(buf.len(), encoded_key_len(field_number));

            let key = decode_key(&mut &buf[..]).unwrap();
            assert_eq!(key, ProtoKey::new(wire_type, field_number));
            assert_eq!(key.into_parts(), (wire_type, field_number));
        }

        let strat = (arb_field_number(), arb_wiretype());
        proptest!(|((field_number, wire_type) in strat)| test(field_number, wire_type))
    }

    #[test]
    fn test_all_valid_values() {
        for i in u8::MIN..u8::MAX {
            let wire_type = WireType::try_from(i);
            match (i, wire_type) {
                (0, Ok(WireType::Varint))
                | (1, Ok(WireType::I64))
                | (2, Ok(WireType::Len))
                | (3, Ok(WireType::SGroup))
                | (4, Ok(WireType::EGroup))
                | (5, Ok(WireType::I32)) => (),
                (_, Err(DecodeError::InvalidWireType { value })) => assert_eq!(value, i),
                other => panic!("unexpected value {other:?}"),
            }
        }
    }

    #[test]
    fn test_known_keys() {
        // field 1, Len
        assert_eq!(key_bytes(WireType::Len, 1), [0x0a]);
        // field 2, Len
        assert_eq!(key_bytes(WireType::Len, 2), [0x12]);
        // field 16 needs two bytes
        assert_eq!(key_bytes(WireType::Varint, 16), [0x80, 0x01]);
        assert_eq!(encoded_key_len(15), 1);
        assert_eq!(encoded_key_len(16), 2);
        assert_eq!(encoded_key_len(MAXIMUM_FIELD_NUMBER), 5);
    }

    #[test]
    fn test_decode_key_errors() {
        // Field number zero.
        assert_eq!(
            decode_key(&mut &[0x02u8][..]),
            Err(DecodeError::illegal_tag(IllegalTagReason::ZeroFieldNumber))
        );
        // Wire types 6 and 7 don't exist.
        assert_eq!(
            decode_key(&mut &[0x0eu8][..]),
            Err(DecodeError::InvalidWireType { value: 6 })
        );
        assert_eq!(
            decode_key(&mut &[0x0fu8][..]),
            Err(DecodeError::InvalidWireType { value: 7 })
        );
        // Field number 2^29.
        let mut buf = Vec::new();
        (u64::from(MAXIMUM_FIELD_NUMBER + 1) << 3).encode_leb128(&mut buf);
        assert_eq!(
            decode_key(&mut &buf[..]),
            Err(DecodeError::illegal_tag(
                IllegalTagReason::FieldNumberOutOfRange
            ))
        );
        // Empty and truncated.
        assert_eq!(
            decode_key(&mut &[0u8; 0][..]),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
        assert_eq!(
            decode_key(&mut &[0x80u8][..]),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
    }

    #[test]
    fn test_decode_len() {
        // Length 0
        let mut buf = &[0u8][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 0);

        // Length 127 (single byte)
        let mut buf = &[127u8][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 127);

        // Length 128 (two bytes)
        let mut buf = &[0x80, 0x01][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 128);

        // Length 300
        let mut buf = &[0xAC, 0x02][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 300);

        // "Negative" length
        let mut buf = Vec::new();
        u64::MAX.encode_leb128(&mut buf);
        assert_eq!(
            decode_len(&mut &buf[..]),
            Err(DecodeError::InvalidLength { value: u64::MAX })
        );
    }

    #[test]
    fn test_skip_field_varint() {
        let ctx = DecodeContext::default();

        // Skip a 1-byte varint
        let mut buf = &[42u8, 99][..];
        skip_field(WireType::Varint, &mut buf, ctx).unwrap();
        assert_eq!(buf, &[99]);

        // Skip a multi-byte varint
        let mut buf = &[0x80, 0x01, 99][..];
        skip_field(WireType::Varint, &mut buf, ctx).unwrap();
        assert_eq!(buf, &[99]);

        // Overlong varint
        let mut buf = &[0xff; 11][..];
        assert_eq!(
            skip_field(WireType::Varint, &mut buf, ctx),
            Err(DecodeError::IntegerOverflow)
        );
    }

    #[test]
    fn test_skip_field_fixed() {
        let ctx = DecodeContext::default();

        // Skip I32
        let mut buf = &[1, 2, 3, 4, 99][..];
        skip_field(WireType::I32, &mut buf, ctx).unwrap();
        assert_eq!(buf, &[99]);

        // Skip I64
        let mut buf = &[1, 2, 3, 4, 5, 6, 7, 8, 99][..];
        skip_field(WireType::I64, &mut buf, ctx).unwrap();
        assert_eq!(buf, &[99]);

        // Not enough bytes
        let mut buf = &[1, 2, 3][..];
        assert_eq!(
            skip_field(WireType::I32, &mut buf, ctx),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
        let mut buf = &[1, 2, 3, 4, 5, 6, 7][..];
        assert_eq!(
            skip_field(WireType::I64, &mut buf, ctx),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
    }

    #[test]
    fn test_skip_field_len() {
        let ctx = DecodeContext::default();

        // Skip length-delimited field: length=3, data=[1,2,3]
        let mut buf = &[3, 1, 2, 3, 99][..];
        skip_field(WireType::Len, &mut buf, ctx).unwrap();
        assert_eq!(buf, &[99]);

        // Skip empty length-delimited field
        let mut buf = &[0, 99][..];
        skip_field(WireType::Len, &mut buf, ctx).unwrap();
        assert_eq!(buf, &[99]);

        // Length runs past the end of the buffer
        let mut buf = &[5, 1, 2][..];
        assert_eq!(
            skip_field(WireType::Len, &mut buf, ctx),
            Err(DecodeError::InvalidLength { value: 5 })
        );
    }

    #[test]
    fn test_skip_group() {
        let ctx = DecodeContext::default();

        // group 5 { field 1: varint 150, field 2: "hi", group 3 { field 1: fixed32 } }
        let mut buf = Vec::new();
        encode_key(WireType::Varint, 1, &mut buf);
        buf.extend_from_slice(&[0x96, 0x01]);
        encode_key(WireType::Len, 2, &mut buf);
        buf.extend_from_slice(&[2, b'h', b'i']);
        encode_key(WireType::SGroup, 3, &mut buf);
        encode_key(WireType::I32, 1, &mut buf);
        buf.extend_from_slice(&[1, 2, 3, 4]);
        encode_key(WireType::EGroup, 3, &mut buf);
        encode_key(WireType::EGroup, 5, &mut buf);
        buf.push(99);

        // The start-group key of the outer group has already been consumed.
        let mut slice = &buf[..];
        skip_field(WireType::SGroup, &mut slice, ctx).unwrap();
        assert_eq!(slice, &[99]);
    }

    #[test]
    fn test_skip_group_unterminated() {
        let ctx = DecodeContext::default();

        let mut buf = Vec::new();
        encode_key(WireType::Varint, 1, &mut buf);
        buf.push(1);
        assert_eq!(
            skip_field(WireType::SGroup, &mut &buf[..], ctx),
            Err(DecodeError::UnterminatedGroup)
        );

        // An empty group body never sees its end.
        assert_eq!(
            skip_field(WireType::SGroup, &mut &[0u8; 0][..], ctx),
            Err(DecodeError::UnterminatedGroup)
        );

        // Inner group closed, outer group not.
        let mut buf = Vec::new();
        encode_key(WireType::SGroup, 2, &mut buf);
        encode_key(WireType::EGroup, 2, &mut buf);
        assert_eq!(
            skip_field(WireType::SGroup, &mut &buf[..], ctx),
            Err(DecodeError::UnterminatedGroup)
        );
    }

    #[test]
    fn test_skip_end_group_outside_group() {
        let mut buf = &[0u8][..];
        assert_eq!(
            skip_field(WireType::EGroup, &mut buf, DecodeContext::default()),
            Err(DecodeError::illegal_tag(
                IllegalTagReason::UnexpectedEndGroup
            ))
        );
    }

    #[test]
    fn test_skip_group_recursion_limit() {
        const DEPTH: u32 = 64;

        // DEPTH - 1 start-group keys nested inside the already consumed one,
        // then DEPTH end-group keys.
        let mut buf = Vec::new();
        for _ in 1..DEPTH {
            encode_key(WireType::SGroup, 1, &mut buf);
        }
        for _ in 0..DEPTH {
            encode_key(WireType::EGroup, 1, &mut buf);
        }

        let ctx = DecodeContext::new(&DecodeConfig::with_max_depth(DEPTH));
        skip_field(WireType::SGroup, &mut &buf[..], ctx).unwrap();

        let ctx = DecodeContext::new(&DecodeConfig::with_max_depth(DEPTH - 1));
        assert_eq!(
            skip_field(WireType::SGroup, &mut &buf[..], ctx),
            Err(DecodeError::RecursionLimitExceeded { limit: DEPTH - 1 })
        );
    }

    #[test]
    fn test_skip_pathological_nesting_does_not_overflow() {
        // A megabyte of start-group keys must fail cleanly instead of blowing the stack.
        let buf = alloc::vec![0x0bu8; 1 << 20];
        assert_eq!(
            skip_field(WireType::SGroup, &mut &buf[..], DecodeContext::default()),
            Err(DecodeError::RecursionLimitExceeded {
                limit: crate::config::DEFAULT_MAX_DEPTH
            })
        );
    }
}
