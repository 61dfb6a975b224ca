//! LEB128 variable-length integer encoding/decoding.
//!
//! Protobuf calls these "varints": 7 bits of payload per byte, least
//! significant group first, with the high bit of every byte but the last set.

// This module uses `as` casts which have been thoroughly reviewed for correctness.
#![allow(clippy::as_conversions)]

use crate::error::DecodeError;
use crate::util::likely;

/// Types that can be encoded as, and decoded from, a LEB128 integer.
pub trait LebCodec: Sized + Copy {
    /// Maximum number of bytes an encoded value of this type can span.
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 variable length integer from the front of `data`.
    ///
    /// Returns a tuple of the decoded value and the number of bytes read to
    /// decode said value. Never reads past the end of `data`.
    ///
    /// # Errors
    ///
    /// * [`DecodeError::UnexpectedEndOfBuffer`] if `data` ends before the
    ///   terminating byte (high bit clear).
    /// * [`DecodeError::IntegerOverflow`] if more than
    ///   [`LebCodec::MAX_LEB_BYTES`] bytes are read, or the last byte carries
    ///   bits that do not fit in `Self`.
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Decode a LEB128 variable length integer from a [`bytes::Buf`],
    /// advancing it past the integer.
    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<(Self, usize), DecodeError> {
        let chunk = buf.chunk();

        // Fast path: the current chunk either holds the whole integer or is
        // all that is left of the buffer.
        if likely(chunk.len() >= Self::MAX_LEB_BYTES || chunk.len() == buf.remaining()) {
            let (value, bytes_read) = Self::decode_leb128(chunk)?;
            buf.advance(bytes_read);
            return Ok((value, bytes_read));
        }

        // Slow path: the integer straddles chunks, read byte by byte.
        let mut scratch = [0u8; 16];
        for i in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeError::UnexpectedEndOfBuffer);
            }
            scratch[i] = buf.get_u8();
            if scratch[i] < 0x80 {
                return Self::decode_leb128(&scratch[..=i]);
            }
        }
        Err(DecodeError::IntegerOverflow)
    }

    /// Encode `self` as a LEB128 variable length integer into the provided
    /// buffer, returning the number of bytes written.
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes required to encode this integer.
    fn encoded_leb128_len(self) -> usize;
}

macro_rules! impl_leb_codec {
    ($ty:ty, $max_bytes:expr, $last_byte_limit:expr) => {
        impl LebCodec for $ty {
            const MAX_LEB_BYTES: usize = $max_bytes;

            #[inline]
            fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
                // Fast path, field keys and most lengths fit in a single byte.
                match data.first() {
                    None => return Err(DecodeError::UnexpectedEndOfBuffer),
                    Some(&b) if b < 0x80 => return Ok((b as $ty, 1)),
                    Some(_) => (),
                }

                let mut value: $ty = 0;
                for (i, &b) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
                    // The final group only has room for the remaining high bits.
                    if i == Self::MAX_LEB_BYTES - 1 && b >= $last_byte_limit {
                        return Err(DecodeError::IntegerOverflow);
                    }
                    value |= ((b & 0x7f) as $ty) << (7 * i);
                    if b < 0x80 {
                        return Ok((value, i + 1));
                    }
                }

                if data.len() < Self::MAX_LEB_BYTES {
                    Err(DecodeError::UnexpectedEndOfBuffer)
                } else {
                    Err(DecodeError::IntegerOverflow)
                }
            }

            #[inline]
            fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize {
                let mut value = self;
                let mut written = 1;
                while value >= 0x80 {
                    buf.put_u8((value & 0x7f) as u8 | 0x80);
                    value >>= 7;
                    written += 1;
                }
                buf.put_u8(value as u8);
                written
            }

            /// LEB128 encodes 7 bits per byte, so the length is
            /// `ceil(significant_bits / 7)` with a minimum of 1 byte for zero.
            #[inline]
            fn encoded_leb128_len(self) -> usize {
                let significant_bits = <$ty>::BITS - (self | 1).leading_zeros();
                significant_bits.div_ceil(7) as usize
            }
        }
    };
}

// 9 full groups hold 63 bits, the 10th group may only carry the top bit.
impl_leb_codec!(u64, 10, 0x02);
// 4 full groups hold 28 bits, the 5th group may carry the remaining 4.
impl_leb_codec!(u32, 5, 0x10);

/// Decodes a `u64` varint starting at `offset` within `buffer`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_varint(buffer: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let data = buffer
        .get(offset..)
        .ok_or(DecodeError::UnexpectedEndOfBuffer)?;
    u64::decode_leb128(data)
}

/// Encodes `value` as a varint into `buf`, returning the number of bytes written.
#[inline]
pub fn encode_varint<B: bytes::BufMut>(value: u64, buf: &mut B) -> usize {
    value.encode_leb128(buf)
}

/// Returns the number of bytes `value` occupies as a varint.
#[inline]
pub fn encoded_varint_len(value: u64) -> usize {
    value.encoded_leb128_len()
}
