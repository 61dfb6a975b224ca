//! Strategies and helpers shared by the integration tests.

#![allow(dead_code)]

use proptest::collection::vec;
use proptest::prelude::*;
use protowire::leb128::encode_varint;
use protowire::proxy::{Id, ProxyMessage};
use protowire::wire::{decode_key, decode_len, encode_key, WireType, MAXIMUM_FIELD_NUMBER};

pub fn arb_id() -> impl Strategy<Value = Id> {
    (
        vec(any::<u8>(), 0..64),
        ".{0,32}",
        vec(any::<u8>(), 0..64),
    )
        .prop_map(|(public_key, address, id)| Id::new(public_key, address, id))
}

/// `destination` is present nine times out of ten.
pub fn arb_proxy_message() -> impl Strategy<Value = ProxyMessage> {
    (".{0,64}", proptest::option::weighted(0.9, arb_id()))
        .prop_map(|(message, destination)| ProxyMessage::new(message, destination))
}

/// A single encoded field, key included, with a field number of at least
/// `min_field_number` and a Varint, I64, Len or I32 payload.
pub fn arb_unknown_field(min_field_number: u32) -> impl Strategy<Value = Vec<u8>> {
    let payload = prop_oneof![
        any::<u64>().prop_map(|value| {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            (WireType::Varint, buf)
        }),
        any::<u64>().prop_map(|value| (WireType::I64, value.to_le_bytes().to_vec())),
        vec(any::<u8>(), 0..32).prop_map(|data| {
            let mut buf = Vec::new();
            encode_varint(u64::try_from(data.len()).unwrap(), &mut buf);
            buf.extend_from_slice(&data);
            (WireType::Len, buf)
        }),
        any::<u32>().prop_map(|value| (WireType::I32, value.to_le_bytes().to_vec())),
    ];

    (min_field_number..=MAXIMUM_FIELD_NUMBER, payload).prop_map(
        |(field_number, (wire_type, payload))| {
            let mut buf = Vec::new();
            encode_key(wire_type, field_number, &mut buf);
            buf.extend_from_slice(&payload);
            buf
        },
    )
}

/// Returns the offset of every top-level field boundary in `buf`, including
/// `0` and `buf.len()`. Only understands length-delimited fields.
pub fn field_boundaries(buf: &[u8]) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut cursor = buf;
    while !cursor.is_empty() {
        let key = decode_key(&mut cursor).unwrap();
        assert_eq!(key.wire_type(), WireType::Len);
        let len = decode_len(&mut cursor).unwrap();
        cursor = &cursor[len..];
        boundaries.push(buf.len() - cursor.len());
    }
    boundaries
}
