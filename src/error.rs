// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use thiserror::Error;

use crate::byte_array::ByteArrayError;
use crate::var_int::VarIntError;

/// Failure modes while parsing a byte stream into a control packet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The source ran out of bytes while a field was still being read, or
    /// while the fixed header itself (type/flags byte, `Remaining Length`
    /// continuation bytes) was being framed.
    #[error("unexpected end of input")]
    EndOfInput,

    /// The variable-length `Remaining Length` field used a fifth continuation
    /// byte, or otherwise failed to encode a valid value.
    #[error("malformed remaining length")]
    MalformedLength,

    /// Fixed header flag bits did not match the value required for this
    /// packet type.
    #[error("invalid fixed header flags")]
    InvalidPacketFlags,

    /// Fixed header type nibble is outside the 1..=14 range of known packet
    /// types.
    #[error("unsupported packet type {0:#04x}")]
    UnsupportedType(u8),

    /// A packet's `decode()` was invoked on a `ByteArray` whose fixed header
    /// names a different packet type.
    #[error("packet type mismatch")]
    InvalidPacketType,

    /// CONNECT protocol name was not the literal string `MQTT`.
    #[error("invalid protocol name")]
    InvalidProtocolName,

    /// CONNECT protocol level byte was not a recognized value.
    #[error("invalid protocol level")]
    InvalidProtocolLevel,

    /// CONNECT flag byte combination violates the wire-format invariants
    /// (e.g. password flag without username flag, non-zero reserved bit).
    #[error("invalid connect flags")]
    InvalidConnectFlags,

    /// A QoS field held a value other than 0, 1, or 2.
    #[error("invalid QoS value")]
    InvalidQoS,

    /// A packet identifier was zero where the protocol requires non-zero.
    #[error("invalid packet identifier")]
    InvalidPacketId,

    /// A one-byte boolean field held a value other than 0x00 or 0x01.
    #[error("invalid boolean byte")]
    InvalidBoolData,

    /// SUBSCRIBE/UNSUBSCRIBE payload contained no topic filters.
    #[error("empty topic filter list")]
    EmptyTopicFilter,

    /// A length-prefixed field declared more than 65,535 bytes.
    #[error("data exceeds 65535 bytes")]
    TooManyData,

    /// A packet's declared `Remaining Length` does not match the byte count
    /// its body actually requires (e.g. PUBACK/PINGREQ body length fixed at
    /// a known size).
    #[error("remaining length does not match packet body")]
    InvalidRemainingLength,

    /// PUBLISH's computed payload length underflowed while subtracting the
    /// topic name and packet identifier from `Remaining Length`.
    #[error("publish payload length underflow")]
    PayloadUnderflow,

    /// `read_packet` could not read the number of octets `Remaining Length`
    /// declared from its source.
    #[error("short read while framing packet")]
    ShortRead,
}

impl From<ByteArrayError> for DecodeError {
    fn from(e: ByteArrayError) -> Self {
        match e {
            ByteArrayError::OutOfRangeError => Self::EndOfInput,
        }
    }
}

impl From<VarIntError> for DecodeError {
    fn from(_e: VarIntError) -> Self {
        Self::MalformedLength
    }
}

/// Failure modes while serializing a control packet into a byte stream.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A length-prefixed field would need to encode more than 65,535 bytes.
    #[error("data exceeds 65535 bytes")]
    TooManyData,

    /// `Remaining Length` would overflow the four-byte variable-length
    /// encoding (> 268,435,455).
    #[error("remaining length too large to encode")]
    InvalidVarInt,

    /// A value would produce a fixed header inconsistent with the MQTT
    /// wire format (e.g. DUP=1 on a QoS 0 PUBLISH).
    #[error("invalid packet field combination")]
    InvalidPacketType,

    /// The destination `std::io::Write` sink returned an error while
    /// `write_packet` flushed an encoded packet to it.
    #[error("i/o error writing packet: {0}")]
    Io(#[from] std::io::Error),
}
