// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::io::{Read, Write};

use crate::{
    ByteArray, ConnectAckPacket, ConnectPacket, DecodeError, DecodePacket, DisconnectPacket,
    EncodeError, EncodePacket, FixedHeader, PacketType, PingRequestPacket, PingResponsePacket,
    PublishAckPacket, PublishCompletePacket, PublishPacket, PublishReceivedPacket,
    PublishReleasePacket, SubscribeAckPacket, SubscribePacket, UnsubscribeAckPacket,
    UnsubscribePacket,
};

/// Any of the fourteen MQTT 3.1.1 control packets, dispatched by the type
/// nibble of its fixed header.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlPacket {
    Connect(ConnectPacket),
    ConnectAck(ConnectAckPacket),
    Publish(PublishPacket),
    PublishAck(PublishAckPacket),
    PublishReceived(PublishReceivedPacket),
    PublishRelease(PublishReleasePacket),
    PublishComplete(PublishCompletePacket),
    Subscribe(SubscribePacket),
    SubscribeAck(SubscribeAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubscribeAck(UnsubscribeAckPacket),
    PingRequest(PingRequestPacket),
    PingResponse(PingResponsePacket),
    Disconnect(DisconnectPacket),
}

/// Build an empty, default-valued packet of the type named by `type_code`
/// (the fixed header's upper nibble, 1..=14).
///
/// Returns `None` for a type code outside that range; unlike the wire
/// format, `PacketType` has no "unsupported" variant to construct, so this
/// is the only failure mode.
#[must_use]
pub fn new_control_packet(type_code: u8) -> Option<ControlPacket> {
    match type_code {
        1 => Some(ControlPacket::Connect(ConnectPacket::default())),
        2 => Some(ControlPacket::ConnectAck(ConnectAckPacket::default())),
        3 => Some(ControlPacket::Publish(PublishPacket::default())),
        4 => Some(ControlPacket::PublishAck(PublishAckPacket::default())),
        5 => Some(ControlPacket::PublishReceived(
            PublishReceivedPacket::default(),
        )),
        6 => Some(ControlPacket::PublishRelease(
            PublishReleasePacket::default(),
        )),
        7 => Some(ControlPacket::PublishComplete(
            PublishCompletePacket::default(),
        )),
        8 => Some(ControlPacket::Subscribe(SubscribePacket::default())),
        9 => Some(ControlPacket::SubscribeAck(SubscribeAckPacket::default())),
        10 => Some(ControlPacket::Unsubscribe(UnsubscribePacket::default())),
        11 => Some(ControlPacket::UnsubscribeAck(
            UnsubscribeAckPacket::default(),
        )),
        12 => Some(ControlPacket::PingRequest(PingRequestPacket::default())),
        13 => Some(ControlPacket::PingResponse(PingResponsePacket::default())),
        14 => Some(ControlPacket::Disconnect(DisconnectPacket::default())),
        _ => None,
    }
}

/// Build an empty, default-valued packet whose variant matches
/// `fixed_header`'s `PacketType`, preserving the header as given.
///
/// `FixedHeader` only ever holds an already-validated `PacketType` (the
/// wire's 1..=14 range is enforced once, by `PacketType::try_from` during
/// `FixedHeader::decode`), so every arm below is reachable and the match is
/// exhaustive: there is no raw type byte left to reject here. The `Result`
/// return matches the wire-level factory semantics this dispatches from.
///
/// # Errors
///
/// This constructor cannot currently fail; it returns `Result` to mirror
/// the two-constructor factory shape named alongside [`new_control_packet`].
pub fn new_with_header(fixed_header: FixedHeader) -> Result<ControlPacket, DecodeError> {
    Ok(match fixed_header.packet_type() {
        PacketType::Connect => ControlPacket::Connect(ConnectPacket::default()),
        PacketType::ConnectAck => ControlPacket::ConnectAck(ConnectAckPacket::default()),
        PacketType::Publish { dup, qos, retain } => {
            ControlPacket::Publish(PublishPacket::with_flags(dup, qos, retain))
        }
        PacketType::PublishAck => ControlPacket::PublishAck(PublishAckPacket::default()),
        PacketType::PublishReceived => {
            ControlPacket::PublishReceived(PublishReceivedPacket::default())
        }
        PacketType::PublishRelease => {
            ControlPacket::PublishRelease(PublishReleasePacket::default())
        }
        PacketType::PublishComplete => {
            ControlPacket::PublishComplete(PublishCompletePacket::default())
        }
        PacketType::Subscribe => ControlPacket::Subscribe(SubscribePacket::default()),
        PacketType::SubscribeAck => ControlPacket::SubscribeAck(SubscribeAckPacket::default()),
        PacketType::Unsubscribe => ControlPacket::Unsubscribe(UnsubscribePacket::default()),
        PacketType::UnsubscribeAck => {
            ControlPacket::UnsubscribeAck(UnsubscribeAckPacket::default())
        }
        PacketType::PingRequest => ControlPacket::PingRequest(PingRequestPacket::default()),
        PacketType::PingResponse => ControlPacket::PingResponse(PingResponsePacket::default()),
        PacketType::Disconnect => ControlPacket::Disconnect(DisconnectPacket::default()),
    })
}

/// Read one complete control packet from `src`: the fixed header is parsed
/// byte by byte to learn the `Remaining Length`, then that many further
/// bytes are read and handed, together with the header, to the matching
/// packet's own `decode`.
///
/// # Errors
///
/// Returns `EndOfInput` if `src` runs out of bytes while the fixed header
/// itself (type/flags byte or `Remaining Length` continuation bytes) is
/// being read, `ShortRead` if `src` runs out of bytes before `Remaining
/// Length` octets of body are satisfied, or any other `DecodeError` the
/// packet body itself raises.
pub fn read_packet(src: &mut impl Read) -> Result<ControlPacket, DecodeError> {
    let mut header_byte = [0_u8; 1];
    src.read_exact(&mut header_byte)
        .map_err(|_| DecodeError::EndOfInput)?;

    let mut buf = vec![header_byte[0]];

    let mut remaining_length: usize = 0;
    let mut multiplier: usize = 1;
    loop {
        let mut byte = [0_u8; 1];
        src.read_exact(&mut byte)
            .map_err(|_| DecodeError::EndOfInput)?;
        buf.push(byte[0]);

        remaining_length += (byte[0] & 0x7f) as usize * multiplier;
        multiplier *= 128;
        if multiplier > 128 * 128 * 128 * 128 {
            return Err(DecodeError::MalformedLength);
        }
        if byte[0] & 0x80 == 0 {
            break;
        }
    }

    let mut body = vec![0_u8; remaining_length];
    src.read_exact(&mut body)
        .map_err(|_| DecodeError::ShortRead)?;
    buf.extend_from_slice(&body);

    let type_code = (header_byte[0] & 0b1111_0000) >> 4;
    let mut ba = ByteArray::new(&buf);

    match type_code {
        1 => Ok(ControlPacket::Connect(ConnectPacket::decode(&mut ba)?)),
        2 => Ok(ControlPacket::ConnectAck(ConnectAckPacket::decode(
            &mut ba,
        )?)),
        3 => Ok(ControlPacket::Publish(PublishPacket::decode(&mut ba)?)),
        4 => Ok(ControlPacket::PublishAck(PublishAckPacket::decode(
            &mut ba,
        )?)),
        5 => Ok(ControlPacket::PublishReceived(
            PublishReceivedPacket::decode(&mut ba)?,
        )),
        6 => Ok(ControlPacket::PublishRelease(
            PublishReleasePacket::decode(&mut ba)?,
        )),
        7 => Ok(ControlPacket::PublishComplete(
            PublishCompletePacket::decode(&mut ba)?,
        )),
        8 => Ok(ControlPacket::Subscribe(SubscribePacket::decode(&mut ba)?)),
        9 => Ok(ControlPacket::SubscribeAck(SubscribeAckPacket::decode(
            &mut ba,
        )?)),
        10 => Ok(ControlPacket::Unsubscribe(UnsubscribePacket::decode(
            &mut ba,
        )?)),
        11 => Ok(ControlPacket::UnsubscribeAck(
            UnsubscribeAckPacket::decode(&mut ba)?,
        )),
        12 => Ok(ControlPacket::PingRequest(PingRequestPacket::decode(
            &mut ba,
        )?)),
        13 => Ok(ControlPacket::PingResponse(PingResponsePacket::decode(
            &mut ba,
        )?)),
        14 => Ok(ControlPacket::Disconnect(DisconnectPacket::decode(
            &mut ba,
        )?)),
        _ => Err(DecodeError::UnsupportedType(type_code)),
    }
}

/// Encode `packet` (including its own fixed header) and write it to `sink`
/// in a single `write_all` call.
///
/// # Errors
///
/// Returns error if `packet` cannot be encoded, or if `sink` fails to
/// accept the bytes.
pub fn write_packet(packet: &ControlPacket, sink: &mut impl Write) -> Result<usize, EncodeError> {
    let mut buf = Vec::new();
    let n = match packet {
        ControlPacket::Connect(p) => p.encode(&mut buf)?,
        ControlPacket::ConnectAck(p) => p.encode(&mut buf)?,
        ControlPacket::Publish(p) => p.encode(&mut buf)?,
        ControlPacket::PublishAck(p) => p.encode(&mut buf)?,
        ControlPacket::PublishReceived(p) => p.encode(&mut buf)?,
        ControlPacket::PublishRelease(p) => p.encode(&mut buf)?,
        ControlPacket::PublishComplete(p) => p.encode(&mut buf)?,
        ControlPacket::Subscribe(p) => p.encode(&mut buf)?,
        ControlPacket::SubscribeAck(p) => p.encode(&mut buf)?,
        ControlPacket::Unsubscribe(p) => p.encode(&mut buf)?,
        ControlPacket::UnsubscribeAck(p) => p.encode(&mut buf)?,
        ControlPacket::PingRequest(p) => p.encode(&mut buf)?,
        ControlPacket::PingResponse(p) => p.encode(&mut buf)?,
        ControlPacket::Disconnect(p) => p.encode(&mut buf)?,
    };

    sink.write_all(&buf)?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PacketId, QoS};

    #[test]
    fn test_new_control_packet_range() {
        assert!(new_control_packet(0).is_none());
        assert!(new_control_packet(15).is_none());
        assert!(matches!(
            new_control_packet(12),
            Some(ControlPacket::PingRequest(_))
        ));
    }

    #[test]
    fn test_round_trip_ping() {
        let packet = ControlPacket::PingRequest(PingRequestPacket::new());
        let mut buf = Vec::new();
        write_packet(&packet, &mut buf).unwrap();

        let decoded = read_packet(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_round_trip_publish_ack() {
        let packet = ControlPacket::PublishAck(PublishAckPacket::new(PacketId::new(9)));
        let mut buf = Vec::new();
        write_packet(&packet, &mut buf).unwrap();

        let decoded = read_packet(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_read_packet_eof_in_fixed_header() {
        // Type/flags byte present, `Remaining Length` byte missing: EOF
        // happens while the fixed header itself is being framed.
        let buf = [0b1100_0000_u8];
        let mut src = buf.as_slice();
        assert_eq!(read_packet(&mut src), Err(DecodeError::EndOfInput));
    }

    #[test]
    fn test_read_packet_short_read() {
        // Fixed header complete (PUBACK, Remaining Length 2), body missing:
        // EOF happens while the declared body octets are being read.
        let buf = [0b0100_0000_u8, 0x02];
        let mut src = buf.as_slice();
        assert_eq!(read_packet(&mut src), Err(DecodeError::ShortRead));
    }

    #[test]
    fn test_new_with_header() {
        let fixed_header = FixedHeader::new(PacketType::PingRequest, 0).unwrap();
        let packet = new_with_header(fixed_header).unwrap();
        assert!(matches!(packet, ControlPacket::PingRequest(_)));
    }

    #[test]
    fn test_new_with_header_preserves_publish_flags() {
        let fixed_header = FixedHeader::new(
            PacketType::Publish {
                dup: true,
                qos: QoS::AtLeastOnce,
                retain: true,
            },
            0,
        )
        .unwrap();
        let packet = new_with_header(fixed_header).unwrap();
        match packet {
            ControlPacket::Publish(p) => {
                assert!(p.dup());
                assert_eq!(p.qos(), QoS::AtLeastOnce);
                assert!(p.retain());
            }
            _ => panic!("expected Publish variant"),
        }
    }
}
