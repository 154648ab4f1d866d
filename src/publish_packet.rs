// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use bytes::{Bytes, BytesMut};

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, Packet,
    PacketId, PacketType, QoS, Topic, VarIntError,
};

/// Message sent between Clients and the Server, carrying an application
/// payload addressed to `topic`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PublishPacket {
    dup: bool,
    qos: QoS,
    retain: bool,
    topic: Topic,
    packet_id: PacketId,
    payload: BytesMut,
}

impl PublishPacket {
    /// # Errors
    /// Returns error if `topic` is too long to encode.
    pub fn new(topic: &str, qos: QoS, payload: &[u8]) -> Result<Self, EncodeError> {
        Ok(Self {
            dup: false,
            qos,
            retain: false,
            topic: Topic::new(topic)?,
            packet_id: PacketId::default(),
            payload: BytesMut::from(payload),
        })
    }

    /// Build an empty PUBLISH carrying exactly the flags a fixed header
    /// already named, bypassing `set_dup`'s `[MQTT-3.3.1-2]` check. Used by
    /// the packet factory to preserve a decoded/caller-built `FixedHeader`
    /// as given, the same way `decode` itself trusts the wire's flag bits
    /// until the rest of the body is parsed.
    pub(crate) fn with_flags(dup: bool, qos: QoS, retain: bool) -> Self {
        Self {
            dup,
            qos,
            retain,
            topic: Topic::default(),
            packet_id: PacketId::default(),
            payload: BytesMut::new(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        self.topic.as_ref()
    }

    #[must_use]
    pub const fn qos(&self) -> QoS {
        self.qos
    }

    pub fn set_qos(&mut self, qos: QoS) -> &mut Self {
        self.qos = qos;
        self
    }

    #[must_use]
    pub const fn retain(&self) -> bool {
        self.retain
    }

    pub fn set_retain(&mut self, retain: bool) -> &mut Self {
        self.retain = retain;
        self
    }

    #[must_use]
    pub const fn dup(&self) -> bool {
        self.dup
    }

    /// Set the duplicate-delivery flag.
    ///
    /// # Errors
    /// Returns error if `dup` is set while `qos()` is `AtMostOnce`
    /// `[MQTT-3.3.1-2]`.
    pub fn set_dup(&mut self, dup: bool) -> Result<&mut Self, EncodeError> {
        if dup && self.qos == QoS::AtMostOnce {
            return Err(EncodeError::InvalidPacketType);
        }
        self.dup = dup;
        Ok(self)
    }

    #[must_use]
    pub const fn packet_id(&self) -> PacketId {
        self.packet_id
    }

    pub fn set_packet_id(&mut self, packet_id: PacketId) -> &mut Self {
        self.packet_id = packet_id;
        self
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: &[u8]) -> &mut Self {
        self.payload = BytesMut::from(payload);
        self
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let mut remaining_length = self.topic.bytes() + self.payload.len();
        if self.qos != QoS::AtMostOnce {
            remaining_length += PacketId::bytes();
        }
        FixedHeader::new(
            PacketType::Publish {
                dup: self.dup,
                qos: self.qos,
                retain: self.retain,
            },
            remaining_length,
        )
    }
}

impl Packet for PublishPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Publish {
            dup: self.dup,
            qos: self.qos,
            retain: self.retain,
        }
    }

    fn bytes(&self) -> Result<usize, VarIntError> {
        Ok(self.get_fixed_header()?.bytes())
    }
}

impl DecodePacket for PublishPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        let (dup, qos, retain) = match fixed_header.packet_type() {
            PacketType::Publish { dup, qos, retain } => (dup, qos, retain),
            _ => return Err(DecodeError::InvalidPacketType),
        };

        // A PUBLISH Packet MUST NOT have both QoS bits set to 0 and DUP
        // set to 1 [MQTT-3.3.1-2].
        if dup && qos == QoS::AtMostOnce {
            return Err(DecodeError::InvalidPacketFlags);
        }

        let topic = Topic::decode(ba)?;

        let packet_id = if qos == QoS::AtMostOnce {
            PacketId::default()
        } else {
            let packet_id = PacketId::decode(ba)?;
            if packet_id.value() == 0 {
                return Err(DecodeError::InvalidPacketId);
            }
            packet_id
        };

        let header_len = topic.bytes() + if qos == QoS::AtMostOnce { 0 } else { PacketId::bytes() };
        let payload_len = fixed_header
            .remaining_length()
            .checked_sub(header_len)
            .ok_or(DecodeError::PayloadUnderflow)?;

        let payload = ba.read_bytes(payload_len)?;

        Ok(Self {
            dup,
            qos,
            retain,
            topic,
            packet_id,
            payload: BytesMut::from(payload),
        })
    }
}

impl EncodePacket for PublishPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let fixed_header = self.get_fixed_header()?;
        let mut n = fixed_header.encode(buf)?;

        n += self.topic.encode(buf)?;
        if self.qos != QoS::AtMostOnce {
            n += self.packet_id.encode(buf)?;
        }

        buf.extend_from_slice(&self.payload);
        n += self.payload.len();

        Ok(n)
    }
}

impl From<PublishPacket> for Bytes {
    fn from(packet: PublishPacket) -> Self {
        packet.payload.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_qos0_boundary() {
        let buf = [0x30, 0x03, 0x00, 0x01, b't'];
        let mut ba = ByteArray::new(&buf);
        let packet = PublishPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.topic(), "t");
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_decode_qos0_with_payload() {
        let buf = [0x30, 0x04, 0x00, 0x01, b't', b'x'];
        let mut ba = ByteArray::new(&buf);
        let packet = PublishPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.topic(), "t");
        assert_eq!(packet.payload(), b"x");
    }

    #[test]
    fn test_round_trip_qos1() {
        let mut packet = PublishPacket::new("a/b", QoS::AtLeastOnce, b"hello").unwrap();
        packet.set_packet_id(PacketId::new(42));

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();

        let mut ba = ByteArray::new(&buf);
        let decoded = PublishPacket::decode(&mut ba).unwrap();
        assert_eq!(decoded.topic(), "a/b");
        assert_eq!(decoded.qos(), QoS::AtLeastOnce);
        assert_eq!(decoded.packet_id().value(), 42);
        assert_eq!(decoded.payload(), b"hello");
    }

    #[test]
    fn test_dup_allowed_with_qos1() {
        let mut packet = PublishPacket::new("a", QoS::AtLeastOnce, b"").unwrap();
        assert!(packet.set_dup(true).is_ok());
    }

    #[test]
    fn test_dup_rejected_with_qos0() {
        let mut packet = PublishPacket::new("a", QoS::AtMostOnce, b"").unwrap();
        assert!(packet.set_dup(true).is_err());
    }
}
