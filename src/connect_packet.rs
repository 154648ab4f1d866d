// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::connect_ack_packet::ConnectReturnCode;
use crate::connect_flags::ConnectFlags;
use crate::{
    BinaryData, ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader,
    Packet, PacketType, StringData, Topic, U16Data, VarIntError,
};

/// Protocol name carried in every CONNECT packet. MQTT 3.1.1 requires the
/// literal string `MQTT` (earlier drafts used `MQIsdp`); anything else is a
/// `validate` rejection, not a decode failure.
pub const PROTOCOL_NAME: &str = "MQTT";

/// MQTT 3.1.1 protocol level byte.
pub const PROTOCOL_LEVEL: u8 = 4;

/// Request sent by a Client to open a Network Connection and begin a
/// Session with a Server.
///
/// ```txt
///  7                          0
/// +----------------------------+
/// | Fixed header               |
/// +----------------------------+
/// | Protocol name length       |
/// | Protocol name string ...   |
/// +----------------------------+
/// | Protocol level             |
/// +----------------------------+
/// | Connect flags              |
/// +----------------------------+
/// | Keep alive                 |
/// +----------------------------+
/// | Client id ...              |
/// +----------------------------+
/// | Will topic ...             |
/// | Will message ...           |
/// +----------------------------+
/// | Username ...                |
/// | Password ...                |
/// +----------------------------+
/// ```
///
/// `decode` never fails on a value that is merely a protocol violation
/// (bad protocol name/level, reserved flag bit, empty client id with
/// `clean_session` unset); those are reported by [`ConnectPacket::validate`]
/// instead, matching how a broker actually replies with a `ConnectAckPacket`
/// rather than dropping the connection silently.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectPacket {
    protocol_name: StringData,
    protocol_level: u8,
    connect_flags: ConnectFlags,
    keep_alive: U16Data,
    client_id: StringData,
    will_topic: Option<Topic>,
    will_message: BinaryData,
    username: StringData,
    password: BinaryData,
}

impl Default for ConnectPacket {
    fn default() -> Self {
        Self {
            protocol_name: StringData::default(),
            protocol_level: PROTOCOL_LEVEL,
            connect_flags: ConnectFlags::default(),
            keep_alive: U16Data::default(),
            client_id: StringData::default(),
            will_topic: None,
            will_message: BinaryData::default(),
            username: StringData::default(),
            password: BinaryData::default(),
        }
    }
}

impl ConnectPacket {
    /// # Errors
    /// Returns error if `client_id` is too long to encode.
    pub fn new(client_id: &str) -> Result<Self, EncodeError> {
        Ok(Self {
            protocol_name: StringData::from(PROTOCOL_NAME)?,
            keep_alive: U16Data::new(60),
            client_id: StringData::from(client_id)?,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn protocol_name(&self) -> &str {
        self.protocol_name.as_ref()
    }

    #[must_use]
    pub const fn protocol_level(&self) -> u8 {
        self.protocol_level
    }

    pub fn set_protocol_level(&mut self, protocol_level: u8) -> &mut Self {
        self.protocol_level = protocol_level;
        self
    }

    #[must_use]
    pub const fn connect_flags(&self) -> &ConnectFlags {
        &self.connect_flags
    }

    pub fn set_connect_flags(&mut self, connect_flags: ConnectFlags) -> &mut Self {
        self.connect_flags = connect_flags;
        self
    }

    #[must_use]
    pub const fn keep_alive(&self) -> u16 {
        self.keep_alive.value()
    }

    pub fn set_keep_alive(&mut self, keep_alive: u16) -> &mut Self {
        self.keep_alive = U16Data::new(keep_alive);
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_ref()
    }

    /// # Errors
    /// Returns error if `client_id` is too long to encode.
    pub fn set_client_id(&mut self, client_id: &str) -> Result<&mut Self, EncodeError> {
        self.client_id = StringData::from(client_id)?;
        Ok(self)
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_ref()
    }

    /// # Errors
    /// Returns error if `username` is too long to encode.
    pub fn set_username(&mut self, username: &str) -> Result<&mut Self, EncodeError> {
        self.username = StringData::from(username)?;
        self.connect_flags.set_has_username(!self.username.is_empty());
        Ok(self)
    }

    #[must_use]
    pub fn password(&self) -> &[u8] {
        self.password.as_ref()
    }

    /// # Errors
    /// Returns error if `password` is too long to encode.
    pub fn set_password(&mut self, password: &[u8]) -> Result<&mut Self, EncodeError> {
        self.password = BinaryData::from_slice(password)?;
        self.connect_flags.set_has_password(!self.password.as_ref().is_empty());
        Ok(self)
    }

    #[must_use]
    pub fn will_topic(&self) -> Option<&str> {
        self.will_topic.as_ref().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn will_message(&self) -> &[u8] {
        self.will_message.as_ref()
    }

    /// Set the Will topic and message together; an empty `topic` clears the
    /// Will flag entirely, matching `[MQTT-3.1.2-8]` (topic and message
    /// must be set together or not at all).
    ///
    /// # Errors
    /// Returns error if `topic` or `message` is too long to encode.
    pub fn set_will(&mut self, topic: &str, message: &[u8]) -> Result<&mut Self, EncodeError> {
        if topic.is_empty() {
            self.will_topic = None;
            self.will_message = BinaryData::default();
            self.connect_flags.set_will(false);
        } else {
            self.will_topic = Some(Topic::new(topic)?);
            self.will_message = BinaryData::from_slice(message)?;
            self.connect_flags.set_will(true);
        }
        Ok(self)
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let mut remaining_length = self.protocol_name.bytes()
            + 1 // protocol level
            + ConnectFlags::bytes()
            + U16Data::bytes()
            + self.client_id.bytes();

        if let Some(will_topic) = &self.will_topic {
            remaining_length += will_topic.bytes() + self.will_message.bytes();
        }
        if self.connect_flags.has_username() {
            remaining_length += self.username.bytes();
        }
        if self.connect_flags.has_password() {
            remaining_length += self.password.bytes();
        }

        FixedHeader::new(PacketType::Connect, remaining_length)
    }

    /// Evaluate the CONNECT acceptance rules, in the order a broker would
    /// check them, and return the CONNACK return code to reply with.
    #[must_use]
    pub fn validate(&self) -> ConnectReturnCode {
        if self.connect_flags.reserved() {
            return ConnectReturnCode::ProtocolViolation;
        }
        if self.protocol_name.as_ref() != PROTOCOL_NAME {
            return ConnectReturnCode::ProtocolViolation;
        }
        if self.protocol_level != PROTOCOL_LEVEL {
            return ConnectReturnCode::RefusedBadProtocolLevel;
        }
        if self.connect_flags.has_password() && !self.connect_flags.has_username() {
            return ConnectReturnCode::RefusedBadUsernameOrPassword;
        }
        if self.client_id.is_empty() && !self.connect_flags.clean_session() {
            return ConnectReturnCode::RefusedIDRejected;
        }
        ConnectReturnCode::Accepted
    }
}

impl Packet for ConnectPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Connect
    }

    fn bytes(&self) -> Result<usize, VarIntError> {
        Ok(self.get_fixed_header()?.bytes())
    }
}

impl DecodePacket for ConnectPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type() != PacketType::Connect {
            return Err(DecodeError::InvalidPacketType);
        }

        let protocol_name = StringData::decode(ba)?;
        let protocol_level = ba.read_byte()?;
        let connect_flags = ConnectFlags::decode(ba)?;
        let keep_alive = U16Data::decode(ba)?;
        let client_id = StringData::decode(ba)?;

        let will_topic = if connect_flags.will() {
            Some(Topic::decode(ba)?)
        } else {
            None
        };
        let will_message = if connect_flags.will() {
            BinaryData::decode(ba)?
        } else {
            BinaryData::default()
        };

        let username = if connect_flags.has_username() {
            StringData::decode(ba)?
        } else {
            StringData::default()
        };
        let password = if connect_flags.has_password() {
            BinaryData::decode(ba)?
        } else {
            BinaryData::default()
        };

        Ok(Self {
            protocol_name,
            protocol_level,
            connect_flags,
            keep_alive,
            client_id,
            will_topic,
            will_message,
            username,
            password,
        })
    }
}

impl EncodePacket for ConnectPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let fixed_header = self.get_fixed_header()?;
        let mut n = fixed_header.encode(buf)?;

        n += self.protocol_name.encode(buf)?;
        buf.push(self.protocol_level);
        n += 1;
        n += self.connect_flags.encode(buf)?;
        n += self.keep_alive.encode(buf)?;
        n += self.client_id.encode(buf)?;

        if let Some(will_topic) = &self.will_topic {
            n += will_topic.encode(buf)?;
            n += self.will_message.encode(buf)?;
        }
        if self.connect_flags.has_username() {
            n += self.username.encode(buf)?;
        }
        if self.connect_flags.has_password() {
            n += self.password.encode(buf)?;
        }

        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let buf: Vec<u8> = vec![
            16, 20, 0, 4, 77, 81, 84, 84, 4, 2, 0, 60, 0, 8, 119, 118, 80, 84, 88, 99, 67, 119,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.client_id(), "wvPTXcCw");
        assert_eq!(packet.protocol_name(), "MQTT");
        assert_eq!(packet.protocol_level(), 4);
        assert_eq!(packet.keep_alive(), 60);
        assert_eq!(packet.validate(), ConnectReturnCode::Accepted);
    }

    #[test]
    fn test_decode_full() {
        let buf: Vec<u8> = vec![
            0x10, 0x34, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0xCC, 0x00, 0x00, 0x00, 0x04,
            0x74, 0x65, 0x73, 0x74, 0x00, 0x04, 0x74, 0x65, 0x73, 0x74, 0x00, 0x0C, b'T', b'e',
            b's', b't', b' ', b'P', b'a', b'y', b'l', b'o', b'a', b'd', 0x00, 0x08, b't', b'e',
            b's', b't', b'u', b's', b'e', b'r', 0x00, 0x08, b't', b'e', b's', b't', b'p', b'a',
            b's', b's',
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(packet.protocol_name(), "MQTT");
        assert_eq!(packet.protocol_level(), 4);
        assert_eq!(packet.keep_alive(), 0);
        assert_eq!(packet.client_id(), "test");
        assert_eq!(packet.will_topic(), Some("test"));
        assert_eq!(packet.will_message(), b"Test Payload");
        assert_eq!(packet.username(), "testuser");
        assert_eq!(packet.password(), b"testpass");
    }

    #[test]
    fn test_validate_bad_protocol_name() {
        let mut packet = ConnectPacket::new("client").unwrap();
        packet.protocol_name = StringData::from("MQIsdp").unwrap();
        assert_eq!(packet.validate(), ConnectReturnCode::ProtocolViolation);
    }

    #[test]
    fn test_validate_bad_protocol_level() {
        let mut packet = ConnectPacket::new("client").unwrap();
        packet.set_protocol_level(3);
        assert_eq!(packet.validate(), ConnectReturnCode::RefusedBadProtocolLevel);
    }

    #[test]
    fn test_validate_password_without_username() {
        let mut packet = ConnectPacket::new("client").unwrap();
        packet.set_password(b"secret").unwrap();
        packet.connect_flags.set_has_username(false);
        assert_eq!(
            packet.validate(),
            ConnectReturnCode::RefusedBadUsernameOrPassword
        );
    }

    #[test]
    fn test_validate_empty_client_id_requires_clean_session() {
        let mut packet = ConnectPacket::new("").unwrap();
        packet.connect_flags.set_clean_session(false);
        assert_eq!(packet.validate(), ConnectReturnCode::RefusedIDRejected);

        packet.connect_flags.set_clean_session(true);
        assert_eq!(packet.validate(), ConnectReturnCode::Accepted);
    }

    #[test]
    fn test_decode_never_fails_on_protocol_violations() {
        // Reserved flag bit set, empty client id, clean_session unset:
        // all protocol violations, none of which should fail decode().
        let buf: Vec<u8> = vec![
            0x10, 0x0D, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut ba = ByteArray::new(&buf);
        let packet = ConnectPacket::decode(&mut ba).unwrap();
        assert!(packet.connect_flags().reserved());
        assert_eq!(packet.validate(), ConnectReturnCode::ProtocolViolation);
    }
}
