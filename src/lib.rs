// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Encoder/decoder for MQTT 3.1.1 control packets.
//!
//! Parsing is permissive by design: malformed *wire* data (truncated
//! input, an out-of-range QoS byte, a reserved fixed-header flag bit set
//! wrong) fails `decode()` immediately, but CONNECT-specific protocol
//! violations (bad protocol name/level, reserved connect-flag bit, an
//! empty client id without `clean_session`) never do — they surface only
//! through [`ConnectPacket::validate`], mirroring how a real broker would
//! still parse the packet before deciding how to answer it.

mod binary_data;
mod byte_array;
mod codec;
mod connect_ack_packet;
mod connect_flags;
mod connect_packet;
mod control_packet;
mod disconnect_packet;
mod error;
mod header;
mod packet_id;
mod ping_request_packet;
mod ping_response_packet;
mod publish_ack_packet;
mod publish_complete_packet;
mod publish_packet;
mod publish_received_packet;
mod publish_release_packet;
mod qos;
mod string_data;
mod subscribe_ack_packet;
mod subscribe_packet;
mod topic;
mod u16_data;
mod unsubscribe_ack_packet;
mod unsubscribe_packet;
pub mod utils;
mod var_int;

pub use binary_data::BinaryData;
pub use byte_array::{ByteArray, ByteArrayError};
pub use codec::{DecodePacket, EncodePacket};
pub use connect_ack_packet::{ConnectAckPacket, ConnectReturnCode};
pub use connect_flags::ConnectFlags;
pub use connect_packet::{ConnectPacket, PROTOCOL_LEVEL, PROTOCOL_NAME};
pub use control_packet::{
    new_control_packet, new_with_header, read_packet, write_packet, ControlPacket,
};
pub use disconnect_packet::DisconnectPacket;
pub use error::{DecodeError, EncodeError};
pub use header::{FixedHeader, Packet, PacketType};
pub use packet_id::PacketId;
pub use ping_request_packet::PingRequestPacket;
pub use ping_response_packet::PingResponsePacket;
pub use publish_ack_packet::PublishAckPacket;
pub use publish_complete_packet::PublishCompletePacket;
pub use publish_packet::PublishPacket;
pub use publish_received_packet::PublishReceivedPacket;
pub use publish_release_packet::PublishReleasePacket;
pub use qos::QoS;
pub use string_data::StringData;
pub use subscribe_ack_packet::{SubscribeAck, SubscribeAckPacket};
pub use subscribe_packet::{SubscribePacket, SubscribeTopic};
pub use topic::Topic;
pub use u16_data::U16Data;
pub use unsubscribe_ack_packet::UnsubscribeAckPacket;
pub use unsubscribe_packet::UnsubscribePacket;
pub use var_int::{VarInt, VarIntError, MAX_PACKET_LEN};
