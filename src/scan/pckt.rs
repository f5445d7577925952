use std::net::Ipv4Addr;

use pnet::packet::{
    icmp::{
        self,
        echo_request::{IcmpCodes, MutableEchoRequestPacket},
        IcmpPacket, IcmpTypes,
    },
    tcp::{self, MutableTcpPacket, TcpFlags},
    Packet,
};

use crate::error::ScanError;

const ICMP_ECHO_HDR_SZ: usize = 8;
const ICMP_PAYLOAD: &[u8] = b"hostscan";

const TCP_HDR_SZ: usize = 20;
const TCP_HDR_WORDS: u8 = (TCP_HDR_SZ / 4) as u8;
const TCP_WINDOW: u16 = 64240;

/// ICMP echo request carrying `identifier` so the reply can be matched.
pub fn echo_request(identifier: u16, sequence: u16) -> Result<Vec<u8>, ScanError> {
    let mut raw = vec![0; ICMP_ECHO_HDR_SZ + ICMP_PAYLOAD.len()];

    {
        let mut echo =
            MutableEchoRequestPacket::new(&mut raw).ok_or(ScanError::PacketBuildFailed("ICMP"))?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCodes::NoCode);
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        echo.set_payload(ICMP_PAYLOAD);
    }

    let checksum = {
        let generic = IcmpPacket::new(&raw).ok_or(ScanError::PacketBuildFailed("ICMP"))?;
        icmp::checksum(&generic)
    };
    MutableEchoRequestPacket::new(&mut raw)
        .ok_or(ScanError::PacketBuildFailed("ICMP"))?
        .set_checksum(checksum);

    Ok(raw)
}

/// Bare TCP SYN segment. The checksum covers the IPv4 pseudo header, so the
/// source address must be the one the kernel will route the probe from.
pub fn syn(
    src: Ipv4Addr,
    dest: Ipv4Addr,
    src_port: u16,
    dest_port: u16,
    sequence: u32,
) -> Result<Vec<u8>, ScanError> {
    let mut raw = vec![0; TCP_HDR_SZ];

    {
        let mut segment =
            MutableTcpPacket::new(&mut raw).ok_or(ScanError::PacketBuildFailed("TCP"))?;
        segment.set_source(src_port);
        segment.set_destination(dest_port);
        segment.set_sequence(sequence);
        segment.set_acknowledgement(0);
        segment.set_data_offset(TCP_HDR_WORDS);
        segment.set_flags(TcpFlags::SYN);
        segment.set_window(TCP_WINDOW);
        segment.set_urgent_ptr(0);
        let checksum = tcp::ipv4_checksum(&segment.to_immutable(), &src, &dest);
        segment.set_checksum(checksum);
    }

    Ok(raw)
}

/// Returns the identifier of an echo reply, or `None` for any other ICMP type.
pub fn echo_reply_identifier(packet: &IcmpPacket) -> Option<u16> {
    use pnet::packet::icmp::echo_reply::EchoReplyPacket;

    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }
    EchoReplyPacket::new(packet.packet()).map(|reply| reply.get_identifier())
}
