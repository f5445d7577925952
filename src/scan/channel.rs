use std::{
    io,
    net::{IpAddr, Ipv4Addr, UdpSocket},
};

use pnet::{
    packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    transport::{
        transport_channel, TransportChannelType, TransportProtocol, TransportReceiver,
        TransportSender,
    },
};

use crate::error::ScanError;

const TRANSPORT_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Icmp,
    Tcp,
}

impl Protocol {
    fn next_header(self) -> IpNextHeaderProtocol {
        match self {
            Protocol::Icmp => IpNextHeaderProtocols::Icmp,
            Protocol::Tcp => IpNextHeaderProtocols::Tcp,
        }
    }
}

/// Opens a layer 4 raw channel; the kernel fills in the IPv4 header.
pub fn link(protocol: Protocol) -> Result<(TransportSender, TransportReceiver), ScanError> {
    let kind = TransportChannelType::Layer4(TransportProtocol::Ipv4(protocol.next_header()));

    transport_channel(TRANSPORT_BUFFER_SIZE, kind).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => ScanError::NormalUserRequired,
        _ => ScanError::ChannelFailed(e),
    })
}

/// Local address the kernel routes towards `dest` from. Connecting a UDP
/// socket only consults the routing table, nothing is sent.
pub fn source_for(dest: Ipv4Addr) -> Result<Ipv4Addr, ScanError> {
    let lookup = || -> io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((dest, 9))?;
        Ok(socket.local_addr()?.ip())
    };

    match lookup() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(_)) => Err(ScanError::OnlyIpv4TargetSupported),
        Err(e) => Err(ScanError::SourceLookupFailed(IpAddr::V4(dest), e)),
    }
}
