use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Mutex,
    time::{Duration, Instant},
};

use pnet::{
    packet::{icmp::IcmpPacket, tcp::TcpPacket},
    transport::{icmp_packet_iter, tcp_packet_iter},
};
use rand::Rng;

use crate::{error::ScanError, resolver};

use super::{
    channel::{self, Protocol},
    pckt, ProbeKind, ProbeRequest, Reply, TcpFlags, Transport,
};

const EPHEMERAL_PORTS: std::ops::RangeInclusive<u16> = 49152..=65535;

/// Raw socket transport built on pnet layer 4 channels.
///
/// Every probe opens its own channel, so probes running on different sweep
/// workers never share a socket. Each raw socket sees every inbound packet of
/// its protocol; replies are matched on source address plus ports (TCP) or
/// echo identifier (ICMP).
///
/// The last resolved target is cached, so a sweep over one hostname resolves
/// it once instead of once per port.
#[derive(Debug, Default)]
pub struct RawTransport {
    last: Mutex<Option<(String, Ipv4Addr)>>,
}

impl RawTransport {
    /// Checks up front that raw channels can be opened at all, so a missing
    /// privilege fails once instead of on every probe.
    pub fn open() -> Result<Self, ScanError> {
        for protocol in [Protocol::Icmp, Protocol::Tcp] {
            channel::link(protocol)?;
            log::debug!("Raw {:?} channel available", protocol);
        }

        Ok(Self::default())
    }

    fn resolve(&self, address: &str) -> Result<Ipv4Addr, ScanError> {
        if let Ok(last) = self.last.lock() {
            if let Some((cached, ip)) = last.as_ref() {
                if cached == address {
                    return Ok(*ip);
                }
            }
        }

        // Failures are never cached; the next probe tries again.
        let ip = resolver::lookup(address)?;
        if let Ok(mut last) = self.last.lock() {
            *last = Some((address.into(), ip));
        }

        Ok(ip)
    }

    fn echo(&self, dest: Ipv4Addr, timeout: Duration) -> Result<Option<Reply>, ScanError> {
        let dest_ip = IpAddr::V4(dest);
        let (mut tx, mut rx) = channel::link(Protocol::Icmp)?;

        let identifier: u16 = rand::random();
        let raw = pckt::echo_request(identifier, 1)?;
        let packet = IcmpPacket::new(&raw).ok_or(ScanError::PacketBuildFailed("ICMP"))?;
        tx.send_to(packet, dest_ip)
            .map_err(|e| ScanError::PacketSendFailed(dest_ip, e))?;

        let deadline = Instant::now() + timeout;
        let mut replies = icmp_packet_iter(&mut rx);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match replies.next_with_timeout(remaining) {
                Ok(Some((packet, source))) => {
                    if source == dest_ip && pckt::echo_reply_identifier(&packet) == Some(identifier)
                    {
                        return Ok(Some(Reply::icmp(source)));
                    }
                }
                Ok(None) => return Ok(None),
                Err(e) => return Err(ScanError::PacketRecvFailed(dest_ip, e)),
            }
        }
    }

    fn syn(
        &self,
        dest: Ipv4Addr,
        port: u16,
        timeout: Duration,
    ) -> Result<Option<Reply>, ScanError> {
        let dest_ip = IpAddr::V4(dest);
        let src = channel::source_for(dest)?;
        let (mut tx, mut rx) = channel::link(Protocol::Tcp)?;

        let mut rng = rand::thread_rng();
        let src_port = rng.gen_range(EPHEMERAL_PORTS);
        let raw = pckt::syn(src, dest, src_port, port, rng.gen())?;
        let packet = TcpPacket::new(&raw).ok_or(ScanError::PacketBuildFailed("TCP"))?;
        tx.send_to(packet, dest_ip)
            .map_err(|e| ScanError::PacketSendFailed(dest_ip, e))?;

        let deadline = Instant::now() + timeout;
        let mut replies = tcp_packet_iter(&mut rx);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match replies.next_with_timeout(remaining) {
                Ok(Some((segment, source))) => {
                    if source == dest_ip
                        && segment.get_source() == port
                        && segment.get_destination() == src_port
                    {
                        let flags = TcpFlags::from_bits(u16::from(segment.get_flags()));
                        return Ok(Some(Reply::tcp(source, flags)));
                    }
                }
                Ok(None) => return Ok(None),
                Err(e) => return Err(ScanError::PacketRecvFailed(dest_ip, e)),
            }
        }
    }
}

impl Transport for RawTransport {
    fn send(&self, request: &ProbeRequest) -> Result<Option<Reply>, ScanError> {
        let dest = self.resolve(&request.target.address)?;

        match request.kind {
            ProbeKind::IcmpEcho => self.echo(dest, request.timeout),
            ProbeKind::TcpSyn => {
                let port = request
                    .target
                    .port
                    .ok_or_else(|| ScanError::InvalidPort(request.target.to_string()))?;
                self.syn(dest, port, request.timeout)
            }
        }
    }
}
