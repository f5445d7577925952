use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

use url::Host;

use crate::error::ScanError;

/// Maps a target (IPv4 literal or hostname) to the first IPv4 address it
/// resolves to.
pub fn lookup(target: &str) -> Result<Ipv4Addr, ScanError> {
    let target = target.trim();

    let ip = match Host::parse(target).map_err(ScanError::HostParseFailed)? {
        Host::Domain(dmn) => (dmn.as_str(), 0 /* dummy port */)
            .to_socket_addrs()
            .map_err(ScanError::ResolverFailed)?
            .find_map(|saddr| match saddr {
                SocketAddr::V4(sip) => Some(*sip.ip()),
                SocketAddr::V6(_) => None,
            })
            .ok_or_else(|| ScanError::DomainLookupFailed(target.into()))?,
        Host::Ipv4(ip) => return Ok(ip),
        Host::Ipv6(_) => return Err(ScanError::OnlyIpv4TargetSupported),
    };

    log::debug!("Found IPv4 `{}` mapped by target `{}`", ip, target);

    Ok(ip)
}
