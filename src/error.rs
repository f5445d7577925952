use std::net::IpAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("port `{0}` is invalid")]
    InvalidPort(String),
    #[error("failed to check target kind (ensure it's a domain or IPv4)")]
    HostParseFailed(#[source] url::ParseError),
    #[error("failed to resolve the given target: {0}")]
    ResolverFailed(#[source] std::io::Error),
    #[error("resolver didn't find any IPv4 address mapped by `{0}`")]
    DomainLookupFailed(String),
    #[error("only supports IPv4 addresses or domains that map addresses with this IP version")]
    OnlyIpv4TargetSupported,
    #[error("{0} Name or service not known")]
    Unresolved(String),
    #[error("you must run the scanner as sudo")]
    NormalUserRequired,
    #[error("failed to create socket: {0}")]
    ChannelFailed(#[source] std::io::Error),
    #[error("failed to find a source address towards `{0}`: {1}")]
    SourceLookupFailed(IpAddr, #[source] std::io::Error),
    #[error("failed to build {0} packet")]
    PacketBuildFailed(&'static str),
    #[error("failed to send packet to `{0}`: {1}")]
    PacketSendFailed(IpAddr, #[source] std::io::Error),
    #[error("failed to receive packet from `{0}`: {1}")]
    PacketRecvFailed(IpAddr, #[source] std::io::Error),
    #[error("failed to start worker pool: {0}")]
    WorkerPoolFailed(#[source] rayon::ThreadPoolBuildError),
}

impl ScanError {
    /// Whether the error means the target could not be mapped to an address,
    /// as opposed to a local socket or I/O failure.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            ScanError::HostParseFailed(_)
                | ScanError::ResolverFailed(_)
                | ScanError::DomainLookupFailed(_)
                | ScanError::OnlyIpv4TargetSupported
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn resolution_errors_are_told_apart_from_io_errors() {
        assert!(ScanError::DomainLookupFailed("nowhere.invalid".into()).is_resolution());
        assert!(ScanError::OnlyIpv4TargetSupported.is_resolution());
        assert!(!ScanError::NormalUserRequired.is_resolution());

        let ip = IpAddr::from([10, 0, 0, 1]);
        let err = ScanError::PacketSendFailed(ip, io::Error::from(io::ErrorKind::Other));
        assert!(!err.is_resolution());
    }

    #[test]
    fn unresolved_message_names_the_target() {
        let err = ScanError::Unresolved("nowhere.invalid".into());
        assert_eq!(err.to_string(), "nowhere.invalid Name or service not known");
    }
}
