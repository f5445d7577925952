use std::{
    fmt::{Debug, Display},
    net::IpAddr,
    time::Duration,
};

use crate::error::ScanError;

pub use self::{
    engine::ProbeEngine,
    port::{service_name, WELL_KNOWN},
    raw::RawTransport,
};

mod channel;
mod engine;
mod pckt;
mod port;
mod raw;

/// An address (IPv4 literal or hostname) and, for TCP probes, a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub address: String,
    pub port: Option<u16>,
}

impl Target {
    pub fn host(address: &str) -> Self {
        Self {
            address: address.into(),
            port: None,
        }
    }

    pub fn with_port(address: &str, port: u16) -> Self {
        Self {
            address: address.into(),
            port: Some(port),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.address, port),
            None => write!(f, "{}", self.address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    IcmpEcho,
    TcpSyn,
}

impl Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProbeKind::IcmpEcho => "ICMP echo",
                ProbeKind::TcpSyn => "TCP SYN",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub target: Target,
    pub kind: ProbeKind,
    pub timeout: Duration,
}

impl ProbeRequest {
    pub fn icmp(address: &str, timeout: Duration) -> Self {
        Self {
            target: Target::host(address),
            kind: ProbeKind::IcmpEcho,
            timeout,
        }
    }

    pub fn syn(address: &str, port: u16, timeout: Duration) -> Self {
        Self {
            target: Target::with_port(address, port),
            kind: ProbeKind::TcpSyn,
            timeout,
        }
    }
}

/// TCP control bits carried by a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpFlags(u16);

impl TcpFlags {
    pub const FIN: TcpFlags = TcpFlags(0x01);
    pub const SYN: TcpFlags = TcpFlags(0x02);
    pub const RST: TcpFlags = TcpFlags(0x04);
    pub const ACK: TcpFlags = TcpFlags(0x10);
    pub const SYN_ACK: TcpFlags = TcpFlags(0x12);
    pub const RST_ACK: TcpFlags = TcpFlags(0x14);

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, other: TcpFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A response received before the probe's timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub source: IpAddr,
    /// Only set for replies to TCP probes.
    pub tcp_flags: Option<TcpFlags>,
}

impl Reply {
    pub fn icmp(source: IpAddr) -> Self {
        Self {
            source,
            tcp_flags: None,
        }
    }

    pub fn tcp(source: IpAddr, flags: TcpFlags) -> Self {
        Self {
            source,
            tcp_flags: Some(flags),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Reply(Reply),
    NoReply,
    ResolutionError { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    Open,
    Closed,
    Unreachable,
}

impl PortStatus {
    /// SYN+ACK means open. RST, any other flag combination, or silence means
    /// closed. A target that can't be resolved is unreachable.
    pub fn classify(result: &ProbeResult) -> Self {
        match result {
            ProbeResult::Reply(Reply {
                tcp_flags: Some(flags),
                ..
            }) if flags.contains(TcpFlags::SYN_ACK) && !flags.contains(TcpFlags::RST) => {
                PortStatus::Open
            }
            ProbeResult::Reply(_) | ProbeResult::NoReply => PortStatus::Closed,
            ProbeResult::ResolutionError { .. } => PortStatus::Unreachable,
        }
    }
}

impl Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PortStatus::Open => "open",
                PortStatus::Closed => "closed",
                PortStatus::Unreachable => "unreachable",
            }
        )
    }
}

/// Sends a single probe and waits for a single reply.
///
/// Implementations must give up once `request.timeout` elapses and return
/// `Ok(None)`. A target that can't be resolved must surface as an error for
/// which [`ScanError::is_resolution`] holds, never as a missing reply.
pub trait Transport: Sync {
    fn send(&self, request: &ProbeRequest) -> Result<Option<Reply>, ScanError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ProbeRequest) -> Result<Option<Reply>, ScanError> {
        (**self).send(request)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{collections::HashMap, net::IpAddr, sync::Mutex, thread, time::Duration};

    use super::{ProbeKind, ProbeRequest, Reply, TcpFlags, Transport};
    use crate::{error::ScanError, sweep::Cancellation};

    /// What the scripted transport answers for a given target.
    #[derive(Debug, Clone, Copy)]
    pub enum Answer {
        Reply(TcpFlags),
        Echo,
        Silence,
        Unresolvable,
    }

    /// Answers from a fixed script and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedTransport {
        answers: HashMap<(String, Option<u16>), Answer>,
        pub fallback: Option<Answer>,
        pub sent: Mutex<Vec<ProbeRequest>>,
        delay: Option<Duration>,
        cancel_after: Option<(usize, Cancellation)>,
    }

    impl ScriptedTransport {
        pub fn answer(mut self, address: &str, port: Option<u16>, answer: Answer) -> Self {
            self.answers.insert((address.into(), port), answer);
            self
        }

        pub fn otherwise(mut self, answer: Answer) -> Self {
            self.fallback = Some(answer);
            self
        }

        /// Holds every answer back for `delay`.
        pub fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Trips `cancel` once `count` requests have been sent.
        pub fn cancel_after(mut self, count: usize, cancel: Cancellation) -> Self {
            self.cancel_after = Some((count, cancel));
            self
        }

        pub fn sent(&self) -> Vec<ProbeRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &ProbeRequest) -> Result<Option<Reply>, ScanError> {
            {
                let mut sent = self.sent.lock().unwrap();
                sent.push(request.clone());
                if let Some((count, cancel)) = &self.cancel_after {
                    if sent.len() >= *count {
                        cancel.cancel();
                    }
                }
            }
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }

            let key = (request.target.address.clone(), request.target.port);
            let answer = self
                .answers
                .get(&key)
                .copied()
                .or(self.fallback)
                .unwrap_or(Answer::Silence);

            let source = request
                .target
                .address
                .parse::<IpAddr>()
                .unwrap_or(IpAddr::from([127, 0, 0, 1]));

            match (answer, request.kind) {
                (Answer::Reply(flags), ProbeKind::TcpSyn) => Ok(Some(Reply::tcp(source, flags))),
                (Answer::Echo, ProbeKind::IcmpEcho) => Ok(Some(Reply::icmp(source))),
                (Answer::Unresolvable, _) => Err(ScanError::DomainLookupFailed(
                    request.target.address.clone(),
                )),
                _ => Ok(None),
            }
        }
    }
}
