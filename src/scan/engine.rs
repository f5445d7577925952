use crate::{
    config::ScanConfig,
    report::{Event, Reporter},
};

use super::{port::service_name, PortStatus, ProbeRequest, ProbeResult, Transport};

/// Builds single probes, hands them to a [`Transport`] and classifies what
/// comes back. Every probe is attempted exactly once.
pub struct ProbeEngine<T, R> {
    transport: T,
    reporter: R,
    config: ScanConfig,
}

impl<T: Transport, R: Reporter> ProbeEngine<T, R> {
    pub fn new(transport: T, reporter: R) -> Self {
        Self::with_config(transport, reporter, ScanConfig::default())
    }

    pub fn with_config(transport: T, reporter: R, config: ScanConfig) -> Self {
        Self {
            transport,
            reporter,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn dispatch(&self, request: &ProbeRequest) -> ProbeResult {
        log::debug!("Sending {} probe to `{}`", request.kind, request.target);

        match self.transport.send(request) {
            Ok(Some(reply)) => ProbeResult::Reply(reply),
            Ok(None) => ProbeResult::NoReply,
            Err(e) if e.is_resolution() => ProbeResult::ResolutionError {
                reason: e.to_string(),
            },
            Err(e) => {
                log::warn!("{} probe to `{}` failed: {}", request.kind, request.target, e);
                ProbeResult::NoReply
            }
        }
    }

    /// ICMP echo liveness check. Unresolvable targets count as down.
    pub fn ping(&self, address: &str) -> bool {
        let request = ProbeRequest::icmp(address, self.config.ping_timeout);

        match self.dispatch(&request) {
            ProbeResult::Reply(reply) => {
                self.reporter.report(&Event::Live {
                    source: reply.source,
                });
                true
            }
            ProbeResult::NoReply | ProbeResult::ResolutionError { .. } => {
                self.reporter.report(&Event::Down {
                    target: address.into(),
                });
                false
            }
        }
    }

    /// Sends a TCP SYN and returns whatever came back, unclassified.
    pub fn scan_raw(&self, address: &str, port: u16) -> ProbeResult {
        let request = ProbeRequest::syn(address, port, self.config.tcp_timeout);
        self.dispatch(&request)
    }

    /// Classifies a TCP SYN probe and reports it. A target that can't be
    /// resolved yields [`PortStatus::Unreachable`]; the caller decides whether
    /// that ends the scan.
    pub fn scan_port(&self, address: &str, port: u16) -> PortStatus {
        let result = self.scan_raw(address, port);
        let status = PortStatus::classify(&result);

        let event = match status {
            PortStatus::Open => Event::Open {
                target: address.into(),
                port,
                service: service_name(port),
            },
            PortStatus::Closed => Event::Closed {
                target: address.into(),
                port,
                service: service_name(port),
            },
            PortStatus::Unreachable => {
                if let ProbeResult::ResolutionError { reason } = &result {
                    log::debug!("Couldn't resolve `{}`: {}", address, reason);
                }
                Event::Unreachable {
                    target: address.into(),
                }
            }
        };
        self.reporter.report(&event);

        status
    }
}
