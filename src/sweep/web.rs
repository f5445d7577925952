use crate::{
    error::ScanError,
    report::{Event, Reporter},
    scan::{PortStatus, Transport},
};

use super::Sweeper;

/// General web hosting ports. The order decides which one is credited when
/// several are open.
pub const WEB_PORTS: [u16; 3] = [80, 443, 8080];

impl<'e, T: Transport, R: Reporter> Sweeper<'e, T, R> {
    /// Tries the web ports one after another and stops at the first open
    /// one, returning it. Always sequential regardless of the sweep mode.
    pub fn scan_web_ports(&self, address: &str) -> Result<Option<u16>, ScanError> {
        let reporter = self.engine.reporter();

        for port in WEB_PORTS {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            match self.engine.scan_port(address, port) {
                PortStatus::Open => {
                    reporter.report(&Event::WebsiteActive {
                        target: address.into(),
                        port,
                    });
                    return Ok(Some(port));
                }
                PortStatus::Unreachable if self.engine.config().abort_on_unresolved => {
                    return Err(ScanError::Unresolved(address.into()));
                }
                PortStatus::Closed | PortStatus::Unreachable => {}
            }
        }

        reporter.report(&Event::NoWebsite {
            target: address.into(),
        });
        Ok(None)
    }
}
