use std::{net::Ipv4Addr, ops::RangeInclusive, time::Instant};

use crate::{error::ScanError, report::Reporter, resolver, scan::Transport};

use super::{SweepReport, Sweeper};

/// Host ids of a /24 worth probing: 0 is the network, 255 the broadcast.
const HOST_IDS: RangeInclusive<u8> = 1..=254;

impl<'e, T: Transport, R: Reporter> Sweeper<'e, T, R> {
    /// Pings the seed and, only if it answers, every host of its /24.
    /// A silent seed yields an empty report.
    pub fn sweep_subnet(&self, seed: &str) -> Result<SweepReport<Ipv4Addr, bool>, ScanError> {
        let now = Instant::now();

        if !self.engine.ping(seed) {
            return Ok(SweepReport::new(Vec::new(), now.elapsed()));
        }

        let [a, b, c, _] = resolver::lookup(seed)?.octets();
        let hosts: Vec<Ipv4Addr> = HOST_IDS.map(|id| Ipv4Addr::new(a, b, c, id)).collect();

        log::debug!("Sweeping {}.{}.{}.0/24", a, b, c);

        let entries = self.fan_out(&hosts, |ip| Ok(self.engine.ping(&ip.to_string())))?;

        Ok(SweepReport::new(entries, now.elapsed()))
    }
}
