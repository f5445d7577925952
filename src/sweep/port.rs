use std::time::Instant;

use crate::{
    error::ScanError,
    report::Reporter,
    scan::{PortStatus, Transport, WELL_KNOWN},
};

use super::{SweepReport, Sweeper};

pub type PortReport = SweepReport<u16, PortStatus>;

impl<'e, T: Transport, R: Reporter> Sweeper<'e, T, R> {
    /// Probes the well-known ports in their canonical order. Each result is
    /// reported together with its service name.
    pub fn scan_well_known(&self, address: &str) -> Result<PortReport, ScanError> {
        let ports: Vec<u16> = WELL_KNOWN.iter().map(|(port, _)| *port).collect();
        self.sweep_ports(address, &ports)
    }

    /// Probes every port from 1 to 65535.
    pub fn scan_all_ports(&self, address: &str) -> Result<PortReport, ScanError> {
        let ports: Vec<u16> = (1..=u16::MAX).collect();
        self.sweep_ports(address, &ports)
    }

    /// Probes a caller supplied list, keeping the caller's order.
    pub fn scan_ports(&self, address: &str, ports: &[u16]) -> Result<PortReport, ScanError> {
        self.sweep_ports(address, ports)
    }

    fn sweep_ports(&self, address: &str, ports: &[u16]) -> Result<PortReport, ScanError> {
        let now = Instant::now();
        let abort = self.engine.config().abort_on_unresolved;

        let entries = self.fan_out(ports, |port| match self.engine.scan_port(address, port) {
            PortStatus::Unreachable if abort => Err(ScanError::Unresolved(address.into())),
            status => Ok(status),
        })?;

        Ok(SweepReport::new(entries, now.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::ScanConfig,
        report::{recording::RecordingReporter, Event},
        scan::{
            mock::{Answer, ScriptedTransport},
            service_name, ProbeEngine, TcpFlags,
        },
        sweep::Cancellation,
    };

    const HOST: &str = "10.0.0.5";

    fn server() -> ScriptedTransport {
        ScriptedTransport::default()
            .answer(HOST, Some(22), Answer::Reply(TcpFlags::SYN_ACK))
            .answer(HOST, Some(443), Answer::Reply(TcpFlags::SYN_ACK))
            .otherwise(Answer::Reply(TcpFlags::RST_ACK))
    }

    #[test]
    fn well_known_sweep_follows_canonical_order() {
        let engine = ProbeEngine::with_config(
            server(),
            RecordingReporter::default(),
            ScanConfig::default().sequential(),
        );
        let report = Sweeper::new(&engine).scan_well_known(HOST).unwrap();

        let ports: Vec<u16> = report.iter().map(|(port, _)| *port).collect();
        let expected: Vec<u16> = WELL_KNOWN.iter().map(|(port, _)| *port).collect();
        assert_eq!(ports, expected);
        assert_eq!(report.open().collect::<Vec<_>>(), [22, 443]);
        assert_eq!(report.count(PortStatus::Closed), 12);

        let events = engine.reporter().events();
        assert_eq!(
            events[..2],
            [
                Event::Closed {
                    target: HOST.into(),
                    port: 21,
                    service: Some("FTP")
                },
                Event::Open {
                    target: HOST.into(),
                    port: 22,
                    service: Some("SSH")
                },
            ]
        );
    }

    #[test]
    fn concurrent_results_keep_their_own_service_name() {
        let transport = server().slow(Duration::from_millis(5));
        let engine = ProbeEngine::with_config(
            transport,
            RecordingReporter::default(),
            ScanConfig::default().workers(8),
        );
        Sweeper::new(&engine).scan_well_known(HOST).unwrap();

        let events = engine.reporter().events();
        assert_eq!(events.len(), WELL_KNOWN.len());
        for event in events {
            match event {
                Event::Open { port, service, .. } | Event::Closed { port, service, .. } => {
                    assert_eq!(service, service_name(port), "port {}", port);
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn full_sweep_covers_the_whole_range_in_order() {
        let engine = ProbeEngine::with_config(
            server(),
            RecordingReporter::default(),
            ScanConfig::default().workers(64),
        );
        let report = Sweeper::new(&engine).scan_all_ports(HOST).unwrap();

        assert_eq!(report.len(), 65535);
        assert!(report.iter().map(|(port, _)| *port).eq(1..=u16::MAX));
        assert_eq!(report.open().collect::<Vec<_>>(), [22, 443]);
        assert_eq!(engine.transport().sent().len(), 65535);
    }

    #[test]
    fn ad_hoc_list_keeps_caller_order() {
        let engine = ProbeEngine::new(server(), RecordingReporter::default());
        let report = Sweeper::new(&engine).scan_ports(HOST, &[8080, 22, 3000]).unwrap();

        assert_eq!(
            report.entries,
            [
                (8080, PortStatus::Closed),
                (22, PortStatus::Open),
                (3000, PortStatus::Closed)
            ]
        );
    }

    #[test]
    fn unresolved_target_aborts_by_default() {
        let transport = ScriptedTransport::default().otherwise(Answer::Unresolvable);
        let engine = ProbeEngine::with_config(
            transport,
            RecordingReporter::default(),
            ScanConfig::default().sequential(),
        );

        let err = Sweeper::new(&engine).scan_well_known("nowhere.invalid").unwrap_err();
        assert!(matches!(err, ScanError::Unresolved(ref host) if host == "nowhere.invalid"));
        assert_eq!(engine.transport().sent().len(), 1);
    }

    #[test]
    fn unresolved_target_is_recorded_when_keeping_going() {
        let transport = ScriptedTransport::default().otherwise(Answer::Unresolvable);
        let config = ScanConfig::default().sequential().keep_going();
        let engine = ProbeEngine::with_config(transport, RecordingReporter::default(), config);

        let report = Sweeper::new(&engine).scan_ports("nowhere.invalid", &[80, 443]).unwrap();
        assert_eq!(report.count(PortStatus::Unreachable), 2);
    }

    #[test]
    fn cancellation_stops_dispatching_ports() {
        let engine = ProbeEngine::new(server(), RecordingReporter::default());
        let report = Sweeper::new(&engine)
            .cancellation(Cancellation::with_deadline(Instant::now()))
            .scan_all_ports(HOST)
            .unwrap();

        assert!(report.is_empty());
        assert!(engine.transport().sent().is_empty());
    }

    fn assert_cut_short(report: &PortReport, sent: usize, limit: usize) {
        assert!(sent >= 100, "only {} ports dispatched", sent);
        assert!(sent < limit, "{} ports dispatched after cancel", sent);
        assert_eq!(report.len(), sent);
        assert!(report
            .iter()
            .zip(report.iter().skip(1))
            .all(|((a, _), (b, _))| a < b));
    }

    #[test]
    fn cancelling_mid_sweep_keeps_finished_ports_sequential() {
        let cancel = Cancellation::new();
        let transport = server().cancel_after(100, cancel.clone());
        let engine = ProbeEngine::with_config(
            transport,
            RecordingReporter::default(),
            ScanConfig::default().sequential(),
        );

        let report = Sweeper::new(&engine)
            .cancellation(cancel)
            .scan_all_ports(HOST)
            .unwrap();

        assert_eq!(engine.transport().sent().len(), 100);
        assert!(report.iter().map(|(port, _)| *port).eq(1..=100));
        assert_cut_short(&report, 100, 101);
    }

    #[test]
    fn cancelling_mid_sweep_keeps_finished_ports_concurrent() {
        let cancel = Cancellation::new();
        let transport = server().cancel_after(100, cancel.clone());
        let engine = ProbeEngine::with_config(
            transport,
            RecordingReporter::default(),
            ScanConfig::default().workers(16),
        );

        let report = Sweeper::new(&engine)
            .cancellation(cancel)
            .scan_all_ports(HOST)
            .unwrap();

        // Ports already past the check when the flag flips still finish.
        let sent = engine.transport().sent().len();
        assert_cut_short(&report, sent, 100 + 16);
    }
}
