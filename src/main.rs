use std::time::Duration;

use clap::{
    arg, crate_authors, crate_name, crate_version, value_parser, ArgAction, ArgGroup, ArgMatches,
    Command,
};
use hostscan::{
    abort,
    config::ScanConfig,
    error::ScanError,
    is_user_sudo, logger,
    report::{ConsoleReporter, Reporter},
    scan::{service_name, PortStatus, ProbeEngine, RawTransport, Transport},
    sweep::{Cancellation, SweepReport, Sweeper},
};
use pad::PadStr;

enum Operation {
    Ping,
    Subnet,
    Ports(Vec<u16>),
    Common,
    All,
    Web,
}

struct ParsedArgs {
    debug: bool,
    operation: Operation,
    config: ScanConfig,
    deadline: Option<u64>,
    target: String,
}

fn parse_port(raw: &str) -> Result<u16, ScanError> {
    match raw.trim().parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ScanError::InvalidPort(String::from(raw))),
    }
}

fn parse_args(matches: ArgMatches) -> Result<ParsedArgs, ScanError> {
    let debug = matches.get_flag("debug");

    let operation = if matches.get_flag("ping") {
        Operation::Ping
    } else if matches.get_flag("subnet") {
        Operation::Subnet
    } else if matches.get_flag("common") {
        Operation::Common
    } else if matches.get_flag("all") {
        Operation::All
    } else if matches.get_flag("web") {
        Operation::Web
    } else {
        let ports = matches
            .get_many::<String>("port")
            .into_iter()
            .flatten()
            .map(|rp| parse_port(rp))
            .collect::<Result<_, _>>()?;
        Operation::Ports(ports)
    };

    let mut config = ScanConfig::default();
    if matches.get_flag("sequential") {
        config = config.sequential();
    } else if let Some(&workers) = matches.get_one::<usize>("workers") {
        config = config.workers(workers);
    }
    if matches.get_flag("keep-going") {
        config = config.keep_going();
    }

    let deadline = matches.get_one::<u64>("deadline").copied();
    let target = matches
        .get_one::<String>("target")
        .cloned()
        .unwrap_or_default();

    Ok(ParsedArgs {
        debug,
        operation,
        config,
        deadline,
        target,
    })
}

fn print_hosts<I: std::fmt::Display + Copy>(report: &SweepReport<I, bool>) {
    let mut out = format!("\nSweep Duration: {:.4}s\n", report.elapsed.as_secs_f32());
    let live: Vec<I> = report.live().collect();
    if live.is_empty() {
        out.push_str("Didn't find any live host.\n");
    } else {
        out.push_str(&format!("{} of {} hosts live:\n", live.len(), report.len()));
        live.iter().for_each(|ip| out.push_str(&format!("  {}\n", ip)));
    }

    print!("{}", out);
}

fn print_ports(report: &SweepReport<u16, PortStatus>) {
    let mut out = format!("\nScan Duration: {:.4}s\n\n", report.elapsed.as_secs_f32());
    let open: Vec<u16> = report.open().collect();
    if open.is_empty() {
        out.push_str("Didn't find any open port.\n");
    } else {
        out.push_str("Port    State      Service\n");

        open.iter().for_each(|&port| {
            out.push_str(&format!(
                "{:<8}{}{}\n",
                port,
                format!("{}", PortStatus::Open).pad_to_width(11),
                service_name(port).unwrap_or("-"),
            ))
        });
    }
    out.push_str(&format!(
        "\n{} scanned, {} open, {} closed, {} unreachable\n",
        report.len(),
        open.len(),
        report.count(PortStatus::Closed),
        report.count(PortStatus::Unreachable),
    ));

    print!("{}", out);
}

/// Runs one operation. Every error it returns is fatal to the binary.
fn run<T: Transport, R: Reporter>(
    engine: &ProbeEngine<T, R>,
    cancel: Cancellation,
    operation: &Operation,
    target: &str,
) -> Result<(), ScanError> {
    let sweeper = Sweeper::new(engine).cancellation(cancel);

    match operation {
        Operation::Ping => {
            engine.ping(target);
        }
        Operation::Subnet => print_hosts(&sweeper.sweep_subnet(target)?),
        Operation::Ports(ports) if ports.len() == 1 => {
            if engine.scan_port(target, ports[0]) == PortStatus::Unreachable {
                return Err(ScanError::Unresolved(target.into()));
            }
        }
        Operation::Ports(ports) => print_ports(&sweeper.scan_ports(target, ports)?),
        Operation::Common => print_ports(&sweeper.scan_well_known(target)?),
        Operation::All => print_ports(&sweeper.scan_all_ports(target)?),
        Operation::Web => {
            sweeper.scan_web_ports(target)?;
        }
    }

    Ok(())
}

fn main() {
    let arg_matches = Command::new(crate_name!())
        .about(
            "Host discovery and TCP SYN port scanner.\n\
            Raw ICMP and TCP probes require sudo user.",
        )
        .version(crate_version!())
        .arg_required_else_help(true)
        .author(crate_authors!())
        .args([
            // Miscellaneous arguments.
            arg!(-d --debug "Turns on debugging information").action(ArgAction::SetTrue),
            arg!(--sequential "Send one probe at a time").action(ArgAction::SetTrue),
            arg!(-j --workers <N> "Maximum probes in flight during a sweep")
                .value_parser(value_parser!(usize)),
            arg!(--deadline <SECS> "Stop dispatching new probes after this many seconds")
                .value_parser(value_parser!(u64)),
            arg!(-k --"keep-going" "Record unresolvable targets instead of stopping")
                .action(ArgAction::SetTrue),
            arg!([target] "Address or hostname to scan").required(true),
        ])
        .args([
            // Operations.
            arg!(--ping "ICMP echo the target").action(ArgAction::SetTrue),
            arg!(-n --subnet "Ping sweep the /24 of the target").action(ArgAction::SetTrue),
            arg!(-p --port <PORT> "One or more ports separated by a comma").value_delimiter(','),
            arg!(-c --common "Scan the well-known ports").action(ArgAction::SetTrue),
            arg!(-a --all "Scan every port from 1 to 65535").action(ArgAction::SetTrue),
            arg!(-w --web "Look for a website on the general hosting ports")
                .action(ArgAction::SetTrue),
        ])
        .group(
            ArgGroup::new("operation")
                .args(["ping", "subnet", "port", "common", "all", "web"])
                .required(true),
        )
        .get_matches();

    // Extract arguments.
    let parsed = parse_args(arg_matches).unwrap_or_else(|e| abort(e));

    logger::init(parsed.debug);

    // Raw sockets are required by every operation.
    if !is_user_sudo() {
        abort(ScanError::NormalUserRequired);
    }
    let transport = RawTransport::open().unwrap_or_else(|e| abort(e));

    let engine = ProbeEngine::with_config(transport, ConsoleReporter, parsed.config);
    let cancel = match parsed.deadline {
        Some(secs) => Cancellation::after(Duration::from_secs(secs)),
        None => Cancellation::new(),
    };

    if let Err(e) = run(&engine, cancel, &parsed.operation, &parsed.target) {
        abort(e);
    }
}
