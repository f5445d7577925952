use std::{
    io::{self, Write},
    net::IpAddr,
};

use colored::Colorize;

/// A classified outcome handed to the output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Live {
        source: IpAddr,
    },
    Down {
        target: String,
    },
    /// `service` is the well-known name of the port, printed on the same line.
    Open {
        target: String,
        port: u16,
        service: Option<&'static str>,
    },
    Closed {
        target: String,
        port: u16,
        service: Option<&'static str>,
    },
    Unreachable {
        target: String,
    },
    WebsiteActive {
        target: String,
        port: u16,
    },
    NoWebsite {
        target: String,
    },
}

/// Output sink for scan outcomes. Implementations own any styling and must
/// tolerate being called from several sweep workers at once.
pub trait Reporter: Sync {
    fn report(&self, event: &Event);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, event: &Event) {
        (**self).report(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _: &Event) {}
}

/// Prints one styled line per event on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    fn label(service: Option<&'static str>) -> String {
        match service {
            Some(name) => format!("{} ", format!("{} scanning:", name).cyan()),
            None => String::new(),
        }
    }

    fn line(event: &Event) -> String {
        match event {
            Event::Live { source } => format!(
                "{}",
                format!("system with ip {} is live", source)
                    .black()
                    .on_green()
            ),
            Event::Down { target } => format!(
                "{}",
                format!("system with ip `{}` is either down or doesn't exist", target)
                    .red()
                    .dimmed()
            ),
            Event::Open {
                target,
                port,
                service,
            } => format!(
                "{}{}",
                Self::label(*service),
                format!("port {} is open on {}", port, target)
                    .black()
                    .on_green()
            ),
            Event::Closed {
                target,
                port,
                service,
            } => format!(
                "{}{}",
                Self::label(*service),
                format!("port {} closed on {}", port, target).red().dimmed()
            ),
            Event::Unreachable { target } => format!(
                "{}",
                format!("{} Name or service not known", target).black().on_red()
            ),
            Event::WebsiteActive { target, port } => format!(
                "{}",
                format!("Website {} active (port {})", target, port)
                    .black()
                    .on_green()
            ),
            Event::NoWebsite { target } => format!(
                "{}",
                format!(
                    "No website running on general hosting ports of {}\nYou may run a full scan for affirmation",
                    target
                )
                .cyan()
            ),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &Event) {
        // Holding the lock keeps lines from concurrent workers whole.
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", Self::line(event)) {
            log::warn!("Failed to write scan output: {}", e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_lines_carry_the_interpolated_values() {
        colored::control::set_override(false);

        let open = ConsoleReporter::line(&Event::Open {
            target: "10.0.0.7".into(),
            port: 22,
            service: Some("SSH"),
        });
        assert_eq!(open, "SSH scanning: port 22 is open on 10.0.0.7");

        let closed = ConsoleReporter::line(&Event::Closed {
            target: "10.0.0.7".into(),
            port: 21,
            service: Some("FTP"),
        });
        assert_eq!(closed, "FTP scanning: port 21 closed on 10.0.0.7");

        let unnamed = ConsoleReporter::line(&Event::Closed {
            target: "10.0.0.7".into(),
            port: 4000,
            service: None,
        });
        assert_eq!(unnamed, "port 4000 closed on 10.0.0.7");

        let down = ConsoleReporter::line(&Event::Down {
            target: "10.0.0.9".into(),
        });
        assert_eq!(down, "system with ip `10.0.0.9` is either down or doesn't exist");

        let unreachable = ConsoleReporter::line(&Event::Unreachable {
            target: "nowhere.invalid".into(),
        });
        assert_eq!(unreachable, "nowhere.invalid Name or service not known");
    }
}
