use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Well-known ports in the order the common-port sweep visits them.
pub const WELL_KNOWN: [(u16, &str); 14] = [
    (21, "FTP"),
    (22, "SSH"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (123, "NTP"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "Microsoft-ds"),
    (465, "SMTPS"),
    (631, "CUPS"),
    (993, "IMAPS"),
    (995, "POP3"),
];

static SERVICES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| WELL_KNOWN.into_iter().collect());

pub fn service_name(port: u16) -> Option<&'static str> {
    SERVICES.get(&port).copied()
}
