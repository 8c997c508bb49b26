//! Parser for `/proc/<pid>/net/dev`.
//!
//! After two header lines, each line holds an interface name followed by 16
//! counters; receive bytes/packets are the first two, transmit
//! bytes/packets are fields 9 and 10. Interfaces are kept separate so they
//! can be exposed under an `interface` label.

use std::io::BufRead;

/// Interface name prefixes that carry no container-attributable traffic.
const IGNORED_INTERFACES: [&str; 2] = ["lo", "veth"];

/// Traffic counters for a single network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStat {
    pub interface: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// Per-interface traffic counters from one `/proc/<pid>/net/dev` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkStat {
    pub interfaces: Vec<InterfaceStat>,
}

fn is_ignored_interface(interface: &str) -> bool {
    IGNORED_INTERFACES
        .iter()
        .any(|prefix| interface.starts_with(prefix))
}

/// Extracts the four counters of interest from the data fields of one
/// interface line. Returns `None` when the line is too short; individual
/// unparsable fields count as zero, mirroring how the kernel pads the file.
fn stats_from_fields<'a>(
    interface: &str,
    mut fields: impl Iterator<Item = &'a str>,
) -> Option<InterfaceStat> {
    let rx_bytes = fields.next()?.parse().unwrap_or(0);
    let rx_packets = fields.next()?.parse().unwrap_or(0);
    // Skip rx_errs through rx_multicast to reach the transmit block.
    let tx_bytes = fields.nth(6)?.parse().unwrap_or(0);
    let tx_packets = fields.next()?.parse().unwrap_or(0);
    Some(InterfaceStat {
        interface: interface.to_string(),
        rx_bytes,
        rx_packets,
        tx_bytes,
        tx_packets,
    })
}

impl NetworkStat {
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let mut line = String::new();

        // Skip the two header lines.
        for _ in 0..2 {
            buf.read_line(&mut line)?;
            line.clear();
        }

        while buf.read_line(&mut line)? != 0 {
            if let Some((interface, fields)) = line.trim().split_once(':') {
                if !is_ignored_interface(interface) {
                    if let Some(entry) = stats_from_fields(interface, fields.split_whitespace()) {
                        stat.interfaces.push(entry);
                    }
                }
            }
            line.clear();
        }

        Ok(stat)
    }
}
