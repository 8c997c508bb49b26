//! Parser for the cgroup v2 `io.stat` file.
//!
//! Each line describes one block device: a `major:minor` identifier
//! followed by `key=value` pairs, e.g.
//!
//! ```text
//! 8:0 rbytes=1024 wbytes=2048 rios=12 wios=24
//! ```
//!
//! Devices are kept separate so they can be exposed under a `device` label.
//! Unknown keys and malformed pairs are ignored; a known key with a
//! non-numeric value is an error.

use std::io::BufRead;

use super::StatParseError;

/// I/O counters for a single block device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIo {
    /// The `major:minor` device identifier as it appears in the file.
    pub device: String,
    pub rbytes: u64,
    pub wbytes: u64,
    pub rios: u64,
    pub wios: u64,
}

/// Per-device I/O counters from `io.stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IoStat {
    pub devices: Vec<DeviceIo>,
}

impl IoStat {
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            let Some(device) = parts.next() else {
                line.clear();
                continue;
            };

            let mut entry = DeviceIo {
                device: device.to_string(),
                rbytes: 0,
                wbytes: 0,
                rios: 0,
                wios: 0,
            };
            for part in parts {
                let Some((key, value)) = part.split_once('=') else {
                    continue;
                };
                let field = match key {
                    "rbytes" => &mut entry.rbytes,
                    "wbytes" => &mut entry.wbytes,
                    "rios" => &mut entry.rios,
                    "wios" => &mut entry.wios,
                    _ => continue,
                };
                *field = value.parse::<u64>().map_err(|source| {
                    StatParseError::InvalidKeyValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        line: lineno,
                        source,
                    }
                })?;
            }
            stat.devices.push(entry);
            line.clear();
        }

        Ok(stat)
    }
}
