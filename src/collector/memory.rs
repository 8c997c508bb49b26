//! Parsers for the single-value cgroup v2 memory files.
//!
//! `memory.current` carries one numeric value (usage in bytes);
//! `memory.max` carries either a numeric limit or the keyword `max` for
//! "no limit".

use std::io::BufRead;

use super::StatParseError;

/// Current memory usage from `memory.current`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub usage_bytes: u64,
}

impl MemoryUsage {
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let line = line.trim();
        let usage_bytes = line
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: line.to_string(),
                line: 1,
                source,
            })?;

        Ok(Self { usage_bytes })
    }
}

/// Memory limit from `memory.max`. `None` means the `max` keyword, i.e. no
/// limit is configured.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryLimit {
    pub limit_bytes: Option<u64>,
}

impl MemoryLimit {
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let limit_bytes = match line.trim() {
            "max" => None,
            value => Some(value.parse::<u64>().map_err(|source| {
                StatParseError::InvalidValue {
                    value: value.to_string(),
                    line: 1,
                    source,
                }
            })?),
        };

        Ok(Self { limit_bytes })
    }
}
