//! Parser for the cgroup v2 `cpu.stat` file.
//!
//! The file is a sequence of whitespace-separated key/value lines, e.g.
//!
//! ```text
//! usage_usec 1000000
//! user_usec 600000
//! system_usec 400000
//! ```
//!
//! Unknown keys are ignored so newer kernels do not break parsing; a known
//! key with a non-numeric value is an error.

use std::io::BufRead;

use super::StatParseError;

/// CPU usage counters from `cpu.stat`, in microseconds or period counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuStat {
    /// Total CPU time consumed (user + system).
    pub usage_usec: u64,
    /// Time spent in user space.
    pub user_usec: u64,
    /// Time spent in kernel space.
    pub system_usec: u64,
    /// Number of enforcement periods the cgroup was eligible to run in.
    pub nr_periods: u64,
    /// Number of periods in which the cgroup was throttled.
    pub nr_throttled: u64,
    /// Total time the cgroup was throttled.
    pub throttled_usec: u64,
}

impl CpuStat {
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                let field = match key {
                    "usage_usec" => Some(&mut stat.usage_usec),
                    "user_usec" => Some(&mut stat.user_usec),
                    "system_usec" => Some(&mut stat.system_usec),
                    "nr_periods" => Some(&mut stat.nr_periods),
                    "nr_throttled" => Some(&mut stat.nr_throttled),
                    "throttled_usec" => Some(&mut stat.throttled_usec),
                    _ => None,
                };
                if let Some(field) = field {
                    *field = value.parse::<u64>().map_err(|source| {
                        StatParseError::InvalidKeyValue {
                            key: key.to_string(),
                            value: value.to_string(),
                            line: lineno,
                            source,
                        }
                    })?;
                }
            }
            line.clear();
        }

        Ok(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_cpu_stat() {
        let data = "";
        let stat = CpuStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat, CpuStat::default());
    }

    #[test]
    fn test_parse_complete_cpu_stat() {
        let data = "\
usage_usec 623932088000
user_usec 421230248000
system_usec 202701840000
nr_periods 10
nr_throttled 2
throttled_usec 50000
";
        let stat = CpuStat::from_reader(&mut data.as_bytes()).unwrap();

        assert_eq!(stat.usage_usec, 623_932_088_000);
        assert_eq!(stat.user_usec, 421_230_248_000);
        assert_eq!(stat.system_usec, 202_701_840_000);
        assert_eq!(stat.nr_periods, 10);
        assert_eq!(stat.nr_throttled, 2);
        assert_eq!(stat.throttled_usec, 50_000);
    }

    #[test]
    fn test_parse_partial_cpu_stat() {
        let data = "\
usage_usec 100
user_usec 60
";
        let stat = CpuStat::from_reader(&mut data.as_bytes()).unwrap();

        assert_eq!(stat.usage_usec, 100);
        assert_eq!(stat.user_usec, 60);
        assert_eq!(stat.system_usec, 0); // defaults
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let data = "\
usage_usec 100
nr_bursts 5
burst_usec 123
";
        let stat = CpuStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.usage_usec, 100);
    }

    #[test]
    fn test_parse_invalid_cpu_stat() {
        let data = "\
usage_usec abc
user_usec 42
";
        let err = CpuStat::from_reader(&mut data.as_bytes()).unwrap_err();
        match err {
            StatParseError::InvalidKeyValue {
                key, value, line, ..
            } => {
                assert_eq!(key, "usage_usec");
                assert_eq!(value, "abc");
                assert_eq!(line, 1);
            }
            other => panic!("expected InvalidKeyValue, got {other:?}"),
        }
    }
}
