//! Per-container stat collection feeding the metric cache.
//!
//! A [`Collector`] keeps the container's cgroup v2 stat files open and
//! rewinds them after every read, so the per-interval hot path re-reads
//! without reopening anything. [`Collector::sample`] parses each file and
//! inserts the resulting metric families into an open cache session; the
//! cache's reset-mode pruning then retires families of containers that stop
//! being sampled.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

mod cpu;
mod error;
mod io;
mod memory;
mod net;

pub use cpu::CpuStat;
pub use error::{CollectError, StatParseError};
pub use io::{DeviceIo, IoStat};
pub use memory::{MemoryLimit, MemoryUsage};
pub use net::{InterfaceStat, NetworkStat};

use crate::cache::{Session, Value};
use crate::container::ContainerId;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Samples one container's cgroup and procfs stat files into the cache.
#[derive(Debug)]
pub struct Collector {
    cpu_stat: Option<BufReader<File>>,
    memory_current: Option<BufReader<File>>,
    memory_max: Option<BufReader<File>>,
    io_stat: Option<BufReader<File>>,
    net_dev: Option<BufReader<File>>,
}

impl Collector {
    /// Reads every available stat file and inserts the parsed samples into
    /// the open session, labeled with the container id. Missing files are
    /// skipped; a file that fails to read or parse aborts the sample with
    /// an error (the session stays usable, the partial inserts age out at
    /// the next reset-mode commit if the container is dropped).
    pub fn sample(
        &mut self,
        session: &mut Session<'_>,
        id: &ContainerId,
    ) -> Result<(), CollectError> {
        let id_labels = ["id"];
        let id_values = [id.as_ref()];

        if let Some(cpu) = read_and_rewind(self.cpu_stat.as_mut(), CpuStat::from_reader)? {
            session.insert(
                "container_cpu_usage_seconds_total",
                &id_labels,
                &id_values,
                "Cumulative CPU time consumed by the container in seconds.",
                Value::Counter(cpu.usage_usec as f64 / MICROS_PER_SECOND),
                None,
            )?;
            session.insert(
                "container_cpu_user_seconds_total",
                &id_labels,
                &id_values,
                "Cumulative user CPU time consumed by the container in seconds.",
                Value::Counter(cpu.user_usec as f64 / MICROS_PER_SECOND),
                None,
            )?;
            session.insert(
                "container_cpu_system_seconds_total",
                &id_labels,
                &id_values,
                "Cumulative system CPU time consumed by the container in seconds.",
                Value::Counter(cpu.system_usec as f64 / MICROS_PER_SECOND),
                None,
            )?;
            session.insert(
                "container_cpu_periods_total",
                &id_labels,
                &id_values,
                "Number of elapsed CPU enforcement intervals.",
                Value::Counter(cpu.nr_periods as f64),
                None,
            )?;
            session.insert(
                "container_cpu_throttled_periods_total",
                &id_labels,
                &id_values,
                "Number of throttled CPU enforcement intervals.",
                Value::Counter(cpu.nr_throttled as f64),
                None,
            )?;
        }

        if let Some(usage) = read_and_rewind(self.memory_current.as_mut(), MemoryUsage::from_reader)?
        {
            session.insert(
                "container_memory_usage_bytes",
                &id_labels,
                &id_values,
                "Current memory usage of the container in bytes.",
                Value::Gauge(usage.usage_bytes as f64),
                None,
            )?;
        }

        if let Some(limit) = read_and_rewind(self.memory_max.as_mut(), MemoryLimit::from_reader)? {
            // No family at all when the limit is "max"; an absent series is
            // clearer than a sentinel value.
            if let Some(limit_bytes) = limit.limit_bytes {
                session.insert(
                    "container_memory_limit_bytes",
                    &id_labels,
                    &id_values,
                    "Memory limit of the container in bytes.",
                    Value::Gauge(limit_bytes as f64),
                    None,
                )?;
            }
        }

        if let Some(io) = read_and_rewind(self.io_stat.as_mut(), IoStat::from_reader)? {
            let labels = ["device", "id", "op"];
            for dev in &io.devices {
                for (op, bytes, ops) in [
                    ("read", dev.rbytes, dev.rios),
                    ("write", dev.wbytes, dev.wios),
                ] {
                    let values = [dev.device.as_str(), id.as_ref(), op];
                    session.insert(
                        "container_blkio_bytes_total",
                        &labels,
                        &values,
                        "Cumulative block I/O in bytes.",
                        Value::Counter(bytes as f64),
                        None,
                    )?;
                    session.insert(
                        "container_blkio_ops_total",
                        &labels,
                        &values,
                        "Cumulative block I/O operations.",
                        Value::Counter(ops as f64),
                        None,
                    )?;
                }
            }
        }

        if let Some(net) = read_and_rewind(self.net_dev.as_mut(), NetworkStat::from_reader)? {
            let labels = ["id", "interface"];
            for iface in &net.interfaces {
                let values = [id.as_ref(), iface.interface.as_str()];
                for (family, help, count) in [
                    (
                        "container_network_receive_bytes_total",
                        "Cumulative bytes received.",
                        iface.rx_bytes,
                    ),
                    (
                        "container_network_receive_packets_total",
                        "Cumulative packets received.",
                        iface.rx_packets,
                    ),
                    (
                        "container_network_transmit_bytes_total",
                        "Cumulative bytes transmitted.",
                        iface.tx_bytes,
                    ),
                    (
                        "container_network_transmit_packets_total",
                        "Cumulative packets transmitted.",
                        iface.tx_packets,
                    ),
                ] {
                    session.insert(
                        family,
                        &labels,
                        &values,
                        help,
                        Value::Counter(count as f64),
                        None,
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// Reads from a stat file, applies the parser, and rewinds the cursor so the
/// next interval re-reads from the start. Returns `Ok(None)` for files that
/// were never opened.
fn read_and_rewind<T, R, E>(
    file: Option<&mut R>,
    reader: impl FnOnce(&mut R) -> Result<T, E>,
) -> Result<Option<T>, E>
where
    R: BufRead + Seek,
    E: From<std::io::Error>,
{
    if let Some(f) = file {
        let result = reader(f)?;
        f.seek(SeekFrom::Start(0))?;
        Ok(Some(result))
    } else {
        Ok(None)
    }
}

#[inline]
fn open_file(path: impl AsRef<std::path::Path>) -> Option<BufReader<File>> {
    Some(BufReader::new(File::open(path).ok()?))
}

/// Builds a [`Collector`] from stat file paths; paths that cannot be opened
/// leave the corresponding source unset.
#[derive(Debug, Default)]
pub struct CollectorBuilder {
    cpu_stat: Option<BufReader<File>>,
    memory_current: Option<BufReader<File>>,
    memory_max: Option<BufReader<File>>,
    io_stat: Option<BufReader<File>>,
    net_dev: Option<BufReader<File>>,
}

impl CollectorBuilder {
    /// Sets the path to the `cpu.stat` file.
    pub fn set_cpu_stat_file(&mut self, path: impl AsRef<std::path::Path>) -> &mut Self {
        self.cpu_stat = open_file(path);
        self
    }

    /// Sets the path to the `memory.current` file.
    pub fn set_memory_current_file(&mut self, path: impl AsRef<std::path::Path>) -> &mut Self {
        self.memory_current = open_file(path);
        self
    }

    /// Sets the path to the `memory.max` file.
    pub fn set_memory_max_file(&mut self, path: impl AsRef<std::path::Path>) -> &mut Self {
        self.memory_max = open_file(path);
        self
    }

    /// Sets the path to the `io.stat` file.
    pub fn set_io_stat_file(&mut self, path: impl AsRef<std::path::Path>) -> &mut Self {
        self.io_stat = open_file(path);
        self
    }

    /// Sets the path to the container's `/proc/<pid>/net/dev` file.
    pub fn set_net_dev_file(&mut self, path: impl AsRef<std::path::Path>) -> &mut Self {
        self.net_dev = open_file(path);
        self
    }

    pub fn build(self) -> Collector {
        Collector {
            cpu_stat: self.cpu_stat,
            memory_current: self.memory_current,
            memory_max: self.memory_max,
            io_stat: self.io_stat,
            net_dev: self.net_dev,
        }
    }
}
