//! Container discovery by walking the cgroup v2 hierarchy.
//!
//! Container cgroups are recognized by their directory naming convention
//! (`docker-<id>.scope`, `cri-containerd-<id>.scope`, `libpod-<id>.scope`).
//! Newly seen containers are registered with the [`Monitor`]; containers
//! that disappear are dropped by the monitor itself when their stat files
//! stop reading, and their metrics age out of the reset-mode cache.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::collector::CollectorBuilder;
use crate::container::ContainerId;
use crate::error::ResultOkLogExt;
use crate::monitor::{MonitoredContainer, Monitor};

/// Hex digits in a container id as it appears in a cgroup directory name.
const CONTAINER_ID_LENGTH: usize = 64;

/// Periodically rescanned view of one cgroup v2 subtree.
#[derive(Debug, Clone)]
pub struct Scanner {
    cgroup_root: PathBuf,
}

impl Scanner {
    pub fn new(cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
        }
    }

    /// Walks the cgroup tree once and registers every container directory
    /// not already tracked by the monitor. Unreadable subdirectories are
    /// logged and skipped; only a missing root is an error.
    pub fn scan(&self, monitor: &Monitor) -> std::io::Result<()> {
        let mut stack = VecDeque::new();
        stack.push_back(self.cgroup_root.clone());

        // Surface a broken root eagerly instead of silently scanning nothing.
        std::fs::metadata(&self.cgroup_root)?;

        while let Some(dir) = stack.pop_back() {
            let Some(entries) = std::fs::read_dir(&dir).ok_log("failed to read cgroup directory")
            else {
                continue;
            };
            for entry in entries.flatten() {
                let Some(file_type) = entry.file_type().ok_log("failed to stat cgroup entry")
                else {
                    continue;
                };
                if !file_type.is_dir() {
                    continue;
                }

                let path = entry.path();
                match extract_container_id(&entry.file_name()) {
                    Some(container_id) => {
                        if !monitor.is_tracking(&container_id) {
                            monitor
                                .register_container(container_id, build_container(&path));
                        }
                    }
                    // Container scopes are leaves; everything else may hold
                    // nested slices.
                    None => stack.push_back(path),
                }
            }
        }

        Ok(())
    }
}

/// Opens the container's stat files at the standard cgroup v2 layout. The
/// network file lives in procfs and needs one of the container's PIDs.
fn build_container(path: &Path) -> MonitoredContainer {
    let mut builder = CollectorBuilder::default();
    builder
        .set_cpu_stat_file(path.join("cpu.stat"))
        .set_memory_current_file(path.join("memory.current"))
        .set_memory_max_file(path.join("memory.max"))
        .set_io_stat_file(path.join("io.stat"));
    if let Some(pid) = read_first_pid(path) {
        builder.set_net_dev_file(format!("/proc/{pid}/net/dev"));
    }
    MonitoredContainer::new(builder.build())
}

/// Reads the first PID from the container's `cgroup.procs`. All processes
/// of a container share a network namespace, so one PID suffices for
/// `/proc/<pid>/net/dev`.
fn read_first_pid(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path.join("cgroup.procs")).ok()?;
    content.lines().find_map(|line| line.trim().parse().ok())
}

/// Tries to extract a container id from a cgroup directory name.
///
/// Recognizes Docker, containerd, and Podman scope naming.
fn extract_container_id(name: &OsStr) -> Option<ContainerId> {
    let suffix = b".scope";
    let prefixes: &[&[u8]] = &[b"docker-", b"cri-containerd-", b"libpod-"];

    let name = name.as_bytes();
    for prefix in prefixes {
        if let Some(id_bytes) = extract_id_from_path_bytes(name, prefix, suffix) {
            let id = std::str::from_utf8(id_bytes).ok()?;
            return ContainerId::new(id).ok();
        }
    }
    None
}

/// Returns the id portion of `path_bytes` if it carries the given prefix and
/// suffix around exactly [`CONTAINER_ID_LENGTH`] id bytes.
#[inline]
fn extract_id_from_path_bytes<'a>(
    path_bytes: &'a [u8],
    prefix: &[u8],
    suffix: &[u8],
) -> Option<&'a [u8]> {
    if path_bytes.starts_with(prefix)
        && path_bytes.ends_with(suffix)
        && path_bytes.len() == prefix.len() + CONTAINER_ID_LENGTH + suffix.len()
    {
        return Some(&path_bytes[prefix.len()..(path_bytes.len() - suffix.len())]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_ID: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_extract_valid_container_id() {
        for name in [
            format!("docker-{RAW_ID}.scope"),
            format!("cri-containerd-{RAW_ID}.scope"),
            format!("libpod-{RAW_ID}.scope"),
        ] {
            let id = extract_container_id(OsStr::new(&name)).unwrap();
            assert_eq!(id.as_ref(), RAW_ID);
        }
    }

    #[test]
    fn test_extract_invalid_container_id() {
        for name in [
            "docker-invalid.scope",
            "system.slice",
            "docker-0123.scope",
            "user-1000.slice",
        ] {
            assert!(extract_container_id(OsStr::new(name)).is_none());
        }
    }

    #[test]
    fn test_scan_registers_nested_container() {
        let root = tempfile::tempdir().unwrap();
        let scope = root
            .path()
            .join("system.slice")
            .join(format!("docker-{RAW_ID}.scope"));
        std::fs::create_dir_all(&scope).unwrap();
        std::fs::write(scope.join("cpu.stat"), "usage_usec 1000\n").unwrap();

        let monitor = Monitor::default();
        let scanner = Scanner::new(root.path());
        scanner.scan(&monitor).unwrap();

        let id = ContainerId::new(RAW_ID).unwrap();
        assert!(monitor.is_tracking(&id));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let scope = root.path().join(format!("docker-{RAW_ID}.scope"));
        std::fs::create_dir_all(&scope).unwrap();

        let monitor = Monitor::default();
        let scanner = Scanner::new(root.path());
        scanner.scan(&monitor).unwrap();
        scanner.scan(&monitor).unwrap();
        assert_eq!(monitor.size(), 1);
    }

    #[test]
    fn test_scan_missing_root_is_an_error() {
        let monitor = Monitor::default();
        let scanner = Scanner::new("/definitely/not/a/cgroup/root");
        assert!(scanner.scan(&monitor).is_err());
    }
}
