use dashmap::DashMap;

use crate::cache::Session;
use crate::collector::Collector;
use crate::container::ContainerId;

/// A discovered container and the collector holding its stat file handles.
#[derive(Debug)]
pub struct MonitoredContainer {
    collector: Collector,
}

impl MonitoredContainer {
    pub fn new(collector: Collector) -> Self {
        Self { collector }
    }
}

/// Tracks all currently monitored containers and drives their collection.
#[derive(Debug, Default)]
pub struct Monitor {
    containers: DashMap<ContainerId, MonitoredContainer>,
}

impl Monitor {
    pub fn register_container(&self, container_id: ContainerId, container: MonitoredContainer) {
        self.containers.insert(container_id, container);
    }

    pub fn remove_container(&self, container_id: &ContainerId) {
        self.containers.remove(container_id);
    }

    pub fn is_tracking(&self, container_id: &ContainerId) -> bool {
        self.containers.contains_key(container_id)
    }

    pub fn size(&self) -> usize {
        self.containers.len()
    }

    /// Samples every tracked container into the open session. A container
    /// whose stat files can no longer be read is dropped from tracking; its
    /// metrics age out at the session's reset-mode commit.
    pub fn collect(&self, session: &mut Session<'_>) {
        self.containers.retain(|container_id, container| {
            match container.collector.sample(session, container_id) {
                Ok(()) => true,
                Err(err) => {
                    log::error!(
                        target: "container monitor",
                        "failed sampling container stats: container_id={}, error={}",
                        container_id,
                        err
                    );
                    false
                }
            }
        });
    }
}
