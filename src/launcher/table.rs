use std::collections::{BTreeSet, HashMap};
use std::time::SystemTime;

use crate::error::{OperationResult, OrchestrationError};
use crate::registry::PortMapping;

/// A container this process started and has not torn down yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainerRecord {
    pub workload: String,
    pub container_id: String,
    pub image: String,
    pub ports: Vec<PortMapping>,
    pub started_at: SystemTime,
}

impl RunningContainerRecord {
    /// First 12 characters of the id, as `docker ps` shows it.
    pub fn short_id(&self) -> &str {
        short(&self.container_id)
    }
}

pub(crate) fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Tracked containers plus the host ports they (or in-flight launches) hold.
#[derive(Debug, Default)]
pub(crate) struct Table {
    records: HashMap<String, RunningContainerRecord>,
    /// host port → description of the holder
    claims: HashMap<u16, String>,
}

impl Table {
    /// Reserve every host port in `ports` for `workload`, or none of them.
    pub fn claim(&mut self, workload: &str, ports: &[PortMapping]) -> OperationResult<()> {
        let mut requested = BTreeSet::new();
        for p in ports {
            if let Some(holder) = self.claims.get(&p.host) {
                return Err(OrchestrationError::PortConflict {
                    port: p.host,
                    holder: holder.clone(),
                });
            }
            if !requested.insert(p.host) {
                return Err(OrchestrationError::PortConflict {
                    port: p.host,
                    holder: format!("`{workload}` (requested twice)"),
                });
            }
        }
        for p in ports {
            self.claims
                .insert(p.host, format!("`{workload}` (launch in progress)"));
        }
        Ok(())
    }

    pub fn release(&mut self, ports: &[PortMapping]) {
        for p in ports {
            self.claims.remove(&p.host);
        }
    }

    /// Turn a reservation into a tracked record.
    pub fn commit(&mut self, record: RunningContainerRecord) {
        let holder = format!("`{}` (container {})", record.workload, record.short_id());
        for p in &record.ports {
            self.claims.insert(p.host, holder.clone());
        }
        self.records.insert(record.container_id.clone(), record);
    }

    pub fn contains(&self, container_id: &str) -> bool {
        self.records.contains_key(container_id)
    }

    pub fn remove(&mut self, container_id: &str) -> Option<RunningContainerRecord> {
        let record = self.records.remove(container_id)?;
        self.release(&record.ports);
        Some(record)
    }

    pub fn snapshot(&self) -> Vec<RunningContainerRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.container_id.cmp(&b.container_id))
        });
        records
    }
}
