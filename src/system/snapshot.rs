use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::format::{format_gb, format_load, format_percent, format_rate};

use super::probe::HardwareProbe;
use super::rate::{NetworkRates, RateComputer};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub memory_usage: String,
    pub total_memory: String,
    pub used_memory: String,
    pub free_memory: String,
    pub cpu_usage: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiskReport {
    #[serde(rename_all = "camelCase")]
    Usage {
        total_disk: String,
        used_disk: String,
        free_disk: String,
    },
    Missing { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub download_speed: String,
    pub upload_speed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSnapshot {
    pub cpu_usage: String,
}

/// Composes probe reads into the metric groups served to clients.
pub struct SnapshotAggregator {
    probe: Arc<dyn HardwareProbe>,
    rates: RateComputer,
    cpu_window: Duration,
}

impl SnapshotAggregator {
    pub fn new(probe: Arc<dyn HardwareProbe>, rates: RateComputer, cpu_window: Duration) -> Self {
        SnapshotAggregator {
            probe,
            rates,
            cpu_window,
        }
    }

    /// Blocks for one CPU sampling window.
    pub fn stats(&self) -> StatsSnapshot {
        let memory = self.probe.current_memory();
        let used = memory.used_bytes();
        let usage = if memory.total_bytes == 0 {
            0.0
        } else {
            used as f64 / memory.total_bytes as f64 * 100.0
        };

        let cpu_usage = self
            .probe
            .current_cpu_loads(self.cpu_window)
            .into_iter()
            .map(format_load)
            .collect();

        StatsSnapshot {
            memory_usage: format_percent(usage),
            total_memory: format_gb(memory.total_bytes),
            used_memory: format_gb(used),
            free_memory: format_gb(memory.available_bytes),
            cpu_usage,
        }
    }

    pub fn disk(&self) -> DiskReport {
        match self.probe.primary_disk() {
            Some(disk) => DiskReport::Usage {
                total_disk: format_gb(disk.total_bytes),
                used_disk: format_gb(disk.used_bytes()),
                free_disk: format_gb(disk.usable_bytes),
            },
            None => {
                tracing::warn!("no file store enumerated");
                DiskReport::Missing {
                    error: "No disk found".to_string(),
                }
            }
        }
    }

    pub fn network(&self) -> NetworkSnapshot {
        let counters = self.probe.network_counters();
        network_snapshot(
            self.rates
                .compute_network_rates(counters.received_bytes, counters.sent_bytes),
        )
    }

    /// Like [`Self::network`] with an explicit sample time in epoch millis.
    pub fn network_at(&self, now_ms: u64) -> NetworkSnapshot {
        let counters = self.probe.network_counters();
        network_snapshot(
            self.rates
                .compute_at(counters.received_bytes, counters.sent_bytes, now_ms),
        )
    }

    /// Blocks for one CPU sampling window.
    pub fn cpu(&self) -> CpuSnapshot {
        CpuSnapshot {
            cpu_usage: format_load(self.probe.current_overall_cpu_load(self.cpu_window)),
        }
    }
}

fn network_snapshot(rates: NetworkRates) -> NetworkSnapshot {
    NetworkSnapshot {
        download_speed: format_rate(rates.download_kb_per_sec),
        upload_speed: format_rate(rates.upload_kb_per_sec),
    }
}
