use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::probe::{DiskSnapshot, HardwareProbe, MemorySnapshot, NetworkCounters};
use super::process::{ProcessOrder, ProcessRecord};

/// Scripted [`HardwareProbe`] for tests. CPU reads return immediately.
#[derive(Default)]
pub struct FakeProbe {
    pub memory: Option<MemorySnapshot>,
    pub cpu_loads: Vec<f64>,
    pub overall_load: f64,
    pub disk: Option<DiskSnapshot>,
    pub processes: Vec<ProcessRecord>,
    pub kill_outcome: Option<bool>,
    network: Mutex<VecDeque<NetworkCounters>>,
    kills: Mutex<Vec<u32>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(mut self, total_bytes: u64, available_bytes: u64) -> Self {
        self.memory = Some(MemorySnapshot {
            total_bytes,
            available_bytes,
        });
        self
    }

    pub fn with_cpu_loads(mut self, loads: Vec<f64>) -> Self {
        self.cpu_loads = loads;
        self
    }

    pub fn with_overall_load(mut self, load: f64) -> Self {
        self.overall_load = load;
        self
    }

    pub fn with_disk(mut self, total_bytes: u64, usable_bytes: u64) -> Self {
        self.disk = Some(DiskSnapshot {
            total_bytes,
            usable_bytes,
        });
        self
    }

    pub fn with_processes(mut self, processes: Vec<ProcessRecord>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_kill_outcome(mut self, outcome: Option<bool>) -> Self {
        self.kill_outcome = outcome;
        self
    }

    /// Queue counter reads; the last one repeats once the queue drains.
    pub fn with_network(self, reads: Vec<(u64, u64)>) -> Self {
        {
            let mut queue = self.network.lock().unwrap_or_else(|e| e.into_inner());
            queue.extend(reads.into_iter().map(|(rx, tx)| NetworkCounters {
                received_bytes: rx,
                sent_bytes: tx,
            }));
        }
        self
    }

    /// PIDs passed to [`HardwareProbe::signal_kill`], in call order.
    pub fn kills(&self) -> Vec<u32> {
        self.kills.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl HardwareProbe for FakeProbe {
    fn current_memory(&self) -> MemorySnapshot {
        self.memory.unwrap_or(MemorySnapshot {
            total_bytes: 0,
            available_bytes: 0,
        })
    }

    fn current_cpu_loads(&self, _window: Duration) -> Vec<f64> {
        self.cpu_loads.clone()
    }

    fn current_overall_cpu_load(&self, _window: Duration) -> f64 {
        self.overall_load
    }

    fn primary_disk(&self) -> Option<DiskSnapshot> {
        self.disk
    }

    fn network_counters(&self) -> NetworkCounters {
        let mut queue = self.network.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().copied().unwrap_or_default()
        }
    }

    fn list_processes(&self, order: ProcessOrder) -> Vec<ProcessRecord> {
        let mut records = self.processes.clone();
        order.sort(&mut records);
        records
    }

    fn process_exists(&self, pid: u32) -> bool {
        self.processes.iter().any(|p| p.pid == pid)
    }

    fn signal_kill(&self, pid: u32) -> Option<bool> {
        if !self.process_exists(pid) {
            return None;
        }
        self.kills
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(pid);
        self.kill_outcome
    }
}
