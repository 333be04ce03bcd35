use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use sysinfo::{
    CpuRefreshKind, Disks, Networks, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind,
    Signal, System,
};

use super::process::{ProcessOrder, ProcessRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemorySnapshot {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskSnapshot {
    pub total_bytes: u64,
    pub usable_bytes: u64,
}

impl DiskSnapshot {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.usable_bytes)
    }
}

/// Cumulative byte counters summed over every interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkCounters {
    pub received_bytes: u64,
    pub sent_bytes: u64,
}

/// Point-in-time reads from the host. Implementations hold no derived state.
///
/// The CPU accessors block the calling thread for `window` because a load
/// figure needs two time-separated counter reads.
pub trait HardwareProbe: Send + Sync {
    fn current_memory(&self) -> MemorySnapshot;
    /// Per-core load fractions in `0.0..=1.0`, in core order. May be empty.
    fn current_cpu_loads(&self, window: Duration) -> Vec<f64>;
    fn current_overall_cpu_load(&self, window: Duration) -> f64;
    fn primary_disk(&self) -> Option<DiskSnapshot>;
    fn network_counters(&self) -> NetworkCounters;
    fn list_processes(&self, order: ProcessOrder) -> Vec<ProcessRecord>;
    fn process_exists(&self, pid: u32) -> bool;
    /// `None` when the platform offers no library-level kill.
    fn signal_kill(&self, pid: u32) -> Option<bool>;
}

/// [`HardwareProbe`] backed by `sysinfo`. Each concern owns its own handle so
/// a CPU sample in progress does not hold up memory or process reads.
///
/// The `cpu` handle stays locked for the whole sampling window, so concurrent
/// per-core and overall samples run one after the other: two overlapping
/// requests take about two windows.
pub struct SysinfoProbe {
    sys: Mutex<System>,
    cpu: Mutex<System>,
    networks: Mutex<Networks>,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let cpu = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        SysinfoProbe {
            sys: Mutex::new(sys),
            cpu: Mutex::new(cpu),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }

    fn sample_cpu(&self, window: Duration) -> MutexGuard<'_, System> {
        let mut cpu = lock(&self.cpu);
        cpu.refresh_cpu_usage();
        thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        cpu.refresh_cpu_usage();
        cpu
    }
}

impl HardwareProbe for SysinfoProbe {
    fn current_memory(&self) -> MemorySnapshot {
        let mut sys = lock(&self.sys);
        sys.refresh_memory();
        MemorySnapshot {
            total_bytes: sys.total_memory(),
            available_bytes: sys.available_memory(),
        }
    }

    fn current_cpu_loads(&self, window: Duration) -> Vec<f64> {
        let cpu = self.sample_cpu(window);
        cpu.cpus()
            .iter()
            .map(|core| f64::from(core.cpu_usage()) / 100.0)
            .collect()
    }

    fn current_overall_cpu_load(&self, window: Duration) -> f64 {
        let cpu = self.sample_cpu(window);
        f64::from(cpu.global_cpu_usage()) / 100.0
    }

    fn primary_disk(&self) -> Option<DiskSnapshot> {
        let disks = Disks::new_with_refreshed_list();
        disks.list().first().map(|disk| DiskSnapshot {
            total_bytes: disk.total_space(),
            usable_bytes: disk.available_space(),
        })
    }

    fn network_counters(&self) -> NetworkCounters {
        let mut networks = lock(&self.networks);
        networks.refresh(true);
        networks
            .list()
            .values()
            .fold(NetworkCounters::default(), |acc, data| NetworkCounters {
                received_bytes: acc.received_bytes.saturating_add(data.total_received()),
                sent_bytes: acc.sent_bytes.saturating_add(data.total_transmitted()),
            })
    }

    fn list_processes(&self, order: ProcessOrder) -> Vec<ProcessRecord> {
        let mut sys = lock(&self.sys);
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let mut records: Vec<ProcessRecord> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().to_string(),
                resident_set_bytes: process.memory(),
                cpu_percent: process.cpu_usage(),
            })
            .collect();
        order.sort(&mut records);
        records
    }

    fn process_exists(&self, pid: u32) -> bool {
        let sys_pid = Pid::from_u32(pid);
        let mut sys = lock(&self.sys);
        sys.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
        sys.process(sys_pid).is_some()
    }

    fn signal_kill(&self, pid: u32) -> Option<bool> {
        let sys_pid = Pid::from_u32(pid);
        let mut sys = lock(&self.sys);
        sys.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
        let process = sys.process(sys_pid)?;
        match process.kill_with(Signal::Kill) {
            Some(sent) => Some(sent),
            // Signal not supported on this platform, fall back to kill()
            None => Some(process.kill()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_bytes_never_underflow() {
        let mem = MemorySnapshot {
            total_bytes: 10,
            available_bytes: 12,
        };
        assert_eq!(mem.used_bytes(), 0);
        let disk = DiskSnapshot {
            total_bytes: 100,
            usable_bytes: 40,
        };
        assert_eq!(disk.used_bytes(), 60);
    }

    #[test]
    fn sysinfo_probe_reads_do_not_panic() {
        let probe = SysinfoProbe::new();
        let mem = probe.current_memory();
        assert!(mem.used_bytes() <= mem.total_bytes);
        let _ = probe.primary_disk();
        let _ = probe.network_counters();
        let loads = probe.current_cpu_loads(Duration::from_millis(10));
        assert!(loads.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn current_process_is_listed_and_exists() {
        let probe = SysinfoProbe::new();
        let pid = std::process::id();
        let records = probe.list_processes(ProcessOrder::CpuDesc);
        assert!(records.iter().any(|r| r.pid == pid));
        assert!(probe.process_exists(pid));
        assert!(!probe.process_exists(u32::MAX));
        assert_eq!(probe.signal_kill(u32::MAX), None);
    }
}
