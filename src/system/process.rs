use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub resident_set_bytes: u64,
    pub cpu_percent: f32,
}

impl ProcessRecord {
    pub fn resident_set_kb(&self) -> u64 {
        self.resident_set_bytes / 1024
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessOrder {
    #[default]
    CpuDesc,
    MemoryDesc,
    Pid,
}

impl ProcessOrder {
    pub fn from_query(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(ProcessOrder::CpuDesc),
            "memory" | "mem" => Some(ProcessOrder::MemoryDesc),
            "pid" => Some(ProcessOrder::Pid),
            _ => None,
        }
    }

    /// Stable sort; ties keep enumeration order. NaN CPU readings sort last.
    pub fn sort(self, records: &mut [ProcessRecord]) {
        match self {
            ProcessOrder::CpuDesc => {
                records.sort_by(|a, b| cmp_cpu_desc(a.cpu_percent, b.cpu_percent))
            }
            ProcessOrder::MemoryDesc => {
                records.sort_by(|a, b| b.resident_set_bytes.cmp(&a.resident_set_bytes))
            }
            ProcessOrder::Pid => records.sort_by_key(|r| r.pid),
        }
    }
}

fn cmp_cpu_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, cpu: f32, rss: u64) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: format!("proc_{pid}"),
            resident_set_bytes: rss,
            cpu_percent: cpu,
        }
    }

    #[test]
    fn cpu_desc_orders_busiest_first() {
        let mut records = vec![record(1, 0.5, 0), record(2, 80.0, 0), record(3, 12.0, 0)];
        ProcessOrder::CpuDesc.sort(&mut records);
        let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 3, 1]);
    }

    #[test]
    fn cpu_desc_is_stable_and_puts_nan_last() {
        let mut records = vec![
            record(1, f32::NAN, 0),
            record(2, 5.0, 0),
            record(3, 5.0, 0),
            record(4, 0.0, 0),
        ];
        ProcessOrder::CpuDesc.sort(&mut records);
        let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn memory_and_pid_orders() {
        let mut records = vec![record(3, 0.0, 10), record(1, 0.0, 30), record(2, 0.0, 20)];
        ProcessOrder::MemoryDesc.sort(&mut records);
        assert_eq!(records[0].pid, 1);
        ProcessOrder::Pid.sort(&mut records);
        assert_eq!(records[0].pid, 1);
        assert_eq!(records[2].pid, 3);
    }

    #[test]
    fn query_names_map_to_orders() {
        assert_eq!(ProcessOrder::from_query("CPU"), Some(ProcessOrder::CpuDesc));
        assert_eq!(ProcessOrder::from_query("mem"), Some(ProcessOrder::MemoryDesc));
        assert_eq!(ProcessOrder::from_query("pid"), Some(ProcessOrder::Pid));
        assert_eq!(ProcessOrder::from_query("name"), None);
    }

    #[test]
    fn resident_set_converts_to_whole_kb() {
        assert_eq!(record(1, 0.0, 4096).resident_set_kb(), 4);
        assert_eq!(record(1, 0.0, 1500).resident_set_kb(), 1);
    }
}
