use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::format::bytes_to_kb;

/// What to do when a counter goes backwards (interface reset, wrap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeDeltaPolicy {
    /// Report the signed rate as computed.
    #[default]
    PassThrough,
    ClampToZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkCounterState {
    pub last_received_bytes: u64,
    pub last_sent_bytes: u64,
    pub last_sample_time_millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkRates {
    pub download_kb_per_sec: f64,
    pub upload_kb_per_sec: f64,
}

/// Turns cumulative byte counters into KB/s throughput between successive calls.
///
/// The state starts with zero counters, so the first reading after startup is
/// the whole counter value divided by the time since construction.
pub struct RateComputer {
    state: Mutex<NetworkCounterState>,
    policy: NegativeDeltaPolicy,
}

impl RateComputer {
    pub fn new(policy: NegativeDeltaPolicy) -> Self {
        Self::starting_at(now_millis(), policy)
    }

    pub fn starting_at(start_millis: u64, policy: NegativeDeltaPolicy) -> Self {
        RateComputer {
            state: Mutex::new(NetworkCounterState {
                last_received_bytes: 0,
                last_sent_bytes: 0,
                last_sample_time_millis: start_millis,
            }),
            policy,
        }
    }

    pub fn state(&self) -> NetworkCounterState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn compute_network_rates(&self, received: u64, sent: u64) -> NetworkRates {
        self.compute_at(received, sent, now_millis())
    }

    /// Read, compute and replace under a single lock so concurrent callers
    /// never pair one caller's timestamp with another's byte counts.
    ///
    /// A non-positive elapsed time (same millisecond, or the wall clock
    /// stepped back) is treated as one second. The result is then only an
    /// approximation of the true rate.
    pub fn compute_at(&self, received: u64, sent: u64, now_ms: u64) -> NetworkRates {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed_ms = i128::from(now_ms) - i128::from(state.last_sample_time_millis);
        let elapsed_secs = if elapsed_ms <= 0 {
            1.0
        } else {
            elapsed_ms as f64 / 1000.0
        };

        let rates = NetworkRates {
            download_kb_per_sec: self.rate(received, state.last_received_bytes, elapsed_secs),
            upload_kb_per_sec: self.rate(sent, state.last_sent_bytes, elapsed_secs),
        };

        *state = NetworkCounterState {
            last_received_bytes: received,
            last_sent_bytes: sent,
            last_sample_time_millis: now_ms,
        };

        tracing::debug!(
            elapsed_secs,
            download = rates.download_kb_per_sec,
            upload = rates.upload_kb_per_sec,
            "network rate computed"
        );
        rates
    }

    fn rate(&self, current: u64, previous: u64, elapsed_secs: f64) -> f64 {
        let delta = (i128::from(current) - i128::from(previous)) as f64;
        let rate = bytes_to_kb(delta) / elapsed_secs;
        match self.policy {
            NegativeDeltaPolicy::PassThrough => rate,
            NegativeDeltaPolicy::ClampToZero => rate.max(0.0),
        }
    }
}

impl Default for RateComputer {
    fn default() -> Self {
        Self::new(NegativeDeltaPolicy::default())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_megabyte_over_one_second() {
        let rc = RateComputer::starting_at(0, NegativeDeltaPolicy::PassThrough);
        rc.compute_at(0, 0, 1000);
        let rates = rc.compute_at(1_048_576, 0, 2000);
        assert_eq!(rates.download_kb_per_sec, 1024.0);
        assert_eq!(rates.upload_kb_per_sec, 0.0);
    }

    #[test]
    fn rate_scales_with_elapsed_time() {
        let rc = RateComputer::starting_at(1000, NegativeDeltaPolicy::PassThrough);
        let rates = rc.compute_at(2048, 4096, 1500);
        assert_eq!(rates.download_kb_per_sec, 4.0);
        assert_eq!(rates.upload_kb_per_sec, 8.0);
    }

    #[test]
    fn same_millisecond_uses_one_second() {
        let rc = RateComputer::starting_at(5000, NegativeDeltaPolicy::PassThrough);
        let rates = rc.compute_at(10 * 1024, 1024, 5000);
        assert_eq!(rates.download_kb_per_sec, 10.0);
        assert_eq!(rates.upload_kb_per_sec, 1.0);
    }

    #[test]
    fn clock_stepping_back_uses_one_second() {
        let rc = RateComputer::starting_at(5000, NegativeDeltaPolicy::PassThrough);
        let rates = rc.compute_at(1024, 0, 4000);
        assert_eq!(rates.download_kb_per_sec, 1.0);
        assert_eq!(rc.state().last_sample_time_millis, 4000);
    }

    #[test]
    fn counter_reset_passes_through_negative() {
        let rc = RateComputer::starting_at(0, NegativeDeltaPolicy::PassThrough);
        rc.compute_at(10 * 1024, 10 * 1024, 1000);
        let rates = rc.compute_at(0, 5 * 1024, 2000);
        assert_eq!(rates.download_kb_per_sec, -10.0);
        assert_eq!(rates.upload_kb_per_sec, -5.0);
    }

    #[test]
    fn counter_reset_clamps_when_configured() {
        let rc = RateComputer::starting_at(0, NegativeDeltaPolicy::ClampToZero);
        rc.compute_at(10 * 1024, 0, 1000);
        let rates = rc.compute_at(0, 2048, 2000);
        assert_eq!(rates.download_kb_per_sec, 0.0);
        assert_eq!(rates.upload_kb_per_sec, 2.0);
    }

    #[test]
    fn state_is_replaced_after_each_call() {
        let rc = RateComputer::starting_at(0, NegativeDeltaPolicy::PassThrough);
        rc.compute_at(7, 9, 42);
        assert_eq!(
            rc.state(),
            NetworkCounterState {
                last_received_bytes: 7,
                last_sent_bytes: 9,
                last_sample_time_millis: 42,
            }
        );
    }

    #[test]
    fn concurrent_callers_never_tear_state() {
        use std::sync::Arc;
        use std::thread;

        // Bytes move at exactly 1 KB per millisecond, so any sample taken
        // after the stored one reads 1000 KB/s. Out-of-order samples fall back
        // to the one-second interval and read non-positive.
        let rc = Arc::new(RateComputer::starting_at(0, NegativeDeltaPolicy::PassThrough));
        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                let rc = Arc::clone(&rc);
                thread::spawn(move || {
                    (0..200u64)
                        .map(|i| {
                            let t = 1 + i * 8 + worker;
                            let rates = rc.compute_at(t * 1024, t * 2048, t);
                            (rates.download_kb_per_sec, rates.upload_kb_per_sec)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for (down, up) in handle.join().unwrap() {
                let forward = (down - 1000.0).abs() < 1e-6 && (up - 2000.0).abs() < 1e-6;
                let backward = down <= 0.0 && (up - 2.0 * down).abs() < 1e-6;
                assert!(forward || backward, "torn sample: {down} / {up}");
            }
        }

        let state = rc.state();
        assert_eq!(state.last_received_bytes, state.last_sample_time_millis * 1024);
        assert_eq!(state.last_sent_bytes, state.last_sample_time_millis * 2048);
    }
}
