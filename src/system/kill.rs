use std::fmt;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::KillConfig;

use super::platform;
use super::probe::HardwareProbe;
use super::process::{ProcessOrder, ProcessRecord};

const WAIT_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillError {
    InvalidPid(i64),
    Spawn { program: String, reason: String },
    NonZeroExit(Option<i32>),
    TimedOut(Duration),
    Wait(String),
    NotFound(u32),
    Refused(u32),
    Disabled(u32),
}

impl fmt::Display for KillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KillError::InvalidPid(pid) => write!(f, "PID {pid} cannot be terminated"),
            KillError::Spawn { program, reason } => {
                write!(f, "Cannot run program \"{program}\": {reason}")
            }
            KillError::NonZeroExit(_) => write!(f, "Command failed"),
            KillError::TimedOut(timeout) => {
                write!(f, "Command timed out after {} ms", timeout.as_millis())
            }
            KillError::Wait(reason) => write!(f, "Failed waiting for command: {reason}"),
            KillError::NotFound(pid) => write!(f, "Process {pid} not found"),
            KillError::Refused(pid) => {
                write!(f, "Failed to kill PID {pid} (permission denied?)")
            }
            KillError::Disabled(pid) => {
                write!(f, "Library-level kill of PID {pid} is not enabled")
            }
        }
    }
}

impl std::error::Error for KillError {}

/// One way of ending a process.
pub trait TerminationStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn terminate(&self, pid: u32) -> Result<(), KillError>;
}

/// Runs the platform kill command and waits for it, bounded by `timeout`.
pub struct NativeCommand {
    argv: Vec<String>,
    timeout: Duration,
}

impl NativeCommand {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        NativeCommand { argv, timeout }
    }

    pub fn platform_default(timeout: Duration) -> Self {
        Self::new(platform::native_kill_argv(), timeout)
    }

    fn command_for(&self, pid: u32) -> Result<Command, KillError> {
        let (program, args) = self.argv.split_first().ok_or_else(|| KillError::Spawn {
            program: String::new(),
            reason: "empty command".to_string(),
        })?;
        let pid = pid.to_string();
        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(|arg| arg.replace("{pid}", &pid)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(cmd)
    }
}

impl TerminationStrategy for NativeCommand {
    fn name(&self) -> &'static str {
        "native"
    }

    fn terminate(&self, pid: u32) -> Result<(), KillError> {
        let mut child = self
            .command_for(pid)?
            .spawn()
            .map_err(|e| KillError::Spawn {
                program: self.argv.first().cloned().unwrap_or_default(),
                reason: e.to_string(),
            })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    tracing::debug!(pid, code = ?status.code(), "kill command exited");
                    return Err(KillError::NonZeroExit(status.code()));
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(WAIT_POLL),
                Ok(None) => {
                    abandon(&mut child);
                    return Err(KillError::TimedOut(self.timeout));
                }
                Err(err) => {
                    abandon(&mut child);
                    return Err(KillError::Wait(err.to_string()));
                }
            }
        }
    }
}

/// Kills and reaps a command we stopped waiting on, so it never lingers as a zombie.
fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Looks the process up through the probe and, when `enabled`, signals it
/// directly. Disabled by default: most hosts refuse this without privileges.
pub struct LibraryFallback {
    probe: Arc<dyn HardwareProbe>,
    enabled: bool,
}

impl LibraryFallback {
    pub fn new(probe: Arc<dyn HardwareProbe>, enabled: bool) -> Self {
        LibraryFallback { probe, enabled }
    }
}

impl TerminationStrategy for LibraryFallback {
    fn name(&self) -> &'static str {
        "library"
    }

    fn terminate(&self, pid: u32) -> Result<(), KillError> {
        if !self.probe.process_exists(pid) {
            return Err(KillError::NotFound(pid));
        }
        if !self.enabled {
            return Err(KillError::Disabled(pid));
        }
        match self.probe.signal_kill(pid) {
            Some(true) => Ok(()),
            Some(false) => Err(KillError::Refused(pid)),
            None => Err(KillError::NotFound(pid)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationResult {
    Terminated { pid: u32, via: &'static str },
    Failed { pid: i64, error: KillError },
}

impl TerminationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminationResult::Terminated { .. })
    }

    pub fn message(&self) -> String {
        match self {
            TerminationResult::Terminated { pid, .. } => {
                format!("Process with PID {pid} terminated.")
            }
            TerminationResult::Failed { error, .. } => {
                format!("Failed to terminate process: {error}")
            }
        }
    }
}

enum KillPhase {
    Attempt,
    Fallback(KillError),
    Done(TerminationResult),
}

pub struct ProcessController {
    probe: Arc<dyn HardwareProbe>,
    primary: Box<dyn TerminationStrategy>,
    fallback: Box<dyn TerminationStrategy>,
}

impl ProcessController {
    pub fn new(
        probe: Arc<dyn HardwareProbe>,
        primary: Box<dyn TerminationStrategy>,
        fallback: Box<dyn TerminationStrategy>,
    ) -> Self {
        ProcessController {
            probe,
            primary,
            fallback,
        }
    }

    pub fn from_config(probe: Arc<dyn HardwareProbe>, config: &KillConfig) -> Self {
        let primary = match &config.command {
            Some(argv) => NativeCommand::new(argv.clone(), config.timeout()),
            None => NativeCommand::platform_default(config.timeout()),
        };
        let fallback = LibraryFallback::new(Arc::clone(&probe), config.library_fallback);
        Self::new(probe, Box::new(primary), Box::new(fallback))
    }

    pub fn list_processes(&self, order: ProcessOrder) -> Vec<ProcessRecord> {
        self.probe.list_processes(order)
    }

    /// Native command first; any failure of it, nonzero exit included,
    /// moves on to the fallback. The reported error is the native one.
    ///
    /// Anything outside `1..=i32::MAX` is refused outright: the native
    /// command would read it as a process group or as -1.
    pub fn terminate(&self, requested: i64) -> TerminationResult {
        let pid = match u32::try_from(requested) {
            Ok(pid) if pid != 0 && i32::try_from(pid).is_ok() => pid,
            _ => {
                return TerminationResult::Failed {
                    pid: requested,
                    error: KillError::InvalidPid(requested),
                };
            }
        };

        let mut phase = KillPhase::Attempt;
        loop {
            phase = match phase {
                KillPhase::Attempt => match self.primary.terminate(pid) {
                    Ok(()) => KillPhase::Done(TerminationResult::Terminated {
                        pid,
                        via: self.primary.name(),
                    }),
                    Err(err) => {
                        tracing::warn!(
                            pid,
                            strategy = self.primary.name(),
                            %err,
                            "termination failed"
                        );
                        KillPhase::Fallback(err)
                    }
                },
                KillPhase::Fallback(primary_err) => match self.fallback.terminate(pid) {
                    Ok(()) => KillPhase::Done(TerminationResult::Terminated {
                        pid,
                        via: self.fallback.name(),
                    }),
                    Err(err) => {
                        tracing::warn!(
                            pid,
                            strategy = self.fallback.name(),
                            %err,
                            "fallback termination failed"
                        );
                        KillPhase::Done(TerminationResult::Failed {
                            pid: requested,
                            error: primary_err,
                        })
                    }
                },
                KillPhase::Done(result) => {
                    if result.is_success() {
                        tracing::info!(pid, "process terminated");
                    }
                    return result;
                }
            };
        }
    }
}
