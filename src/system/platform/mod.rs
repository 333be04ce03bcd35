//! Native process-termination command for the host platform.

pub trait NativeTermination {
    /// Program and argument template; `{pid}` is replaced with the target PID.
    fn kill_command() -> (&'static str, &'static [&'static str]);
}

#[cfg(not(target_os = "windows"))]
mod unix;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(not(target_os = "windows"))]
use unix as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn native_kill_argv() -> Vec<String> {
    let (program, args) = platform_impl::Platform::kill_command();
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_argv_targets_pid_placeholder() {
        let argv = native_kill_argv();
        assert!(!argv.is_empty());
        assert!(argv.iter().any(|a| a == "{pid}"));
    }
}
