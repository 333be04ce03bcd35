#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod kill;
pub mod platform;
pub mod probe;
pub mod process;
pub mod rate;
pub mod snapshot;
