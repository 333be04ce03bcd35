use super::NativeTermination;

pub struct Platform;

impl NativeTermination for Platform {
    // The shell builtin is used so hosts without a standalone `kill` binary work too.
    fn kill_command() -> (&'static str, &'static [&'static str]) {
        ("sh", &["-c", "kill -9 \"$0\"", "{pid}"])
    }
}
