use super::NativeTermination;

pub struct Platform;

impl NativeTermination for Platform {
    fn kill_command() -> (&'static str, &'static [&'static str]) {
        ("taskkill", &["/PID", "{pid}", "/F"])
    }
}
