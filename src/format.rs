const KB: f64 = 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Binary gigabytes with two decimals, e.g. `"16.00 GB"`.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GB)
}

/// A 0.0..=1.0 load fraction rendered as a two-decimal percentage, e.g. `"42.50"`.
pub fn format_load(fraction: f64) -> String {
    format_percent(fraction * 100.0)
}

pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}")
}

pub fn format_rate(kb_per_sec: f64) -> String {
    format!("{kb_per_sec:.2} KB/s")
}

pub fn bytes_to_kb(bytes: f64) -> f64 {
    bytes / KB
}
