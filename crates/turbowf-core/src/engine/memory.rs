use std::fs;
use tracing::trace;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Bytes of memory currently available to new allocations, if the platform
/// reports it.
pub fn available_memory() -> Option<u64> {
    let content = fs::read_to_string(MEMINFO_PATH).ok()?;
    let bytes = parse_meminfo(&content);
    trace!("Available memory from {}: {:?}", MEMINFO_PATH, bytes);
    bytes
}

fn parse_meminfo(content: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix("MemAvailable:")?;
        let mut parts = rest.split_whitespace();
        let value: u64 = parts.next()?.parse().ok()?;
        match parts.next() {
            Some("kB") | Some("KB") => value.checked_mul(1024),
            None => Some(value),
            Some(_) => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mem_available_in_kilobytes() {
        let content = "MemTotal:       16314020 kB\nMemFree:         1200000 kB\nMemAvailable:    8000000 kB\n";
        assert_eq!(parse_meminfo(content), Some(8_000_000 * 1024));
    }

    #[test]
    fn missing_field_yields_none() {
        assert_eq!(parse_meminfo("MemTotal: 10 kB\n"), None);
    }
}
