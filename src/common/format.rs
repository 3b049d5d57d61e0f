use colored::*;
use std::path::{Path, MAIN_SEPARATOR};

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Binary units from largest to smallest, with the decimals shown for each
const UNITS: &[(u64, &str, usize)] = &[
    (GIB * 1024, "TB", 2),
    (GIB, "GB", 2),
    (MIB, "MB", 2),
    (KIB, "KB", 1),
];

/// Bytes as a human-readable size ("1.50 GB", "12.0 KB", "512 B")
pub fn format_size(bytes: u64) -> String {
    UNITS
        .iter()
        .find(|(scale, _, _)| bytes >= *scale)
        .map(|(scale, unit, decimals)| format!("{:.*} {}", *decimals, bytes as f64 / *scale as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}

/// Size colored by how much it would reclaim: red from 1 GB, yellow from 100 MB
pub fn format_size_colored(bytes: u64) -> ColoredString {
    let text = format_size(bytes);
    match bytes {
        b if b >= GIB => text.red().bold(),
        b if b >= 100 * MIB => text.yellow(),
        _ => text.white(),
    }
}

pub fn format_count(count: usize) -> String {
    match count {
        1 => "1 file".to_string(),
        n => format!("{} files", n),
    }
}

/// Path for display with the home directory shortened to `~`
pub fn format_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~{}{}", MAIN_SEPARATOR, rest.display()),
        None => path.display().to_string(),
    }
}

/// Elapsed scan time: milliseconds under a second, then seconds, then minutes
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        return format!("{:.0}ms", secs * 1000.0);
    }
    if secs < 60.0 {
        return format!("{:.1}s", secs);
    }
    let whole = secs.round() as u64;
    format!("{}m {}s", whole / 60, whole % 60)
}

/// Whole-second wait such as the boost cooldown
pub fn format_wait(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{}s", s),
        s => format!("{}m {:02}s", s / 60, s % 60),
    }
}

pub fn print_header(title: &str) {
    println!();
    println!("  {}", title.bold().underline());
    println!("{}", "─".repeat(60).dimmed());
}

pub fn print_kv(key: &str, value: &str) {
    println!("  {:<14} {}", format!("{}:", key).dimmed(), value);
}

/// Shorten to at most `max_len` characters, ending in "..."
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(&".".repeat(max_len - keep));
    out
}
