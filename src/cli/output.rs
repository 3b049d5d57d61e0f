use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;

use crate::boost::{BoostResult, BoostStatus};
use crate::browsers::{BrowserCleanResult, BrowserCloseResult, BrowserRecord};
use crate::cleaner::{CleanResult, DeleteOutcome};
use crate::common::format::{self, format_path, format_size, format_size_colored};
use crate::common::fs::Filesystem;
use crate::scanner::catalog::Catalog;
use crate::scanner::{self, DiskItem, FileEntry, ScanResult};

/// Envelope for `scan --format json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanReport<'a> {
    scanned_at: DateTime<Utc>,
    duration_secs: f64,
    total_size: u64,
    categories: &'a ScanResult,
}

/// Envelope for `clean --format json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanReport<'a> {
    cleaned_at: DateTime<Utc>,
    dry_run: bool,
    total_freed: u64,
    categories: &'a CleanResult,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing JSON: {}", e),
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

/// Print scan results in human-readable format
pub fn print_scan_results(result: &ScanResult, duration_secs: f64, detailed: bool) {
    let total = scanner::total_size(result);
    let files: usize = result.values().map(|c| c.files.len()).sum();

    println!();
    println!("  {}", "Padma Scan Results".bold());
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned in {}  •  {} reclaimable  •  {}",
        format::format_duration(duration_secs).cyan(),
        format_size_colored(total),
        format::format_count(files).dimmed()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if total == 0 {
        println!("  {} Nothing to reclaim.", "✨");
        println!();
        return;
    }

    let mut rows: Vec<_> = result.iter().collect();
    rows.sort_by(|a, b| b.1.size.cmp(&a.1.size));

    for (name, scan) in rows {
        let marker = if scan.size > 0 { "●".green() } else { "○".dimmed() };
        println!(
            "  {} {:<20} {:>12}  {}",
            marker,
            name,
            format_size_colored(scan.size),
            format::format_count(scan.files.len()).dimmed()
        );
        if scan.skipped > 0 {
            println!(
                "      {} {} entries could not be read",
                "⚠".yellow(),
                scan.skipped
            );
        }
        if scan.cancelled {
            println!("      {} scan stopped early", "⚠".yellow());
        }
        if detailed {
            for file in scan.files.iter().take(20) {
                println!("      {} {}", "→".dimmed(), format::truncate(&format_path(file), 70).dimmed());
            }
            if scan.files.len() > 20 {
                println!("      {} ... and {} more", "→".dimmed(), scan.files.len() - 20);
            }
        }
    }

    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!("  {} Total reclaimable: {}", "💾", format_size_colored(total));
    println!("  {} Run {} to reclaim it", "💡", "padma clean".cyan());
    println!();
}

pub fn print_scan_json(result: &ScanResult, duration_secs: f64) {
    print_json(&ScanReport {
        scanned_at: Utc::now(),
        duration_secs,
        total_size: scanner::total_size(result),
        categories: result,
    });
}

/// One line per category: `<bytes>\t<category>`
pub fn print_scan_quiet(result: &ScanResult) {
    for (name, scan) in result {
        println!("{}\t{}", scan.size, name);
    }
}

// ─── Clean ────────────────────────────────────────────────────────────────────

pub fn print_clean_results(result: &CleanResult, dry_run: bool) {
    let total: u64 = result.values().map(|c| c.freed_space).sum();
    let verb = if dry_run { "Would free" } else { "Freed" };

    println!();
    for (name, outcome) in result {
        if outcome.success {
            println!(
                "  {} {:<20} {:>12}",
                "✓".green(),
                name,
                format_size(outcome.freed_space)
            );
        } else {
            println!("  {} {:<20} {}", "✗".red(), name, "failed".red());
        }
        if outcome.failed > 0 {
            println!(
                "      {} {} entries were locked or in use and were left in place",
                "⚠".yellow(),
                outcome.failed
            );
        }
        if let Some(err) = &outcome.error {
            println!("      {} {}", "→".dimmed(), err.dimmed());
        }
    }
    println!();
    println!("  {} {}: {}", "💾", verb, format_size_colored(total));
    println!();
}

pub fn print_clean_json(result: &CleanResult, dry_run: bool) {
    print_json(&CleanReport {
        cleaned_at: Utc::now(),
        dry_run,
        total_freed: result.values().map(|c| c.freed_space).sum(),
        categories: result,
    });
}

pub fn print_clean_quiet(result: &CleanResult) {
    for (name, outcome) in result {
        println!("{}\t{}\t{}", outcome.freed_space, name, if outcome.success { "ok" } else { "failed" });
    }
}

// ─── Delete ───────────────────────────────────────────────────────────────────

pub fn print_delete(outcome: &DeleteOutcome, path: &std::path::Path) {
    if outcome.success {
        println!("  {} Deleted {}", "✓".green(), format_path(path));
    } else {
        println!(
            "  {} {}",
            "✗".red(),
            outcome.error.as_deref().unwrap_or("Delete failed").red()
        );
    }
}

// ─── Boost ────────────────────────────────────────────────────────────────────

pub fn print_boost(result: &BoostResult) {
    if result.success {
        let freed = result.freed_memory.map(format_size).unwrap_or_else(|| "unknown".into());
        println!("  {} Memory boost done, freed {}", "✓".green(), freed.bold());
        if result.hard_applied == Some(false) && result.mode == Some(crate::boost::BoostMode::Hard) {
            println!(
                "  {} Hard mode needs administrator rights; only the soft trim ran",
                "⚠".yellow()
            );
        }
    } else if let Some(remaining) = result.cooldown_remaining {
        println!(
            "  {} Boost is cooling down, try again in {}",
            "⏳",
            format::format_wait(remaining).cyan()
        );
    } else {
        println!(
            "  {} {}",
            "✗".red(),
            result.error.as_deref().unwrap_or("Boost failed").red()
        );
    }
}

pub fn print_boost_status(status: &BoostStatus) {
    if status.can_boost {
        println!("  {} Boost available", "✓".green());
    } else {
        println!(
            "  {} Next boost in {}",
            "⏳",
            format::format_wait(status.remaining_seconds).cyan()
        );
    }
}

// ─── Browsers ─────────────────────────────────────────────────────────────────

pub fn print_browsers(records: &[BrowserRecord]) {
    format::print_header("Installed Browsers");

    if records.is_empty() {
        println!("  No supported browsers found.");
        println!();
        return;
    }

    for record in records {
        let state = if record.is_running {
            "running".yellow()
        } else {
            "closed".dimmed()
        };
        println!("  {} {} ({})", "●".cyan(), record.display_name.bold(), state);
        format::print_kv("    Cache", &format_size(record.cache_size));
        format::print_kv("    Cookies", &format!("~{}", record.cookie_count));
        format::print_kv("    History", &format!("~{} entries", record.history_count));
        println!();
    }
    println!(
        "  {} Counts are estimated from database size",
        "ℹ".dimmed()
    );
    println!();
}

pub fn print_browser_clean(result: &BrowserCleanResult, name: &str) {
    if result.success {
        println!(
            "  {} Cleaned {}, freed {}",
            "✓".green(),
            name,
            format_size(result.freed_space.unwrap_or(0)).bold()
        );
    } else {
        if let Some(freed) = result.freed_space.filter(|f| *f > 0) {
            println!("  {} Partially cleaned {}, freed {}", "⚠".yellow(), name, format_size(freed));
        }
        println!(
            "  {} {}",
            "✗".red(),
            result.error.as_deref().unwrap_or("Browser clean failed").red()
        );
    }
}

pub fn print_browser_close(result: &BrowserCloseResult, name: &str) {
    if result.success {
        println!("  {} {} is closed", "✓".green(), name);
    } else {
        println!(
            "  {} {}",
            "✗".red(),
            result.error.as_deref().unwrap_or("Could not close browser").red()
        );
    }
}

// ─── Largest / Analyze ────────────────────────────────────────────────────────

pub fn print_largest(files: &[FileEntry]) {
    format::print_header("Largest Files");

    if files.is_empty() {
        println!("  No files above the size threshold.");
        println!();
        return;
    }

    for (i, file) in files.iter().enumerate() {
        println!(
            "  {:>3}. {:>12}  {}",
            i + 1,
            format_size_colored(file.size),
            format::truncate(&format_path(&file.path), 70)
        );
    }
    println!();
}

pub fn print_tree(item: &DiskItem) {
    println!();
    println!("  {} {}", format_path(&item.path).bold(), format_size_colored(item.size));
    print_children(item, 1);
    println!();
}

fn print_children(item: &DiskItem, indent: usize) {
    for child in &item.children {
        let name = if child.is_directory {
            format!("{}/", child.name).blue().to_string()
        } else {
            child.name.clone()
        };
        println!("  {}{:>12}  {}", "  ".repeat(indent), format_size(child.size), name);
        print_children(child, indent + 1);
    }
}

// ─── Categories ───────────────────────────────────────────────────────────────

pub fn print_categories(catalog: &Catalog, fs: &dyn Filesystem) {
    format::print_header("Categories");

    for spec in catalog.iter() {
        let tag = if spec.user_defined { " (config)".dimmed().to_string() } else { String::new() };
        println!("  {} {}{}  {}", "●".cyan(), spec.name.bold(), tag, spec.description.dimmed());
        let roots = spec.resolve_roots(fs);
        if roots.is_empty() && spec.kind == crate::scanner::catalog::CategoryKind::Walk {
            println!("      {} no roots on this system", "→".dimmed());
        }
        for root in roots {
            let exists = if fs.exists(&root) { "" } else { " (missing)" };
            println!("      {} {}{}", "→".dimmed(), format_path(&root), exists.dimmed());
        }
    }

    let overlaps = catalog.overlapping_roots(fs);
    if !overlaps.is_empty() {
        println!();
        for o in overlaps {
            println!(
                "  {} {} and {} share {}; they are cleaned one after the other",
                "⚠".yellow(),
                o.first,
                o.second,
                format_path(&o.second_root)
            );
        }
    }
    println!();
}
