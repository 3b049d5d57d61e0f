use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use padma::api::Padma;
use padma::boost::BoostMode;
use padma::browsers::BrowserCleanOptions;
use padma::cleaner::engine::CategoryClean;
use padma::cleaner::CleanOptions;
use padma::cli::args::{Cli, Commands, CompletionShell, ConfigAction, OutputFormat};
use padma::cli::output;
use padma::common::config::{Config, DeletePolicy};
use padma::common::format;
use padma::scanner::{self, CategoryScan};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _log_guard = init_logging(cli.verbose);

    match &cli.command {
        Commands::Config { action } => return cmd_config(action),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load()?;
    let format = if cli.quiet {
        OutputFormat::Quiet
    } else {
        cli.format.unwrap_or_else(|| OutputFormat::from(&config.output_format))
    };
    let padma = Padma::new(config);

    match &cli.command {
        Commands::Scan {
            categories,
            detailed,
        } => cmd_scan(&padma, format, categories, *detailed),

        Commands::Clean {
            categories,
            yes,
            dry_run,
        } => cmd_clean(&padma, format, categories, *yes, *dry_run),

        Commands::Delete {
            path,
            permanent,
            yes,
        } => cmd_delete(&padma, format, path, *permanent, *yes),

        Commands::Boost { mode } => cmd_boost(&padma, format, *mode),

        Commands::BoostStatus => {
            let status = padma.boost_status();
            match format {
                OutputFormat::Human => output::print_boost_status(&status),
                OutputFormat::Json => output::print_json(&status),
                OutputFormat::Quiet => println!("{}", status.remaining_seconds),
            }
            Ok(())
        }

        Commands::Browsers => {
            let records = padma.discover_browsers();
            match format {
                OutputFormat::Human => output::print_browsers(&records),
                OutputFormat::Json => output::print_json(&records),
                OutputFormat::Quiet => {
                    for r in &records {
                        println!("{}\t{}", r.cache_size, r.name);
                    }
                }
            }
            Ok(())
        }

        Commands::BrowserClean {
            name,
            cache,
            cookies,
            history,
            yes,
        } => {
            // Cache only when nothing was picked
            let options = if !cache && !cookies && !history {
                BrowserCleanOptions {
                    cache: true,
                    ..Default::default()
                }
            } else {
                BrowserCleanOptions {
                    cache: *cache,
                    cookies: *cookies,
                    history: *history,
                }
            };
            cmd_browser_clean(&padma, format, name, options, *yes)
        }

        Commands::CloseBrowser { name, yes } => cmd_close_browser(&padma, format, name, *yes),

        Commands::Largest {
            path,
            limit,
            min_mb,
        } => {
            let root = padma.locations().expand(path);
            if !root.exists() {
                anyhow::bail!("Path does not exist: {}", root.display());
            }
            let limit = limit.unwrap_or(padma.config().largest_files_limit);
            let min_size = min_mb
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or_else(|| padma.config().large_file_threshold_bytes());

            let files = padma.largest_files(&root, limit, min_size);
            match format {
                OutputFormat::Human => output::print_largest(&files),
                OutputFormat::Json => output::print_json(&files),
                OutputFormat::Quiet => {
                    for f in &files {
                        println!("{}\t{}", f.size, f.path.display());
                    }
                }
            }
            Ok(())
        }

        Commands::Analyze { path, depth } => {
            let root = padma.locations().expand(path);
            let depth = depth.unwrap_or(padma.config().analyze_depth);
            let Some(tree) = padma.analyze(&root, depth) else {
                anyhow::bail!("Path does not exist: {}", root.display());
            };
            match format {
                OutputFormat::Human => output::print_tree(&tree),
                OutputFormat::Json => output::print_json(&tree),
                OutputFormat::Quiet => println!("{}\t{}", tree.size, tree.path.display()),
            }
            Ok(())
        }

        Commands::Categories => {
            match format {
                OutputFormat::Human => output::print_categories(padma.catalog(), padma.filesystem()),
                OutputFormat::Json => output::print_json(&padma.catalog().names().collect::<Vec<_>>()),
                OutputFormat::Quiet => {
                    for name in padma.catalog().names() {
                        println!("{}", name);
                    }
                }
            }
            Ok(())
        }

        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

/// Console logging on `--verbose`, plus a daily log file under the data dir.
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let console_filter = if verbose {
        EnvFilter::new("padma=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("padma=warn"))
    };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(console_filter);

    let logs_dir = Config::logs_dir();
    if std::fs::create_dir_all(&logs_dir).is_err() {
        tracing_subscriber::registry().with(console).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logs_dir, "padma.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("padma=info"));

    tracing_subscriber::registry().with(console).with(file).init();
    Some(guard)
}

fn progress_bar(len: usize, format: OutputFormat) -> Option<ProgressBar> {
    if format != OutputFormat::Human {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━░"),
    );
    Some(pb)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("\n  {} {} [y/N] ", "❓", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    if input.trim().eq_ignore_ascii_case("y") {
        Ok(true)
    } else {
        println!("  {} Cancelled", "✗".red());
        Ok(false)
    }
}

/// Names the request resolves to, for sizing the progress bar
fn requested(padma: &Padma, categories: &[String]) -> Vec<String> {
    if categories.is_empty() {
        padma.catalog().names().map(String::from).collect()
    } else {
        categories.to_vec()
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(padma: &Padma, format: OutputFormat, categories: &[String], detailed: bool) -> Result<()> {
    let names = requested(padma, categories);
    let pb = progress_bar(names.len(), format);
    let started = Instant::now();

    let on_done = |name: &str, _: &CategoryScan| {
        if let Some(pb) = &pb {
            pb.set_message(name.to_string());
            pb.inc(1);
        }
    };
    let results = padma.scan_with(
        &names,
        Some(&on_done as &(dyn Fn(&str, &CategoryScan) + Sync)),
        None,
    );
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let elapsed = started.elapsed().as_secs_f64();
    match format {
        OutputFormat::Human => output::print_scan_results(&results, elapsed, detailed),
        OutputFormat::Json => output::print_scan_json(&results, elapsed),
        OutputFormat::Quiet => output::print_scan_quiet(&results),
    }
    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(
    padma: &Padma,
    format: OutputFormat,
    categories: &[String],
    yes: bool,
    dry_run: bool,
) -> Result<()> {
    let names = requested(padma, categories);

    if !yes && !dry_run {
        let preview = padma.scan(&names);
        let total = scanner::total_size(&preview);
        if total == 0 {
            if format == OutputFormat::Human {
                println!("  {} Nothing to reclaim.", "✨");
            }
            return Ok(());
        }
        let prompt = format!(
            "Delete {} from {} categories?",
            format::format_size(total),
            preview.values().filter(|c| c.size > 0).count()
        );
        if !confirm(&prompt)? {
            return Ok(());
        }
    }

    let options = CleanOptions {
        dry_run,
        ..CleanOptions::from_config(padma.config())
    };
    let pb = progress_bar(names.len(), format);
    let on_done = |name: &str, _: &CategoryClean| {
        if let Some(pb) = &pb {
            pb.set_message(name.to_string());
            pb.inc(1);
        }
    };
    let results = padma.clean_with(&names, options, Some(&on_done as &dyn Fn(&str, &CategoryClean)));
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    match format {
        OutputFormat::Human => output::print_clean_results(&results, dry_run),
        OutputFormat::Json => output::print_clean_json(&results, dry_run),
        OutputFormat::Quiet => output::print_clean_quiet(&results),
    }
    Ok(())
}

// ─── Delete ───────────────────────────────────────────────────────────────────

fn cmd_delete(padma: &Padma, format: OutputFormat, path: &str, permanent: bool, yes: bool) -> Result<()> {
    let target = padma.locations().expand(path);
    let policy = if permanent {
        DeletePolicy::Permanent
    } else {
        padma.config().single_delete
    };

    if !yes {
        let verb = match policy {
            DeletePolicy::Permanent => "Permanently delete",
            DeletePolicy::Trash => "Move to recycle bin",
        };
        if !confirm(&format!("{} {}?", verb, format::format_path(&target)))? {
            return Ok(());
        }
    }

    let outcome = padma.delete_one_with(&target, policy);
    match format {
        OutputFormat::Human => output::print_delete(&outcome, &target),
        OutputFormat::Json => output::print_json(&outcome),
        OutputFormat::Quiet => {}
    }
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

// ─── Boost ────────────────────────────────────────────────────────────────────

fn cmd_boost(padma: &Padma, format: OutputFormat, mode: BoostMode) -> Result<()> {
    let result = padma.try_boost(mode);
    match format {
        OutputFormat::Human => output::print_boost(&result),
        OutputFormat::Json => output::print_json(&result),
        OutputFormat::Quiet => println!("{}", result.freed_memory.unwrap_or(0)),
    }
    Ok(())
}

// ─── Browsers ─────────────────────────────────────────────────────────────────

fn cmd_browser_clean(
    padma: &Padma,
    format: OutputFormat,
    name: &str,
    options: BrowserCleanOptions,
    yes: bool,
) -> Result<()> {
    if !yes && (options.cookies || options.history) {
        let what = match (options.cookies, options.history) {
            (true, true) => "cookies and history",
            (true, false) => "cookies",
            _ => "history",
        };
        if !confirm(&format!("Remove {}'s {}? This signs you out of websites.", name, what))? {
            return Ok(());
        }
    }

    let result = padma.clean_browser(name, options);
    match format {
        OutputFormat::Human => output::print_browser_clean(&result, name),
        OutputFormat::Json => output::print_json(&result),
        OutputFormat::Quiet => println!("{}", result.freed_space.unwrap_or(0)),
    }
    Ok(())
}

fn cmd_close_browser(padma: &Padma, format: OutputFormat, name: &str, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Force-close {}? Unsaved tabs and downloads are lost.", name))? {
        return Ok(());
    }

    let result = padma.close_browser(name);
    match format {
        OutputFormat::Human => output::print_browser_close(&result, name),
        OutputFormat::Json => output::print_json(&result),
        OutputFormat::Quiet => {}
    }
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::init_dirs()?;
            if !Config::config_path().exists() {
                Config::default().save()?;
            }
            println!(
                "  {} Padma initialized at {}",
                "✓".green(),
                format::format_path(&Config::data_dir())
            );
            println!("  Created: config.toml, logs/");
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("  {} Configuration reset to defaults", "✓".green());
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
        }
    }
    Ok(())
}

fn cmd_completions(shell: &CompletionShell) {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => clap_complete::Shell::Bash,
        CompletionShell::Zsh => clap_complete::Shell::Zsh,
        CompletionShell::Fish => clap_complete::Shell::Fish,
        CompletionShell::PowerShell => clap_complete::Shell::PowerShell,
    };
    clap_complete::generate(shell, &mut cmd, "padma", &mut std::io::stdout());
}
