use clap::{Parser, Subcommand, ValueEnum};

use crate::boost::BoostMode;

/// Padma: scan and reclaim disk clutter
#[derive(Parser, Debug)]
#[command(
    name = "padma",
    version,
    about = "Scan and reclaim temp files, logs, browser caches and the recycle bin",
    long_about = "Padma measures reclaimable disk space per category and removes it\n\
                  best-effort, skipping files that are locked or in use.",
    after_help = "EXAMPLES:\n  \
        padma scan                             Scan every category\n  \
        padma scan temp logs --detailed        Scan two categories, list files\n  \
        padma clean temp --dry-run             Show what cleaning would free\n  \
        padma clean browser-chrome -y          Clean without confirmation\n  \
        padma delete ~/Downloads/big.iso       Move one file to the recycle bin\n  \
        padma boost --mode soft                Trim process working sets\n  \
        padma browsers                         List installed browsers\n  \
        padma browser-clean firefox --cache    Clear Firefox's cache\n  \
        padma largest ~ --limit 20             Largest files under home\n  \
        padma analyze ~/Downloads --depth 2    Disk usage tree"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (defaults to the configured one)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode — minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure reclaimable space per category
    Scan {
        /// Categories to scan (all when omitted)
        categories: Vec<String>,

        /// Show individual files in results
        #[arg(long)]
        detailed: bool,
    },

    /// Delete the contents of categories
    Clean {
        /// Categories to clean (all when omitted)
        categories: Vec<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Report what would be freed without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete a single file or directory
    Delete {
        /// Path to delete
        path: String,

        /// Unlink instead of moving to the recycle bin
        #[arg(long)]
        permanent: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Free up memory
    Boost {
        /// Boost intensity
        #[arg(long, value_enum, default_value = "soft")]
        mode: BoostMode,
    },

    /// Show whether a boost is allowed right now
    BoostStatus,

    /// List installed browsers with cache size and record estimates
    Browsers,

    /// Remove a browser's cache, cookies or history
    BrowserClean {
        /// Browser name (chrome, edge, brave, firefox)
        name: String,

        /// Remove cached web content
        #[arg(long)]
        cache: bool,

        /// Remove cookies (signs you out of websites)
        #[arg(long)]
        cookies: bool,

        /// Remove browsing history
        #[arg(long)]
        history: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Force-close a running browser so it can be cleaned
    CloseBrowser {
        /// Browser name (chrome, edge, brave, firefox)
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Find the largest files under a directory
    Largest {
        /// Directory to search
        #[arg(default_value = "~")]
        path: String,

        /// Number of files to list (defaults to the configured limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum size in MB (defaults to the configured threshold)
        #[arg(long)]
        min_mb: Option<u64>,
    },

    /// Show a disk usage tree
    Analyze {
        /// Directory to analyze
        #[arg(default_value = "~")]
        path: String,

        /// Levels of directories to expand (defaults to the configured depth)
        #[arg(long)]
        depth: Option<u32>,
    },

    /// List known categories and their roots
    Categories,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Print the config file location
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Initialize Padma directories and default config
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

impl From<&crate::common::config::OutputFormat> for OutputFormat {
    fn from(format: &crate::common::config::OutputFormat) -> Self {
        use crate::common::config::OutputFormat as Configured;
        match format {
            Configured::Human => OutputFormat::Human,
            Configured::Json => OutputFormat::Json,
            Configured::Quiet => OutputFormat::Quiet,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
