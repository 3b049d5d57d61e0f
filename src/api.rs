//! The operation surface a host application (CLI, desktop shell) drives.
//!
//! [`Padma`] owns everything that lives for the life of the host process:
//! configuration, the category catalog, the OS adapters and the boost
//! cooldown. Each operation is synchronous and returns a complete,
//! serializable result; partial failures are reported inside the result.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::boost::{self, BoostCooldownGuard, BoostMode, BoostResult, BoostStatus};
use crate::boost::{MemoryProbe, MemoryTrimmer, PowerShellTrimmer, SysinfoMemory};
use crate::browsers::{self, BrowserCleanOptions, BrowserCleanResult, BrowserCloseResult, BrowserRecord};
use crate::cleaner::{self, CleanOptions, CleanResult, DeleteOutcome, ReclaimEngine};
use crate::cleaner::engine::CategoryClean;
use crate::common::config::{Config, DeletePolicy};
use crate::common::fs::{Filesystem, LocalFs};
use crate::common::locations::Locations;
use crate::scanner::catalog::Catalog;
use crate::scanner::walker::{self, CancelToken, FileEntry};
use crate::scanner::{self, CategoryScan, CategoryScanner, DiskItem, ScanResult};
use crate::system::{ProcessLister, RecycleBin, SysinfoProcesses, TrashCanBin};

pub struct Padma {
    config: Config,
    catalog: Catalog,
    fs: Arc<dyn Filesystem>,
    recycle: Arc<dyn RecycleBin>,
    processes: Arc<dyn ProcessLister>,
    probe: Arc<dyn MemoryProbe>,
    trimmer: Arc<dyn MemoryTrimmer>,
    cooldown: BoostCooldownGuard,
    /// Serializes deletions across concurrent clean requests
    clean_lock: Mutex<()>,
}

impl Padma {
    /// Real filesystem and OS adapters, locations from the environment
    pub fn new(config: Config) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> PadmaBuilder {
        PadmaBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn locations(&self) -> &Locations {
        self.catalog.locations()
    }

    pub fn filesystem(&self) -> &dyn Filesystem {
        self.fs.as_ref()
    }

    pub fn scan(&self, categories: &[String]) -> ScanResult {
        self.scan_with(categories, None, None)
    }

    pub fn scan_with(
        &self,
        categories: &[String],
        progress: Option<&(dyn Fn(&str, &CategoryScan) + Sync)>,
        cancel: Option<CancelToken>,
    ) -> ScanResult {
        let scanner = CategoryScanner::new(&self.catalog, self.fs.as_ref(), self.recycle.as_ref());
        match cancel {
            Some(token) => scanner.with_cancel(token).scan(categories, progress),
            None => scanner.scan(categories, progress),
        }
    }

    pub fn clean(&self, categories: &[String]) -> CleanResult {
        self.clean_with(categories, CleanOptions::from_config(&self.config), None)
    }

    pub fn clean_with(
        &self,
        categories: &[String],
        options: CleanOptions,
        progress: Option<&dyn Fn(&str, &CategoryClean)>,
    ) -> CleanResult {
        let _serial = self.clean_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.engine().with_options(options).clean(categories, progress)
    }

    /// Delete one path with the configured single-delete policy
    pub fn delete_one(&self, path: &Path) -> DeleteOutcome {
        self.delete_one_with(path, self.config.single_delete)
    }

    pub fn delete_one_with(&self, path: &Path, policy: DeletePolicy) -> DeleteOutcome {
        let _serial = self.clean_lock.lock().unwrap_or_else(|e| e.into_inner());
        cleaner::delete_one(self.fs.as_ref(), &self.config, path, policy)
    }

    pub fn try_boost(&self, mode: BoostMode) -> BoostResult {
        self.try_boost_at(mode, Instant::now())
    }

    pub fn try_boost_at(&self, mode: BoostMode, now: Instant) -> BoostResult {
        boost::run_boost(&self.cooldown, self.probe.as_ref(), self.trimmer.as_ref(), mode, now)
    }

    pub fn boost_status(&self) -> BoostStatus {
        self.boost_status_at(Instant::now())
    }

    pub fn boost_status_at(&self, now: Instant) -> BoostStatus {
        self.cooldown.status(now)
    }

    /// Installed browsers with cache size and estimated record counts
    pub fn discover_browsers(&self) -> Vec<BrowserRecord> {
        browsers::discover(self.fs.as_ref(), self.locations(), self.processes.as_ref())
            .iter()
            .map(|record| browsers::analyze(self.fs.as_ref(), record))
            .collect()
    }

    pub fn clean_browser(&self, name: &str, options: BrowserCleanOptions) -> BrowserCleanResult {
        let _serial = self.clean_lock.lock().unwrap_or_else(|e| e.into_inner());
        browsers::clean_browser(&self.engine(), self.processes.as_ref(), name, options)
    }

    /// Force-close a running browser; one that is already closed succeeds
    pub fn close_browser(&self, name: &str) -> BrowserCloseResult {
        browsers::close_browser(
            self.fs.as_ref(),
            self.locations(),
            self.processes.as_ref(),
            name,
            browsers::CLOSE_WAIT,
        )
    }

    /// Biggest files under `root` that are at least `min_size` bytes
    pub fn largest_files(&self, root: &Path, limit: usize, min_size: u64) -> Vec<FileEntry> {
        walker::largest_files(root, limit, min_size, None)
    }

    pub fn analyze(&self, root: &Path, depth: u32) -> Option<DiskItem> {
        scanner::analyze(self.fs.as_ref(), root, depth)
    }

    fn engine(&self) -> ReclaimEngine<'_> {
        ReclaimEngine::new(&self.catalog, self.fs.as_ref(), self.recycle.as_ref(), &self.config)
    }
}

/// Assembles a [`Padma`]; every part defaults to the real implementation
#[derive(Default)]
pub struct PadmaBuilder {
    config: Option<Config>,
    locations: Option<Locations>,
    fs: Option<Arc<dyn Filesystem>>,
    recycle: Option<Arc<dyn RecycleBin>>,
    processes: Option<Arc<dyn ProcessLister>>,
    probe: Option<Arc<dyn MemoryProbe>>,
    trimmer: Option<Arc<dyn MemoryTrimmer>>,
}

impl PadmaBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn locations(mut self, locations: Locations) -> Self {
        self.locations = Some(locations);
        self
    }

    pub fn filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn recycle_bin(mut self, bin: Arc<dyn RecycleBin>) -> Self {
        self.recycle = Some(bin);
        self
    }

    pub fn processes(mut self, lister: Arc<dyn ProcessLister>) -> Self {
        self.processes = Some(lister);
        self
    }

    pub fn memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn memory_trimmer(mut self, trimmer: Arc<dyn MemoryTrimmer>) -> Self {
        self.trimmer = Some(trimmer);
        self
    }

    pub fn build(self) -> Padma {
        let config = self.config.unwrap_or_default();
        let locations = self.locations.unwrap_or_else(Locations::from_env);
        let fs = self.fs.unwrap_or_else(|| Arc::new(LocalFs));
        let catalog = Catalog::from_config(&locations, &config);
        catalog.log_overlaps(fs.as_ref());

        Padma {
            config,
            catalog,
            fs,
            recycle: self.recycle.unwrap_or_else(|| Arc::new(TrashCanBin)),
            processes: self.processes.unwrap_or_else(|| Arc::new(SysinfoProcesses)),
            probe: self.probe.unwrap_or_else(|| Arc::new(SysinfoMemory)),
            trimmer: self.trimmer.unwrap_or_else(|| Arc::new(PowerShellTrimmer)),
            cooldown: BoostCooldownGuard::new(),
            clean_lock: Mutex::new(()),
        }
    }
}
