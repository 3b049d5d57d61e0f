use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::browsers::catalog::{self as browsers, Engine};
use crate::common::config::Config;
use crate::common::fs::Filesystem;
use crate::common::locations::Locations;

/// How a category's contents are measured and removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// Walk the roots with the tree walker, delete their children
    Walk,
    /// Ask the OS recycle bin for its size, empty it to clean
    Recycle,
}

/// One source of roots for a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSpec {
    /// A fixed directory
    Path(PathBuf),
    /// A glob pattern, expanded on every resolve
    Glob(String),
    /// `<parent>/<each sub-directory>/<leaf>`, for browsers whose profile
    /// folders have unpredictable names
    EachProfile { parent: PathBuf, leaf: String },
}

/// A named class of reclaimable data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    pub name: String,
    pub description: String,
    pub kind: CategoryKind,
    pub max_depth: u32,
    pub roots: Vec<RootSpec>,
    /// Declared in config.toml rather than built in
    pub user_defined: bool,
}

impl CategorySpec {
    fn walk(name: &str, description: &str, max_depth: u32, roots: Vec<RootSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: CategoryKind::Walk,
            max_depth,
            roots,
            user_defined: false,
        }
    }

    /// Resolve to concrete directories. Re-evaluated on every call; nothing
    /// here is cached between scan and clean.
    pub fn resolve_roots(&self, fs: &dyn Filesystem) -> Vec<PathBuf> {
        let mut resolved = Vec::new();
        for spec in &self.roots {
            match spec {
                RootSpec::Path(p) => resolved.push(p.clone()),
                RootSpec::Glob(pattern) => match glob::glob(pattern) {
                    Ok(paths) => resolved.extend(paths.filter_map(|p| p.ok())),
                    Err(e) => {
                        tracing::warn!(category = %self.name, pattern = %pattern, error = %e, "invalid root pattern");
                    }
                },
                RootSpec::EachProfile { parent, leaf } => {
                    for name in browsers::profile_names(fs, parent) {
                        resolved.push(parent.join(name).join(leaf));
                    }
                }
            }
        }
        resolved.dedup();
        resolved
    }
}

/// Two categories whose roots alias or nest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootOverlap {
    pub first: String,
    pub second: String,
    pub first_root: PathBuf,
    pub second_root: PathBuf,
}

/// Maps category identifiers to their roots
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: BTreeMap<String, CategorySpec>,
    locations: Locations,
}

pub const RECYCLE: &str = "recycle";

impl Catalog {
    /// The built-in categories, resolved against `loc`
    pub fn builtin(loc: &Locations) -> Self {
        let mut catalog = Self {
            categories: BTreeMap::new(),
            locations: loc.clone(),
        };

        let mut temp = vec![RootSpec::Path(loc.user_temp.clone())];
        let mut prefetch = Vec::new();
        let mut logs = vec![RootSpec::Path(loc.local_data.join("CrashDumps"))];
        if let Some(sys) = &loc.system_root {
            temp.push(RootSpec::Path(sys.join("Temp")));
            prefetch.push(RootSpec::Path(sys.join("Prefetch")));
            logs.push(RootSpec::Path(sys.join("Logs")));
        }

        catalog.insert(CategorySpec::walk("temp", "User and system temporary files", 5, temp));
        catalog.insert(CategorySpec::walk("prefetch", "Windows prefetch traces", 2, prefetch));
        catalog.insert(CategorySpec::walk("logs", "Crash dumps and system logs", 3, logs));

        for browser in browsers::all() {
            let roots = match browser.engine {
                Engine::Chromium => browser
                    .profile_cache_dirs("Default", loc)
                    .into_iter()
                    .map(RootSpec::Path)
                    .collect(),
                Engine::Gecko => vec![RootSpec::EachProfile {
                    parent: browser.cache_root(loc),
                    leaf: browsers::GECKO_CACHE_DIR.to_string(),
                }],
            };
            let description = format!("{} cache", browser.display_name);
            catalog.insert(CategorySpec::walk(&browser.category(), &description, 3, roots));
        }

        catalog.insert(CategorySpec {
            name: RECYCLE.to_string(),
            description: "Recycle bin".to_string(),
            kind: CategoryKind::Recycle,
            max_depth: 0,
            roots: Vec::new(),
            user_defined: false,
        });

        catalog
    }

    /// Built-ins plus the categories declared in config. A config entry with
    /// a built-in name replaces the built-in.
    pub fn from_config(loc: &Locations, config: &Config) -> Self {
        let mut catalog = Self::builtin(loc);
        for (name, over) in &config.categories {
            let roots = over
                .roots
                .iter()
                .map(|raw| {
                    let expanded = loc.expand(raw);
                    let text = expanded.to_string_lossy();
                    if text.contains('*') || text.contains('?') {
                        RootSpec::Glob(text.to_string())
                    } else {
                        RootSpec::Path(expanded)
                    }
                })
                .collect();
            catalog.insert(CategorySpec {
                name: name.clone(),
                description: "User-defined category".to_string(),
                kind: CategoryKind::Walk,
                max_depth: over.max_depth,
                roots,
                user_defined: true,
            });
        }
        catalog
    }

    pub fn insert(&mut self, spec: CategorySpec) {
        self.categories.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&CategorySpec> {
        self.categories.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategorySpec> {
        self.categories.values()
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Every pair of categories where a root of one equals or contains a
    /// root of the other
    pub fn overlapping_roots(&self, fs: &dyn Filesystem) -> Vec<RootOverlap> {
        let resolved: Vec<(&str, Vec<PathBuf>)> = self
            .categories
            .values()
            .filter(|c| c.kind == CategoryKind::Walk)
            .map(|c| (c.name.as_str(), c.resolve_roots(fs)))
            .collect();

        let mut overlaps = Vec::new();
        for (i, (first, first_roots)) in resolved.iter().enumerate() {
            for (second, second_roots) in &resolved[i + 1..] {
                for a in first_roots {
                    for b in second_roots {
                        if nests(a, b) || nests(b, a) {
                            overlaps.push(RootOverlap {
                                first: first.to_string(),
                                second: second.to_string(),
                                first_root: a.clone(),
                                second_root: b.clone(),
                            });
                        }
                    }
                }
            }
        }
        overlaps
    }

    /// Warn about any overlapping roots; clean serializes them
    pub fn log_overlaps(&self, fs: &dyn Filesystem) {
        for overlap in self.overlapping_roots(fs) {
            tracing::warn!(
                first = %overlap.first,
                second = %overlap.second,
                first_root = %overlap.first_root.display(),
                second_root = %overlap.second_root.display(),
                "categories share a root"
            );
        }
    }
}

/// `inner` is `outer` or lies below it
pub fn nests(inner: &Path, outer: &Path) -> bool {
    if cfg!(windows) {
        let lower = |p: &Path| p.to_string_lossy().to_lowercase().replace('/', "\\");
        let (inner, outer) = (lower(inner), lower(outer));
        let outer = outer.trim_end_matches('\\');
        inner == outer || inner.starts_with(&format!("{}\\", outer))
    } else {
        inner.starts_with(outer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::CategoryOverride;
    use crate::common::fs::LocalFs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_categories() {
        let loc = Locations::rooted_at(Path::new("/sandbox"));
        let catalog = Catalog::builtin(&loc);
        let names: Vec<_> = catalog.names().collect();
        for expected in [
            "temp",
            "prefetch",
            "logs",
            "recycle",
            "browser-chrome",
            "browser-edge",
            "browser-brave",
            "browser-firefox",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }

        let temp = catalog.get("temp").unwrap();
        assert_eq!(temp.max_depth, 5);
        assert_eq!(temp.roots.len(), 2);
        assert_eq!(catalog.get("recycle").unwrap().kind, CategoryKind::Recycle);
    }

    #[test]
    fn test_no_system_root_means_no_prefetch_roots() {
        let mut loc = Locations::rooted_at(Path::new("/sandbox"));
        loc.system_root = None;
        let catalog = Catalog::builtin(&loc);
        assert!(catalog.get("prefetch").unwrap().roots.is_empty());
        assert_eq!(catalog.get("temp").unwrap().roots.len(), 1);
    }

    #[test]
    fn test_firefox_roots_follow_profiles() {
        let dir = TempDir::new().unwrap();
        let loc = Locations::rooted_at(dir.path());
        let firefox = browsers::find("firefox").unwrap();
        let cache_root = firefox.cache_root(&loc);
        std::fs::create_dir_all(cache_root.join("a1.default-release")).unwrap();
        std::fs::create_dir_all(cache_root.join("b2.default")).unwrap();

        let catalog = Catalog::builtin(&loc);
        let roots = catalog.get("browser-firefox").unwrap().resolve_roots(&LocalFs);
        assert_eq!(
            roots,
            vec![
                cache_root.join("a1.default-release").join("cache2"),
                cache_root.join("b2.default").join("cache2"),
            ]
        );
    }

    #[test]
    fn test_config_categories_merge() {
        let loc = Locations::rooted_at(Path::new("/sandbox"));
        let mut config = Config::default();
        config.categories.insert(
            "downloads".into(),
            CategoryOverride {
                roots: vec!["~/Downloads/old".into()],
                max_depth: 1,
            },
        );
        let catalog = Catalog::from_config(&loc, &config);
        let spec = catalog.get("downloads").unwrap();
        assert!(spec.user_defined);
        assert_eq!(spec.roots, vec![RootSpec::Path(loc.home.join("Downloads").join("old"))]);
    }

    #[test]
    fn test_builtins_do_not_overlap() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::builtin(&Locations::rooted_at(dir.path()));
        assert!(catalog.overlapping_roots(&LocalFs).is_empty());
    }

    #[test]
    fn test_overlap_detected() {
        let loc = Locations::rooted_at(Path::new("/sandbox"));
        let mut catalog = Catalog::builtin(&loc);
        catalog.insert(CategorySpec::walk(
            "everything-temp",
            "",
            3,
            vec![RootSpec::Path(loc.user_temp.join("nested"))],
        ));
        let overlaps = catalog.overlapping_roots(&LocalFs);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].first, "everything-temp");
        assert_eq!(overlaps[0].second, "temp");
    }

    #[test]
    fn test_nests() {
        assert!(nests(Path::new("/a/b"), Path::new("/a")));
        assert!(nests(Path::new("/a"), Path::new("/a")));
        assert!(!nests(Path::new("/ab"), Path::new("/a")));
    }
}
