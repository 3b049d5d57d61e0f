use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use padma::common::config::{CategoryOverride, Config};
use padma::common::locations::Locations;
use padma::scanner;
use padma::system::RecycleBin;
use padma::Padma;

struct EmptyBin;

impl RecycleBin for EmptyBin {
    fn size(&self) -> Result<u64> {
        Ok(0)
    }
    fn empty(&self) -> Result<()> {
        Ok(())
    }
}

fn write(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; len]).unwrap();
}

fn padma_at(tmp: &TempDir, config: Config) -> Padma {
    Padma::builder()
        .config(config)
        .locations(Locations::rooted_at(tmp.path()))
        .recycle_bin(Arc::new(EmptyBin))
        .build()
}

fn with_category(name: &str, root: &Path, max_depth: u32) -> Config {
    let mut categories = BTreeMap::new();
    categories.insert(
        name.to_string(),
        CategoryOverride {
            roots: vec![root.display().to_string()],
            max_depth,
        },
    );
    Config {
        categories,
        ..Config::default()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ─── Temp category ────────────────────────────────────────────────────────────

#[test]
fn test_temp_scan_counts_nested_files() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Config::default());
    let temp = &padma.locations().user_temp;
    write(&temp.join("file1.bin"), 1_048_576);
    write(&temp.join("sub").join("file2.bin"), 2_048);

    let result = padma.scan(&names(&["temp"]));
    let scan = &result["temp"];
    assert_eq!(scan.size, 1_050_624);
    assert_eq!(scan.files.len(), 2);
    assert!(scan.files.contains(&temp.join("file1.bin")));
    assert!(scan.files.contains(&temp.join("sub").join("file2.bin")));
}

#[test]
fn test_scan_is_repeatable() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Config::default());
    let temp = padma.locations().user_temp.clone();
    write(&temp.join("a.log"), 300);
    write(&temp.join("x").join("b.log"), 700);

    let first = padma.scan(&names(&["temp"]));
    let second = padma.scan(&names(&["temp"]));
    assert_eq!(first["temp"].size, second["temp"].size);
    assert_eq!(first["temp"].files.len(), second["temp"].files.len());
}

// ─── Depth bound ──────────────────────────────────────────────────────────────

#[test]
fn test_files_beyond_max_depth_are_not_counted() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("deep");
    write(&root.join("a/b/c/d/file.bin"), 4096);

    let padma = padma_at(&tmp, with_category("deep", &root, 2));
    let result = padma.scan(&names(&["deep"]));
    assert_eq!(result["deep"].size, 0);
    assert!(result["deep"].files.is_empty());

    let padma = padma_at(&tmp, with_category("deep", &root, 4));
    let result = padma.scan(&names(&["deep"]));
    assert_eq!(result["deep"].size, 4096);
}

// ─── Multi-category requests ──────────────────────────────────────────────────

#[test]
fn test_sizes_add_across_categories() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("downloads-cache");
    write(&root.join("one.bin"), 1_000);

    let padma = padma_at(&tmp, with_category("dl", &root, 3));
    write(&padma.locations().user_temp.join("t.tmp"), 250);

    let both = padma.scan(&names(&["temp", "dl"]));
    let temp = padma.scan(&names(&["temp"]));
    let dl = padma.scan(&names(&["dl"]));
    assert_eq!(
        scanner::total_size(&both),
        scanner::total_size(&temp) + scanner::total_size(&dl)
    );
    assert_eq!(scanner::total_size(&both), 1_250);
}

#[test]
fn test_duplicate_names_scanned_once() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Config::default());
    write(&padma.locations().user_temp.join("t.tmp"), 10);

    let result = padma.scan(&names(&["temp", "temp"]));
    assert_eq!(result.len(), 1);
    assert_eq!(result["temp"].size, 10);
}

#[test]
fn test_unknown_category_is_empty() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Config::default());
    let result = padma.scan(&names(&["not-a-real-category"]));
    assert_eq!(result["not-a-real-category"].size, 0);
    assert!(result["not-a-real-category"].files.is_empty());
}

#[test]
fn test_missing_root_is_empty() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, with_category("gone", &tmp.path().join("nope"), 5));
    let result = padma.scan(&names(&["gone", "prefetch"]));
    assert_eq!(result["gone"].size, 0);
    assert_eq!(result["prefetch"].size, 0);
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_is_scanned() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("redirected-temp");
    write(&target.join("cache.bin"), 4096);
    let link = tmp.path().join("temp-link");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let padma = padma_at(&tmp, with_category("linked", &link, 3));
    let result = padma.scan(&names(&["linked"]));
    assert_eq!(result["linked"].size, 4096);
    assert_eq!(result["linked"].files.len(), 1);
}

#[test]
fn test_glob_roots_from_config() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("apps/one/logs/a.log"), 100);
    write(&tmp.path().join("apps/two/logs/b.log"), 200);
    write(&tmp.path().join("apps/two/keep.txt"), 999);

    let pattern = tmp.path().join("apps").join("*").join("logs");
    let padma = padma_at(&tmp, with_category("app-logs", &pattern, 2));
    let result = padma.scan(&names(&["app-logs"]));
    assert_eq!(result["app-logs"].size, 300);
}

// ─── Largest files / analyze ──────────────────────────────────────────────────

#[test]
fn test_largest_files_sorted() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("small.bin"), 10);
    write(&tmp.path().join("big.bin"), 5_000);
    write(&tmp.path().join("nested/mid.bin"), 2_000);

    let padma = padma_at(&tmp, Config::default());
    let files = padma.largest_files(tmp.path(), 2, 100);
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].size, 5_000);
    assert_eq!(files[1].size, 2_000);
}

#[test]
fn test_analyze_tree_totals() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("tree");
    write(&root.join("a.bin"), 100);
    write(&root.join("dir/b.bin"), 50);
    write(&root.join("dir/inner/c.bin"), 25);

    let padma = padma_at(&tmp, Config::default());
    let tree = padma.analyze(&root, 1).unwrap();
    assert!(tree.is_directory);
    assert_eq!(tree.size, 175);
    assert_eq!(tree.children[0].name, "dir");
    assert_eq!(tree.children[0].size, 75);

    assert!(padma.analyze(&tmp.path().join("missing"), 1).is_none());
}
