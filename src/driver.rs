//! Directory traversal and parallel per-file rewriting.
//!
//! Each file is read, parsed, rewritten, and written back independently;
//! the rule set is shared immutably across workers and a failure on one
//! file never aborts its siblings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config;
use crate::path::PkgPath;
use crate::rewrite;
use crate::rules::RewriteRules;
use crate::syntax;

pub struct RunOptions {
    pub config: PathBuf,
    pub local_root: String,
    pub dir: PathBuf,
    pub max_parallel: usize,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files that were mutated and written back.
    pub rewritten: Vec<PathBuf>,
    /// Files inspected but left untouched.
    pub skipped: usize,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let cfg = config::load(&options.config)?;
    let rules = cfg
        .packages
        .apply_prefix(&PkgPath::new(&options.local_root));
    run_with_rules(&rules, &options.local_root, &options.dir, options.max_parallel)
}

pub fn run_with_rules(
    rules: &RewriteRules,
    local_root: &str,
    dir: &Path,
    max_parallel: usize,
) -> Result<RunSummary> {
    if max_parallel == 0 {
        return Err(anyhow!("max parallelism must be a positive integer"));
    }
    let files = collect_source_files(dir)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_parallel)
        .build()
        .context("failed to build worker pool")?;

    let results: Vec<(PathBuf, Result<bool>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| (file.clone(), process_file(rules, local_root, dir, file)))
            .collect()
    });

    let mut summary = RunSummary::default();
    for (path, result) in results {
        match result {
            Ok(true) => summary.rewritten.push(path),
            Ok(false) => summary.skipped += 1,
            Err(error) => summary.failures.push(FileFailure { path, error }),
        }
    }
    summary.rewritten.sort();
    Ok(summary)
}

/// Read, parse, rewrite, and (when the tree changed) write back one file.
pub fn process_file(
    rules: &RewriteRules,
    local_root: &str,
    base: &Path,
    file: &Path,
) -> Result<bool> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("could not read {}", file.display()))?;
    let mut parsed = syntax::parse_file(&source)
        .with_context(|| format!("could not parse {}", file.display()))?;
    let pkg_path = package_path_for(local_root, base, file)?;
    let changed = rewrite::apply(rules, &pkg_path, &mut parsed)
        .with_context(|| format!("could not apply rules to {}", file.display()))?;
    if changed {
        fs::write(file, syntax::print_file(&parsed))
            .with_context(|| format!("could not write {}", file.display()))?;
    }
    Ok(changed)
}

/// The package path of a file: the local root extended with the file's
/// directory relative to the traversal base.
pub fn package_path_for(local_root: &str, base: &Path, file: &Path) -> Result<PkgPath> {
    let dir = file.parent().unwrap_or(base);
    let rel = dir.strip_prefix(base).unwrap_or(dir);
    let mut segments = Vec::new();
    for component in rel.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .with_context(|| format!("non-UTF-8 path component in {}", file.display()))?;
        segments.push(segment.to_string());
    }
    Ok(PkgPath::new(local_root).append(&segments))
}

fn collect_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && is_ignored_dir(entry.path())));
    for entry in walker {
        let entry = entry.with_context(|| format!("could not walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) == Some("go") {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn is_ignored_dir(path: &Path) -> bool {
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => matches!(name, ".git" | "vendor" | "testdata"),
        None => false,
    }
}
