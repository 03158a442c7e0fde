//! Locates and reads the raw upstream table files.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use depot_core::table::{self, Row, Table};

use crate::config::Config;

/// Files found under `input.dir`, matched to upstream tables by stem.
#[derive(Debug, Default)]
pub struct TableFiles {
    pub found: BTreeMap<Table, PathBuf>,
    /// Files that passed the include globs but match no known table.
    pub unmatched: Vec<PathBuf>,
}

impl TableFiles {
    pub fn missing(&self) -> Vec<Table> {
        Table::ALL
            .into_iter()
            .filter(|t| !self.found.contains_key(t))
            .collect()
    }
}

pub fn scan_tables(config: &Config) -> Result<TableFiles> {
    let root = &config.input.dir;
    if !root.is_dir() {
        bail!("Input directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.input.include_globs)?;
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if include_set.is_match(relative) {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut files = TableFiles::default();
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        match Table::from_file_stem(&stem) {
            Some(table) if files.found.contains_key(&table) => {
                tracing::warn!(
                    table = %table,
                    path = %path.display(),
                    "duplicate table file ignored"
                );
            }
            Some(table) => {
                files.found.insert(table, path);
            }
            None => files.unmatched.push(path),
        }
    }
    Ok(files)
}

/// Read and parse one table file. Shape errors are fatal.
pub fn read_table(path: &Path) -> Result<Vec<Row>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read table file: {}", path.display()))?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let rows = table::parse(&raw, &file)?;
    Ok(rows)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
