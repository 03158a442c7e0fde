//! Generation pipeline orchestration.
//!
//! Coordinates the full `depot generate` flow: locate table files → parse →
//! decode into a [`Catalog`] → assemble each faction on a bounded pool of
//! blocking tasks → write faction documents, `core-stratagems.json` and
//! `index.json`.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use depot_core::build::{BuildReport, Catalog, RawTables};
use depot_core::table::Table;

use crate::config::Config;
use crate::connector_fs;
use crate::export::{self, Index, IndexEntry};
use crate::progress::{GenerateProgressEvent, GenerateProgressReporter};

/// Tables the pipeline cannot run without.
const REQUIRED_TABLES: [Table; 2] = [Table::Factions, Table::Datasheets];

pub async fn run_generate(
    config: &Config,
    dry_run: bool,
    factions: &[String],
    progress: Arc<dyn GenerateProgressReporter>,
) -> Result<()> {
    let files = connector_fs::scan_tables(config)?;
    for table in REQUIRED_TABLES {
        if !files.found.contains_key(&table) {
            bail!(
                "Required table '{}' not found in {}",
                table,
                config.input.dir.display()
            );
        }
    }
    for table in files.missing() {
        tracing::info!(table = %table, "table file not found, treating as empty");
    }
    for path in &files.unmatched {
        tracing::debug!(path = %path.display(), "file does not match any table");
    }

    let total_tables = files.found.len() as u64;
    let mut tables = RawTables::new();
    for (n, (table, path)) in files.found.iter().enumerate() {
        progress.report(GenerateProgressEvent::Loading {
            table: table.to_string(),
            n: n as u64 + 1,
            total: total_tables,
        });
        let rows = connector_fs::read_table(path)?;
        tracing::debug!(table = %table, rows = rows.len(), "parsed table");
        tables.insert(*table, rows);
    }

    let row_counts: Vec<(Table, usize)> = tables.iter().map(|(t, rows)| (*t, rows.len())).collect();
    let catalog = Arc::new(Catalog::from_tables(tables)?);
    let selected = select_factions(&catalog, factions)?;

    if dry_run {
        let mut row_counts = row_counts;
        row_counts.sort();
        println!("generate (dry-run)");
        for (table, rows) in row_counts {
            println!("  {:<34} {:>7} rows", table.name(), rows);
        }
        for faction_id in &selected {
            println!(
                "  faction {:<26} {:>7} datasheets",
                faction_id,
                catalog.datasheet_count(faction_id)
            );
        }
        return Ok(());
    }

    let out_dir = config.output.dir.clone();
    let pretty = config.output.pretty;
    let built = build_all(
        Arc::clone(&catalog),
        &selected,
        config.generate.workers,
        &out_dir,
        pretty,
        Arc::clone(&progress),
    )
    .await?;

    let mut report = BuildReport::default();
    let mut entries = Vec::with_capacity(built.len());
    for (entry, faction_report) in built {
        if faction_report.total() > 0 {
            tracing::warn!(
                faction = %entry.id,
                abilities = faction_report.abilities,
                stratagems = faction_report.stratagems,
                enhancements = faction_report.enhancements,
                detachment_abilities = faction_report.detachment_abilities,
                leaders = faction_report.leaders,
                "skipped dangling references"
            );
        }
        report.absorb(&faction_report);
        entries.push(entry);
    }

    let core_stratagems = catalog.core_stratagems();
    export::write_core_stratagems(&out_dir, &core_stratagems, pretty)?;

    let index = Index {
        generated_at: chrono::Utc::now().to_rfc3339(),
        factions: entries,
    };
    export::write_index(&out_dir, &index, pretty)?;

    let datasheets: usize = index.factions.iter().map(|f| f.datasheet_count).sum();
    println!("generate");
    println!("  tables: {}", total_tables);
    println!("  factions written: {}", index.factions.len());
    println!("  datasheets: {}", datasheets);
    println!("  core stratagems: {}", core_stratagems.len());
    println!("  dangling references skipped: {}", report.total());
    println!("  output: {}", out_dir.display());
    println!("ok");
    Ok(())
}

/// Faction ids to build, in `factions` table order. Every requested id
/// must exist.
fn select_factions(catalog: &Catalog, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(catalog.faction_ids());
    }
    for id in requested {
        if !catalog.has_faction(id) {
            bail!("Unknown faction: '{}'", id);
        }
    }
    let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
    Ok(catalog
        .faction_ids()
        .into_iter()
        .filter(|id| wanted.contains(id.as_str()))
        .collect())
}

/// Assemble and write every selected faction, at most `workers` at once.
/// Results come back in `faction_ids` order.
async fn build_all(
    catalog: Arc<Catalog>,
    faction_ids: &[String],
    workers: usize,
    out_dir: &std::path::Path,
    pretty: bool,
    progress: Arc<dyn GenerateProgressReporter>,
) -> Result<Vec<(IndexEntry, BuildReport)>> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let completed = Arc::new(AtomicU64::new(0));
    let total = faction_ids.len() as u64;
    let mut tasks = JoinSet::new();

    for (position, faction_id) in faction_ids.iter().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("worker pool closed")?;
        let catalog = Arc::clone(&catalog);
        let completed = Arc::clone(&completed);
        let progress = Arc::clone(&progress);
        let faction_id = faction_id.clone();
        let out_dir = out_dir.to_path_buf();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let (faction, report) = catalog
                .build_faction(&faction_id)
                .with_context(|| format!("Unknown faction: '{}'", faction_id))?;
            let entry = export::write_faction(&out_dir, &faction, pretty)?;
            let n = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress.report(GenerateProgressEvent::Building {
                faction: faction.name.clone(),
                n,
                total,
            });
            tracing::debug!(faction = %faction_id, datasheets = entry.datasheet_count, "faction written");
            Ok::<_, anyhow::Error>((position, entry, report))
        });
    }

    let mut results: Vec<Option<(IndexEntry, BuildReport)>> = vec![None; faction_ids.len()];
    while let Some(joined) = tasks.join_next().await {
        let (position, entry, report) = joined.context("faction worker panicked")??;
        results[position] = Some((entry, report));
    }
    Ok(results.into_iter().flatten().collect())
}
