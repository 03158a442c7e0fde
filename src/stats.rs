//! Output directory statistics.
//!
//! Summarizes what the last `depot generate` produced: faction and
//! datasheet counts, document sizes, and how long ago it ran.

use anyhow::Result;

use crate::config::Config;
use crate::export::{self, CORE_STRATAGEMS_FILE, INDEX_FILE};

pub fn run_stats(config: &Config) -> Result<()> {
    let out_dir = &config.output.dir;
    let index = export::read_index(out_dir)?;

    let file_size = |relative: &str| {
        std::fs::metadata(out_dir.join(relative))
            .map(|m| m.len())
            .unwrap_or(0)
    };

    let total_datasheets: usize = index.factions.iter().map(|f| f.datasheet_count).sum();
    let total_detachments: usize = index.factions.iter().map(|f| f.detachment_count).sum();
    let total_bytes: u64 = index.factions.iter().map(|f| file_size(&f.path)).sum::<u64>()
        + file_size(INDEX_FILE)
        + file_size(CORE_STRATAGEMS_FILE);

    let generated = chrono::DateTime::parse_from_rfc3339(&index.generated_at)
        .map(|dt| format_ts_relative(dt.timestamp()))
        .unwrap_or_else(|_| index.generated_at.clone());

    println!("Depot Output Stats");
    println!("==================");
    println!();
    println!("  Output:       {}", out_dir.display());
    println!("  Generated:    {}", generated);
    println!("  Size:         {}", format_bytes(total_bytes));
    println!();
    println!("  Factions:     {}", index.factions.len());
    println!("  Datasheets:   {}", total_datasheets);
    println!("  Detachments:  {}", total_detachments);

    if !index.factions.is_empty() {
        println!();
        println!("  By faction:");
        println!(
            "  {:<28} {:>10} {:>11} {:>10}",
            "FACTION", "DATASHEETS", "DETACHMENTS", "SIZE"
        );
        println!("  {}", "-".repeat(62));
        for faction in &index.factions {
            println!(
                "  {:<28} {:>10} {:>11} {:>10}",
                faction.name,
                faction.datasheet_count,
                faction.detachment_count,
                format_bytes(file_size(&faction.path))
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;
    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_scale() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn relative_times() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
        assert_eq!(format_ts_relative(0), "1970-01-01 00:00");
    }
}
