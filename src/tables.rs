use anyhow::Result;

use depot_core::table::Table;

use crate::config::Config;
use crate::connector_fs;

pub fn list_tables(config: &Config) -> Result<()> {
    let files = connector_fs::scan_tables(config)?;

    println!("{:<34} {:<10} {:>7}  FILE", "TABLE", "STATUS", "ROWS");
    for table in Table::ALL {
        match files.found.get(&table) {
            Some(path) => {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                match connector_fs::read_table(path) {
                    Ok(rows) => println!(
                        "{:<34} {:<10} {:>7}  {}",
                        table.name(),
                        "OK",
                        rows.len(),
                        file
                    ),
                    Err(e) => println!(
                        "{:<34} {:<10} {:>7}  {} ({:#})",
                        table.name(),
                        "ERROR",
                        "-",
                        file,
                        e
                    ),
                }
            }
            None => println!("{:<34} {:<10} {:>7}  -", table.name(), "MISSING", "-"),
        }
    }

    for path in &files.unmatched {
        println!("unmatched file: {}", path.display());
    }

    Ok(())
}
