//! JSON writers for the generated documents.
//!
//! Layout under `output.dir`:
//!
//! ```text
//! index.json
//! core-stratagems.json
//! factions/<slug>.json
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use depot_core::models::{Faction, Stratagem};

pub const INDEX_FILE: &str = "index.json";
pub const CORE_STRATAGEMS_FILE: &str = "core-stratagems.json";
pub const FACTIONS_DIR: &str = "factions";

/// The manifest the web client loads first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub generated_at: String,
    pub factions: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Relative to the output directory.
    pub path: String,
    pub datasheet_count: usize,
    pub detachment_count: usize,
    /// SHA-256 of the faction document bytes.
    pub hash: String,
}

pub fn faction_path(slug: &str) -> String {
    format!("{}/{}.json", FACTIONS_DIR, slug)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn to_bytes<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write one faction document and return its manifest entry.
pub fn write_faction(out_dir: &Path, faction: &Faction, pretty: bool) -> Result<IndexEntry> {
    let bytes = to_bytes(faction, pretty)?;
    let path = faction_path(&faction.slug);
    write_bytes(&out_dir.join(&path), &bytes)?;

    Ok(IndexEntry {
        id: faction.id.clone(),
        slug: faction.slug.clone(),
        name: faction.name.clone(),
        path,
        datasheet_count: faction.datasheets.len(),
        detachment_count: faction.detachments.len(),
        hash: sha256_hex(&bytes),
    })
}

pub fn write_core_stratagems(out_dir: &Path, stratagems: &[Stratagem], pretty: bool) -> Result<()> {
    let bytes = to_bytes(&stratagems, pretty)?;
    write_bytes(&out_dir.join(CORE_STRATAGEMS_FILE), &bytes)
}

pub fn write_index(out_dir: &Path, index: &Index, pretty: bool) -> Result<()> {
    let bytes = to_bytes(index, pretty)?;
    write_bytes(&out_dir.join(INDEX_FILE), &bytes)
}

pub fn read_index(out_dir: &Path) -> Result<Index> {
    let path = out_dir.join(INDEX_FILE);
    let content = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to read {} (run `depot generate` first)",
            path.display()
        )
    })?;
    serde_json::from_str(&content).with_context(|| format!("Invalid index: {}", path.display()))
}

/// Load a generated faction document by faction id via the index.
pub fn read_faction(out_dir: &Path, faction_id: &str) -> Result<Option<Faction>> {
    let index = read_index(out_dir)?;
    let Some(entry) = index.factions.iter().find(|f| f.id == faction_id) else {
        return Ok(None);
    };
    let path = out_dir.join(&entry.path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read faction document: {}", path.display()))?;
    let faction = serde_json::from_str(&content)
        .with_context(|| format!("Invalid faction document: {}", path.display()))?;
    Ok(Some(faction))
}
