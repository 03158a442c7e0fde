//! Share text for saved rosters and collections.
//!
//! Reads a roster or collection JSON file, optionally re-normalizes its
//! selections against the current generated faction document, and prints
//! Markdown or plain text to stdout.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use std::path::Path;

use depot_core::models::{Collection, Faction, Roster};
use depot_core::roster::{
    collection_to_markdown, collection_to_text, refresh_collection, refresh_roster,
    roster_to_markdown, roster_to_text,
};

use crate::config::Config;
use crate::export;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShareKind {
    Roster,
    Collection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum ShareFormat {
    #[default]
    Markdown,
    Text,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// The generated faction document, if one can be loaded. Failures are
/// logged and treated as "no refresh".
fn load_faction(config: &Config, faction_id: &str) -> Option<Faction> {
    match export::read_faction(&config.output.dir, faction_id) {
        Ok(Some(faction)) => Some(faction),
        Ok(None) => {
            tracing::warn!(faction = %faction_id, "faction not in generated index, skipping refresh");
            None
        }
        Err(e) => {
            tracing::warn!("could not load generated data, skipping refresh: {:#}", e);
            None
        }
    }
}

fn faction_name(config: &Config, faction_id: &str) -> Option<String> {
    let index = export::read_index(&config.output.dir).ok()?;
    index
        .factions
        .into_iter()
        .find(|f| f.id == faction_id)
        .map(|f| f.name)
}

/// Render share text for a saved file.
pub fn render_share(
    config: &Config,
    kind: ShareKind,
    path: &Path,
    format: ShareFormat,
    refresh: bool,
) -> Result<String> {
    match kind {
        ShareKind::Roster => {
            let mut roster: Roster = read_json(path)?;
            if refresh {
                if let Some(faction) = load_faction(config, &roster.faction_id) {
                    roster = refresh_roster(roster, &faction);
                }
            }
            let name = faction_name(config, &roster.faction_id);
            Ok(match format {
                ShareFormat::Markdown => roster_to_markdown(&roster, name.as_deref()),
                ShareFormat::Text => roster_to_text(&roster, name.as_deref()),
            })
        }
        ShareKind::Collection => {
            let mut collection: Collection = read_json(path)?;
            if refresh {
                if let Some(faction) = load_faction(config, &collection.faction_id) {
                    collection = refresh_collection(collection, &faction);
                }
            }
            let name = faction_name(config, &collection.faction_id);
            Ok(match format {
                ShareFormat::Markdown => collection_to_markdown(&collection, name.as_deref()),
                ShareFormat::Text => collection_to_text(&collection, name.as_deref()),
            })
        }
    }
}

pub fn run_share(
    config: &Config,
    kind: ShareKind,
    path: &Path,
    format: ShareFormat,
    refresh: bool,
) -> Result<()> {
    let text = render_share(config, kind, path, format, refresh)?;
    print!("{}", text);
    Ok(())
}
