//! Supplement identity: which sub-expansion of a faction a datasheet or
//! detachment belongs to.
//!
//! Two strategies coexist:
//!
//! 1. [`get_supplement_info`] looks a `(faction, source)` pair up in a fixed
//!    table of known supplement books.
//! 2. [`build_detachment_supplement_index`] derives a detachment's
//!    supplement from the datasheets linked to its abilities.
//!
//! The reserved key [`CODEX_KEY`] means "no supplement" and always displays
//! as `None`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::{Datasheet, DetachmentAbility};
use crate::util::{slugify, title_case_slug};

pub const CODEX_KEY: &str = "codex";
pub const CODEX_LABEL: &str = "None";

const LEGENDS_KEY_SUFFIX: &str = "-legends";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupplementInfo {
    pub slug: &'static str,
    pub name: &'static str,
}

/// faction id → source id → supplement.
static SUPPLEMENTS: LazyLock<HashMap<&'static str, HashMap<&'static str, SupplementInfo>>> =
    LazyLock::new(|| {
        let space_marines = [
            ("000000021", "blood-angels", "Blood Angels"),
            ("000000022", "dark-angels", "Dark Angels"),
            ("000000023", "space-wolves", "Space Wolves"),
            ("000000024", "black-templars", "Black Templars"),
            ("000000025", "deathwatch", "Deathwatch"),
            ("000000026", "ultramarines", "Ultramarines"),
            ("000000027", "imperial-fists", "Imperial Fists"),
            ("000000028", "iron-hands", "Iron Hands"),
            ("000000029", "raven-guard", "Raven Guard"),
            ("000000030", "salamanders", "Salamanders"),
            ("000000031", "white-scars", "White Scars"),
        ];

        let mut table = HashMap::new();
        table.insert(
            "SM",
            space_marines
                .into_iter()
                .map(|(source, slug, name)| (source, SupplementInfo { slug, name }))
                .collect(),
        );
        table
    });

/// Static lookup. `None` when the faction has no table, the source id is
/// absent, or the source is not a known supplement.
pub fn get_supplement_info(faction_id: &str, source_id: Option<&str>) -> Option<SupplementInfo> {
    let by_source = SUPPLEMENTS.get(faction_id)?;
    by_source.get(source_id?).copied()
}

/// Normalize any supplement key to a non-empty lowercase slug.
pub fn normalize_supplement_key(key: Option<&str>) -> String {
    let slug = key.map(slugify).unwrap_or_default();
    if slug.is_empty() {
        CODEX_KEY.to_string()
    } else {
        slug
    }
}

pub fn is_codex_key(key: &str) -> bool {
    normalize_supplement_key(Some(key)) == CODEX_KEY
}

/// Display label for a supplement: explicit label when given, otherwise
/// the key title-cased.
pub fn format_supplement_label(key: &str, label: Option<&str>) -> String {
    let key = normalize_supplement_key(Some(key));
    if key == CODEX_KEY {
        return CODEX_LABEL.to_string();
    }
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => title_case_slug(&key),
    }
}

/// Like [`format_supplement_label`] but with any Legends marker removed,
/// for use inside other labels.
pub fn format_short_supplement_label(key: &str, label: Option<&str>) -> String {
    let key = normalize_supplement_key(Some(key));
    if key == CODEX_KEY {
        return CODEX_LABEL.to_string();
    }
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => strip_legends_label(label).to_string(),
        _ => title_case_slug(key.strip_suffix(LEGENDS_KEY_SUFFIX).unwrap_or(&key)),
    }
}

fn strip_legends_label(label: &str) -> &str {
    for suffix in ["(Warhammer Legends)", "(Legends)"] {
        if label.len() >= suffix.len() {
            let split = label.len() - suffix.len();
            if label.is_char_boundary(split) && label[split..].eq_ignore_ascii_case(suffix) {
                return label[..split].trim_end();
            }
        }
    }
    label
}

/// `"Gladius Task Force [Blood Angels]"` for supplement detachments, the
/// bare name otherwise.
pub fn format_detachment_option_label(
    name: &str,
    supplement_key: &str,
    supplement_label: Option<&str>,
) -> String {
    if is_codex_key(supplement_key) {
        return name.to_string();
    }
    format!(
        "{} [{}]",
        name,
        format_short_supplement_label(supplement_key, supplement_label)
    )
}

/// A `datasheets-detachment-abilities` join row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasheetDetachmentAbilityLink {
    pub datasheet_id: String,
    pub detachment_ability_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachmentSupplement {
    pub supplement_key: String,
    pub supplement_label: String,
}

impl DetachmentSupplement {
    fn codex() -> Self {
        Self {
            supplement_key: CODEX_KEY.to_string(),
            supplement_label: CODEX_LABEL.to_string(),
        }
    }
}

/// Derive each detachment's supplement from its linked datasheets.
///
/// The first linked datasheet carrying a non-codex supplement decides;
/// detachments with no such datasheet fall back to codex. Links to unknown
/// datasheets are skipped.
pub fn build_detachment_supplement_index(
    datasheets: &[Datasheet],
    links: &[DatasheetDetachmentAbilityLink],
    detachment_abilities: &[DetachmentAbility],
) -> BTreeMap<String, DetachmentSupplement> {
    let datasheets_by_id: HashMap<&str, &Datasheet> =
        datasheets.iter().map(|ds| (ds.id.as_str(), ds)).collect();

    let mut index = BTreeMap::new();
    for ability in detachment_abilities {
        if index.contains_key(&ability.detachment) {
            continue;
        }

        let ability_ids: HashSet<&str> = detachment_abilities
            .iter()
            .filter(|a| a.detachment == ability.detachment)
            .map(|a| a.id.as_str())
            .collect();

        let supplement = links
            .iter()
            .filter(|link| ability_ids.contains(link.detachment_ability_id.as_str()))
            .filter_map(|link| datasheets_by_id.get(link.datasheet_id.as_str()))
            .find_map(|ds| {
                let key = normalize_supplement_key(Some(&ds.supplement_key));
                (key != CODEX_KEY).then(|| DetachmentSupplement {
                    supplement_label: format_supplement_label(&key, Some(&ds.supplement_name)),
                    supplement_key: key,
                })
            })
            .unwrap_or_else(DetachmentSupplement::codex);

        index.insert(ability.detachment.clone(), supplement);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn static_lookup() {
        assert_eq!(
            get_supplement_info("SM", Some("000000021")),
            Some(SupplementInfo {
                slug: "blood-angels",
                name: "Blood Angels"
            })
        );
        assert_eq!(get_supplement_info("SM", None), None);
        assert_eq!(get_supplement_info("XYZ", Some("000000021")), None);
        assert_eq!(get_supplement_info("SM", Some("unknown")), None);
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_supplement_key(None), "codex");
        assert_eq!(normalize_supplement_key(Some("  ")), "codex");
        assert_eq!(
            normalize_supplement_key(Some("Blood Angels")),
            "blood-angels"
        );
        assert!(is_codex_key("CODEX"));
        assert!(!is_codex_key("deathwatch"));
    }

    #[test]
    fn labels() {
        assert_eq!(format_supplement_label("codex", Some("Anything")), "None");
        assert_eq!(format_supplement_label("dark-angels", None), "Dark Angels");
        assert_eq!(
            format_supplement_label("dark-angels", Some("Sons of the Lion")),
            "Sons of the Lion"
        );
        assert_eq!(
            format_short_supplement_label("blood-angels-legends", None),
            "Blood Angels"
        );
        assert_eq!(
            format_short_supplement_label("blood-angels-legends", Some("Blood Angels (Legends)")),
            "Blood Angels"
        );
    }

    #[test]
    fn detachment_option_labels() {
        assert_eq!(
            format_detachment_option_label("Gladius Task Force", "codex", Some("None")),
            "Gladius Task Force"
        );
        assert_eq!(
            format_detachment_option_label("Liberator Assault Group", "blood-angels", None),
            "Liberator Assault Group [Blood Angels]"
        );
    }

    fn sheet(id: &str, key: &str, name: &str) -> Datasheet {
        Datasheet {
            id: id.to_string(),
            supplement_key: key.to_string(),
            supplement_name: name.to_string(),
            ..Default::default()
        }
    }

    fn ability(id: &str, detachment: &str) -> DetachmentAbility {
        DetachmentAbility {
            id: id.to_string(),
            detachment: detachment.to_string(),
            ..Default::default()
        }
    }

    fn link(datasheet: &str, ability: &str) -> DatasheetDetachmentAbilityLink {
        DatasheetDetachmentAbilityLink {
            datasheet_id: datasheet.to_string(),
            detachment_ability_id: ability.to_string(),
        }
    }

    #[test]
    fn detachment_index_prefers_first_supplement_datasheet() {
        let datasheets = vec![
            sheet("codex-sheet", "codex", ""),
            sheet("ba-sheet", "blood-angels", "Blood Angels"),
            sheet("dw-sheet", "deathwatch", "Deathwatch"),
        ];
        let abilities = vec![
            ability("gladius-core", "Gladius Task Force"),
            ability("gladius-ba", "Gladius Task Force"),
            ability("spectrus", "Spectrus Kill Team"),
            ability("firestorm", "Firestorm Assault Force"),
        ];
        let links = vec![
            link("codex-sheet", "gladius-core"),
            link("ba-sheet", "gladius-ba"),
            link("dw-sheet", "spectrus"),
            link("codex-sheet", "firestorm"),
            link("missing-sheet", "firestorm"),
        ];

        let index = build_detachment_supplement_index(&datasheets, &links, &abilities);

        assert_eq!(
            index["Gladius Task Force"],
            DetachmentSupplement {
                supplement_key: "blood-angels".to_string(),
                supplement_label: "Blood Angels".to_string(),
            }
        );
        assert_eq!(
            index["Spectrus Kill Team"],
            DetachmentSupplement {
                supplement_key: "deathwatch".to_string(),
                supplement_label: "Deathwatch".to_string(),
            }
        );
        assert_eq!(
            index["Firestorm Assault Force"],
            DetachmentSupplement::codex()
        );
    }
}
