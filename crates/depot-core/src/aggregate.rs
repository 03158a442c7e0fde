//! Grouping, filtering and ordering of datasheets and detachment content
//! for the browse views.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{
    Datasheet, DetachmentAbility, Enhancement, Stratagem, SupplementMetadata, SupplementOption,
};
use crate::supplement::{format_supplement_label, normalize_supplement_key, CODEX_KEY, CODEX_LABEL};

pub const ALL_KEY: &str = "all";
pub const ALL_LABEL: &str = "All";

fn supplement_key_of(datasheet: &Datasheet) -> String {
    normalize_supplement_key(Some(&datasheet.supplement_key))
}

fn is_codex(datasheet: &Datasheet) -> bool {
    supplement_key_of(datasheet) == CODEX_KEY
}

fn compare_names(a: &Datasheet, b: &Datasheet) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

/// Buckets keyed by role, each sorted by name (case-insensitive).
pub fn group_datasheets_by_role(datasheets: &[Datasheet]) -> BTreeMap<String, Vec<Datasheet>> {
    let mut groups: BTreeMap<String, Vec<Datasheet>> = BTreeMap::new();
    for datasheet in datasheets {
        groups
            .entry(datasheet.role.clone())
            .or_default()
            .push(datasheet.clone());
    }
    for bucket in groups.values_mut() {
        bucket.sort_by(compare_names);
    }
    groups
}

/// Client display toggles. `None` means "no preference".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    pub show_legends: Option<bool>,
    pub show_forge_world: Option<bool>,
}

/// Hide Legends / Forge World entries only when explicitly switched off.
pub fn filter_datasheets_by_settings(
    datasheets: &[Datasheet],
    settings: Option<&DisplaySettings>,
) -> Vec<Datasheet> {
    let Some(settings) = settings else {
        return datasheets.to_vec();
    };
    datasheets
        .iter()
        .filter(|ds| !(settings.show_legends == Some(false) && ds.is_legends))
        .filter(|ds| !(settings.show_forge_world == Some(false) && ds.is_forge_world))
        .cloned()
        .collect()
}

/// Filter options for the supplement selector.
///
/// `All` always comes first; `None` (codex) only when codex datasheets
/// exist; then one option per supplement, sorted by label.
pub fn derive_supplement_metadata(datasheets: &[Datasheet]) -> SupplementMetadata {
    let mut supplements: BTreeMap<String, (String, usize)> = BTreeMap::new();
    let mut codex_count = 0;

    for datasheet in datasheets {
        let key = supplement_key_of(datasheet);
        if key == CODEX_KEY {
            codex_count += 1;
            continue;
        }
        supplements
            .entry(key.clone())
            .or_insert_with(|| {
                let label = format_supplement_label(&key, Some(&datasheet.supplement_name));
                (label, 0)
            })
            .1 += 1;
    }

    let mut options = vec![SupplementOption {
        key: ALL_KEY.to_string(),
        label: ALL_LABEL.to_string(),
        count: datasheets.len(),
    }];
    if codex_count > 0 {
        options.push(SupplementOption {
            key: CODEX_KEY.to_string(),
            label: CODEX_LABEL.to_string(),
            count: codex_count,
        });
    }

    let mut supplement_options: Vec<SupplementOption> = supplements
        .into_iter()
        .map(|(key, (label, count))| SupplementOption { key, label, count })
        .collect();
    supplement_options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.key.cmp(&b.key)));

    SupplementMetadata {
        has_supplements: !supplement_options.is_empty(),
        has_codex_datasheets: codex_count > 0,
        options: options.into_iter().chain(supplement_options).collect(),
    }
}

/// `all` → everything; `codex` → codex only; any other key → that
/// supplement's datasheets followed by every codex datasheet.
pub fn filter_datasheets_by_supplement(
    datasheets: &[Datasheet],
    selection: &str,
) -> Vec<Datasheet> {
    let selection = selection.trim().to_lowercase();
    if selection == ALL_KEY {
        return datasheets.to_vec();
    }
    let selection = normalize_supplement_key(Some(&selection));
    let codex = datasheets.iter().filter(|ds| is_codex(ds));
    if selection == CODEX_KEY {
        return codex.cloned().collect();
    }
    datasheets
        .iter()
        .filter(|ds| supplement_key_of(ds) == selection)
        .chain(codex)
        .cloned()
        .collect()
}

/// Stable sort putting the selected group first, then codex, then the rest,
/// each by name.
pub fn sort_datasheets_by_supplement_preference(
    datasheets: &[Datasheet],
    selected_supplement: &str,
    has_supplements: bool,
) -> Vec<Datasheet> {
    let mut sorted = datasheets.to_vec();
    let selected = selected_supplement.trim().to_lowercase();
    if !has_supplements || selected == ALL_KEY {
        return sorted;
    }
    let preferred = normalize_supplement_key(Some(&selected));

    let rank = |ds: &Datasheet| {
        let key = supplement_key_of(ds);
        if key == preferred {
            0
        } else if key == CODEX_KEY {
            1
        } else {
            2
        }
    };
    sorted.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| compare_names(a, b)));
    sorted
}

/// Everything sharing one detachment name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetachmentGroup {
    pub abilities: Vec<DetachmentAbility>,
    pub enhancements: Vec<Enhancement>,
    pub stratagems: Vec<Stratagem>,
}

/// Group by exact detachment name. Every name seen on any of the three
/// kinds gets a bucket, even if some kinds are empty for it.
pub fn group_faction_data_by_detachment(
    detachment_abilities: &[DetachmentAbility],
    enhancements: &[Enhancement],
    stratagems: &[Stratagem],
) -> BTreeMap<String, DetachmentGroup> {
    let names: BTreeSet<&str> = detachment_abilities
        .iter()
        .map(|a| a.detachment.as_str())
        .chain(enhancements.iter().map(|e| e.detachment.as_str()))
        .chain(stratagems.iter().map(|s| s.detachment.as_str()))
        .collect();

    let mut groups: BTreeMap<String, DetachmentGroup> = names
        .into_iter()
        .map(|name| (name.to_string(), DetachmentGroup::default()))
        .collect();

    for ability in detachment_abilities {
        if let Some(group) = groups.get_mut(&ability.detachment) {
            group.abilities.push(ability.clone());
        }
    }
    for enhancement in enhancements {
        if let Some(group) = groups.get_mut(&enhancement.detachment) {
            group.enhancements.push(enhancement.clone());
        }
    }
    for stratagem in stratagems {
        if let Some(group) = groups.get_mut(&stratagem.detachment) {
            group.stratagems.push(stratagem.clone());
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(id: &str, name: &str, role: &str, key: &str) -> Datasheet {
        Datasheet {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            supplement_key: key.to_string(),
            ..Default::default()
        }
    }

    fn names(datasheets: &[Datasheet]) -> Vec<&str> {
        datasheets.iter().map(|d| d.name.as_str()).collect()
    }

    fn four_sheets() -> Vec<Datasheet> {
        vec![
            sheet("1", "Intercessors", "Battleline", ""),
            sheet("2", "Captain", "Characters", "codex"),
            sheet("3", "Sanguinary Guard", "Infantry", "blood-angels"),
            sheet("4", "Deathwing Knights", "Infantry", "dark-angels"),
        ]
    }

    #[test]
    fn roles_group_and_sort_case_insensitively() {
        let sheets = vec![
            sheet("1", "tactical squad", "Battleline", ""),
            sheet("2", "Assault Intercessors", "Battleline", ""),
            sheet("3", "Captain", "Characters", ""),
        ];
        let groups = group_datasheets_by_role(&sheets);
        assert_eq!(groups.len(), 2);
        assert_eq!(
            names(&groups["Battleline"]),
            vec!["Assault Intercessors", "tactical squad"]
        );
        assert_eq!(names(&groups["Characters"]), vec!["Captain"]);
    }

    #[test]
    fn settings_filter_only_when_explicitly_false() {
        let mut legends = sheet("1", "Legends Unit", "Other", "");
        legends.is_legends = true;
        let mut forge = sheet("2", "Forge Unit", "Other", "");
        forge.is_forge_world = true;
        let plain = sheet("3", "Plain Unit", "Other", "");
        let sheets = vec![legends, forge, plain];

        assert_eq!(filter_datasheets_by_settings(&sheets, None), sheets);
        assert_eq!(
            filter_datasheets_by_settings(&sheets, Some(&DisplaySettings::default())),
            sheets
        );

        let hide_legends = DisplaySettings {
            show_legends: Some(false),
            show_forge_world: Some(true),
        };
        assert_eq!(
            names(&filter_datasheets_by_settings(&sheets, Some(&hide_legends))),
            vec!["Forge Unit", "Plain Unit"]
        );

        let hide_both = DisplaySettings {
            show_legends: Some(false),
            show_forge_world: Some(false),
        };
        assert_eq!(
            names(&filter_datasheets_by_settings(&sheets, Some(&hide_both))),
            vec!["Plain Unit"]
        );
    }

    #[test]
    fn supplement_metadata_options() {
        let metadata = derive_supplement_metadata(&four_sheets());
        let options: Vec<(&str, &str, usize)> = metadata
            .options
            .iter()
            .map(|o| (o.key.as_str(), o.label.as_str(), o.count))
            .collect();

        assert_eq!(
            options,
            vec![
                ("all", "All", 4),
                ("codex", "None", 2),
                ("blood-angels", "Blood Angels", 1),
                ("dark-angels", "Dark Angels", 1),
            ]
        );
        assert!(metadata.has_supplements);
        assert!(metadata.has_codex_datasheets);
    }

    #[test]
    fn supplement_metadata_without_codex() {
        let metadata = derive_supplement_metadata(&[sheet("1", "A", "Other", "deathwatch")]);
        let keys: Vec<&str> = metadata.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["all", "deathwatch"]);
        assert!(!metadata.has_codex_datasheets);
    }

    #[test]
    fn filter_by_supplement_appends_codex() {
        let mut sheets = four_sheets();
        sheets.push(sheet("5", "Custom Hero", "Characters", "custom-supplement"));

        assert_eq!(filter_datasheets_by_supplement(&sheets, "all"), sheets);
        assert_eq!(
            names(&filter_datasheets_by_supplement(&sheets, "codex")),
            vec!["Intercessors", "Captain"]
        );
        assert_eq!(
            names(&filter_datasheets_by_supplement(&sheets, "custom-supplement")),
            vec!["Custom Hero", "Intercessors", "Captain"]
        );
    }

    #[test]
    fn preference_sort() {
        let sheets = four_sheets();
        assert_eq!(
            sort_datasheets_by_supplement_preference(&sheets, "blood-angels", false),
            sheets
        );
        assert_eq!(
            sort_datasheets_by_supplement_preference(&sheets, "all", true),
            sheets
        );
        assert_eq!(
            names(&sort_datasheets_by_supplement_preference(&sheets, "dark-angels", true)),
            vec![
                "Deathwing Knights",
                "Captain",
                "Intercessors",
                "Sanguinary Guard",
            ]
        );
        assert_eq!(
            names(&sort_datasheets_by_supplement_preference(&sheets, "codex", true)),
            vec![
                "Captain",
                "Intercessors",
                "Deathwing Knights",
                "Sanguinary Guard",
            ]
        );
    }

    #[test]
    fn detachment_grouping_covers_every_name() {
        let abilities = vec![DetachmentAbility {
            id: "da1".to_string(),
            detachment: "Gladius Task Force".to_string(),
            ..Default::default()
        }];
        let enhancements = vec![Enhancement {
            id: "e1".to_string(),
            detachment: "Ironstorm Spearhead".to_string(),
            ..Default::default()
        }];
        let stratagems = vec![
            Stratagem {
                id: "s1".to_string(),
                detachment: "Gladius Task Force".to_string(),
                ..Default::default()
            },
            Stratagem {
                id: "s2".to_string(),
                detachment: String::new(),
                ..Default::default()
            },
        ];

        let groups = group_faction_data_by_detachment(&abilities, &enhancements, &stratagems);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["", "Gladius Task Force", "Ironstorm Spearhead"]);

        let gladius = &groups["Gladius Task Force"];
        assert_eq!(gladius.abilities.len(), 1);
        assert_eq!(gladius.stratagems.len(), 1);
        assert!(gladius.enhancements.is_empty());

        let ironstorm = &groups["Ironstorm Spearhead"];
        assert_eq!(ironstorm.enhancements.len(), 1);
        assert!(ironstorm.abilities.is_empty());
        assert_eq!(groups[""].stratagems.len(), 1);
    }
}
