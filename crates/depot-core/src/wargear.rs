//! Wargear grouping: flat per-profile rows into weapons with profiles.
//!
//! Upstream publishes one row per weapon profile. A multi-mode weapon
//! repeats its base name across consecutive rows, with the mode appended
//! after a dash: `Plasma pistol - standard`, `Plasma pistol - supercharge`.
//! Grouping is positional: only *consecutive* rows sharing a base name
//! collapse into one [`Wargear`].
//!
//! Grouped ids are `<datasheetId>-<slug of base name>`, so they survive
//! regeneration and saved roster selections can be matched again.

use std::collections::{HashMap, HashSet};

use crate::models::{
    Datasheet, DatasheetWargear, Wargear, WargearEntry, WargearKind, WargearProfile,
};
use crate::util::{normalize_name, slugify};

const PROFILE_SEPARATORS: [&str; 3] = [" - ", " – ", " — "];

/// The weapon name without its `" - <profile>"` qualifier.
pub fn base_weapon_name(name: &str) -> &str {
    let cut = PROFILE_SEPARATORS
        .iter()
        .filter_map(|sep| name.find(sep))
        .min()
        .unwrap_or(name.len());
    name[..cut].trim()
}

pub fn wargear_id(datasheet_id: &str, base_name: &str) -> String {
    format!("{}-{}", datasheet_id, slugify(base_name))
}

fn profile_from_row(row: &DatasheetWargear) -> WargearProfile {
    WargearProfile {
        name: row.name.trim().to_string(),
        line_in_wargear: row.line_in_wargear.clone(),
        dice: row.dice.clone(),
        range: row.range.clone(),
        kind: row.kind.clone(),
        attacks: row.a.clone(),
        skill: row.bs_ws.clone(),
        strength: row.s.clone(),
        ap: row.ap.clone(),
        damage: row.d.clone(),
        description: row.description.clone(),
    }
}

fn is_melee(profile: &WargearProfile) -> bool {
    profile.kind.trim().eq_ignore_ascii_case("melee")
        || profile.range.trim().eq_ignore_ascii_case("melee")
}

pub fn wargear_kind(profiles: &[WargearProfile]) -> WargearKind {
    let melee = profiles.iter().filter(|p| is_melee(p)).count();
    if melee == 0 {
        WargearKind::Ranged
    } else if melee == profiles.len() {
        WargearKind::Melee
    } else {
        WargearKind::Mixed
    }
}

/// Group a mixed list of entries. Already-grouped entries pass through
/// untouched; runs of legacy rows are collapsed by base name.
pub fn group_wargear(entries: Vec<WargearEntry>, datasheet_id: &str) -> Vec<Wargear> {
    let mut grouped: Vec<Wargear> = Vec::with_capacity(entries.len());
    // Index into `grouped` of the weapon legacy rows may still extend.
    let mut open: Option<usize> = None;

    for entry in entries {
        let row = match entry {
            WargearEntry::Grouped(wargear) => {
                grouped.push(wargear);
                open = None;
                continue;
            }
            WargearEntry::Legacy(row) => row,
        };

        let base = base_weapon_name(&row.name);
        let profile = profile_from_row(&row);

        if let Some(current) = open.and_then(|i| grouped.get_mut(i)) {
            if normalize_name(&current.name) == normalize_name(base) {
                current.profiles.push(profile);
                current.kind = wargear_kind(&current.profiles);
                continue;
            }
        }

        let owner = if row.datasheet_id.is_empty() {
            datasheet_id
        } else {
            row.datasheet_id.as_str()
        };
        let profiles = vec![profile];
        grouped.push(Wargear {
            id: wargear_id(owner, base),
            datasheet_id: owner.to_string(),
            line: row.line.clone(),
            name: base.to_string(),
            kind: wargear_kind(&profiles),
            profiles,
        });
        open = Some(grouped.len() - 1);
    }

    grouped
}

/// Bring a datasheet's wargear into grouped form. Idempotent.
pub fn normalize_datasheet_wargear(mut datasheet: Datasheet) -> Datasheet {
    let all_grouped = datasheet
        .wargear
        .iter()
        .all(|entry| matches!(entry, WargearEntry::Grouped(_)));
    if all_grouped {
        return datasheet;
    }

    let entries = std::mem::take(&mut datasheet.wargear);
    datasheet.wargear = group_wargear(entries, &datasheet.id)
        .into_iter()
        .map(WargearEntry::Grouped)
        .collect();
    datasheet
}

/// Re-resolve a saved selection against the current grouped wargear.
///
/// Grouped selections match by id first, then by base name; legacy rows
/// match by base name (case- and whitespace-insensitive). Each canonical
/// weapon appears once, in first-matched order. Selections that match
/// nothing are dropped.
pub fn normalize_selected_wargear(
    selection: &[WargearEntry],
    canonical: &[Wargear],
) -> Vec<Wargear> {
    let by_id: HashMap<&str, &Wargear> = canonical.iter().map(|w| (w.id.as_str(), w)).collect();
    let mut by_name: HashMap<String, &Wargear> = HashMap::new();
    for wargear in canonical {
        by_name
            .entry(normalize_name(base_weapon_name(&wargear.name)))
            .or_insert(wargear);
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    for entry in selection {
        let matched = match entry {
            WargearEntry::Grouped(w) => by_id
                .get(w.id.as_str())
                .or_else(|| by_name.get(&normalize_name(base_weapon_name(&w.name)))),
            WargearEntry::Legacy(row) => by_name.get(&normalize_name(base_weapon_name(&row.name))),
        };
        if let Some(wargear) = matched {
            if seen.insert(wargear.id.clone()) {
                resolved.push((*wargear).clone());
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(name: &str, kind: &str, range: &str) -> DatasheetWargear {
        DatasheetWargear {
            datasheet_id: "000000042".to_string(),
            line: "1".to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            range: range.to_string(),
            a: "1".to_string(),
            bs_ws: "3+".to_string(),
            s: "4".to_string(),
            ap: "0".to_string(),
            d: "1".to_string(),
            ..Default::default()
        }
    }

    fn bolt_pistol_sheet() -> Datasheet {
        Datasheet {
            id: "000000042".to_string(),
            name: "Captain".to_string(),
            wargear: vec![
                WargearEntry::Legacy(row("Bolt pistol", "Ranged", "12\"")),
                WargearEntry::Legacy(row("Bolt pistol - Melee Strike", "Melee", "Melee")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn base_name_strips_profile_qualifier() {
        assert_eq!(
            base_weapon_name("Bolt pistol - Melee Strike"),
            "Bolt pistol"
        );
        assert_eq!(
            base_weapon_name("Plasma pistol – supercharge"),
            "Plasma pistol"
        );
        assert_eq!(base_weapon_name(" Power fist "), "Power fist");
        assert_eq!(base_weapon_name("Combi-weapon"), "Combi-weapon");
    }

    #[test]
    fn consecutive_rows_group_into_one_weapon() {
        let normalized = normalize_datasheet_wargear(bolt_pistol_sheet());
        let wargear = normalized.grouped_wargear();

        assert_eq!(wargear.len(), 1);
        assert_eq!(wargear[0].id, "000000042-bolt-pistol");
        assert_eq!(wargear[0].name, "Bolt pistol");
        assert_eq!(wargear[0].kind, WargearKind::Mixed);
        assert_eq!(wargear[0].profiles.len(), 2);
        assert_eq!(wargear[0].profiles[1].name, "Bolt pistol - Melee Strike");
        assert_eq!(wargear[0].profiles[0].skill, "3+");
    }

    #[test]
    fn grouped_input_is_unchanged() {
        let once = normalize_datasheet_wargear(bolt_pistol_sheet());
        let twice = normalize_datasheet_wargear(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn legacy_selection_rematches_grouped_weapon() {
        let legacy_selection = bolt_pistol_sheet().wargear;
        let canonical = normalize_datasheet_wargear(bolt_pistol_sheet()).grouped_wargear();

        let resolved = normalize_selected_wargear(&legacy_selection, &canonical);
        assert_eq!(resolved, canonical);
    }

    #[test]
    fn selection_matches_by_id_then_name_and_drops_unknown() {
        let canonical = normalize_datasheet_wargear(bolt_pistol_sheet()).grouped_wargear();
        let mut renamed = canonical[0].clone();
        renamed.name = "Renamed upstream".to_string();
        let mut rekeyed = canonical[0].clone();
        rekeyed.id = "stale-id".to_string();
        rekeyed.name = "  BOLT   pistol ".to_string();

        let selection = vec![
            WargearEntry::Grouped(renamed),
            WargearEntry::Grouped(rekeyed),
            WargearEntry::Legacy(row("Chainsword", "Melee", "Melee")),
        ];
        let resolved = normalize_selected_wargear(&selection, &canonical);
        assert_eq!(resolved, canonical);
    }

    #[test]
    fn kinds() {
        let ranged = group_wargear(
            vec![WargearEntry::Legacy(row("Boltgun", "Ranged", "24\""))],
            "x",
        );
        assert_eq!(ranged[0].kind, WargearKind::Ranged);

        let melee = group_wargear(
            vec![WargearEntry::Legacy(row("Chainsword", "Melee", "Melee"))],
            "x",
        );
        assert_eq!(melee[0].kind, WargearKind::Melee);
    }

    #[test]
    fn non_consecutive_profiles_form_separate_groups() {
        let grouped = group_wargear(
            vec![
                WargearEntry::Legacy(row("Plasma pistol - standard", "Ranged", "12\"")),
                WargearEntry::Legacy(row("Chainsword", "Melee", "Melee")),
                WargearEntry::Legacy(row("Plasma pistol - supercharge", "Ranged", "12\"")),
            ],
            "000000042",
        );
        let names: Vec<&str> = grouped.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Plasma pistol", "Chainsword", "Plasma pistol"]);
    }

    #[test]
    fn missing_row_datasheet_id_falls_back_to_owner() {
        let mut orphan = row("Boltgun", "Ranged", "24\"");
        orphan.datasheet_id.clear();
        let grouped = group_wargear(vec![WargearEntry::Legacy(orphan)], "000000007");
        assert_eq!(grouped[0].id, "000000007-boltgun");
        assert_eq!(grouped[0].datasheet_id, "000000007");
    }
}
