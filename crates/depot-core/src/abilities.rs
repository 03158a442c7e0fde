//! Ability categorization, display ordering, and re-resolution of saved
//! wargear-ability selections.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::Ability;
use crate::util::slugify;

/// Abilities split by how the client renders them: full text inline, or a
/// name that refers to a shared rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedAbilities {
    pub inline: Vec<Ability>,
    pub referenced: Vec<Ability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityCategory {
    Inline,
    Referenced,
}

/// First match wins; the last two rules catch non-standard upstream types.
pub fn ability_category(ability: &Ability) -> AbilityCategory {
    let kind = ability.kind.trim();
    match kind {
        "Datasheet" | "Wargear" => AbilityCategory::Inline,
        "Core" | "Faction" => AbilityCategory::Referenced,
        _ if kind.contains("Special") || kind.contains("Fortification") => AbilityCategory::Inline,
        _ if !ability.id.trim().is_empty() => AbilityCategory::Referenced,
        _ => AbilityCategory::Inline,
    }
}

pub fn categorize_abilities(abilities: &[Ability]) -> CategorizedAbilities {
    let mut categorized = CategorizedAbilities::default();
    for ability in abilities {
        match ability_category(ability) {
            AbilityCategory::Inline => categorized.inline.push(ability.clone()),
            AbilityCategory::Referenced => categorized.referenced.push(ability.clone()),
        }
    }
    categorized
}

fn normalized_kind(ability: &Ability) -> String {
    ability.kind.trim().to_lowercase()
}

/// Core abilities first, then by type, then by display name (case-insensitive).
pub fn compare_for_display(a: &Ability, b: &Ability) -> Ordering {
    let (kind_a, kind_b) = (normalized_kind(a), normalized_kind(b));
    let core_a = kind_a.contains("core");
    let core_b = kind_b.contains("core");
    core_b
        .cmp(&core_a)
        .then_with(|| kind_a.cmp(&kind_b))
        .then_with(|| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
        })
}

pub fn sort_abilities_for_display(abilities: &mut [Ability]) {
    abilities.sort_by(compare_for_display);
}

pub fn ability_slug(ability: &Ability) -> String {
    slugify(&ability.display_name())
}

fn is_wargear_ability(ability: &Ability) -> bool {
    ability.kind.trim().eq_ignore_ascii_case("wargear")
}

/// Re-resolve saved wargear-ability selections against a datasheet.
///
/// Each selection is matched to one of the datasheet's wargear abilities by
/// id, or failing that by the slug of its display name. The canonical
/// ability is kept once per id and once per slug, in first-matched order, and always carries an id
/// (its slug when upstream gave none). Selections that match nothing are
/// dropped.
pub fn normalize_selected_wargear_abilities(
    selected: &[Ability],
    datasheet_abilities: &[Ability],
) -> Vec<Ability> {
    let wargear: Vec<&Ability> = datasheet_abilities
        .iter()
        .filter(|a| is_wargear_ability(a))
        .collect();

    let mut by_id: HashMap<&str, &Ability> = HashMap::new();
    let mut by_slug: HashMap<String, &Ability> = HashMap::new();
    for ability in wargear {
        if !ability.id.trim().is_empty() {
            by_id.entry(ability.id.trim()).or_insert(ability);
        }
        by_slug.entry(ability_slug(ability)).or_insert(ability);
    }

    let mut seen_ids = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut resolved = Vec::new();
    for selection in selected {
        let matched = by_id
            .get(selection.id.trim())
            .or_else(|| by_slug.get(&ability_slug(selection)));
        let Some(canonical) = matched else {
            continue;
        };

        let mut ability = (*canonical).clone();
        if ability.id.trim().is_empty() {
            ability.id = ability_slug(&ability);
        }
        let slug = ability_slug(&ability);
        if seen_ids.contains(&ability.id) || seen_slugs.contains(&slug) {
            continue;
        }
        seen_ids.insert(ability.id.clone());
        seen_slugs.insert(slug);
        resolved.push(ability);
    }
    resolved
}
