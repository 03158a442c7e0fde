//! The `depot` schema: normalized documents produced by the generator and
//! the user-authored roster/collection shapes that snapshot them.
//!
//! Every type serializes with camelCase keys, which is the shape the web
//! client reads. Upstream tables decode straight into several of these
//! types because the parser camelCases the upstream headers.

use serde::{Deserialize, Serialize};

/// One published rules document (codex, index, errata pack, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub edition: String,
    pub version: String,
    pub errata_date: String,
    pub errata_link: String,
}

/// A faction document: the root the web client loads per army.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Faction {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub link: String,
    pub datasheets: Vec<Datasheet>,
    pub stratagems: Vec<Stratagem>,
    pub enhancements: Vec<Enhancement>,
    pub detachment_abilities: Vec<DetachmentAbility>,
    pub detachments: Vec<Detachment>,
    pub supplements: SupplementMetadata,
}

/// The per-unit rules card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datasheet {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub faction_id: String,
    pub source_id: String,
    pub legend: String,
    pub role: String,
    pub loadout: String,
    pub transport: String,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    pub leader_head: String,
    pub leader_footer: String,
    pub damaged_w: String,
    pub damaged_description: String,
    pub link: String,
    pub is_forge_world: bool,
    pub is_legends: bool,
    pub supplement_key: String,
    pub supplement_slug: String,
    pub supplement_name: String,
    pub supplement_label: String,
    pub is_supplement: bool,
    pub abilities: Vec<Ability>,
    pub keywords: Vec<DatasheetKeyword>,
    pub models: Vec<DatasheetModel>,
    pub options: Vec<DatasheetOption>,
    pub wargear: Vec<WargearEntry>,
    pub unit_composition: Vec<UnitComposition>,
    pub model_costs: Vec<ModelCost>,
    pub stratagems: Vec<Stratagem>,
    pub enhancements: Vec<Enhancement>,
    pub detachment_abilities: Vec<DetachmentAbility>,
    pub leaders: Vec<LeaderTarget>,
}

impl Datasheet {
    /// The grouped wargear entries. After
    /// [`normalize_datasheet_wargear`](crate::wargear::normalize_datasheet_wargear)
    /// this is every entry.
    pub fn grouped_wargear(&self) -> Vec<Wargear> {
        self.wargear
            .iter()
            .filter_map(|entry| match entry {
                WargearEntry::Grouped(w) => Some(w.clone()),
                WargearEntry::Legacy(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasheetKeyword {
    pub keyword: String,
    pub model: String,
    pub is_faction_keyword: bool,
}

/// One statline variant of a datasheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasheetModel {
    pub line: String,
    pub name: String,
    pub m: String,
    pub t: String,
    pub sv: String,
    pub inv_sv: String,
    pub inv_sv_descr: String,
    pub w: String,
    pub ld: String,
    pub oc: String,
    pub base_size: String,
    pub base_size_descr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasheetOption {
    pub line: String,
    pub button: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitComposition {
    pub line: String,
    pub description: String,
}

/// A unit size and its points. `cost` is a string-encoded integer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelCost {
    pub line: String,
    pub description: String,
    pub cost: String,
}

/// A datasheet this leader may attach to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderTarget {
    pub id: String,
    pub name: String,
}

/// Legacy flat wargear row: one row per weapon profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasheetWargear {
    pub datasheet_id: String,
    pub line: String,
    pub line_in_wargear: String,
    pub dice: String,
    pub name: String,
    pub description: String,
    pub range: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub a: String,
    pub bs_ws: String,
    pub s: String,
    pub ap: String,
    pub d: String,
}

/// One fire mode or attack mode of a weapon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WargearProfile {
    pub name: String,
    pub line_in_wargear: String,
    pub dice: String,
    pub range: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attacks: String,
    pub skill: String,
    pub strength: String,
    pub ap: String,
    pub damage: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WargearKind {
    #[default]
    Ranged,
    Melee,
    Mixed,
}

/// A weapon with every profile grouped under one stable id.
///
/// `profiles` is required when deserializing: its presence tells a grouped
/// entry apart from a [`DatasheetWargear`] row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wargear {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub datasheet_id: String,
    #[serde(default)]
    pub line: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: WargearKind,
    pub profiles: Vec<WargearProfile>,
}

/// Wargear as found in the wild: grouped (current) or a flat legacy row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WargearEntry {
    Grouped(Wargear),
    Legacy(DatasheetWargear),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ability {
    pub id: String,
    pub name: String,
    pub legend: String,
    pub faction_id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl Ability {
    /// `name`, followed by the parameter in parentheses when present.
    pub fn display_name(&self) -> String {
        match self.parameter.as_deref().map(str::trim) {
            Some(param) if !param.is_empty() => format!("{} ({})", self.name.trim(), param),
            _ => self.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stratagem {
    pub id: String,
    pub faction_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cp_cost: String,
    pub legend: String,
    pub turn: String,
    pub phase: String,
    pub detachment: String,
    pub detachment_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enhancement {
    pub id: String,
    pub faction_id: String,
    pub name: String,
    pub cost: String,
    pub detachment: String,
    pub detachment_id: String,
    pub legend: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetachmentAbility {
    pub id: String,
    pub faction_id: String,
    pub name: String,
    pub legend: String,
    pub description: String,
    pub detachment: String,
    pub detachment_id: String,
}

/// A detachment, derived by grouping its three entity kinds by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Detachment {
    pub name: String,
    /// `name` with the supplement suffix, e.g. `Gladius Task Force [Blood Angels]`.
    pub label: String,
    pub supplement_key: String,
    pub supplement_label: String,
    pub abilities: Vec<DetachmentAbility>,
    pub enhancements: Vec<Enhancement>,
    pub stratagems: Vec<Stratagem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplementMetadata {
    pub has_supplements: bool,
    pub has_codex_datasheets: bool,
    pub options: Vec<SupplementOption>,
}

/// One entry of the supplement filter drop-down.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplementOption {
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterPoints {
    pub current: u32,
    pub max: u32,
}

/// A user-built army list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Roster {
    pub id: String,
    pub name: String,
    pub faction_id: String,
    pub detachment: String,
    pub points: RosterPoints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warlord_unit_id: Option<String>,
    pub units: Vec<RosterUnit>,
    pub enhancements: Vec<RosterEnhancement>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterUnit {
    pub id: String,
    pub datasheet: Datasheet,
    pub model_cost: ModelCost,
    pub selected_wargear: Vec<WargearEntry>,
    pub selected_wargear_abilities: Vec<Ability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterEnhancement {
    pub unit_id: String,
    pub enhancement: Enhancement,
}

/// Build/paint progress of an owned unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionState {
    #[default]
    Sprue,
    Built,
    BattleReady,
    ParadeReady,
}

impl CollectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionState::Sprue => "sprue",
            CollectionState::Built => "built",
            CollectionState::BattleReady => "battle-ready",
            CollectionState::ParadeReady => "parade-ready",
        }
    }
}

/// A user-tracked set of owned units.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub faction_id: String,
    pub items: Vec<CollectionUnit>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionUnit {
    pub id: String,
    pub datasheet: Datasheet,
    pub model_cost: ModelCost,
    pub state: CollectionState,
    pub selected_wargear: Vec<WargearEntry>,
    pub selected_wargear_abilities: Vec<Ability>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wargear_entry_discriminates_on_profiles() {
        let grouped: WargearEntry = serde_json::from_value(json!({
            "id": "000000001-bolt-pistol",
            "name": "Bolt pistol",
            "type": "Ranged",
            "profiles": []
        }))
        .unwrap();
        assert!(matches!(grouped, WargearEntry::Grouped(_)));

        let legacy: WargearEntry = serde_json::from_value(json!({
            "datasheetId": "000000001",
            "name": "Bolt pistol",
            "type": "Ranged",
            "bsWs": "3+"
        }))
        .unwrap();
        match legacy {
            WargearEntry::Legacy(row) => assert_eq!(row.bs_ws, "3+"),
            other => panic!("expected legacy row, got {:?}", other),
        }
    }

    #[test]
    fn display_name_appends_parameter() {
        let mut ability = Ability {
            name: "Deadly Demise".to_string(),
            ..Default::default()
        };
        assert_eq!(ability.display_name(), "Deadly Demise");
        ability.parameter = Some("D3".to_string());
        assert_eq!(ability.display_name(), "Deadly Demise (D3)");
        ability.parameter = Some("  ".to_string());
        assert_eq!(ability.display_name(), "Deadly Demise");
    }

    #[test]
    fn collection_state_uses_kebab_case() {
        let state: CollectionState = serde_json::from_value(json!("battle-ready")).unwrap();
        assert_eq!(state, CollectionState::BattleReady);
        assert_eq!(state.as_str(), "battle-ready");
    }
}
