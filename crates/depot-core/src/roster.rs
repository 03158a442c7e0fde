//! Points totals, role grouping, share text, and re-normalization of saved
//! rosters and collections.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use crate::abilities::normalize_selected_wargear_abilities;
use crate::build::DEFAULT_ROLE;
use crate::models::{
    Ability, Collection, CollectionUnit, Datasheet, Faction, ModelCost, Roster, RosterUnit,
    WargearEntry,
};
use crate::wargear::{base_weapon_name, normalize_datasheet_wargear, normalize_selected_wargear};

/// Points value of a string-encoded cost. Anything unparsable is `0`.
pub fn parse_points(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

/// Saturates at `u32::MAX`; costs come from user-edited files.
fn total_points<'a>(costs: impl Iterator<Item = &'a str>) -> u32 {
    costs.map(parse_points).fold(0, u32::saturating_add)
}

/// Units plus enhancements.
pub fn roster_points(roster: &Roster) -> u32 {
    let units = roster.units.iter().map(|u| u.model_cost.cost.as_str());
    let enhancements = roster
        .enhancements
        .iter()
        .map(|e| e.enhancement.cost.as_str());
    total_points(units.chain(enhancements))
}

pub fn collection_points(collection: &Collection) -> u32 {
    total_points(collection.items.iter().map(|u| u.model_cost.cost.as_str()))
}

/// What share rendering and refreshing need from a roster or collection unit.
pub trait UnitSnapshot {
    fn datasheet(&self) -> &Datasheet;
    fn model_cost(&self) -> &ModelCost;
    fn selected_wargear(&self) -> &[WargearEntry];
    fn selected_wargear_abilities(&self) -> &[Ability];
}

impl UnitSnapshot for RosterUnit {
    fn datasheet(&self) -> &Datasheet {
        &self.datasheet
    }
    fn model_cost(&self) -> &ModelCost {
        &self.model_cost
    }
    fn selected_wargear(&self) -> &[WargearEntry] {
        &self.selected_wargear
    }
    fn selected_wargear_abilities(&self) -> &[Ability] {
        &self.selected_wargear_abilities
    }
}

impl UnitSnapshot for CollectionUnit {
    fn datasheet(&self) -> &Datasheet {
        &self.datasheet
    }
    fn model_cost(&self) -> &ModelCost {
        &self.model_cost
    }
    fn selected_wargear(&self) -> &[WargearEntry] {
        &self.selected_wargear
    }
    fn selected_wargear_abilities(&self) -> &[Ability] {
        &self.selected_wargear_abilities
    }
}

/// Units bucketed by datasheet role, roles in case-insensitive alphabetical
/// order and units in their original order.
pub fn group_units_by_role<U: UnitSnapshot>(units: &[U]) -> Vec<(String, Vec<&U>)> {
    let mut groups: BTreeMap<String, Vec<&U>> = BTreeMap::new();
    for unit in units {
        let role = unit.datasheet().role.trim();
        let role = if role.is_empty() { DEFAULT_ROLE } else { role };
        groups.entry(role.to_string()).or_default().push(unit);
    }
    let mut groups: Vec<(String, Vec<&U>)> = groups.into_iter().collect();
    groups.sort_by_cached_key(|(role, _)| (role.to_lowercase(), role.clone()));
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Markdown,
    Text,
}

impl Style {
    fn bold(self, text: &str) -> String {
        match self {
            Style::Markdown => format!("**{}**", text),
            Style::Text => format!("*{}*", text),
        }
    }

    fn title(self, text: &str) -> String {
        match self {
            Style::Markdown => format!("# {}", text),
            Style::Text => self.bold(text),
        }
    }

    fn section(self, text: &str) -> String {
        match self {
            Style::Markdown => format!("## {}", text),
            Style::Text => self.bold(text),
        }
    }
}

/// Distinct weapon names of a selection, in selection order.
fn wargear_names(selection: &[WargearEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .map(|entry| match entry {
            WargearEntry::Grouped(w) => w.name.trim().to_string(),
            WargearEntry::Legacy(row) => base_weapon_name(&row.name).to_string(),
        })
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .collect()
}

fn unit_line<U: UnitSnapshot>(
    style: Style,
    unit: &U,
    warlord: bool,
    state: Option<&str>,
) -> String {
    let name = if warlord {
        format!("[Warlord] {}", unit.datasheet().name)
    } else {
        unit.datasheet().name.clone()
    };
    let mut line = format!("- {}", style.bold(&name));
    if let Some(state) = state {
        let _ = write!(line, " [{}]", state);
    }
    let description = unit.model_cost().description.trim();
    if !description.is_empty() {
        let _ = write!(line, " - {}", description);
    }
    let _ = write!(line, " ({} pts)", parse_points(&unit.model_cost().cost));
    line
}

fn detail_lines<U: UnitSnapshot>(unit: &U) -> Vec<String> {
    let mut lines = Vec::new();
    let wargear = wargear_names(unit.selected_wargear());
    if !wargear.is_empty() {
        lines.push(format!("  - Wargear: {}", wargear.join(", ")));
    }
    for ability in unit.selected_wargear_abilities() {
        lines.push(format!("  - [Wargear Ability] {}", ability.display_name()));
    }
    lines
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    text.push('\n');
    text
}

fn render_roster(roster: &Roster, faction_name: Option<&str>, style: Style) -> String {
    let mut lines = vec![style.title(&roster.name), String::new()];
    if let Some(faction) = faction_name.map(str::trim).filter(|f| !f.is_empty()) {
        lines.push(format!("{} {}", style.bold("Faction:"), faction));
    }
    if !roster.detachment.trim().is_empty() {
        lines.push(format!("{} {}", style.bold("Detachment:"), roster.detachment.trim()));
    }
    lines.push(format!(
        "{} {} / {}",
        style.bold("Points:"),
        roster_points(roster),
        roster.points.max
    ));
    lines.push(String::new());

    for (role, units) in group_units_by_role(&roster.units) {
        lines.push(style.section(&role));
        for unit in units {
            let warlord = roster.warlord_unit_id.as_deref() == Some(unit.id.as_str());
            lines.push(unit_line(style, unit, warlord, None));
            lines.extend(detail_lines(unit));
            for enhancement in roster.enhancements.iter().filter(|e| e.unit_id == unit.id) {
                lines.push(format!(
                    "  - [Enhancement] {} (+{} pts)",
                    enhancement.enhancement.name,
                    parse_points(&enhancement.enhancement.cost)
                ));
            }
        }
        lines.push(String::new());
    }
    finish(lines)
}

fn render_collection(collection: &Collection, faction_name: Option<&str>, style: Style) -> String {
    let mut lines = vec![style.title(&collection.name), String::new()];
    if let Some(faction) = faction_name.map(str::trim).filter(|f| !f.is_empty()) {
        lines.push(format!("{} {}", style.bold("Faction:"), faction));
    }
    lines.push(format!(
        "{} {}",
        style.bold("Points:"),
        collection_points(collection)
    ));
    lines.push(String::new());

    for (role, units) in group_units_by_role(&collection.items) {
        lines.push(style.section(&role));
        for unit in units {
            lines.push(unit_line(style, unit, false, Some(unit.state.as_str())));
            lines.extend(detail_lines(unit));
        }
        lines.push(String::new());
    }
    finish(lines)
}

pub fn roster_to_markdown(roster: &Roster, faction_name: Option<&str>) -> String {
    render_roster(roster, faction_name, Style::Markdown)
}

pub fn roster_to_text(roster: &Roster, faction_name: Option<&str>) -> String {
    render_roster(roster, faction_name, Style::Text)
}

pub fn collection_to_markdown(collection: &Collection, faction_name: Option<&str>) -> String {
    render_collection(collection, faction_name, Style::Markdown)
}

pub fn collection_to_text(collection: &Collection, faction_name: Option<&str>) -> String {
    render_collection(collection, faction_name, Style::Text)
}

/// The canonical datasheet plus re-resolved selections, or `None` when the
/// datasheet no longer exists.
fn refreshed_selection<U: UnitSnapshot>(
    unit: &U,
    faction: &Faction,
) -> Option<(Datasheet, Vec<WargearEntry>, Vec<Ability>)> {
    let canonical = faction
        .datasheets
        .iter()
        .find(|ds| ds.id == unit.datasheet().id)?;
    let datasheet = normalize_datasheet_wargear(canonical.clone());
    let wargear = normalize_selected_wargear(unit.selected_wargear(), &datasheet.grouped_wargear())
        .into_iter()
        .map(WargearEntry::Grouped)
        .collect();
    let abilities = normalize_selected_wargear_abilities(
        unit.selected_wargear_abilities(),
        &datasheet.abilities,
    );
    Some((datasheet, wargear, abilities))
}

/// Bring every unit's snapshot in line with a freshly generated faction.
/// Units whose datasheet vanished are left as they were.
pub fn refresh_roster(mut roster: Roster, faction: &Faction) -> Roster {
    for unit in &mut roster.units {
        if let Some((datasheet, wargear, abilities)) = refreshed_selection(&*unit, faction) {
            unit.datasheet = datasheet;
            unit.selected_wargear = wargear;
            unit.selected_wargear_abilities = abilities;
        }
    }
    roster.points.current = roster_points(&roster);
    roster
}

pub fn refresh_collection(mut collection: Collection, faction: &Faction) -> Collection {
    for unit in &mut collection.items {
        if let Some((datasheet, wargear, abilities)) = refreshed_selection(&*unit, faction) {
            unit.datasheet = datasheet;
            unit.selected_wargear = wargear;
            unit.selected_wargear_abilities = abilities;
        }
    }
    collection
}
