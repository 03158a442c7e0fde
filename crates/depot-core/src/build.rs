//! Pure half of the generation driver: joins the decoded upstream tables
//! into per-faction [`Faction`] documents.
//!
//! [`Catalog::from_tables`] decodes every parsed table once and indexes the
//! child tables by datasheet id. [`Catalog::build_faction`] then assembles
//! one faction at a time; it only reads the catalog, so factions can be
//! built concurrently from a shared `Arc<Catalog>`.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::abilities::sort_abilities_for_display;
use crate::aggregate::{derive_supplement_metadata, group_faction_data_by_detachment};
use crate::classify::SourceClassifier;
use crate::error::TableError;
use crate::models::{
    Ability, Datasheet, DatasheetKeyword, DatasheetModel, DatasheetOption, DatasheetWargear,
    Detachment, DetachmentAbility, Enhancement, Faction, LeaderTarget, ModelCost, Source,
    Stratagem, UnitComposition, WargearEntry,
};
use crate::supplement::{
    build_detachment_supplement_index, format_detachment_option_label, get_supplement_info,
    DatasheetDetachmentAbilityLink, CODEX_KEY, CODEX_LABEL,
};
use crate::table::{Row, Table};
use crate::util::{line_number, parse_flag, slugify};
use crate::wargear::normalize_datasheet_wargear;

/// Parsed rows for every table that was found. Missing tables read as empty.
pub type RawTables = HashMap<Table, Vec<Row>>;

/// Role assigned to datasheets that arrive without one.
pub const DEFAULT_ROLE: &str = "Other";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFaction {
    id: String,
    name: String,
    link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDatasheet {
    id: String,
    name: String,
    faction_id: String,
    source_id: String,
    legend: String,
    role: String,
    loadout: String,
    transport: String,
    #[serde(rename = "virtual")]
    is_virtual: String,
    leader_head: String,
    leader_footer: String,
    damaged_w: String,
    damaged_description: String,
    link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDatasheetAbility {
    datasheet_id: String,
    line: String,
    ability_id: String,
    model: String,
    name: String,
    description: String,
    #[serde(rename = "type")]
    kind: String,
    parameter: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawKeyword {
    datasheet_id: String,
    keyword: String,
    model: String,
    is_faction_keyword: String,
}

/// A row of a child table whose remaining columns decode into `T`.
#[derive(Debug, Clone, Deserialize)]
struct Child<T> {
    #[serde(rename = "datasheetId", default)]
    datasheet_id: String,
    #[serde(flatten)]
    record: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStratagemLink {
    datasheet_id: String,
    stratagem_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEnhancementLink {
    datasheet_id: String,
    enhancement_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawLeaderLink {
    leader_id: String,
    attached_id: String,
}

/// Dangling cross-references skipped while building a faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub abilities: usize,
    pub stratagems: usize,
    pub enhancements: usize,
    pub detachment_abilities: usize,
    pub leaders: usize,
}

impl BuildReport {
    pub fn total(&self) -> usize {
        self.abilities
            + self.stratagems
            + self.enhancements
            + self.detachment_abilities
            + self.leaders
    }

    pub fn absorb(&mut self, other: &BuildReport) {
        self.abilities += other.abilities;
        self.stratagems += other.stratagems;
        self.enhancements += other.enhancements;
        self.detachment_abilities += other.detachment_abilities;
        self.leaders += other.leaders;
    }
}

/// Every upstream table, decoded and indexed for joining.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    factions: Vec<RawFaction>,
    faction_slugs: HashMap<String, String>,
    classifier: SourceClassifier,
    abilities: HashMap<String, Ability>,
    datasheets: Vec<RawDatasheet>,
    datasheet_names: HashMap<String, String>,
    datasheet_abilities: HashMap<String, Vec<RawDatasheetAbility>>,
    keywords: HashMap<String, Vec<RawKeyword>>,
    models: HashMap<String, Vec<DatasheetModel>>,
    options: HashMap<String, Vec<DatasheetOption>>,
    wargear: HashMap<String, Vec<DatasheetWargear>>,
    unit_composition: HashMap<String, Vec<UnitComposition>>,
    model_costs: HashMap<String, Vec<ModelCost>>,
    stratagem_links: HashMap<String, Vec<String>>,
    enhancement_links: HashMap<String, Vec<String>>,
    detachment_ability_links: Vec<DatasheetDetachmentAbilityLink>,
    detachment_ability_ids: HashMap<String, Vec<String>>,
    leader_links: HashMap<String, Vec<String>>,
    stratagems: Vec<Stratagem>,
    enhancements: Vec<Enhancement>,
    detachment_abilities: Vec<DetachmentAbility>,
}

/// Decode one table's rows into records. Header row is line 1, so the
/// first data row reports as row 2.
fn decode<T: DeserializeOwned>(tables: &RawTables, table: Table) -> Result<Vec<T>, TableError> {
    let Some(rows) = tables.get(&table) else {
        return Ok(Vec::new());
    };
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let object: Map<String, Value> = row
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            serde_json::from_value(Value::Object(object)).map_err(|e| TableError::Decode {
                table: table.name().to_string(),
                row: index + 2,
                message: e.to_string(),
            })
        })
        .collect()
}

fn group_by<T>(items: Vec<T>, key: impl Fn(&T) -> &str) -> HashMap<String, Vec<T>> {
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        groups.entry(key(&item).to_string()).or_default().push(item);
    }
    groups
}

/// Output slugs by faction id, unique across the catalog. Collisions and
/// empty names fall back to `<slug>-<id>`.
fn faction_slugs(factions: &[RawFaction]) -> HashMap<String, String> {
    let mut taken = HashSet::new();
    let mut slugs = HashMap::new();
    for faction in factions {
        if slugs.contains_key(&faction.id) {
            continue;
        }
        let base = slugify(&faction.name);
        let mut slug = base.clone();
        if slug.is_empty() || taken.contains(&slug) {
            slug = slugify(&format!("{}-{}", base, faction.id));
        }
        let mut n = 2;
        while slug.is_empty() || taken.contains(&slug) {
            slug = slugify(&format!("{}-{}-{}", base, faction.id, n));
            n += 1;
        }
        taken.insert(slug.clone());
        slugs.insert(faction.id.clone(), slug);
    }
    slugs
}

fn children<T: DeserializeOwned>(
    tables: &RawTables,
    table: Table,
) -> Result<HashMap<String, Vec<T>>, TableError> {
    let rows: Vec<Child<T>> = decode(tables, table)?;
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(row.datasheet_id).or_default().push(row.record);
    }
    Ok(groups)
}

/// Children of one datasheet, stably ordered by numeric `line`.
fn by_line<T: Clone>(
    index: &HashMap<String, Vec<T>>,
    datasheet_id: &str,
    line: impl Fn(&T) -> &str,
) -> Vec<T> {
    let mut items = index.get(datasheet_id).cloned().unwrap_or_default();
    items.sort_by_key(|item| line_number(line(item)));
    items
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

impl Catalog {
    pub fn from_tables(tables: RawTables) -> Result<Self, TableError> {
        let sources: Vec<Source> = decode(&tables, Table::Sources)?;
        let abilities: Vec<Ability> = decode(&tables, Table::Abilities)?;
        let datasheets: Vec<RawDatasheet> = decode(&tables, Table::Datasheets)?;

        let datasheet_abilities: Vec<RawDatasheetAbility> =
            decode(&tables, Table::DatasheetsAbilities)?;
        let keywords: Vec<RawKeyword> = decode(&tables, Table::DatasheetsKeywords)?;
        let wargear: Vec<DatasheetWargear> = decode(&tables, Table::DatasheetsWargear)?;
        let stratagem_links: Vec<RawStratagemLink> = decode(&tables, Table::DatasheetsStratagems)?;
        let enhancement_links: Vec<RawEnhancementLink> =
            decode(&tables, Table::DatasheetsEnhancements)?;
        let leader_links: Vec<RawLeaderLink> = decode(&tables, Table::DatasheetsLeader)?;
        let detachment_ability_links: Vec<DatasheetDetachmentAbilityLink> =
            decode(&tables, Table::DatasheetsDetachmentAbilities)?;
        let factions: Vec<RawFaction> = decode(&tables, Table::Factions)?;

        let mut stratagem_index: HashMap<String, Vec<String>> = HashMap::new();
        for link in stratagem_links {
            stratagem_index
                .entry(link.datasheet_id)
                .or_default()
                .push(link.stratagem_id);
        }
        let mut enhancement_index: HashMap<String, Vec<String>> = HashMap::new();
        for link in enhancement_links {
            enhancement_index
                .entry(link.datasheet_id)
                .or_default()
                .push(link.enhancement_id);
        }
        let mut detachment_ability_index: HashMap<String, Vec<String>> = HashMap::new();
        for link in &detachment_ability_links {
            detachment_ability_index
                .entry(link.datasheet_id.clone())
                .or_default()
                .push(link.detachment_ability_id.clone());
        }
        let mut leader_index: HashMap<String, Vec<String>> = HashMap::new();
        for link in leader_links {
            leader_index
                .entry(link.leader_id)
                .or_default()
                .push(link.attached_id);
        }

        let mut ability_index = HashMap::new();
        for ability in abilities {
            ability_index.entry(ability.id.clone()).or_insert(ability);
        }

        Ok(Self {
            faction_slugs: faction_slugs(&factions),
            factions,
            classifier: SourceClassifier::new(&sources),
            abilities: ability_index,
            datasheet_names: datasheets
                .iter()
                .map(|ds| (ds.id.clone(), ds.name.clone()))
                .collect(),
            datasheets,
            datasheet_abilities: group_by(datasheet_abilities, |row| &row.datasheet_id),
            keywords: group_by(keywords, |row| &row.datasheet_id),
            models: children(&tables, Table::DatasheetsModels)?,
            options: children(&tables, Table::DatasheetsOptions)?,
            wargear: group_by(wargear, |row| &row.datasheet_id),
            unit_composition: children(&tables, Table::DatasheetsUnitComposition)?,
            model_costs: children(&tables, Table::DatasheetsModelsCost)?,
            stratagem_links: stratagem_index,
            enhancement_links: enhancement_index,
            detachment_ability_links,
            detachment_ability_ids: detachment_ability_index,
            leader_links: leader_index,
            stratagems: decode(&tables, Table::Stratagems)?,
            enhancements: decode(&tables, Table::Enhancements)?,
            detachment_abilities: decode(&tables, Table::DetachmentAbilities)?,
        })
    }

    /// Faction ids in `factions` table order.
    pub fn faction_ids(&self) -> Vec<String> {
        self.factions.iter().map(|f| f.id.clone()).collect()
    }

    pub fn has_faction(&self, faction_id: &str) -> bool {
        self.factions.iter().any(|f| f.id == faction_id)
    }

    pub fn datasheet_count(&self, faction_id: &str) -> usize {
        self.datasheets
            .iter()
            .filter(|ds| ds.faction_id == faction_id)
            .count()
    }

    /// Stratagems with no faction scope.
    pub fn core_stratagems(&self) -> Vec<Stratagem> {
        self.stratagems
            .iter()
            .filter(|s| s.faction_id.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Assemble one faction document. `None` for an unknown faction id.
    pub fn build_faction(&self, faction_id: &str) -> Option<(Faction, BuildReport)> {
        let raw = self.factions.iter().find(|f| f.id == faction_id)?;
        let mut report = BuildReport::default();

        let stratagems_by_id: HashMap<&str, &Stratagem> =
            self.stratagems.iter().map(|s| (s.id.as_str(), s)).collect();
        let enhancements_by_id: HashMap<&str, &Enhancement> =
            self.enhancements.iter().map(|e| (e.id.as_str(), e)).collect();
        let detachment_abilities_by_id: HashMap<&str, &DetachmentAbility> = self
            .detachment_abilities
            .iter()
            .map(|a| (a.id.as_str(), a))
            .collect();
        let lookups = Lookups {
            stratagems: &stratagems_by_id,
            enhancements: &enhancements_by_id,
            detachment_abilities: &detachment_abilities_by_id,
        };

        let mut slugs = HashSet::new();
        let datasheets: Vec<Datasheet> = self
            .datasheets
            .iter()
            .filter(|ds| ds.faction_id == faction_id)
            .map(|ds| {
                let mut datasheet = self.build_datasheet(ds, &lookups, &mut report);
                if !slugs.insert(datasheet.slug.clone()) {
                    datasheet.slug = format!("{}-{}", datasheet.slug, datasheet.id);
                    slugs.insert(datasheet.slug.clone());
                }
                datasheet
            })
            .collect();

        let stratagems: Vec<Stratagem> = self
            .stratagems
            .iter()
            .filter(|s| s.faction_id == faction_id)
            .cloned()
            .collect();
        let enhancements: Vec<Enhancement> = self
            .enhancements
            .iter()
            .filter(|e| e.faction_id == faction_id)
            .cloned()
            .collect();
        let detachment_abilities: Vec<DetachmentAbility> = self
            .detachment_abilities
            .iter()
            .filter(|a| a.faction_id == faction_id)
            .cloned()
            .collect();

        let supplement_index = build_detachment_supplement_index(
            &datasheets,
            &self.detachment_ability_links,
            &detachment_abilities,
        );
        let detachments = group_faction_data_by_detachment(
            &detachment_abilities,
            &enhancements,
            &stratagems,
        )
        .into_iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, group)| {
            let (key, label) = match supplement_index.get(&name) {
                Some(s) => (s.supplement_key.clone(), s.supplement_label.clone()),
                None => (CODEX_KEY.to_string(), CODEX_LABEL.to_string()),
            };
            Detachment {
                label: format_detachment_option_label(&name, &key, Some(&label)),
                name,
                supplement_key: key,
                supplement_label: label,
                abilities: group.abilities,
                enhancements: group.enhancements,
                stratagems: group.stratagems,
            }
        })
        .collect();

        let faction = Faction {
            id: raw.id.clone(),
            slug: self
                .faction_slugs
                .get(&raw.id)
                .cloned()
                .unwrap_or_else(|| slugify(&raw.name)),
            name: raw.name.clone(),
            link: raw.link.clone(),
            supplements: derive_supplement_metadata(&datasheets),
            datasheets,
            stratagems,
            enhancements,
            detachment_abilities,
            detachments,
        };
        Some((faction, report))
    }

    fn build_datasheet(
        &self,
        raw: &RawDatasheet,
        lookups: &Lookups<'_>,
        report: &mut BuildReport,
    ) -> Datasheet {
        let id = raw.id.as_str();
        let source_id = non_empty(&raw.source_id);
        let flags = self.classifier.classify(source_id);

        let mut datasheet = Datasheet {
            id: raw.id.clone(),
            slug: slugify(&raw.name),
            name: raw.name.clone(),
            faction_id: raw.faction_id.clone(),
            source_id: raw.source_id.clone(),
            legend: raw.legend.clone(),
            role: non_empty(&raw.role).unwrap_or(DEFAULT_ROLE).to_string(),
            loadout: raw.loadout.clone(),
            transport: raw.transport.clone(),
            is_virtual: parse_flag(&raw.is_virtual),
            leader_head: raw.leader_head.clone(),
            leader_footer: raw.leader_footer.clone(),
            damaged_w: raw.damaged_w.clone(),
            damaged_description: raw.damaged_description.clone(),
            link: raw.link.clone(),
            is_forge_world: flags.is_forge_world,
            is_legends: flags.is_legends,
            ..Default::default()
        };

        match get_supplement_info(&raw.faction_id, source_id) {
            Some(info) => {
                datasheet.supplement_key = info.slug.to_string();
                datasheet.supplement_slug = info.slug.to_string();
                datasheet.supplement_name = info.name.to_string();
                datasheet.supplement_label = info.name.to_string();
                datasheet.is_supplement = true;
            }
            None => {
                datasheet.supplement_key = CODEX_KEY.to_string();
                datasheet.supplement_slug = CODEX_KEY.to_string();
                datasheet.supplement_label = CODEX_LABEL.to_string();
            }
        }

        datasheet.abilities = self.resolve_abilities(id, report);
        datasheet.keywords = self
            .keywords
            .get(id)
            .map(|rows| {
                rows.iter()
                    .map(|row| DatasheetKeyword {
                        keyword: row.keyword.clone(),
                        model: row.model.clone(),
                        is_faction_keyword: parse_flag(&row.is_faction_keyword),
                    })
                    .collect()
            })
            .unwrap_or_default();
        datasheet.models = by_line(&self.models, id, |m| &m.line);
        datasheet.options = by_line(&self.options, id, |o| &o.line);
        datasheet.unit_composition = by_line(&self.unit_composition, id, |u| &u.line);
        datasheet.model_costs = by_line(&self.model_costs, id, |c| &c.line);

        let mut wargear = self.wargear.get(id).cloned().unwrap_or_default();
        wargear.sort_by_key(|row| (line_number(&row.line), line_number(&row.line_in_wargear)));
        datasheet.wargear = wargear.into_iter().map(WargearEntry::Legacy).collect();

        datasheet.stratagems = resolve_links(
            self.stratagem_links.get(id),
            lookups.stratagems,
            &mut report.stratagems,
        );
        datasheet.enhancements = resolve_links(
            self.enhancement_links.get(id),
            lookups.enhancements,
            &mut report.enhancements,
        );
        datasheet.detachment_abilities = resolve_links(
            self.detachment_ability_ids.get(id),
            lookups.detachment_abilities,
            &mut report.detachment_abilities,
        );

        for attached_id in self.leader_links.get(id).into_iter().flatten() {
            match self.datasheet_names.get(attached_id) {
                Some(name) => datasheet.leaders.push(LeaderTarget {
                    id: attached_id.clone(),
                    name: name.clone(),
                }),
                None => report.leaders += 1,
            }
        }

        normalize_datasheet_wargear(datasheet)
    }

    /// Datasheet ability rows, filled in from the shared `abilities` table
    /// where they reference it, then sorted for display.
    fn resolve_abilities(&self, datasheet_id: &str, report: &mut BuildReport) -> Vec<Ability> {
        let rows = by_line(&self.datasheet_abilities, datasheet_id, |r| &r.line);
        let mut abilities: Vec<Ability> = rows
            .into_iter()
            .map(|row| {
                let mut ability = Ability {
                    name: row.name,
                    description: row.description,
                    kind: row.kind,
                    parameter: non_empty(&row.parameter).map(str::to_string),
                    ..Default::default()
                };
                if row.ability_id.trim().is_empty() {
                    return ability;
                }
                match self.abilities.get(row.ability_id.trim()) {
                    Some(shared) => {
                        ability.id = shared.id.clone();
                        ability.faction_id = shared.faction_id.clone();
                        ability.legend = shared.legend.clone();
                        if ability.name.trim().is_empty() {
                            ability.name = shared.name.clone();
                        }
                        if ability.description.trim().is_empty() {
                            ability.description = shared.description.clone();
                        }
                    }
                    None => report.abilities += 1,
                }
                ability
            })
            .collect();
        sort_abilities_for_display(&mut abilities);
        abilities
    }
}

struct Lookups<'a> {
    stratagems: &'a HashMap<&'a str, &'a Stratagem>,
    enhancements: &'a HashMap<&'a str, &'a Enhancement>,
    detachment_abilities: &'a HashMap<&'a str, &'a DetachmentAbility>,
}

/// Follow join-table ids into their records, counting the ones that point
/// nowhere.
fn resolve_links<T: Clone>(
    ids: Option<&Vec<String>>,
    records: &HashMap<&str, &T>,
    dangling: &mut usize,
) -> Vec<T> {
    let mut resolved = Vec::new();
    for id in ids.into_iter().flatten() {
        match records.get(id.as_str()) {
            Some(record) => resolved.push((*record).clone()),
            None => *dangling += 1,
        }
    }
    resolved
}
