//! Forge World / Legends provenance derived from source naming conventions.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::Source;

const FORGE_WORLD_SUFFIX: &str = "(Forge World)";
const LEGENDS_SUFFIX: &str = "(Warhammer Legends)";
const LEGENDS_PREFIX: &str = "Legends:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFlags {
    pub is_forge_world: bool,
    pub is_legends: bool,
}

/// Membership sets built once from the `sources` table.
#[derive(Debug, Clone, Default)]
pub struct SourceClassifier {
    forge_world: HashSet<String>,
    legends: HashSet<String>,
}

impl SourceClassifier {
    pub fn new(sources: &[Source]) -> Self {
        let mut classifier = Self::default();
        for source in sources {
            let name = source.name.trim();
            if name.ends_with(FORGE_WORLD_SUFFIX) {
                classifier.forge_world.insert(source.id.clone());
            }
            if name.ends_with(LEGENDS_SUFFIX) || name.starts_with(LEGENDS_PREFIX) {
                classifier.legends.insert(source.id.clone());
            }
        }
        classifier
    }

    /// Flags for a source id. Unknown or absent ids are neither.
    pub fn classify(&self, source_id: Option<&str>) -> SourceFlags {
        match source_id {
            Some(id) => SourceFlags {
                is_forge_world: self.forge_world.contains(id),
                is_legends: self.legends.contains(id),
            },
            None => SourceFlags::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, name: &str) -> Source {
        Source {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn classifier() -> SourceClassifier {
        SourceClassifier::new(&[
            source("fw", "Space Marines (Forge World)"),
            source("wl", "Space Marines (Warhammer Legends)"),
            source("lg", "Legends: Ultramarines"),
            source("cx", "Codex: Space Marines"),
            source("pad", "  Imperial Armour (Forge World)  "),
        ])
    }

    #[test]
    fn forge_world_suffix() {
        assert_eq!(
            classifier().classify(Some("fw")),
            SourceFlags {
                is_forge_world: true,
                is_legends: false
            }
        );
        assert!(classifier().classify(Some("pad")).is_forge_world);
    }

    #[test]
    fn legends_suffix_and_prefix() {
        let expected = SourceFlags {
            is_forge_world: false,
            is_legends: true,
        };
        assert_eq!(classifier().classify(Some("wl")), expected);
        assert_eq!(classifier().classify(Some("lg")), expected);
    }

    #[test]
    fn unknown_and_absent_ids_are_unflagged() {
        let c = classifier();
        assert_eq!(c.classify(Some("cx")), SourceFlags::default());
        assert_eq!(c.classify(Some("missing")), SourceFlags::default());
        assert_eq!(c.classify(None), SourceFlags::default());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let c = SourceClassifier::new(&[
            source("a", "Space Marines (forge world)"),
            source("b", "legends: Ultramarines"),
        ]);
        assert_eq!(c.classify(Some("a")), SourceFlags::default());
        assert_eq!(c.classify(Some("b")), SourceFlags::default());
    }
}
