//! Shared domain models for the planner catalog.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};

/// A playable species and the modifiers it contributes to every build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    /// Short identifier (e.g. `human`).
    pub id: String,
    /// Human-readable species name.
    pub name: String,
    /// Modifier bonuses applied before any skill box.
    #[serde(default)]
    pub modifiers: BTreeMap<String, i32>,
}

/// Everything a skill box unlocks once selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    /// Commands made available to the character.
    #[serde(default)]
    pub commands: BTreeSet<String>,
    /// Item and weapon certifications.
    #[serde(default)]
    pub certifications: BTreeSet<String>,
    /// Additive modifier bonuses.
    #[serde(default)]
    pub modifiers: BTreeMap<String, i32>,
}

impl Grants {
    /// Returns `true` when the box unlocks nothing.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.certifications.is_empty() && self.modifiers.is_empty()
    }
}

/// An atomic unlockable unit of a profession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBox {
    /// Globally unique identifier (e.g. `brawler_unarmed_1`).
    pub id: String,
    /// Display name shown in the planner.
    pub name: String,
    /// Skill points consumed from the character pool.
    pub skill_points: u32,
    /// Experience required to train the box in game.
    #[serde(default)]
    pub xp_cost: u32,
    /// Boxes that must be held before this one.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// What the box unlocks.
    #[serde(default)]
    pub grants: Grants,
}

impl SkillBox {
    /// Returns `true` when `id` is one of the direct prerequisites.
    pub fn requires(&self, id: &str) -> bool {
        self.prerequisites.iter().any(|prerequisite| prerequisite == id)
    }
}

/// Profession grouping used by the profession browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfessionCategory {
    /// Starting professions open to every character.
    Basic,
    /// Advanced professions gated behind basic trees.
    Elite,
    /// Force-sensitive branches.
    Force,
    /// Jedi disciplines.
    Jedi,
    /// Starship pilot careers.
    Pilot,
}

impl ProfessionCategory {
    /// All categories in display order.
    pub const ALL: [ProfessionCategory; 5] = [
        ProfessionCategory::Basic,
        ProfessionCategory::Elite,
        ProfessionCategory::Force,
        ProfessionCategory::Jedi,
        ProfessionCategory::Pilot,
    ];

    /// Lowercase identifier as stored in catalog documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ProfessionCategory::Basic => "basic",
            ProfessionCategory::Elite => "elite",
            ProfessionCategory::Force => "force",
            ProfessionCategory::Jedi => "jedi",
            ProfessionCategory::Pilot => "pilot",
        }
    }

    /// Parse a category identifier, ignoring case.
    pub fn parse(input: &str) -> Option<Self> {
        let needle = input.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
    }
}

impl fmt::Display for ProfessionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An ordered chain of boxes inside a profession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTree {
    /// Key of the tree within its profession (e.g. `unarmed`).
    pub key: String,
    /// Display name (e.g. `Unarmed Combat`).
    pub name: String,
    /// Boxes from the lowest tier upwards.
    pub boxes: Vec<SkillBox>,
    /// Optional explicit layout edges: box id → ids it connects to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<BTreeMap<String, Vec<String>>>,
}

/// A profession with its novice box, trees and optional master box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    /// Short identifier (e.g. `brawler`).
    pub id: String,
    /// Human-readable profession name.
    pub name: String,
    /// Flavour text for the profession browser.
    #[serde(default)]
    pub description: String,
    /// Browser grouping.
    pub category: ProfessionCategory,
    /// Boxes required before the profession is considered unlocked.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Entry box of the profession.
    pub novice: SkillBox,
    /// Capstone box, when the profession has one.
    #[serde(default)]
    pub master: Option<SkillBox>,
    /// Skill trees in display order.
    #[serde(default)]
    pub skill_trees: Vec<SkillTree>,
}

impl Profession {
    /// Look up a tree by its key.
    pub fn tree(&self, key: &str) -> Option<&SkillTree> {
        self.skill_trees.iter().find(|tree| tree.key == key)
    }

    /// Iterate over every box of the profession: novice, master, then tree boxes.
    pub fn boxes(&self) -> impl Iterator<Item = &SkillBox> {
        std::iter::once(&self.novice)
            .chain(self.master.iter())
            .chain(self.skill_trees.iter().flat_map(|tree| tree.boxes.iter()))
    }

    /// Returns `true` when the profession owns the given box.
    pub fn contains(&self, box_id: &str) -> bool {
        self.boxes().any(|skill_box| skill_box.id == box_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_box(id: &str, prerequisites: &[&str]) -> SkillBox {
        SkillBox {
            id: id.to_string(),
            name: id.to_string(),
            skill_points: 4,
            xp_cost: 0,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            grants: Grants::default(),
        }
    }

    #[test]
    fn profession_boxes_start_with_novice_and_master() {
        let profession = Profession {
            id: "brawler".to_string(),
            name: "Brawler".to_string(),
            description: String::new(),
            category: ProfessionCategory::Basic,
            prerequisites: Vec::new(),
            novice: sample_box("brawler_novice", &[]),
            master: Some(sample_box("brawler_master", &["brawler_unarmed_1"])),
            skill_trees: vec![SkillTree {
                key: "unarmed".to_string(),
                name: "Unarmed Combat".to_string(),
                boxes: vec![sample_box("brawler_unarmed_1", &["brawler_novice"])],
                connections: None,
            }],
        };

        let ids: Vec<_> = profession.boxes().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["brawler_novice", "brawler_master", "brawler_unarmed_1"]);
        assert!(profession.contains("brawler_unarmed_1"));
        assert!(profession.tree("unarmed").is_some());
        assert!(profession.tree("polearm").is_none());
    }

    #[test]
    fn category_parsing_ignores_case() {
        assert_eq!(ProfessionCategory::parse(" Elite "), Some(ProfessionCategory::Elite));
        assert_eq!(ProfessionCategory::parse("wizard"), None);
        assert_eq!(ProfessionCategory::Jedi.to_string(), "jedi");
    }
}
