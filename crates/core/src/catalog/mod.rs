//! Read-only catalog of species, professions and skill boxes.

/// Shared, refreshable catalog handle.
pub mod loader;
mod validate;

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    error::CatalogError,
    models::{Profession, ProfessionCategory, SkillBox, Species},
};

pub use loader::{CatalogLoader, CatalogSource};

const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.json");

static EMBEDDED: Lazy<Arc<Catalog>> = Lazy::new(|| {
    Arc::new(Catalog::from_json(EMBEDDED_CATALOG).expect("embedded catalog must be valid"))
});

/// On-disk shape of a catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Playable species.
    #[serde(default)]
    pub species: Vec<Species>,
    /// Professions with their trees.
    #[serde(default)]
    pub professions: Vec<Profession>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Novice,
    Master,
    Tree(usize, usize),
}

#[derive(Debug, Clone, Copy)]
struct BoxLocation {
    profession: usize,
    slot: Slot,
}

/// Validated, indexed catalog.
///
/// Box ids are unique across every profession, so a build can mix boxes
/// from several professions without ambiguity.
#[derive(Debug)]
pub struct Catalog {
    species: Vec<Species>,
    professions: Vec<Profession>,
    boxes: HashMap<String, BoxLocation>,
    dependents: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(text)?;
        Self::from_document(document)
    }

    /// Validate a parsed document and build the lookup indices.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        validate::validate(&document)?;

        let CatalogDocument {
            species,
            professions,
        } = document;

        let mut boxes = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for (profession_index, profession) in professions.iter().enumerate() {
            let located = std::iter::once((&profession.novice, Slot::Novice))
                .chain(profession.master.iter().map(|master| (master, Slot::Master)))
                .chain(
                    profession
                        .skill_trees
                        .iter()
                        .enumerate()
                        .flat_map(|(tree_index, tree)| {
                            tree.boxes
                                .iter()
                                .enumerate()
                                .map(move |(box_index, b)| (b, Slot::Tree(tree_index, box_index)))
                        }),
                );
            for (skill_box, slot) in located {
                boxes.insert(
                    skill_box.id.clone(),
                    BoxLocation {
                        profession: profession_index,
                        slot,
                    },
                );
                for prerequisite in &skill_box.prerequisites {
                    dependents
                        .entry(prerequisite.clone())
                        .or_default()
                        .push(skill_box.id.clone());
                }
            }
        }

        Ok(Self {
            species,
            professions,
            boxes,
            dependents,
        })
    }

    /// Read a catalog document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let catalog = Self::from_json(&contents)
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        Ok(catalog)
    }

    /// Shared handle to the built-in dataset.
    pub fn embedded() -> Arc<Catalog> {
        Arc::clone(&*EMBEDDED)
    }

    /// All species in catalog order.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// All professions in catalog order.
    pub fn professions(&self) -> &[Profession] {
        &self.professions
    }

    /// Every skill box across all professions.
    pub fn all_skill_boxes(&self) -> impl Iterator<Item = &SkillBox> {
        self.professions.iter().flat_map(Profession::boxes)
    }

    /// Number of skill boxes in the catalog.
    pub fn skill_box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Look up a skill box from any profession.
    pub fn find_skill_box(&self, id: &str) -> Option<&SkillBox> {
        let location = self.boxes.get(id)?;
        let profession = &self.professions[location.profession];
        match location.slot {
            Slot::Novice => Some(&profession.novice),
            Slot::Master => profession.master.as_ref(),
            Slot::Tree(tree, index) => profession.skill_trees.get(tree)?.boxes.get(index),
        }
    }

    /// Look up a profession by id.
    pub fn find_profession(&self, id: &str) -> Option<&Profession> {
        self.professions.iter().find(|profession| profession.id == id)
    }

    /// Look up a species by id.
    pub fn find_species(&self, id: &str) -> Option<&Species> {
        self.species.iter().find(|species| species.id == id)
    }

    /// Profession owning the given box.
    pub fn profession_of(&self, box_id: &str) -> Option<&Profession> {
        self.boxes
            .get(box_id)
            .map(|location| &self.professions[location.profession])
    }

    /// Boxes that list `box_id` as a direct prerequisite.
    pub fn dependents_of(&self, box_id: &str) -> &[String] {
        self.dependents
            .get(box_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Professions belonging to one browser category.
    pub fn professions_by_category(
        &self,
        category: ProfessionCategory,
    ) -> impl Iterator<Item = &Profession> {
        self.professions
            .iter()
            .filter(move |profession| profession.category == category)
    }

    /// Case-insensitive substring search over profession ids and names.
    pub fn search_professions(&self, query: &str) -> Vec<&Profession> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<&Profession> = self
            .professions
            .iter()
            .filter(|profession| {
                needle.is_empty()
                    || profession.id.to_lowercase().contains(&needle)
                    || profession.name.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }
}
