use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::MAX_SKILL_POINTS;

/// The single mutable state of a planning session.
///
/// Only the [`Planner`](super::Planner) mutates a build, which keeps the
/// point total and the derived grant sets in step with the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildState {
    pub(crate) species_id: String,
    pub(crate) profession_id: String,
    pub(crate) selected: BTreeSet<String>,
    pub(crate) used_points: u32,
    pub(crate) commands: BTreeSet<String>,
    pub(crate) certifications: BTreeSet<String>,
    pub(crate) modifiers: BTreeMap<String, i32>,
}

impl BuildState {
    pub(crate) fn empty(species_id: &str, profession_id: &str) -> Self {
        Self {
            species_id: species_id.to_string(),
            profession_id: profession_id.to_string(),
            selected: BTreeSet::new(),
            used_points: 0,
            commands: BTreeSet::new(),
            certifications: BTreeSet::new(),
            modifiers: BTreeMap::new(),
        }
    }

    /// Species of the character.
    pub fn species_id(&self) -> &str {
        &self.species_id
    }

    /// Profession currently shown by the presentation layer.
    pub fn profession_id(&self) -> &str {
        &self.profession_id
    }

    /// Selected box ids in sorted order.
    pub fn selected_skill_boxes(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Returns `true` when the box is part of the build.
    pub fn is_selected(&self, box_id: &str) -> bool {
        self.selected.contains(box_id)
    }

    /// Points spent on selected boxes.
    pub fn used_skill_points(&self) -> u32 {
        self.used_points
    }

    /// Points still available in the pool.
    pub fn remaining_skill_points(&self) -> u32 {
        MAX_SKILL_POINTS.saturating_sub(self.used_points)
    }

    /// Commands granted by the selection.
    pub fn commands(&self) -> &BTreeSet<String> {
        &self.commands
    }

    /// Certifications granted by the selection.
    pub fn certifications(&self) -> &BTreeSet<String> {
        &self.certifications
    }

    /// Summed modifiers from the species and every selected box.
    pub fn modifiers(&self) -> &BTreeMap<String, i32> {
        &self.modifiers
    }

    /// Returns `true` when no box is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
