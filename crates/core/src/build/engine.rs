use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use super::{BuildState, MAX_SKILL_POINTS};
use crate::{catalog::Catalog, error::PlannerError, template::Template};

/// Result of a [`Planner::toggle`] gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Boxes added to the build (the toggled box plus missing prerequisites).
    Added(BTreeSet<String>),
    /// Boxes removed from the build (the toggled box plus selected dependents).
    Removed(BTreeSet<String>),
}

impl Change {
    /// Ids touched by the change.
    pub fn ids(&self) -> &BTreeSet<String> {
        match self {
            Change::Added(ids) | Change::Removed(ids) => ids,
        }
    }
}

/// What [`Planner::load_selection`] found while restoring a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ids absent from the catalog; kept in the selection but worth nothing.
    pub unknown_boxes: Vec<String>,
    /// Prerequisites of loaded boxes that the loaded selection lacks.
    pub missing_prerequisites: BTreeSet<String>,
    /// Point total claimed by the caller.
    pub supplied_points: u32,
    /// Point total recomputed from the known boxes.
    pub recomputed_points: u32,
}

impl LoadReport {
    /// Returns `true` when the supplied total disagrees with the catalog.
    pub fn points_mismatch(&self) -> bool {
        self.supplied_points != self.recomputed_points
    }

    /// Returns `true` when the loaded build is fully consistent.
    pub fn is_clean(&self) -> bool {
        self.unknown_boxes.is_empty()
            && self.missing_prerequisites.is_empty()
            && !self.points_mismatch()
    }
}

/// Resolution engine applying build transitions against a catalog.
///
/// The planner holds no build of its own. Every operation either applies in
/// full or returns an error with the state untouched.
#[derive(Debug, Clone, Copy)]
pub struct Planner<'a> {
    catalog: &'a Catalog,
}

impl<'a> Planner<'a> {
    /// Create a planner over the given catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Catalog the planner resolves against.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Start an empty build for the given species and viewed profession.
    pub fn start(&self, species_id: &str, profession_id: &str) -> Result<BuildState, PlannerError> {
        self.ensure_species(species_id)?;
        self.ensure_profession(profession_id)?;
        let mut state = BuildState::empty(species_id, profession_id);
        self.refresh_derived(&mut state);
        Ok(state)
    }

    /// Select a box together with every prerequisite the build lacks.
    ///
    /// Returns the ids that were added.
    pub fn select(
        &self,
        state: &mut BuildState,
        box_id: &str,
    ) -> Result<BTreeSet<String>, PlannerError> {
        let added = self.plan_selection(state, box_id)?;
        let needed = self.points_of(&added);
        let available = state.remaining_skill_points();
        if state.used_points.saturating_add(needed) > MAX_SKILL_POINTS {
            debug!("rejected {box_id}: needs {needed} points, {available} available");
            return Err(PlannerError::InsufficientSkillPoints { needed, available });
        }

        for id in &added {
            if let Some(skill_box) = self.catalog.find_skill_box(id) {
                state.commands.extend(skill_box.grants.commands.iter().cloned());
                state
                    .certifications
                    .extend(skill_box.grants.certifications.iter().cloned());
            }
        }
        state.selected.extend(added.iter().cloned());
        state.used_points = state.used_points.saturating_add(needed);
        self.recompute_modifiers(state);

        debug!(
            "selected {box_id} (+{} boxes, {} points used)",
            added.len(),
            state.used_points
        );
        Ok(added)
    }

    /// Deselect a box together with every selected box depending on it.
    ///
    /// Returns the ids that were removed.
    pub fn deselect(
        &self,
        state: &mut BuildState,
        box_id: &str,
    ) -> Result<BTreeSet<String>, PlannerError> {
        if !state.is_selected(box_id) {
            return Err(PlannerError::NotSelected(box_id.to_string()));
        }

        let removed = self.selected_dependents(state, box_id);
        let freed = self.points_of(&removed);
        state.selected.retain(|id| !removed.contains(id));
        state.used_points = state.used_points.saturating_sub(freed);
        self.refresh_derived(state);

        debug!(
            "deselected {box_id} (-{} boxes, {} points used)",
            removed.len(),
            state.used_points
        );
        Ok(removed)
    }

    /// Deselect the box when it is selected, select it otherwise.
    pub fn toggle(&self, state: &mut BuildState, box_id: &str) -> Result<Change, PlannerError> {
        if state.is_selected(box_id) {
            self.deselect(state, box_id).map(Change::Removed)
        } else {
            self.select(state, box_id).map(Change::Added)
        }
    }

    /// Clear the selection, leaving only the species baseline.
    pub fn reset(&self, state: &mut BuildState) {
        state.selected.clear();
        state.used_points = 0;
        self.refresh_derived(state);
        debug!("build reset");
    }

    /// Replace the build with a stored selection.
    ///
    /// Species and profession must exist. Unknown box ids are kept but
    /// contribute nothing; the point total is recomputed from known boxes and
    /// must fit in the pool. Missing prerequisites are reported, not added.
    pub fn load_selection(
        &self,
        state: &mut BuildState,
        species_id: &str,
        profession_id: &str,
        box_ids: &[String],
        supplied_points: u32,
    ) -> Result<LoadReport, PlannerError> {
        self.ensure_species(species_id)?;
        self.ensure_profession(profession_id)?;

        let selected: BTreeSet<String> = box_ids.iter().cloned().collect();
        let mut report = LoadReport {
            supplied_points,
            ..LoadReport::default()
        };
        for id in &selected {
            match self.catalog.find_skill_box(id) {
                Some(skill_box) => {
                    report.recomputed_points =
                        report.recomputed_points.saturating_add(skill_box.skill_points);
                    report.missing_prerequisites.extend(
                        skill_box
                            .prerequisites
                            .iter()
                            .filter(|prerequisite| !selected.contains(*prerequisite))
                            .cloned(),
                    );
                }
                None => report.unknown_boxes.push(id.clone()),
            }
        }

        if report.recomputed_points > MAX_SKILL_POINTS {
            return Err(PlannerError::InsufficientSkillPoints {
                needed: report.recomputed_points,
                available: MAX_SKILL_POINTS,
            });
        }

        if !report.unknown_boxes.is_empty() {
            warn!(
                "loaded build references unknown skill boxes: {}",
                report.unknown_boxes.join(", ")
            );
        }
        if report.points_mismatch() {
            warn!(
                "loaded build claims {} points, catalog totals {}",
                report.supplied_points, report.recomputed_points
            );
        }

        state.species_id = species_id.to_string();
        state.profession_id = profession_id.to_string();
        state.selected = selected;
        state.used_points = report.recomputed_points;
        self.refresh_derived(state);

        debug!(
            "loaded {} boxes for {species_id}/{profession_id}",
            state.selected.len()
        );
        Ok(report)
    }

    /// Restore a saved or imported template into the build.
    pub fn load_template(
        &self,
        state: &mut BuildState,
        template: &Template,
    ) -> Result<LoadReport, PlannerError> {
        self.load_selection(
            state,
            &template.species_id,
            &template.profession_id,
            &template.selected_skill_boxes,
            template.used_skill_points,
        )
    }

    /// Swap the species and recompute modifiers; the selection is untouched.
    pub fn change_species(&self, state: &mut BuildState, species_id: &str) -> Result<(), PlannerError> {
        self.ensure_species(species_id)?;
        state.species_id = species_id.to_string();
        self.recompute_modifiers(state);
        Ok(())
    }

    /// Switch the profession being viewed.
    pub fn change_profession(
        &self,
        state: &mut BuildState,
        profession_id: &str,
    ) -> Result<(), PlannerError> {
        self.ensure_profession(profession_id)?;
        state.profession_id = profession_id.to_string();
        Ok(())
    }

    /// Points left in the pool.
    pub fn remaining_points(&self, state: &BuildState) -> u32 {
        state.remaining_skill_points()
    }

    /// Points [`select`](Self::select) would spend, without touching the build.
    ///
    /// Already selected boxes cost nothing.
    pub fn selection_cost(&self, state: &BuildState, box_id: &str) -> Result<u32, PlannerError> {
        if self.catalog.find_skill_box(box_id).is_none() {
            return Err(PlannerError::UnknownSkillBox(box_id.to_string()));
        }
        if state.is_selected(box_id) {
            return Ok(0);
        }
        let added = self.plan_selection(state, box_id)?;
        Ok(self.points_of(&added))
    }

    /// Returns `true` when [`select`](Self::select) would succeed.
    pub fn can_select(&self, state: &BuildState, box_id: &str) -> bool {
        if state.is_selected(box_id) {
            return false;
        }
        self.selection_cost(state, box_id)
            .map(|cost| state.used_points.saturating_add(cost) <= MAX_SKILL_POINTS)
            .unwrap_or(false)
    }

    /// Box plus the transitive closure of its unselected prerequisites.
    fn plan_selection(&self, state: &BuildState, box_id: &str) -> Result<BTreeSet<String>, PlannerError> {
        let skill_box = self
            .catalog
            .find_skill_box(box_id)
            .ok_or_else(|| PlannerError::UnknownSkillBox(box_id.to_string()))?;
        if state.is_selected(box_id) {
            return Err(PlannerError::AlreadySelected(box_id.to_string()));
        }

        let mut added = BTreeSet::from([skill_box.id.clone()]);
        let mut visited: HashSet<&str> = HashSet::new();
        let mut worklist: Vec<&str> = skill_box.prerequisites.iter().map(String::as_str).collect();
        while let Some(id) = worklist.pop() {
            if state.is_selected(id) || !visited.insert(id) {
                continue;
            }
            added.insert(id.to_string());
            if let Some(prerequisite) = self.catalog.find_skill_box(id) {
                worklist.extend(prerequisite.prerequisites.iter().map(String::as_str));
            }
        }
        Ok(added)
    }

    /// Box plus every selected box that transitively depends on it.
    fn selected_dependents(&self, state: &BuildState, box_id: &str) -> BTreeSet<String> {
        let mut removed = BTreeSet::from([box_id.to_string()]);
        let mut worklist = vec![box_id];
        while let Some(id) = worklist.pop() {
            for dependent in self.catalog.dependents_of(id) {
                if state.is_selected(dependent) && removed.insert(dependent.clone()) {
                    worklist.push(dependent);
                }
            }
        }
        removed
    }

    fn points_of(&self, ids: &BTreeSet<String>) -> u32 {
        ids.iter()
            .filter_map(|id| self.catalog.find_skill_box(id))
            .fold(0u32, |total, skill_box| total.saturating_add(skill_box.skill_points))
    }

    fn ensure_species(&self, species_id: &str) -> Result<(), PlannerError> {
        match self.catalog.find_species(species_id) {
            Some(_) => Ok(()),
            None => Err(PlannerError::UnknownSpecies(species_id.to_string())),
        }
    }

    fn ensure_profession(&self, profession_id: &str) -> Result<(), PlannerError> {
        match self.catalog.find_profession(profession_id) {
            Some(_) => Ok(()),
            None => Err(PlannerError::UnknownProfession(profession_id.to_string())),
        }
    }

    /// Rebuild commands, certifications and modifiers from the selection.
    fn refresh_derived(&self, state: &mut BuildState) {
        state.commands.clear();
        state.certifications.clear();
        for id in &state.selected {
            if let Some(skill_box) = self.catalog.find_skill_box(id) {
                state.commands.extend(skill_box.grants.commands.iter().cloned());
                state
                    .certifications
                    .extend(skill_box.grants.certifications.iter().cloned());
            }
        }
        self.recompute_modifiers(state);
    }

    fn recompute_modifiers(&self, state: &mut BuildState) {
        state.modifiers.clear();
        if let Some(species) = self.catalog.find_species(&state.species_id) {
            for (name, value) in &species.modifiers {
                *state.modifiers.entry(name.clone()).or_insert(0) += value;
            }
        }
        for id in &state.selected {
            if let Some(skill_box) = self.catalog.find_skill_box(id) {
                for (name, value) in &skill_box.grants.modifiers {
                    *state.modifiers.entry(name.clone()).or_insert(0) += value;
                }
            }
        }
    }
}
