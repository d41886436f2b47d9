//! Hand-authored recommended builds shipped with the planner.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    build::{BuildState, LoadReport, Planner},
    error::PlannerError,
};

const EMBEDDED_PRESETS: &str = include_str!("../data/presets.json");

static PRESETS: Lazy<Vec<Preset>> = Lazy::new(|| {
    serde_json::from_str(EMBEDDED_PRESETS).expect("embedded presets must be valid")
});

/// Role a preset is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetCategory {
    /// Absorbs damage for a group.
    Tank,
    /// Damage dealer.
    Dps,
    /// Item and resource crafter.
    Crafter,
    /// Healer or buffer.
    Support,
    /// Mixed combat and utility.
    Hybrid,
    /// Performer.
    Entertainer,
}

impl PresetCategory {
    /// All categories in display order.
    pub const ALL: [PresetCategory; 6] = [
        PresetCategory::Tank,
        PresetCategory::Dps,
        PresetCategory::Crafter,
        PresetCategory::Support,
        PresetCategory::Hybrid,
        PresetCategory::Entertainer,
    ];

    /// Lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            PresetCategory::Tank => "tank",
            PresetCategory::Dps => "dps",
            PresetCategory::Crafter => "crafter",
            PresetCategory::Support => "support",
            PresetCategory::Hybrid => "hybrid",
            PresetCategory::Entertainer => "entertainer",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            PresetCategory::Tank => "Tank",
            PresetCategory::Dps => "DPS",
            PresetCategory::Crafter => "Crafter",
            PresetCategory::Support => "Support",
            PresetCategory::Hybrid => "Hybrid",
            PresetCategory::Entertainer => "Entertainer",
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

impl fmt::Display for PresetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// How much game knowledge a preset assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Forgiving starter build.
    Beginner,
    /// Needs some familiarity with the game.
    Intermediate,
    /// Demands careful play.
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        })
    }
}

/// A recommended build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short pitch.
    pub description: String,
    /// Role grouping.
    pub category: PresetCategory,
    /// Expected experience level.
    pub difficulty: Difficulty,
    /// Advertised point total.
    pub total_skill_points: u32,
    /// Species that suit the build best.
    #[serde(default)]
    pub recommended_species: Vec<String>,
    /// Boxes making up the build.
    pub skill_boxes: Vec<String>,
    /// How the build plays.
    #[serde(default)]
    pub play_style: String,
    /// What the build does well.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Where the build struggles.
    #[serde(default)]
    pub weaknesses: Vec<String>,
    /// Advice for playing the build.
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Every shipped preset.
pub fn presets() -> &'static [Preset] {
    &PRESETS
}

/// Look up a preset by id.
pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.id == id)
}

/// Presets in one category.
pub fn presets_by_category(category: PresetCategory) -> impl Iterator<Item = &'static Preset> {
    PRESETS
        .iter()
        .filter(move |preset| preset.category == category)
}

impl Planner<'_> {
    /// Replace the build with a preset.
    ///
    /// The species is kept; the viewed profession switches to the owner of
    /// the preset's first box.
    pub fn apply_preset(
        &self,
        state: &mut BuildState,
        preset: &Preset,
    ) -> Result<LoadReport, PlannerError> {
        let profession_id = preset
            .skill_boxes
            .iter()
            .find_map(|id| self.catalog().profession_of(id))
            .map(|profession| profession.id.clone())
            .unwrap_or_else(|| state.profession_id().to_string());
        let species_id = state.species_id().to_string();

        let mut next = state.clone();
        self.reset(&mut next);
        let report = self.load_selection(
            &mut next,
            &species_id,
            &profession_id,
            &preset.skill_boxes,
            preset.total_skill_points,
        )?;
        *state = next;
        debug!("applied preset {}", preset.id);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::collections::HashSet;

    #[test]
    fn presets_are_consistent_with_catalog() {
        let catalog = Catalog::embedded();
        let planner = Planner::new(&catalog);
        let mut ids = HashSet::new();

        for preset in presets() {
            assert!(ids.insert(preset.id.as_str()), "duplicate preset {}", preset.id);
            for species in &preset.recommended_species {
                assert!(catalog.find_species(species).is_some(), "{species}");
            }

            let mut state = planner.start("human", "brawler").expect("start");
            let report = planner.apply_preset(&mut state, preset).expect("preset fits");
            assert!(report.is_clean(), "{} is inconsistent: {report:?}", preset.id);
            assert_eq!(state.used_skill_points(), preset.total_skill_points);
        }
    }

    #[test]
    fn every_category_has_a_preset() {
        for category in PresetCategory::ALL {
            assert!(
                presets_by_category(category).next().is_some(),
                "no {category} preset"
            );
        }
        assert_eq!(PresetCategory::parse("DPS"), Some(PresetCategory::Dps));
    }

    #[test]
    fn apply_replaces_build_and_switches_profession() {
        let catalog = Catalog::embedded();
        let planner = Planner::new(&catalog);
        let mut state = planner.start("zabrak", "pilot").expect("start");
        planner.select(&mut state, "pilot_novice").expect("select");

        let preset = find_preset("gunslinger").expect("gunslinger preset");
        planner.apply_preset(&mut state, preset).expect("apply");
        assert!(!state.is_selected("pilot_novice"));
        assert_eq!(state.species_id(), "zabrak");
        assert_eq!(
            Some(state.profession_id()),
            preset
                .skill_boxes
                .first()
                .and_then(|id| catalog.profession_of(id))
                .map(|profession| profession.id.as_str())
        );
        assert!(find_preset("jedi_god").is_none());
    }
}
