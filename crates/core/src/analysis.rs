//! Read-only views over a build: progress, access checks and modifier summaries.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
    build::{BuildState, MAX_SKILL_POINTS},
    catalog::Catalog,
    models::{Profession, ProfessionCategory},
};

const PRIVATE_PREFIX: &str = "private_";

/// How far a build has advanced through one profession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionProgress {
    /// Profession id.
    pub profession_id: String,
    /// Profession display name.
    pub name: String,
    /// Browser grouping.
    pub category: ProfessionCategory,
    /// Selected boxes belonging to the profession.
    pub selected: usize,
    /// All boxes of the profession.
    pub total: usize,
    /// Whether the novice box is held.
    pub has_novice: bool,
    /// Whether the master box is held.
    pub has_master: bool,
}

impl ProfessionProgress {
    /// Returns `true` once any box of the profession is selected.
    pub fn is_started(&self) -> bool {
        self.selected > 0
    }
}

/// Per-profession progress in catalog order.
pub fn profession_progress(state: &BuildState, catalog: &Catalog) -> Vec<ProfessionProgress> {
    catalog
        .professions()
        .iter()
        .map(|profession| ProfessionProgress {
            profession_id: profession.id.clone(),
            name: profession.name.clone(),
            category: profession.category,
            selected: profession
                .boxes()
                .filter(|skill_box| state.is_selected(&skill_box.id))
                .count(),
            total: profession.boxes().count(),
            has_novice: state.is_selected(&profession.novice.id),
            has_master: profession
                .master
                .as_ref()
                .is_some_and(|master| state.is_selected(&master.id)),
        })
        .collect()
}

/// A profession prerequisite the build does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingBox {
    /// Box id.
    pub id: String,
    /// Box display name, or the id when the catalog does not know it.
    pub name: String,
}

/// Whether a build satisfies a profession's prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionAccess {
    /// `true` when every prerequisite is selected.
    pub met: bool,
    /// Prerequisites still to be selected.
    pub missing: Vec<MissingBox>,
}

/// Check a profession's prerequisites against the build.
pub fn profession_access(
    state: &BuildState,
    catalog: &Catalog,
    profession: &Profession,
) -> ProfessionAccess {
    let missing: Vec<MissingBox> = profession
        .prerequisites
        .iter()
        .filter(|id| !state.is_selected(id))
        .map(|id| MissingBox {
            id: id.clone(),
            name: catalog
                .find_skill_box(id)
                .map(|skill_box| skill_box.name.clone())
                .unwrap_or_else(|| id.clone()),
        })
        .collect();
    ProfessionAccess {
        met: missing.is_empty(),
        missing,
    }
}

/// Display bucket of a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierCategory {
    /// Weapon and defence modifiers.
    Combat,
    /// Crafting, medical, scouting and performance modifiers.
    Skills,
    /// Character attributes.
    Attributes,
    /// Force and Jedi modifiers.
    Force,
    /// Internal `private_*` markers.
    Private,
    /// Everything else.
    Other,
}

impl ModifierCategory {
    /// All categories in display order.
    pub const ALL: [ModifierCategory; 6] = [
        ModifierCategory::Combat,
        ModifierCategory::Skills,
        ModifierCategory::Attributes,
        ModifierCategory::Force,
        ModifierCategory::Private,
        ModifierCategory::Other,
    ];

    /// Heading used when rendering the bucket.
    pub fn label(self) -> &'static str {
        match self {
            ModifierCategory::Combat => "Combat",
            ModifierCategory::Skills => "Skills",
            ModifierCategory::Attributes => "Attributes",
            ModifierCategory::Force => "Force",
            ModifierCategory::Private => "Private",
            ModifierCategory::Other => "Other",
        }
    }

    /// Bucket a modifier name by keyword. Earlier rules win.
    pub fn of(name: &str) -> Self {
        const RULES: [(ModifierCategory, &[&str]); 4] = [
            (
                ModifierCategory::Combat,
                &["damage", "accuracy", "speed", "weapon", "combat", "defense"],
            ),
            (ModifierCategory::Force, &["force", "jedi", "lightsaber"]),
            (
                ModifierCategory::Attributes,
                &["health", "action", "mind", "constitution", "strength", "luck"],
            ),
            (
                ModifierCategory::Skills,
                &["skill", "craft", "medicine", "scout", "social", "entertainer"],
            ),
        ];

        if name.starts_with(PRIVATE_PREFIX) {
            return ModifierCategory::Private;
        }
        let lower = name.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
            .map(|(category, _)| *category)
            .unwrap_or(ModifierCategory::Other)
    }
}

/// Split modifiers into display buckets; empty buckets are omitted.
pub fn categorize_modifiers(
    modifiers: &BTreeMap<String, i32>,
) -> BTreeMap<ModifierCategory, BTreeMap<String, i32>> {
    let mut buckets: BTreeMap<ModifierCategory, BTreeMap<String, i32>> = BTreeMap::new();
    for (name, value) in modifiers {
        buckets
            .entry(ModifierCategory::of(name))
            .or_default()
            .insert(name.clone(), *value);
    }
    buckets
}

/// `snake_case` to Title Case; `private_*` names lose the prefix and stay lowercase.
pub fn format_modifier_name(name: &str) -> String {
    if let Some(rest) = name.strip_prefix(PRIVATE_PREFIX) {
        return rest.replace('_', " ");
    }
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Signed display value: `+5`, `0` shown as `+0`, `-3`.
pub fn format_modifier_value(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

/// Modifiers alphabetically, with `private_*` entries last.
pub fn sorted_modifiers(modifiers: &BTreeMap<String, i32>) -> Vec<(&str, i32)> {
    let mut entries: Vec<(&str, i32)> = modifiers
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();
    entries.sort_by_key(|(name, _)| (name.starts_with(PRIVATE_PREFIX), *name));
    entries
}

/// Experience needed to train every selected box.
pub fn experience_total(state: &BuildState, catalog: &Catalog) -> u64 {
    state
        .selected_skill_boxes()
        .iter()
        .filter_map(|id| catalog.find_skill_box(id))
        .map(|skill_box| u64::from(skill_box.xp_cost))
        .sum()
}

/// One row of a current-versus-novice modifier comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierComparison {
    /// Modifier name.
    pub name: String,
    /// Value in the current build.
    pub current: i32,
    /// Value granted by the profession's novice box.
    pub novice: i32,
}

/// Compare current modifiers with what a profession's novice box grants.
pub fn compare_novice_modifiers(
    current: &BTreeMap<String, i32>,
    profession: &Profession,
) -> Vec<ModifierComparison> {
    let novice = &profession.novice.grants.modifiers;
    let names: BTreeSet<&String> = current.keys().chain(novice.keys()).collect();
    names
        .into_iter()
        .map(|name| ModifierComparison {
            name: name.clone(),
            current: current.get(name).copied().unwrap_or(0),
            novice: novice.get(name).copied().unwrap_or(0),
        })
        .collect()
}

/// Headline figures for a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    /// Species display name.
    pub species_name: String,
    /// Viewed profession display name.
    pub profession_name: String,
    /// Points spent.
    pub used_points: u32,
    /// Points left in the pool.
    pub remaining_points: u32,
    /// Size of the pool.
    pub max_points: u32,
    /// Share of the pool spent, rounded down.
    pub percent_used: u32,
    /// Selected boxes.
    pub skill_box_count: usize,
    /// Granted commands.
    pub command_count: usize,
    /// Granted certifications.
    pub certification_count: usize,
    /// Experience to train the whole build.
    pub experience: u64,
}

impl BuildSummary {
    /// Summarise a build, falling back to ids for names the catalog lacks.
    pub fn new(state: &BuildState, catalog: &Catalog) -> Self {
        let species_name = catalog
            .find_species(state.species_id())
            .map(|species| species.name.clone())
            .unwrap_or_else(|| state.species_id().to_string());
        let profession_name = catalog
            .find_profession(state.profession_id())
            .map(|profession| profession.name.clone())
            .unwrap_or_else(|| state.profession_id().to_string());
        Self {
            species_name,
            profession_name,
            used_points: state.used_skill_points(),
            remaining_points: state.remaining_skill_points(),
            max_points: MAX_SKILL_POINTS,
            percent_used: state.used_skill_points() * 100 / MAX_SKILL_POINTS,
            skill_box_count: state.selected_skill_boxes().len(),
            command_count: state.commands().len(),
            certification_count: state.certifications().len(),
            experience: experience_total(state, catalog),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Planner;

    fn modifiers(entries: &[(&str, i32)]) -> BTreeMap<String, i32> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn buckets_follow_keyword_precedence() {
        assert_eq!(ModifierCategory::of("private_brawler"), ModifierCategory::Private);
        assert_eq!(ModifierCategory::of("unarmed_accuracy"), ModifierCategory::Combat);
        assert_eq!(ModifierCategory::of("force_defense"), ModifierCategory::Combat);
        assert_eq!(ModifierCategory::of("jedi_healing"), ModifierCategory::Force);
        assert_eq!(ModifierCategory::of("health_regen"), ModifierCategory::Attributes);
        assert_eq!(ModifierCategory::of("weapon_crafting"), ModifierCategory::Combat);
        assert_eq!(ModifierCategory::of("general_crafting"), ModifierCategory::Skills);
        assert_eq!(ModifierCategory::of("camouflage"), ModifierCategory::Other);

        let buckets = categorize_modifiers(&modifiers(&[
            ("luck", 5),
            ("camouflage", 5),
            ("private_scout", 1),
        ]));
        assert_eq!(buckets.len(), 3);
        assert!(!buckets.contains_key(&ModifierCategory::Combat));
        assert_eq!(buckets[&ModifierCategory::Attributes]["luck"], 5);
    }

    #[test]
    fn formats_names_and_values() {
        assert_eq!(format_modifier_name("unarmed_accuracy"), "Unarmed Accuracy");
        assert_eq!(format_modifier_name("luck"), "Luck");
        assert_eq!(format_modifier_name("private_brawler_master"), "brawler master");
        assert_eq!(format_modifier_value(5), "+5");
        assert_eq!(format_modifier_value(0), "+0");
        assert_eq!(format_modifier_value(-10), "-10");
    }

    #[test]
    fn private_modifiers_sort_last() {
        let binding = modifiers(&[
            ("private_brawler", 1),
            ("unarmed_speed", 10),
            ("luck", 5),
        ]);
        let sorted = sorted_modifiers(&binding);
        let names: Vec<_> = sorted.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["luck", "unarmed_speed", "private_brawler"]);
    }

    #[test]
    fn progress_access_and_summary() {
        let catalog = Catalog::embedded();
        let planner = Planner::new(&catalog);
        let mut state = planner.start("human", "teras_kasi_artist").expect("start");
        let tka = catalog.find_profession("teras_kasi_artist").expect("tka");

        let access = profession_access(&state, &catalog, tka);
        assert!(!access.met);
        assert_eq!(access.missing[0].id, "brawler_unarmed_4");
        assert!(access.missing[0].name.starts_with("Unarmed IV"));

        planner.select(&mut state, "brawler_unarmed_4").expect("select");
        assert!(profession_access(&state, &catalog, tka).met);

        let progress = profession_progress(&state, &catalog);
        let brawler = progress
            .iter()
            .find(|entry| entry.profession_id == "brawler")
            .expect("brawler progress");
        assert_eq!((brawler.selected, brawler.total), (5, 18));
        assert!(brawler.has_novice && !brawler.has_master);
        assert_eq!(progress.iter().filter(|entry| entry.is_started()).count(), 1);

        let summary = BuildSummary::new(&state, &catalog);
        assert_eq!(summary.profession_name, "Teras Kasi Artist");
        assert_eq!(summary.used_points, 26);
        assert_eq!(summary.remaining_points, 224);
        assert_eq!(summary.percent_used, 10);
        assert_eq!(summary.skill_box_count, 5);
        assert_eq!(summary.experience, 1000 + 3000 + 6000 + 10000);
    }

    #[test]
    fn novice_comparison_unions_keys() {
        let catalog = Catalog::embedded();
        let brawler = catalog.find_profession("brawler").expect("brawler");
        let rows = compare_novice_modifiers(&modifiers(&[("luck", 5)]), brawler);
        let luck = rows.iter().find(|row| row.name == "luck").expect("luck row");
        assert_eq!((luck.current, luck.novice), (5, 0));
        let marker = rows
            .iter()
            .find(|row| row.name == "private_brawler")
            .expect("novice marker");
        assert_eq!((marker.current, marker.novice), (0, 1));
    }
}
