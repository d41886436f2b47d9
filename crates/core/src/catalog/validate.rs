use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::CatalogDocument;
use crate::{build::MAX_SKILL_POINTS, error::CatalogError, models::SkillBox};

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("invalid catalog id regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

pub(super) fn validate(document: &CatalogDocument) -> Result<(), CatalogError> {
    let mut species_ids = HashSet::new();
    for species in &document.species {
        check_id("species", &species.id)?;
        if !species_ids.insert(species.id.as_str()) {
            return Err(duplicate("species", &species.id));
        }
    }

    let mut profession_ids = HashSet::new();
    let mut boxes: HashMap<&str, &SkillBox> = HashMap::new();
    for profession in &document.professions {
        check_id("profession", &profession.id)?;
        if !profession_ids.insert(profession.id.as_str()) {
            return Err(duplicate("profession", &profession.id));
        }
        for skill_box in profession.boxes() {
            check_id("skill box", &skill_box.id)?;
            if skill_box.skill_points > MAX_SKILL_POINTS {
                return Err(CatalogError::OversizedBox {
                    id: skill_box.id.clone(),
                    skill_points: skill_box.skill_points,
                });
            }
            if boxes.insert(skill_box.id.as_str(), skill_box).is_some() {
                return Err(duplicate("skill box", &skill_box.id));
            }
        }
    }

    for profession in &document.professions {
        for prerequisite in &profession.prerequisites {
            if !boxes.contains_key(prerequisite.as_str()) {
                return Err(CatalogError::MissingPrerequisite {
                    owner: profession.id.clone(),
                    missing: prerequisite.clone(),
                });
            }
        }
        for skill_box in profession.boxes() {
            for prerequisite in &skill_box.prerequisites {
                if !boxes.contains_key(prerequisite.as_str()) {
                    return Err(CatalogError::MissingPrerequisite {
                        owner: skill_box.id.clone(),
                        missing: prerequisite.clone(),
                    });
                }
            }
        }
    }

    ensure_acyclic(&boxes)
}

fn check_id(kind: &'static str, id: &str) -> Result<(), CatalogError> {
    if ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(CatalogError::InvalidId {
            kind,
            id: id.to_string(),
        })
    }
}

fn duplicate(kind: &'static str, id: &str) -> CatalogError {
    CatalogError::Duplicate {
        kind,
        id: id.to_string(),
    }
}

/// Iterative depth-first walk over prerequisite edges; meeting a box that is
/// still on the stack means the graph loops.
fn ensure_acyclic(boxes: &HashMap<&str, &SkillBox>) -> Result<(), CatalogError> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(boxes.len());
    let mut roots: Vec<&str> = boxes.keys().copied().collect();
    roots.sort_unstable();

    for root in roots {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::Active);
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            let prerequisites = boxes
                .get(id)
                .map(|skill_box| skill_box.prerequisites.as_slice())
                .unwrap_or(&[]);

            if let Some(child) = prerequisites.get(next) {
                frame.1 += 1;
                let child = child.as_str();
                match marks.get(child) {
                    Some(Mark::Active) => return Err(CatalogError::Cycle(child.to_string())),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::Active);
                        stack.push((child, 0));
                    }
                }
            } else {
                marks.insert(id, Mark::Done);
                stack.pop();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(professions: &str) -> CatalogDocument {
        serde_json::from_str(&format!(r#"{{"species": [], "professions": [{professions}]}}"#))
            .expect("test document should parse")
    }

    #[test]
    fn rejects_duplicate_box_ids_across_professions() {
        let doc = document(
            r#"
            {"id": "a", "name": "A", "category": "basic",
             "novice": {"id": "shared_novice", "name": "N", "skill_points": 1}},
            {"id": "b", "name": "B", "category": "basic",
             "novice": {"id": "shared_novice", "name": "N", "skill_points": 1}}
            "#,
        );
        let err = validate(&doc).expect_err("duplicate should fail");
        assert!(matches!(err, CatalogError::Duplicate { kind: "skill box", .. }));
    }

    #[test]
    fn rejects_unknown_profession_prerequisite() {
        let doc = document(
            r#"
            {"id": "elite", "name": "Elite", "category": "elite", "prerequisites": ["ghost_4"],
             "novice": {"id": "elite_novice", "name": "N", "skill_points": 1}}
            "#,
        );
        let err = validate(&doc).expect_err("missing prerequisite should fail");
        assert!(matches!(
            err,
            CatalogError::MissingPrerequisite { ref owner, ref missing }
                if owner == "elite" && missing == "ghost_4"
        ));
    }

    #[test]
    fn rejects_self_prerequisite_and_bad_ids() {
        let doc = document(
            r#"
            {"id": "solo", "name": "Solo", "category": "basic",
             "novice": {"id": "solo_novice", "name": "N", "skill_points": 1, "prerequisites": ["solo_novice"]}}
            "#,
        );
        assert!(matches!(validate(&doc), Err(CatalogError::Cycle(id)) if id == "solo_novice"));

        let doc = document(
            r#"
            {"id": "Bad Id", "name": "Bad", "category": "basic",
             "novice": {"id": "bad_novice", "name": "N", "skill_points": 1}}
            "#,
        );
        assert!(matches!(validate(&doc), Err(CatalogError::InvalidId { kind: "profession", .. })));
    }

    #[test]
    fn rejects_boxes_costing_more_than_the_pool() {
        let doc = document(
            r#"
            {"id": "greedy", "name": "Greedy", "category": "basic",
             "novice": {"id": "greedy_novice", "name": "N", "skill_points": 4294967295}}
            "#,
        );
        assert!(matches!(
            validate(&doc),
            Err(CatalogError::OversizedBox { ref id, skill_points: u32::MAX }) if id == "greedy_novice"
        ));

        let doc = document(
            r#"
            {"id": "whole", "name": "Whole", "category": "basic",
             "novice": {"id": "whole_novice", "name": "N", "skill_points": 250}}
            "#,
        );
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn accepts_diamond_shaped_prerequisites() {
        let doc = document(
            r#"
            {"id": "gem", "name": "Gem", "category": "basic",
             "novice": {"id": "gem_novice", "name": "N", "skill_points": 1},
             "master": {"id": "gem_master", "name": "M", "skill_points": 1, "prerequisites": ["gem_left", "gem_right"]},
             "skill_trees": [{"key": "main", "name": "Main", "boxes": [
                {"id": "gem_left", "name": "L", "skill_points": 1, "prerequisites": ["gem_novice"]},
                {"id": "gem_right", "name": "R", "skill_points": 1, "prerequisites": ["gem_novice"]}
             ]}]}
            "#,
        );
        assert!(validate(&doc).is_ok());
    }
}
