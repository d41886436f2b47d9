//! Share codes: `SWG-BUILD-` followed by base64-encoded build JSON.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, PAD, STANDARD},
        DecodePaddingMode,
    },
    Engine,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{build::BuildState, catalog::Catalog, template::Template};

/// Tag prepended to every encoded build.
pub const SHARE_CODE_PREFIX: &str = "SWG-BUILD-";

/// Payload version written by [`BuildCode::encode`].
pub const FORMAT_VERSION: &str = "1.0";

/// Standard alphabet that accepts codes with or without trailing padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a share code could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Nothing left after trimming and stripping the tag.
    #[error("share code is empty")]
    Empty,
    /// The body is not valid base64.
    #[error("share code is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not UTF-8 text.
    #[error("share code does not contain text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The decoded text is not JSON.
    #[error("share code does not contain valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A required field is absent.
    #[error("share code is missing '{0}'")]
    MissingField(&'static str),
    /// A required field has the wrong shape.
    #[error("share code field '{0}' is malformed")]
    InvalidField(&'static str),
}

/// Display names carried alongside a share code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMeta {
    /// Name of the viewed profession.
    pub profession_name: String,
    /// Name of the species.
    pub species_name: String,
}

/// Wire payload of a share code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCode {
    /// Payload format version.
    pub version: String,
    /// Species id.
    pub species: String,
    /// Viewed profession id.
    pub profession: String,
    /// Selected box ids.
    pub skills: Vec<String>,
    /// Point total at encode time.
    pub skill_points: u32,
    /// Encode time in epoch milliseconds.
    pub timestamp: i64,
    /// Advisory display names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BuildMeta>,
}

impl BuildCode {
    /// Assemble a payload without display metadata.
    pub fn new(
        species: impl Into<String>,
        profession: impl Into<String>,
        skills: Vec<String>,
        skill_points: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            species: species.into(),
            profession: profession.into(),
            skills,
            skill_points,
            timestamp: timestamp.timestamp_millis(),
            meta: None,
        }
    }

    /// Attach display names.
    pub fn with_meta(mut self, meta: BuildMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Capture a build, filling display names from the catalog.
    pub fn from_state(state: &BuildState, catalog: &Catalog, timestamp: DateTime<Utc>) -> Self {
        let code = Self::new(
            state.species_id(),
            state.profession_id(),
            state.selected_skill_boxes().iter().cloned().collect(),
            state.used_skill_points(),
            timestamp,
        );
        let profession_name = catalog
            .find_profession(state.profession_id())
            .map(|profession| profession.name.clone())
            .unwrap_or_else(|| state.profession_id().to_string());
        let species_name = catalog
            .find_species(state.species_id())
            .map(|species| species.name.clone())
            .unwrap_or_else(|| state.species_id().to_string());
        code.with_meta(BuildMeta {
            profession_name,
            species_name,
        })
    }

    /// Serialise to a tagged share code.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{SHARE_CODE_PREFIX}{}", STANDARD.encode(json)))
    }
}

/// Encode a build as a share code stamped with the current time.
pub fn encode_state(state: &BuildState, catalog: &Catalog) -> Result<String, serde_json::Error> {
    BuildCode::from_state(state, catalog, Utc::now()).encode()
}

/// Decode a share code into an import template.
///
/// The tag is optional. Only `species`, `profession` and `skills` are
/// required; everything else falls back to defaults.
pub fn decode(text: &str) -> Result<Template, DecodeError> {
    let trimmed = text.trim();
    let body: String = trimmed
        .strip_prefix(SHARE_CODE_PREFIX)
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = LENIENT.decode(body)?;
    let json = String::from_utf8(bytes)?;
    let payload: Value = serde_json::from_str(&json)?;

    let species = required_str(&payload, "species")?;
    let profession = required_str(&payload, "profession")?;
    let skills = match payload.get("skills") {
        None | Some(Value::Null) => return Err(DecodeError::MissingField("skills")),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(DecodeError::InvalidField("skills"))?,
        Some(_) => return Err(DecodeError::InvalidField("skills")),
    };

    let used_skill_points = payload
        .get("skillPoints")
        .and_then(Value::as_u64)
        .and_then(|points| u32::try_from(points).ok())
        .unwrap_or(0);
    let created_at = payload
        .get("timestamp")
        .and_then(Value::as_i64)
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or_else(Utc::now);
    let profession_name = payload
        .pointer("/meta/professionName")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(profession);

    Ok(Template {
        id: format!("import_{}", Uuid::new_v4().simple()),
        name: format!("Imported {profession_name} Build"),
        species_id: species.to_string(),
        profession_id: profession.to_string(),
        selected_skill_boxes: skills,
        used_skill_points,
        created_at,
    })
}

fn required_str<'a>(payload: &'a Value, field: &'static str) -> Result<&'a str, DecodeError> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field)),
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.as_str()),
        Some(_) => Err(DecodeError::InvalidField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Planner;
    use anyhow::Result;
    use serde_json::json;

    fn code_for(payload: Value) -> String {
        STANDARD.encode(payload.to_string())
    }

    #[test]
    fn round_trips_a_novice_build() -> Result<()> {
        let timestamp = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let code = BuildCode::new(
            "human",
            "brawler",
            vec!["brawler_novice".to_string()],
            4,
            timestamp,
        )
        .encode()?;
        assert!(code.starts_with(SHARE_CODE_PREFIX));

        let template = decode(&code)?;
        assert_eq!(template.species_id, "human");
        assert_eq!(template.profession_id, "brawler");
        assert_eq!(template.selected_skill_boxes, ["brawler_novice"]);
        assert_eq!(template.used_skill_points, 4);
        assert_eq!(template.created_at, timestamp);
        assert_eq!(template.name, "Imported brawler Build");
        assert!(template.id.starts_with("import_"));
        Ok(())
    }

    #[test]
    fn encoding_is_deterministic_and_carries_names() -> Result<()> {
        let catalog = Catalog::embedded();
        let planner = Planner::new(&catalog);
        let mut state = planner.start("twilek", "teras_kasi_artist")?;
        planner.select(&mut state, "brawler_unarmed_1")?;

        let timestamp = Utc::now();
        let first = BuildCode::from_state(&state, &catalog, timestamp).encode()?;
        let second = BuildCode::from_state(&state, &catalog, timestamp).encode()?;
        assert_eq!(first, second);

        let template = decode(&format!("  {first}\n"))?;
        assert_eq!(template.name, "Imported Teras Kasi Artist Build");
        assert_eq!(template.used_skill_points, 8);
        Ok(())
    }

    #[test]
    fn accepts_untagged_codes_with_optional_fields_missing() -> Result<()> {
        let code = code_for(json!({
            "species": "rodian",
            "profession": "scout",
            "skills": []
        }));
        let template = decode(&code)?;
        assert_eq!(template.used_skill_points, 0);
        assert!(template.selected_skill_boxes.is_empty());
        assert_eq!(template.name, "Imported scout Build");
        Ok(())
    }

    #[test]
    fn accepts_unpadded_and_line_wrapped_codes() -> Result<()> {
        let body = code_for(json!({
            "species": "human",
            "profession": "medic",
            "skills": ["medic_injury_1"]
        }));
        assert!(body.ends_with('='));

        let unpadded = body.trim_end_matches('=');
        let template = decode(&format!("{SHARE_CODE_PREFIX}{unpadded}"))?;
        assert_eq!(template.selected_skill_boxes, ["medic_injury_1"]);

        let (head, tail) = body.split_at(body.len() / 2);
        let wrapped = format!("{SHARE_CODE_PREFIX}{head}\r\n  {tail}\n");
        assert_eq!(decode(&wrapped)?.profession_id, "medic");
        Ok(())
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(matches!(decode("not-a-real-code"), Err(DecodeError::Base64(_))));
        assert!(matches!(decode("   "), Err(DecodeError::Empty)));
        assert!(matches!(decode(SHARE_CODE_PREFIX), Err(DecodeError::Empty)));

        let not_json = STANDARD.encode("species=human");
        assert!(matches!(decode(&not_json), Err(DecodeError::Json(_))));

        let missing = code_for(json!({"species": "human", "skills": []}));
        assert!(matches!(
            decode(&missing),
            Err(DecodeError::MissingField("profession"))
        ));

        let blank = code_for(json!({"species": "", "profession": "brawler", "skills": []}));
        assert!(matches!(decode(&blank), Err(DecodeError::InvalidField("species"))));

        let no_skills = code_for(json!({"species": "human", "profession": "brawler"}));
        assert!(matches!(
            decode(&no_skills),
            Err(DecodeError::MissingField("skills"))
        ));

        let bad_skills = code_for(json!({"species": "human", "profession": "brawler", "skills": "x"}));
        assert!(matches!(
            decode(&bad_skills),
            Err(DecodeError::InvalidField("skills"))
        ));
    }
}
