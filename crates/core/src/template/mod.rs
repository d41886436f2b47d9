//! Named build snapshots and their persistence.

mod store;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{build::BuildState, catalog::Catalog, error::StorageError};

pub use store::{aside_key, FileStore, KeyValueStore, MemoryStore, DEFAULT_STORE_DIR};

/// Namespace key under which the template list is stored.
pub const TEMPLATES_KEY: &str = "swg-character-templates";

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// A persisted, named snapshot of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique identifier (`template_<millis>` or `import_<uuid>`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Species of the snapshot.
    pub species_id: String,
    /// Profession viewed when the snapshot was taken.
    pub profession_id: String,
    /// Selected box ids.
    pub selected_skill_boxes: Vec<String>,
    /// Point total recorded with the snapshot.
    pub used_skill_points: u32,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
}

impl Template {
    /// Snapshot a build under the given name.
    pub fn from_state(name: &str, state: &BuildState, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("template_{}", created_at.timestamp_millis()),
            name: normalize_name(name),
            species_id: state.species_id().to_string(),
            profession_id: state.profession_id().to_string(),
            selected_skill_boxes: state.selected_skill_boxes().iter().cloned().collect(),
            used_skill_points: state.used_skill_points(),
            created_at,
        }
    }
}

/// Collapse runs of whitespace and trim.
pub fn normalize_name(name: &str) -> String {
    WHITESPACE_RE.replace_all(name.trim(), " ").into_owned()
}

/// Template list kept under [`TEMPLATES_KEY`] in a key-value store.
pub struct TemplateStore<S> {
    store: S,
}

impl<S: KeyValueStore> TemplateStore<S> {
    /// Wrap a key-value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying key-value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// All templates, most recent first.
    ///
    /// A stored document that fails to parse is moved aside and read as empty.
    pub fn list(&self) -> Result<Vec<Template>, StorageError> {
        let mut templates = self.read()?;
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    /// Look up a template by id.
    pub fn find(&self, id: &str) -> Result<Option<Template>, StorageError> {
        Ok(self.read()?.into_iter().find(|template| template.id == id))
    }

    /// Snapshot the build and append it to the list.
    ///
    /// A blank name falls back to `<profession name> Build`.
    pub fn save(
        &self,
        name: &str,
        state: &BuildState,
        catalog: &Catalog,
    ) -> Result<Template, StorageError> {
        let mut templates = self.read()?;
        let mut template = Template::from_state(name, state, Utc::now());
        if template.name.is_empty() {
            let profession_name = catalog
                .find_profession(state.profession_id())
                .map(|profession| profession.name.as_str())
                .unwrap_or(state.profession_id());
            template.name = format!("{profession_name} Build");
        }

        // Two saves inside one millisecond would otherwise share an id.
        let base = template.id.clone();
        let mut suffix = 1;
        while templates.iter().any(|existing| existing.id == template.id) {
            template.id = format!("{base}_{suffix}");
            suffix += 1;
        }

        templates.push(template.clone());
        self.write(&templates)?;
        info!("saved template {} ({})", template.id, template.name);
        Ok(template)
    }

    /// Append an imported template.
    pub fn import(&self, template: Template) -> Result<Template, StorageError> {
        let mut templates = self.read()?;
        templates.retain(|existing| existing.id != template.id);
        templates.push(template.clone());
        self.write(&templates)?;
        info!("imported template {} ({})", template.id, template.name);
        Ok(template)
    }

    /// Remove a template; returns `false` when no template had that id.
    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut templates = self.read()?;
        let before = templates.len();
        templates.retain(|template| template.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.write(&templates)?;
        Ok(true)
    }

    fn read(&self) -> Result<Vec<Template>, StorageError> {
        let Some(contents) = self.store.load(TEMPLATES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&contents) {
            Ok(templates) => Ok(templates),
            Err(err) => {
                self.store.set_aside(TEMPLATES_KEY)?;
                warn!(
                    "corrupt template store moved to '{}': {err}",
                    aside_key(TEMPLATES_KEY)
                );
                Ok(Vec::new())
            }
        }
    }

    fn write(&self, templates: &[Template]) -> Result<(), StorageError> {
        let serialised = serde_json::to_string_pretty(templates)?;
        self.store.store(TEMPLATES_KEY, &serialised)
    }
}
