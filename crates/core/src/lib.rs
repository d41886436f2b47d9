#![warn(clippy::all, missing_docs)]

//! Core engine for the SWG Infinity character build planner.
//!
//! This crate hosts the skill catalog, the build resolution engine, share
//! codes, template persistence, presets and read-only build analysis used by
//! the `swgplan` CLI and any future frontends.

pub mod analysis;
pub mod build;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod presets;
pub mod template;

pub use build::{BuildState, Change, LoadReport, Planner, MAX_SKILL_POINTS};
pub use catalog::{Catalog, CatalogLoader, CatalogSource};
pub use codec::{BuildCode, DecodeError};
pub use config::AppConfig;
pub use error::{CatalogError, PlannerError, StorageError};
pub use models::{Grants, Profession, ProfessionCategory, SkillBox, SkillTree, Species};
pub use presets::{Preset, PresetCategory};
pub use template::{FileStore, KeyValueStore, MemoryStore, Template, TemplateStore};
