use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use tracing::warn;

use swgplan_core::{
    analysis::{self, BuildSummary},
    codec, presets, AppConfig, BuildState, Catalog, CatalogLoader, CatalogSource, FileStore,
    LoadReport, Planner, Preset, PresetCategory, ProfessionCategory, Template, TemplateStore,
};

use crate::cli::{Command, TemplateCommand};

/// Command handlers shared by every subcommand.
pub struct App {
    config: AppConfig,
    loader: CatalogLoader,
    templates: TemplateStore<FileStore>,
    json: bool,
}

impl App {
    pub fn new(config: AppConfig, json: bool) -> Self {
        let loader = CatalogLoader::from_config(&config);
        let templates = TemplateStore::new(FileStore::new(config.store_dir()));
        Self {
            config,
            loader,
            templates,
            json,
        }
    }

    /// Swap in a catalog named on the command line.
    pub fn use_catalog(&self, source: CatalogSource) {
        self.loader.refresh(source);
    }

    pub fn run(&self, command: Command, out: &mut impl Write) -> Result<()> {
        let catalog = self.loader.catalog()?;
        match command {
            Command::Professions { category, search } => {
                self.professions(&catalog, category.as_deref(), search.as_deref(), out)
            }
            Command::Show { profession } => self.show(&catalog, &profession, out),
            Command::Plan {
                species,
                profession,
                boxes,
            } => self.plan(&catalog, species, profession, &boxes, out),
            Command::Decode { code } => self.decode(&catalog, &code, out),
            Command::Templates { action } => self.templates(&catalog, action, out),
            Command::Presets { category } => self.presets(category.as_deref(), out),
            Command::Preset { id, species } => self.preset(&catalog, &id, species, out),
        }
    }

    fn professions(
        &self,
        catalog: &Catalog,
        category: Option<&str>,
        search: Option<&str>,
        out: &mut impl Write,
    ) -> Result<()> {
        let category = category
            .map(|value| {
                ProfessionCategory::parse(value)
                    .ok_or_else(|| anyhow!("unknown profession category '{value}'"))
            })
            .transpose()?;
        let professions: Vec<_> = catalog
            .search_professions(search.unwrap_or_default())
            .into_iter()
            .filter(|profession| category.map_or(true, |c| profession.category == c))
            .collect();

        if self.json {
            let rows: Vec<Value> = professions
                .iter()
                .map(|profession| {
                    json!({
                        "id": profession.id,
                        "name": profession.name,
                        "category": profession.category,
                        "boxes": profession.boxes().count(),
                        "prerequisites": profession.prerequisites,
                    })
                })
                .collect();
            return write_json(out, &rows);
        }

        for profession in professions {
            writeln!(
                out,
                "{:<20} {:<24} {:<6} {:>3} boxes",
                profession.id,
                profession.name,
                profession.category,
                profession.boxes().count()
            )?;
        }
        Ok(())
    }

    fn show(&self, catalog: &Catalog, profession_id: &str, out: &mut impl Write) -> Result<()> {
        let profession = catalog
            .find_profession(profession_id)
            .ok_or_else(|| anyhow!("unknown profession '{profession_id}'"))?;
        if self.json {
            return write_json(out, profession);
        }

        writeln!(out, "{} [{}]", profession.name, profession.category)?;
        if !profession.description.is_empty() {
            writeln!(out, "{}", profession.description)?;
        }
        if !profession.prerequisites.is_empty() {
            let names: Vec<_> = profession
                .prerequisites
                .iter()
                .map(|id| box_name(catalog, id))
                .collect();
            writeln!(out, "Requires: {}", names.join(", "))?;
        }

        writeln!(out)?;
        write_box_line(out, &profession.novice)?;
        for tree in &profession.skill_trees {
            writeln!(out, "{}", tree.name)?;
            for skill_box in &tree.boxes {
                write!(out, "  ")?;
                write_box_line(out, skill_box)?;
            }
        }
        if let Some(master) = &profession.master {
            write_box_line(out, master)?;
        }
        Ok(())
    }

    fn plan(
        &self,
        catalog: &Catalog,
        species: Option<String>,
        profession: Option<String>,
        boxes: &[String],
        out: &mut impl Write,
    ) -> Result<()> {
        let planner = Planner::new(catalog);
        let species = species.unwrap_or_else(|| self.config.default_species.clone());
        let profession = profession.unwrap_or_else(|| self.config.default_profession.clone());
        let mut state = planner.start(&species, &profession)?;

        let mut rejected = Vec::new();
        for id in boxes {
            if let Err(err) = planner.toggle(&mut state, id) {
                warn!("skipped {id}: {err}");
                rejected.push(format!("{id}: {err}"));
            }
        }

        self.write_build(catalog, &state, &rejected, out)
    }

    fn decode(&self, catalog: &Catalog, code: &str, out: &mut impl Write) -> Result<()> {
        let template = codec::decode(code).context("failed to decode share code")?;
        let planner = Planner::new(catalog);
        let mut state = planner.start(
            &self.config.default_species,
            &self.config.default_profession,
        )?;
        let report = planner.load_template(&mut state, &template)?;

        if self.json {
            return write_json(
                out,
                &json!({
                    "template": template,
                    "summary": BuildSummary::new(&state, catalog),
                    "report": report_json(&report),
                }),
            );
        }

        writeln!(out, "{}", template.name)?;
        writeln!(out, "Created: {}", template.created_at.format("%Y-%m-%d %H:%M"))?;
        write_report(out, &report)?;
        self.write_build(catalog, &state, &[], out)
    }

    fn templates(&self, catalog: &Catalog, action: TemplateCommand, out: &mut impl Write) -> Result<()> {
        match action {
            TemplateCommand::List => {
                let templates = self.templates.list()?;
                if self.json {
                    return write_json(out, &templates);
                }
                if templates.is_empty() {
                    writeln!(out, "No saved templates.")?;
                }
                for template in &templates {
                    writeln!(
                        out,
                        "{:<28} {:<28} {:<10} {:<18} {:>3} pts  {}",
                        template.id,
                        template.name,
                        template.species_id,
                        template.profession_id,
                        template.used_skill_points,
                        template.created_at.format("%Y-%m-%d %H:%M")
                    )?;
                }
                Ok(())
            }
            TemplateCommand::Save { name, code } => {
                let decoded = codec::decode(&code).context("failed to decode share code")?;
                let planner = Planner::new(catalog);
                let mut state = planner.start(
                    &self.config.default_species,
                    &self.config.default_profession,
                )?;
                let report = planner.load_template(&mut state, &decoded)?;
                if !report.is_clean() {
                    warn!("saving template with inconsistencies: {report:?}");
                }
                let saved = self.templates.save(&name, &state, catalog)?;
                self.write_template_result(out, "Saved", &saved)
            }
            TemplateCommand::Delete { id } => {
                if !self.templates.delete(&id)? {
                    bail!("no template with id '{id}'");
                }
                if self.json {
                    return write_json(out, &json!({ "deleted": id }));
                }
                writeln!(out, "Deleted {id}")?;
                Ok(())
            }
            TemplateCommand::Import { code } => {
                let template = codec::decode(&code).context("failed to decode share code")?;
                let imported = self.templates.import(template)?;
                self.write_template_result(out, "Imported", &imported)
            }
        }
    }

    fn presets(&self, category: Option<&str>, out: &mut impl Write) -> Result<()> {
        let shown: Vec<&Preset> = match category {
            Some(value) => {
                let category = PresetCategory::parse(value)
                    .ok_or_else(|| anyhow!("unknown preset category '{value}'"))?;
                presets::presets_by_category(category).collect()
            }
            None => presets::presets().iter().collect(),
        };

        if self.json {
            return write_json(out, &shown);
        }
        for preset in shown {
            writeln!(
                out,
                "{:<20} {:<22} {:<12} {:<13} {:>3} pts",
                preset.id,
                preset.name,
                preset.category,
                preset.difficulty,
                preset.total_skill_points
            )?;
        }
        Ok(())
    }

    fn preset(
        &self,
        catalog: &Catalog,
        id: &str,
        species: Option<String>,
        out: &mut impl Write,
    ) -> Result<()> {
        let preset = presets::find_preset(id).ok_or_else(|| anyhow!("unknown preset '{id}'"))?;
        let planner = Planner::new(catalog);
        let species = species.unwrap_or_else(|| self.config.default_species.clone());
        let mut state = planner.start(&species, &self.config.default_profession)?;
        let report = planner.apply_preset(&mut state, preset)?;

        if !self.json {
            writeln!(out, "{} ({}, {})", preset.name, preset.category, preset.difficulty)?;
            writeln!(out, "{}", preset.description)?;
            if !preset.play_style.is_empty() {
                writeln!(out, "Play style: {}", preset.play_style)?;
            }
            write_list(out, "Strengths", &preset.strengths)?;
            write_list(out, "Weaknesses", &preset.weaknesses)?;
            write_list(out, "Tips", &preset.tips)?;
            if !preset.recommended_species.is_empty() {
                writeln!(out, "Recommended species: {}", preset.recommended_species.join(", "))?;
            }
            write_report(out, &report)?;
            writeln!(out)?;
        }
        self.write_build(catalog, &state, &[], out)
    }

    fn write_build(
        &self,
        catalog: &Catalog,
        state: &BuildState,
        rejected: &[String],
        out: &mut impl Write,
    ) -> Result<()> {
        let summary = BuildSummary::new(state, catalog);
        let share_code = codec::encode_state(state, catalog).context("failed to encode build")?;
        let progress: Vec<_> = analysis::profession_progress(state, catalog)
            .into_iter()
            .filter(|entry| entry.is_started())
            .collect();

        if self.json {
            return write_json(
                out,
                &json!({
                    "summary": summary,
                    "selected": state.selected_skill_boxes(),
                    "commands": state.commands(),
                    "certifications": state.certifications(),
                    "modifiers": state.modifiers(),
                    "progress": progress,
                    "rejected": rejected,
                    "shareCode": share_code,
                }),
            );
        }

        for line in rejected {
            writeln!(out, "! skipped {line}")?;
        }
        writeln!(
            out,
            "{} {} | {}/{} points ({}%), {} boxes, {} commands, {} certifications, {} xp",
            summary.species_name,
            summary.profession_name,
            summary.used_points,
            summary.max_points,
            summary.percent_used,
            summary.skill_box_count,
            summary.command_count,
            summary.certification_count,
            summary.experience
        )?;

        for entry in &progress {
            let marker = if entry.has_master { " (master)" } else { "" };
            writeln!(
                out,
                "  {:<24} {:>2}/{:<2}{marker}",
                entry.name, entry.selected, entry.total
            )?;
        }

        for (category, modifiers) in analysis::categorize_modifiers(state.modifiers()) {
            writeln!(out, "{}:", category.label())?;
            for (name, value) in analysis::sorted_modifiers(&modifiers) {
                writeln!(
                    out,
                    "  {:<28} {:>5}",
                    analysis::format_modifier_name(name),
                    analysis::format_modifier_value(value)
                )?;
            }
        }

        writeln!(out, "Share code: {share_code}")?;
        Ok(())
    }

    fn write_template_result(&self, out: &mut impl Write, verb: &str, template: &Template) -> Result<()> {
        if self.json {
            return write_json(out, template);
        }
        writeln!(out, "{verb} {} ({})", template.id, template.name)?;
        Ok(())
    }
}

fn box_name(catalog: &Catalog, id: &str) -> String {
    catalog
        .find_skill_box(id)
        .map(|skill_box| skill_box.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn write_box_line(out: &mut impl Write, skill_box: &swgplan_core::SkillBox) -> Result<()> {
    writeln!(
        out,
        "{:<28} {:<40} {:>2} pts {:>6} xp",
        skill_box.id, skill_box.name, skill_box.skill_points, skill_box.xp_cost
    )?;
    Ok(())
}

fn write_list(out: &mut impl Write, heading: &str, items: &[String]) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "{heading}:")?;
    for item in items {
        writeln!(out, "  - {item}")?;
    }
    Ok(())
}

fn write_report(out: &mut impl Write, report: &LoadReport) -> Result<()> {
    if !report.unknown_boxes.is_empty() {
        writeln!(out, "Unknown boxes: {}", report.unknown_boxes.join(", "))?;
    }
    if !report.missing_prerequisites.is_empty() {
        let missing: Vec<_> = report.missing_prerequisites.iter().cloned().collect();
        writeln!(out, "Missing prerequisites: {}", missing.join(", "))?;
    }
    if report.points_mismatch() {
        writeln!(
            out,
            "Point total corrected from {} to {}",
            report.supplied_points, report.recomputed_points
        )?;
    }
    Ok(())
}

fn report_json(report: &LoadReport) -> Value {
    json!({
        "unknownBoxes": report.unknown_boxes,
        "missingPrerequisites": report.missing_prerequisites,
        "suppliedPoints": report.supplied_points,
        "recomputedPoints": report.recomputed_points,
    })
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
