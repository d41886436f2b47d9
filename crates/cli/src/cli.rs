//! Command-line definitions for the `swgplan` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Plan Star Wars Galaxies character builds from the terminal.
#[derive(Debug, Parser)]
#[command(name = "swgplan", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Catalog document to use instead of the configured one.
    #[arg(long, global = true, env = "SWGPLAN_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List professions.
    #[command(alias = "ls")]
    Professions {
        /// Only show one category (basic, elite, force, jedi, pilot).
        #[arg(long, short)]
        category: Option<String>,

        /// Case-insensitive match on id or name.
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Show a profession's trees and boxes.
    Show {
        /// Profession id.
        profession: String,
    },

    /// Toggle boxes in order and print the resulting build.
    Plan {
        /// Species id (defaults to the configured species).
        #[arg(long)]
        species: Option<String>,

        /// Viewed profession id (defaults to the configured profession).
        #[arg(long)]
        profession: Option<String>,

        /// Skill box ids; a box already selected is toggled off.
        boxes: Vec<String>,
    },

    /// Decode a share code.
    Decode {
        /// Share code, with or without the SWG-BUILD- tag.
        code: String,
    },

    /// Manage saved templates.
    Templates {
        #[command(subcommand)]
        action: TemplateCommand,
    },

    /// List recommended builds.
    Presets {
        /// Only show one category (tank, dps, crafter, support, hybrid, entertainer).
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Apply a recommended build and print it.
    Preset {
        /// Preset id.
        id: String,

        /// Species id (defaults to the configured species).
        #[arg(long)]
        species: Option<String>,
    },
}

/// Template subcommands.
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List saved templates, newest first.
    #[command(alias = "ls")]
    List,

    /// Save the build behind a share code under a name.
    Save {
        /// Template name.
        name: String,

        /// Share code of the build.
        code: String,
    },

    /// Delete a template.
    #[command(alias = "rm")]
    Delete {
        /// Template id.
        id: String,
    },

    /// Store a share code as an imported template.
    Import {
        /// Share code of the build.
        code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_plan_with_globals() {
        let cli = Cli::try_parse_from([
            "swgplan",
            "plan",
            "--species",
            "wookiee",
            "brawler_unarmed_1",
            "brawler_unarmed_4",
            "--json",
            "-vv",
        ])
        .expect("plan should parse");
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Plan {
                species, boxes, ..
            } => {
                assert_eq!(species.as_deref(), Some("wookiee"));
                assert_eq!(boxes, ["brawler_unarmed_1", "brawler_unarmed_4"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_template_subcommands() {
        let cli = Cli::try_parse_from(["swgplan", "templates", "rm", "template_1"])
            .expect("delete should parse");
        assert!(matches!(
            cli.command,
            Command::Templates {
                action: TemplateCommand::Delete { ref id }
            } if id == "template_1"
        ));
    }
}
