//! Build state and the resolution engine that mutates it.

mod engine;
mod state;

pub use engine::{Change, LoadReport, Planner};
pub use state::BuildState;

/// Size of the skill point pool shared by every build.
pub const MAX_SKILL_POINTS: u32 = 250;
