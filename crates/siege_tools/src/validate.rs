//! Data validation utilities.

use std::path::Path;

use siege_core::data::{self, ARTIFACTS, ENEMIES, HEROES, RELICS, TURRETS};
use siege_core::events::validate_batch;
use tracing::{error, info};

use crate::scenario::Scenario;
use crate::{Result, ToolError};

/// Check the static definition tables and log every issue found.
///
/// # Errors
///
/// Returns [`ToolError::InvalidTables`] if any table check fails.
pub fn validate_tables() -> Result<()> {
    let issues = data::validate_tables();
    for issue in &issues {
        error!(%issue, "Table check failed");
    }
    if !issues.is_empty() {
        return Err(ToolError::InvalidTables(issues.len()));
    }

    info!(
        heroes = HEROES.len(),
        turrets = TURRETS.len(),
        enemies = ENEMIES.len(),
        relics = RELICS.len(),
        artifacts = ARTIFACTS.len(),
        "Data tables valid"
    );
    Ok(())
}

/// Load a scenario and check its config and event script without running
/// it.
///
/// # Errors
///
/// Returns the first load, config or event error.
pub fn validate_scenario(path: &Path) -> Result<Scenario> {
    let scenario = Scenario::load(path)?;
    scenario.config.validate()?;
    validate_batch(&scenario.events, 0, scenario.config.heroes.len())?;
    info!(
        name = %scenario.name,
        events = scenario.events.len(),
        "Scenario valid"
    );
    Ok(scenario)
}
