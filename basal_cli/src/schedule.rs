//! Schedule file loading.
//!
//! A schedule file is TOML with one `[[segments]]` table per rate segment:
//!
//! ```toml
//! [[segments]]
//! start_slot_index = 0
//! end_slot_index = 48
//! pulses_per_hour = 20
//! ```

use crate::error::Result;
use basal_core::BasalProgram;
use std::path::Path;

/// Load and validate a basal program from a TOML file
pub fn load_schedule(path: &Path) -> Result<BasalProgram> {
    let contents = std::fs::read_to_string(path)?;
    let program: BasalProgram = toml::from_str(&contents)?;
    tracing::debug!(
        "Loaded schedule with {} segments from {:?}",
        program.segments().len(),
        path
    );
    Ok(program)
}
