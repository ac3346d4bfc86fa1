#![forbid(unsafe_code)]

//! Basal program encoding for an insulin pump's on-device delivery engine.
//!
//! This crate provides:
//! - Domain types (schedules, slot tables, program elements, snapshots)
//! - Slot quantization in tenth-pulse and whole-pulse precision
//! - Long and short insulin program element encoders (and decoders)
//! - Current slot / current element calculation for resuming delivery
//! - The status checksum
//!
//! Everything here is a pure transformation; sending the results to a pump
//! is left to the transport layer.

pub mod types;
pub mod error;
pub mod logging;
pub mod quantize;
pub mod long_program;
pub mod short_program;
pub mod current;
pub mod checksum;
pub mod program;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use quantize::{
    map_basal_program_to_pulses_per_slot, map_basal_program_to_tenth_pulses_per_slot,
};
pub use long_program::{expand_long_elements, map_tenth_pulses_per_slot_to_long_elements};
pub use short_program::{
    expand_short_elements, map_pulses_per_slot_to_short_elements, ShortProgramEncoder,
};
pub use current::{calculate_current_long_element, calculate_current_slot};
pub use checksum::create_checksum;
pub use program::{encode_program, status_snapshot, EncodedBasalProgram, StatusSnapshot};
