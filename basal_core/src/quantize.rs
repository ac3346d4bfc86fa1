//! Slot quantization of a basal program.
//!
//! Maps each segment of a [`BasalProgram`] onto the 48 half-hour slots of the
//! day, in two independent fixed-point encodings:
//! - tenth pulses per slot, rounded down to half a pulse (long programs)
//! - whole pulses per slot, with odd hourly rates spread as an alternating
//!   extra pulse (short programs)

use crate::{BasalProgram, SlotTable, MAX_PULSES_PER_HOUR, NUMBER_OF_BASAL_SLOTS};

/// Tenth pulses delivered per slot at the given hourly rate
///
/// Half of the hourly rate is delivered per slot, kept to one decimal and
/// floored to a multiple of 0.5 pulse. Rates up to [`MAX_PULSES_PER_HOUR`]
/// stay below the long element limit; higher rates saturate at `u16::MAX`.
pub fn tenth_pulses_per_slot(pulses_per_hour: u16) -> u16 {
    let tenths = u32::from(pulses_per_hour) * 10 / 2;
    let floored = tenths / 5 * 5;
    u16::try_from(floored).unwrap_or(u16::MAX)
}

/// Map a basal program to tenth pulses per slot
pub fn map_basal_program_to_tenth_pulses_per_slot(program: &BasalProgram) -> SlotTable {
    let mut table = [0u16; NUMBER_OF_BASAL_SLOTS];

    for segment in program.segments() {
        let value = tenth_pulses_per_slot(segment.pulses_per_hour);
        for slot in &mut table[segment.slots()] {
            *slot = value;
        }
    }

    tracing::debug!("Mapped {} segments to tenth pulses per slot", program.segments().len());
    table
}

/// Map a basal program to whole pulses per slot
///
/// An odd hourly rate owes one extra pulse per pair of slots. Within each
/// segment the first slot goes without, the second gets it, and so on; the
/// pattern restarts at every segment boundary.
pub fn map_basal_program_to_pulses_per_slot(program: &BasalProgram) -> SlotTable {
    let mut table = [0u16; NUMBER_OF_BASAL_SLOTS];

    for segment in program.segments() {
        let base = segment.pulses_per_hour / 2;
        let odd = segment.pulses_per_hour % 2 == 1;

        for (offset, slot) in table[segment.slots()].iter_mut().enumerate() {
            *slot = if odd && offset % 2 == 1 { base + 1 } else { base };
        }
    }

    tracing::debug!("Mapped {} segments to pulses per slot", program.segments().len());
    table
}
