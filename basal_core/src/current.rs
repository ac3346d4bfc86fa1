//! Live delivery position for resuming or verifying a basal program.
//!
//! The pump counts time in whole seconds from midnight, split into 48 slots
//! of 1800 s. Given a time of day this module works out:
//! - the active slot of the whole-pulse table and what is left of it
//! - the active long element, its remaining tenth pulses and the countdown to
//!   the next tenth pulse

use crate::types::ensure_full_day;
use crate::{
    CurrentLongInsulinProgramElement, CurrentSlot, Error, LongInsulinProgramElement, Result,
    NUMBER_OF_BASAL_SLOTS, SECONDS_PER_SLOT,
};
use chrono::Timelike;

const MICROSECONDS_PER_SECOND: i64 = 1_000_000;

/// Tenth pulses are tracked in ten-thousandths while interpolating
const TEN_THOUSANDTHS_PER_TENTH: i64 = 1_000;

/// Whole seconds since midnight
pub fn second_of_day<T: Timelike>(time: &T) -> u32 {
    time.hour() * 3_600 + time.minute() * 60 + time.second()
}

/// Locate the active slot in the whole-pulse table
///
/// `pulses_remaining` is floored: pulses left in the slot are prorated by the
/// seconds remaining and any fraction is dropped.
pub fn calculate_current_slot<T: Timelike>(
    pulses_per_slot: &[u16],
    time: &T,
) -> Result<CurrentSlot> {
    ensure_full_day(pulses_per_slot)?;

    let second_of_day = second_of_day(time);
    let index = (second_of_day / SECONDS_PER_SLOT) as usize;
    if index >= NUMBER_OF_BASAL_SLOTS {
        return Err(Error::InvalidInput(format!(
            "second of day {} is outside the 48-slot day",
            second_of_day
        )));
    }

    let seconds_remaining = (index as u32 + 1) * SECONDS_PER_SLOT - second_of_day;
    let pulses_remaining =
        u32::from(pulses_per_slot[index]) * seconds_remaining / SECONDS_PER_SLOT;

    let current = CurrentSlot {
        index: index as u8,
        eighth_seconds_remaining: (seconds_remaining * 8) as i16,
        pulses_remaining: pulses_remaining as i16,
    };

    tracing::debug!("Current slot: {:?}", current);
    Ok(current)
}

/// Locate the active long element and its delivery phase
pub fn calculate_current_long_element<T: Timelike>(
    elements: &[LongInsulinProgramElement],
    time: &T,
) -> Result<CurrentLongInsulinProgramElement> {
    let second_of_day = i64::from(second_of_day(time));
    let slot_seconds = i64::from(SECONDS_PER_SLOT);
    let mut start_slot_index: i64 = 0;

    for (index, element) in elements.iter().enumerate() {
        let start_time = start_slot_index * slot_seconds;
        let end_time = start_time + i64::from(element.number_of_slots) * slot_seconds;
        start_slot_index += i64::from(element.number_of_slots);

        if second_of_day < start_time || second_of_day >= end_time {
            continue;
        }

        let mut total_ten_thousandths =
            i64::from(element.total_tenth_pulses) * TEN_THOUSANDTHS_PER_TENTH;
        if total_ten_thousandths == 0 {
            total_ten_thousandths = i64::from(element.number_of_slots) * TEN_THOUSANDTHS_PER_TENTH;
        }

        let duration = end_time - start_time;
        let elapsed = second_of_day - start_time;
        let remaining_ten_thousandths = (duration - elapsed) * total_ten_thousandths / duration;

        let delay = (duration * MICROSECONDS_PER_SECOND * TEN_THOUSANDTHS_PER_TENTH
            / total_ten_thousandths) as i32;
        if delay <= 0 {
            tracing::error!("Long element {} has no usable pulse interval ({})", index, delay);
            return Err(Error::InternalInconsistency(format!(
                "long element {} has non-positive pulse interval {}",
                index, delay
            )));
        }

        let elapsed_in_slot = (elapsed % slot_seconds) as u32;
        let current = CurrentLongInsulinProgramElement {
            element_index: index as u8,
            microseconds_until_next_pulse: fast_forward_countdown(delay, elapsed_in_slot),
            remaining_tenth_pulses: ceil_div(remaining_ten_thousandths, TEN_THOUSANDTHS_PER_TENTH)
                as i16,
        };

        tracing::debug!("Current long element: {:?}", current);
        return Ok(current);
    }

    tracing::error!(
        "No long element covers second {} of the day ({} elements)",
        second_of_day,
        elements.len()
    );
    Err(Error::InternalInconsistency(
        "could not determine current long insulin program element".into(),
    ))
}

/// Run the pump's once-per-second countdown for `seconds` ticks
///
/// Each tick takes one second off the countdown; whenever it reaches zero or
/// below the next interval is added on. `delay` must be positive.
fn fast_forward_countdown(delay: i32, seconds: u32) -> i32 {
    let mut countdown = delay;
    for _ in 0..seconds {
        countdown = countdown.wrapping_sub(MICROSECONDS_PER_SECOND as i32);
        while countdown <= 0 {
            countdown += delay;
        }
    }
    countdown
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    numerator / denominator + i64::from(numerator % denominator != 0)
}
