//! End-to-end basal program encoding and status snapshots.
//!
//! Bundles the individual steps the transport layer needs:
//! - schedule -> slot tables -> long and short elements
//! - slot table + element list + time of day -> status snapshot + checksum

use crate::checksum::create_checksum;
use crate::current::{calculate_current_long_element, calculate_current_slot};
use crate::long_program::map_tenth_pulses_per_slot_to_long_elements;
use crate::quantize::{
    map_basal_program_to_pulses_per_slot, map_basal_program_to_tenth_pulses_per_slot,
};
use crate::short_program::map_pulses_per_slot_to_short_elements;
use crate::types::serialize_slot_table;
use crate::{
    BasalProgram, CurrentLongInsulinProgramElement, CurrentSlot, LongInsulinProgramElement,
    Result, ShortInsulinProgramElement, SlotTable,
};
use chrono::Timelike;
use serde::Serialize;

/// Every on-device representation of one basal program
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EncodedBasalProgram {
    #[serde(serialize_with = "serialize_slot_table")]
    pub tenth_pulses_per_slot: SlotTable,
    #[serde(serialize_with = "serialize_slot_table")]
    pub pulses_per_slot: SlotTable,
    pub long_elements: Vec<LongInsulinProgramElement>,
    pub short_elements: Vec<ShortInsulinProgramElement>,
}

/// Delivery position and checksum at one instant
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub current_slot: CurrentSlot,
    pub current_long_element: CurrentLongInsulinProgramElement,
    pub checksum: u16,
}

/// Quantize a program and encode both element lists
pub fn encode_program(program: &BasalProgram) -> Result<EncodedBasalProgram> {
    let tenth_pulses_per_slot = map_basal_program_to_tenth_pulses_per_slot(program);
    let pulses_per_slot = map_basal_program_to_pulses_per_slot(program);

    let long_elements = map_tenth_pulses_per_slot_to_long_elements(&tenth_pulses_per_slot)?;
    let short_elements = map_pulses_per_slot_to_short_elements(&pulses_per_slot)?;

    tracing::info!(
        "Encoded basal program: {} segments, {} long elements, {} short elements",
        program.segments().len(),
        long_elements.len(),
        short_elements.len()
    );

    Ok(EncodedBasalProgram {
        tenth_pulses_per_slot,
        pulses_per_slot,
        long_elements,
        short_elements,
    })
}

/// Compute the status snapshot used to resume or verify delivery
pub fn status_snapshot<T: Timelike>(
    pulses_per_slot: &[u16],
    long_elements: &[LongInsulinProgramElement],
    time: &T,
) -> Result<StatusSnapshot> {
    let current_slot = calculate_current_slot(pulses_per_slot, time)?;
    let current_long_element = calculate_current_long_element(long_elements, time)?;
    let checksum = create_checksum(pulses_per_slot, &current_slot)?;

    Ok(StatusSnapshot {
        current_slot,
        current_long_element,
        checksum,
    })
}

impl EncodedBasalProgram {
    /// Status snapshot of this program at the given time of day
    pub fn status_at<T: Timelike>(&self, time: &T) -> Result<StatusSnapshot> {
        status_snapshot(&self.pulses_per_slot, &self.long_elements, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test;
    use crate::long_program::expand_long_elements;
    use crate::short_program::expand_short_elements;
    use crate::{Segment, MAX_PULSES_PER_HOUR, MAX_TENTH_PULSES_PER_LONG_ELEMENT};
    use chrono::NaiveTime;

    /// Representative schedules: flat, odd, zero, many segments, huge rates
    fn sample_programs() -> Vec<BasalProgram> {
        let mut programs: Vec<BasalProgram> = [0u16, 1, 2, 3, 7, 20, 41, MAX_PULSES_PER_HOUR]
            .into_iter()
            .map(BasalProgram::flat)
            .collect();

        programs.push(
            BasalProgram::new(vec![
                Segment::new(0, 1, 3),
                Segment::new(1, 2, 3),
                Segment::new(2, 9, 5),
                Segment::new(9, 10, 0),
                Segment::new(10, 27, 9),
                Segment::new(27, 28, 10),
                Segment::new(28, 48, 11),
            ])
            .unwrap(),
        );

        // One segment per slot with a sawtooth of rates
        programs.push(
            BasalProgram::new(
                (0..48u8)
                    .map(|i| Segment::new(i, i + 1, u16::from(i % 5) * 3))
                    .collect(),
            )
            .unwrap(),
        );

        programs.push(
            BasalProgram::new(vec![
                Segment::new(0, 16, 1),
                Segment::new(16, 33, 1),
                Segment::new(33, 48, 4_000),
            ])
            .unwrap(),
        );

        programs
    }

    #[test]
    fn test_encodings_expand_back_to_slot_tables() {
        init_test();

        for program in sample_programs() {
            let encoded = encode_program(&program).unwrap();

            assert_eq!(
                expand_long_elements(&encoded.long_elements).unwrap(),
                encoded.tenth_pulses_per_slot,
                "long encoding of {:?}",
                program
            );
            assert_eq!(
                expand_short_elements(&encoded.short_elements).unwrap(),
                encoded.pulses_per_slot,
                "short encoding of {:?}",
                program
            );
        }
    }

    #[test]
    fn test_element_bounds_and_slot_totals() {
        for program in sample_programs() {
            let encoded = encode_program(&program).unwrap();

            let long_slots: u32 = encoded
                .long_elements
                .iter()
                .map(|e| u32::from(e.number_of_slots))
                .sum();
            let short_slots: u32 = encoded
                .short_elements
                .iter()
                .map(|e| u32::from(e.number_of_slots))
                .sum();
            assert_eq!(long_slots, 48);
            assert_eq!(short_slots, 48);

            assert!(encoded
                .short_elements
                .iter()
                .all(|e| (1..=16).contains(&e.number_of_slots)));
            assert!(encoded
                .long_elements
                .iter()
                .all(|e| u32::from(e.total_tenth_pulses) <= MAX_TENTH_PULSES_PER_LONG_ELEMENT));
        }
    }

    #[test]
    fn test_fastest_valid_rate_fits_long_elements() {
        let program =
            BasalProgram::new(vec![Segment::new(0, 48, MAX_PULSES_PER_HOUR)]).unwrap();

        let encoded = encode_program(&program).unwrap();

        assert_eq!(encoded.long_elements.len(), 24);
        for element in &encoded.long_elements {
            assert_eq!(element.number_of_slots, 2);
            assert_eq!(element.total_tenth_pulses, 65_530);
        }
    }

    #[test]
    fn test_flat_two_pulses_per_hour() {
        let encoded = encode_program(&BasalProgram::flat(2)).unwrap();

        assert!(encoded.pulses_per_slot.iter().all(|&v| v == 1));
        assert_eq!(encoded.short_elements.len(), 3);
        for element in &encoded.short_elements {
            assert_eq!(element.number_of_slots, 16);
            assert_eq!(element.pulses_per_slot, 1);
            assert!(!element.has_extra_alternate_pulse);
        }
    }

    #[test]
    fn test_flat_one_pulse_per_hour_alternates() {
        let encoded = encode_program(&BasalProgram::flat(1)).unwrap();

        assert_eq!(&encoded.pulses_per_slot[..4], &[0, 1, 0, 1]);
        assert!(encoded
            .short_elements
            .iter()
            .all(|e| e.has_extra_alternate_pulse && e.pulses_per_slot == 0));
        assert_eq!(encoded.long_elements.len(), 1);
        assert_eq!(encoded.long_elements[0].total_tenth_pulses, 240);
    }

    #[test]
    fn test_status_at_midnight() {
        let program =
            BasalProgram::new(vec![Segment::new(0, 24, 6), Segment::new(24, 48, 2)]).unwrap();
        let encoded = encode_program(&program).unwrap();
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();

        let status = encoded.status_at(&midnight).unwrap();

        assert_eq!(status.current_slot.index, 0);
        assert_eq!(status.current_slot.eighth_seconds_remaining, 14_400);
        assert_eq!(status.current_slot.pulses_remaining, 3);
        assert_eq!(status.current_long_element.element_index, 0);
        assert_eq!(status.current_long_element.remaining_tenth_pulses, 720);
        assert_eq!(
            status.checksum,
            create_checksum(&encoded.pulses_per_slot, &status.current_slot).unwrap()
        );
    }

    #[test]
    fn test_status_is_defined_for_every_slot() {
        for program in sample_programs() {
            let encoded = encode_program(&program).unwrap();
            for k in 0..48u32 {
                let second = k * 1_800 + 901;
                let time = NaiveTime::from_num_seconds_from_midnight_opt(second, 0).unwrap();
                let status = encoded.status_at(&time).unwrap();
                assert_eq!(u32::from(status.current_slot.index), k);
                assert!(status.current_long_element.microseconds_until_next_pulse > 0);
            }
        }
    }
}
