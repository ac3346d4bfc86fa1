//! Core domain types for basal program encoding.
//!
//! This module defines the value records exchanged with the transport layer:
//! - The caller-supplied basal schedule (segments over 48 half-hour slots)
//! - Slot tables in tenth-pulse and whole-pulse precision
//! - Long and short insulin program elements
//! - Point-in-time delivery snapshots

use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};

// ============================================================================
// Day Model
// ============================================================================

/// Number of 30-minute slots in a day
pub const NUMBER_OF_BASAL_SLOTS: usize = 48;

/// Upper bound on slots covered by one short program element
pub const MAX_SLOTS_PER_SHORT_ELEMENT: u8 = 16;

/// Largest tenth-pulse total a long program element may carry
pub const MAX_TENTH_PULSES_PER_LONG_ELEMENT: u32 = 65_534;

/// Highest hourly rate a segment may carry
///
/// Keeps tenth pulses per slot (rate * 5) inside a signed 16-bit value, so a
/// single slot always fits one long program element.
pub const MAX_PULSES_PER_HOUR: u16 = 6_553;

/// Duration of one slot in seconds
pub const SECONDS_PER_SLOT: u32 = 1_800;

/// Duration of one slot in microseconds
pub const MICROSECONDS_PER_SLOT: u64 = 1_800_000_000;

/// One pulse count per half-hour slot of the day
pub type SlotTable = [u16; NUMBER_OF_BASAL_SLOTS];

/// Check that a borrowed table describes exactly one day of slots
pub(crate) fn ensure_full_day(table: &[u16]) -> Result<()> {
    if table.len() != NUMBER_OF_BASAL_SLOTS {
        return Err(Error::InvalidInput(format!(
            "Basal program must contain {} slots, got {}",
            NUMBER_OF_BASAL_SLOTS,
            table.len()
        )));
    }
    Ok(())
}

/// Serialize a slot table as a plain sequence (serde stops at 32-element arrays)
pub(crate) fn serialize_slot_table<S: Serializer>(
    table: &SlotTable,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(table.iter())
}

// ============================================================================
// Schedule Types
// ============================================================================

/// A contiguous range of slots sharing one delivery rate
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// First slot covered (inclusive)
    pub start_slot_index: u8,
    /// Slot after the last one covered (exclusive)
    pub end_slot_index: u8,
    /// Delivery rate in pulses per hour
    pub pulses_per_hour: u16,
}

impl Segment {
    pub fn new(start_slot_index: u8, end_slot_index: u8, pulses_per_hour: u16) -> Self {
        Self {
            start_slot_index,
            end_slot_index,
            pulses_per_hour,
        }
    }

    /// Slot indices covered by this segment
    pub fn slots(&self) -> std::ops::Range<usize> {
        let start = usize::from(self.start_slot_index).min(NUMBER_OF_BASAL_SLOTS);
        let end = usize::from(self.end_slot_index).min(NUMBER_OF_BASAL_SLOTS);
        start..end.max(start)
    }
}

/// A 24-hour basal rate curve
///
/// Deserialized programs go through the same validation as [`BasalProgram::new`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "BasalProgramFile")]
pub struct BasalProgram {
    segments: Vec<Segment>,
}

/// Unvalidated on-disk shape of a basal program
#[derive(Debug, Deserialize)]
struct BasalProgramFile {
    segments: Vec<Segment>,
}

impl TryFrom<BasalProgramFile> for BasalProgram {
    type Error = Error;

    fn try_from(file: BasalProgramFile) -> Result<Self> {
        BasalProgram::new(file.segments)
    }
}

impl BasalProgram {
    /// Build a program, checking that the segments tile slots `[0, 48)` in order
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        let mut expected_start = 0usize;

        for (i, segment) in segments.iter().enumerate() {
            let start = usize::from(segment.start_slot_index);
            let end = usize::from(segment.end_slot_index);

            if start != expected_start {
                return Err(Error::InvalidProgram(format!(
                    "segment {} starts at slot {}, expected {}",
                    i, start, expected_start
                )));
            }
            if end <= start {
                return Err(Error::InvalidProgram(format!(
                    "segment {} is empty ({}..{})",
                    i, start, end
                )));
            }
            if end > NUMBER_OF_BASAL_SLOTS {
                return Err(Error::InvalidProgram(format!(
                    "segment {} ends at slot {}, past the end of the day",
                    i, end
                )));
            }
            if segment.pulses_per_hour > MAX_PULSES_PER_HOUR {
                return Err(Error::InvalidProgram(format!(
                    "segment {} rate {} exceeds {} pulses per hour",
                    i, segment.pulses_per_hour, MAX_PULSES_PER_HOUR
                )));
            }

            expected_start = end;
        }

        if expected_start != NUMBER_OF_BASAL_SLOTS {
            return Err(Error::InvalidProgram(format!(
                "segments cover {} of {} slots",
                expected_start, NUMBER_OF_BASAL_SLOTS
            )));
        }

        Ok(Self { segments })
    }

    /// Build a program from segments the caller has already validated
    pub fn new_unchecked(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A single segment covering the whole day
    ///
    /// Like [`BasalProgram::new_unchecked`], the rate is not checked against
    /// [`MAX_PULSES_PER_HOUR`].
    pub fn flat(pulses_per_hour: u16) -> Self {
        Self {
            segments: vec![Segment::new(0, NUMBER_OF_BASAL_SLOTS as u8, pulses_per_hour)],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

// ============================================================================
// Program Elements
// ============================================================================

/// A run of slots with identical tenth-pulse rate, as delivered by the long program
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LongInsulinProgramElement {
    pub start_slot_index: u8,
    pub number_of_slots: u8,
    pub total_tenth_pulses: u16,
    pub interval_microseconds: u32,
}

/// A run of at most 16 slots in whole pulses, optionally alternating base / base + 1
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortInsulinProgramElement {
    pub number_of_slots: u8,
    pub pulses_per_slot: u16,
    pub has_extra_alternate_pulse: bool,
}

impl ShortInsulinProgramElement {
    /// Pulses delivered in the `offset`-th slot of this element
    pub fn pulses_at(&self, offset: usize) -> u16 {
        if self.has_extra_alternate_pulse && offset % 2 == 1 {
            self.pulses_per_slot.wrapping_add(1)
        } else {
            self.pulses_per_slot
        }
    }
}

// ============================================================================
// Delivery Snapshots
// ============================================================================

/// Position within the whole-pulse table at a given time of day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentSlot {
    pub index: u8,
    /// Time left in the slot, in pump clock ticks of 1/8 s
    pub eighth_seconds_remaining: i16,
    pub pulses_remaining: i16,
}

/// Position within a long element list at a given time of day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentLongInsulinProgramElement {
    pub element_index: u8,
    pub microseconds_until_next_pulse: i32,
    pub remaining_tenth_pulses: i16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_program_is_valid() {
        let flat = BasalProgram::flat(20);
        let checked = BasalProgram::new(flat.segments().to_vec()).unwrap();
        assert_eq!(checked, flat);
    }

    #[test]
    fn test_program_rejects_gap() {
        let err = BasalProgram::new(vec![Segment::new(0, 10, 4), Segment::new(12, 48, 4)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProgram(_)));
    }

    #[test]
    fn test_program_rejects_short_day() {
        let err = BasalProgram::new(vec![Segment::new(0, 47, 4)]).unwrap_err();
        assert!(matches!(err, Error::InvalidProgram(_)));
    }

    #[test]
    fn test_program_rejects_overrun_and_empty_segments() {
        assert!(BasalProgram::new(vec![Segment::new(0, 49, 4)]).is_err());
        assert!(
            BasalProgram::new(vec![Segment::new(0, 0, 4), Segment::new(0, 48, 4)]).is_err()
        );
        assert!(BasalProgram::new(vec![]).is_err());
    }

    #[test]
    fn test_program_rejects_rate_above_ceiling() {
        let at_ceiling = BasalProgram::new(vec![Segment::new(0, 48, MAX_PULSES_PER_HOUR)]);
        assert!(at_ceiling.is_ok());

        for rate in [MAX_PULSES_PER_HOUR + 1, 13_107, u16::MAX] {
            let err = BasalProgram::new(vec![Segment::new(0, 48, rate)]).unwrap_err();
            assert!(matches!(err, Error::InvalidProgram(_)), "rate {}", rate);
        }
    }

    #[test]
    fn test_segment_deserializes_from_json() {
        let json = r#"{"start_slot_index":0,"end_slot_index":48,"pulses_per_hour":3}"#;
        let segment: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(segment, Segment::new(0, 48, 3));
        assert_eq!(segment.slots(), 0..48);
    }

    #[test]
    fn test_program_deserialization_validates() {
        let json = r#"{"segments":[{"start_slot_index":0,"end_slot_index":48,"pulses_per_hour":5}]}"#;
        let program: BasalProgram = serde_json::from_str(json).unwrap();
        assert_eq!(program, BasalProgram::flat(5));

        let gap = r#"{"segments":[{"start_slot_index":2,"end_slot_index":48,"pulses_per_hour":5}]}"#;
        assert!(serde_json::from_str::<BasalProgram>(gap).is_err());
    }

    #[test]
    fn test_short_element_alternates_from_base() {
        let element = ShortInsulinProgramElement {
            number_of_slots: 4,
            pulses_per_slot: 2,
            has_extra_alternate_pulse: true,
        };
        let pulses: Vec<u16> = (0..4).map(|i| element.pulses_at(i)).collect();
        assert_eq!(pulses, vec![2, 3, 2, 3]);
    }

    #[test]
    fn test_ensure_full_day() {
        assert!(ensure_full_day(&[0u16; 48]).is_ok());
        assert!(matches!(
            ensure_full_day(&[0u16; 47]),
            Err(Error::InvalidInput(_))
        ));
    }
}
