//! Short insulin program encoding.
//!
//! Compresses the whole-pulse slot table into short program elements of at
//! most 16 slots. Odd hourly rates show up in the table as a repeating
//! `base, base + 1` pattern; those runs are folded into a single element with
//! the extra-alternate-pulse flag set instead of one element per slot.
//!
//! The encoder is an explicit state machine. [`ShortProgramEncoder::advance`]
//! consumes one slot and yields at most one finished element.

use crate::types::ensure_full_day;
use crate::{
    Error, Result, ShortInsulinProgramElement, SlotTable, MAX_SLOTS_PER_SHORT_ELEMENT,
    NUMBER_OF_BASAL_SLOTS,
};

/// What kind of run the encoder is currently accumulating
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunMode {
    /// Identical pulse counts
    Run,
    /// Strict `base, base + 1, base, ...` alternation
    Alternate,
}

/// The run currently being accumulated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenRun {
    mode: RunMode,
    length: u8,
    base: u16,
    /// Next slot must be `base + 1` (alternate runs only)
    expect_high: bool,
}

impl OpenRun {
    fn start(value: u16) -> Self {
        Self {
            mode: RunMode::Run,
            length: 1,
            base: value,
            expect_high: false,
        }
    }

    fn close(self) -> ShortInsulinProgramElement {
        ShortInsulinProgramElement {
            number_of_slots: self.length,
            pulses_per_slot: self.base,
            has_extra_alternate_pulse: self.mode == RunMode::Alternate,
        }
    }
}

/// Slot-by-slot short program state machine
#[derive(Clone, Debug, Default)]
pub struct ShortProgramEncoder {
    open: Option<OpenRun>,
}

impl ShortProgramEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next slot value, returning an element if a run closed
    pub fn advance(&mut self, value: u16) -> Option<ShortInsulinProgramElement> {
        let Some(run) = self.open else {
            self.open = Some(OpenRun::start(value));
            return None;
        };

        let (emitted, next) = match run.mode {
            RunMode::Run => Self::advance_run(run, value),
            RunMode::Alternate => Self::advance_alternate(run, value),
        };
        self.open = Some(next);
        emitted
    }

    fn advance_run(run: OpenRun, value: u16) -> (Option<ShortInsulinProgramElement>, OpenRun) {
        if value == run.base {
            if run.length < MAX_SLOTS_PER_SHORT_ELEMENT {
                (None, OpenRun { length: run.length + 1, ..run })
            } else {
                (Some(run.close()), OpenRun::start(value))
            }
        } else if run.length == 1 && run.base.checked_add(1) == Some(value) {
            (
                None,
                OpenRun {
                    mode: RunMode::Alternate,
                    length: 2,
                    base: run.base,
                    expect_high: false,
                },
            )
        } else {
            (Some(run.close()), OpenRun::start(value))
        }
    }

    fn advance_alternate(
        run: OpenRun,
        value: u16,
    ) -> (Option<ShortInsulinProgramElement>, OpenRun) {
        let expected = if run.expect_high { run.base + 1 } else { run.base };

        if value != expected {
            return (Some(run.close()), OpenRun::start(value));
        }
        if run.length >= MAX_SLOTS_PER_SHORT_ELEMENT {
            return (Some(run.close()), OpenRun::start(value));
        }
        (
            None,
            OpenRun {
                length: run.length + 1,
                expect_high: !run.expect_high,
                ..run
            },
        )
    }

    /// Close the trailing run
    pub fn finish(self) -> Result<ShortInsulinProgramElement> {
        self.open.map(OpenRun::close).ok_or_else(|| {
            Error::InternalInconsistency("short program encoder finished without slots".into())
        })
    }
}

/// Map whole pulses per slot to short insulin program elements
pub fn map_pulses_per_slot_to_short_elements(
    pulses_per_slot: &[u16],
) -> Result<Vec<ShortInsulinProgramElement>> {
    ensure_full_day(pulses_per_slot)?;

    let mut encoder = ShortProgramEncoder::new();
    let mut elements = Vec::new();

    for &value in pulses_per_slot {
        if let Some(element) = encoder.advance(value) {
            elements.push(element);
        }
    }
    elements.push(encoder.finish()?);

    tracing::debug!("Encoded {} short insulin program elements", elements.len());
    Ok(elements)
}

/// Rebuild the whole-pulse slot table described by a list of short elements
pub fn expand_short_elements(elements: &[ShortInsulinProgramElement]) -> Result<SlotTable> {
    let mut table = [0u16; NUMBER_OF_BASAL_SLOTS];
    let mut slot = 0usize;

    for element in elements {
        let slots = usize::from(element.number_of_slots);
        if slots == 0 || slot + slots > NUMBER_OF_BASAL_SLOTS {
            return Err(Error::InvalidInput(format!(
                "Short elements overrun the day at slot {}",
                slot
            )));
        }

        for offset in 0..slots {
            table[slot + offset] = element.pulses_at(offset);
        }
        slot += slots;
    }

    if slot != NUMBER_OF_BASAL_SLOTS {
        return Err(Error::InvalidInput(format!(
            "Short elements cover {} of {} slots",
            slot, NUMBER_OF_BASAL_SLOTS
        )));
    }
    Ok(table)
}
