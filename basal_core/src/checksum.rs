//! Additive checksum over a delivery status snapshot.
//!
//! Byte layout summed by the pump: slot index (1 byte), pulses remaining and
//! eighth seconds remaining (2 bytes each, big-endian), then every whole-pulse
//! slot value (2 bytes each, big-endian). The sum wraps at 16 bits.

use crate::types::ensure_full_day;
use crate::{CurrentSlot, Result, NUMBER_OF_BASAL_SLOTS};

/// Serialize the checksummed bytes in pump order
pub fn checksum_bytes(pulses_per_slot: &[u16], current_slot: &CurrentSlot) -> Result<Vec<u8>> {
    ensure_full_day(pulses_per_slot)?;

    let mut bytes = Vec::with_capacity(1 + 2 + 2 + NUMBER_OF_BASAL_SLOTS * 2);
    bytes.push(current_slot.index);
    bytes.extend_from_slice(&current_slot.pulses_remaining.to_be_bytes());
    bytes.extend_from_slice(&current_slot.eighth_seconds_remaining.to_be_bytes());
    for pulses in pulses_per_slot {
        bytes.extend_from_slice(&pulses.to_be_bytes());
    }
    Ok(bytes)
}

/// Sum of all status bytes as unsigned values, wrapping at 16 bits
pub fn create_checksum(pulses_per_slot: &[u16], current_slot: &CurrentSlot) -> Result<u16> {
    let checksum = checksum_bytes(pulses_per_slot, current_slot)?
        .into_iter()
        .fold(0u16, |sum, byte| sum.wrapping_add(u16::from(byte)));

    tracing::debug!("Status checksum: {:#06x}", checksum);
    Ok(checksum)
}
