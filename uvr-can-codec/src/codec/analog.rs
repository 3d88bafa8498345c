//! Analog channel codec
//!
//! Analog channels are carried four per frame in eight banks. Channel `c`
//! lives in bank `(c-1)/4`, slot `(c-1)%4`, as a little-endian signed 16-bit
//! integer at bytes `2*slot` and `2*slot + 1`.
//!
//! Scaling is `physical = raw / divisor` on receive and `raw = physical *
//! divisor` on send, rounded half to even. The send path wraps the result to
//! 16 bits, so negative values go out as their two's complement pattern.

use crate::addressing::{compose, MessageSpace};
use crate::channels::{AnalogReading, ChannelSet, ChannelUnits, Reading};
use crate::types::{CanFrame, NodeId};
use byteorder::{ByteOrder, LittleEndian};

/// Number of analog banks
pub const BANK_COUNT: usize = 8;
/// Channels per bank
pub const SLOTS_PER_BANK: usize = 4;
/// Length of every analog frame sent
pub const FRAME_LEN: usize = 8;

/// 1-based channel number carried in `slot` of `bank`
pub fn channel_at(bank: usize, slot: usize) -> usize {
    bank * SLOTS_PER_BANK + slot + 1
}

/// Physical value of a raw bus integer
pub fn scale(raw: i16, divisor: u16) -> f64 {
    f64::from(raw) / f64::from(divisor)
}

/// Raw 16-bit pattern for a physical value.
///
/// Ties round to even (`2.5 -> 2`, `3.5 -> 4`); results outside the 16-bit
/// range wrap.
pub fn descale(value: f64, divisor: u16) -> u16 {
    let scaled = (value * f64::from(divisor)).round_ties_even();
    if !scaled.is_finite() {
        log::warn!("Cannot encode analog value {} with divisor {}", value, divisor);
        return 0;
    }
    scaled as i64 as u16
}

/// Apply a received payload of analog bank `bank` to `channels`.
///
/// Slots without a configured receive unit are skipped entirely.
pub fn decode_bank(
    bank: usize,
    data: &[u8],
    channels: &mut ChannelSet,
    units: &ChannelUnits,
) -> Vec<Reading> {
    let mut readings = Vec::new();
    for slot in 0..SLOTS_PER_BANK {
        let index = channel_at(bank, slot) - 1;
        let Some(unit) = units.receive_at(index) else {
            log::trace!("Analog{:02} has no receive unit, skipped", index + 1);
            continue;
        };
        let offset = 2 * slot;
        if data.len() < offset + 2 {
            log::debug!(
                "Analog bank {} payload of {} bytes has no slot {}",
                bank,
                data.len(),
                slot
            );
            continue;
        }

        let raw = LittleEndian::read_i16(&data[offset..offset + 2]);
        let reading = AnalogReading {
            value: scale(raw, unit.divisor),
            unit: unit.display_unit,
        };
        channels.record_analog(index, reading);
        readings.push(Reading::Analog {
            channel: index + 1,
            value: reading.value,
            unit: reading.unit,
        });
    }
    readings
}

/// Build the frame of analog bank `bank` from the outgoing values.
///
/// All four slots are always filled; unset channels send 0 and channels
/// without a send unit use factor 1.
pub fn encode_bank(
    bank: usize,
    channels: &ChannelSet,
    units: &ChannelUnits,
    node: NodeId,
) -> CanFrame {
    let mut data = vec![0u8; FRAME_LEN];
    for slot in 0..SLOTS_PER_BANK {
        let index = channel_at(bank, slot) - 1;
        let value = channels.outgoing_analog_at(index).unwrap_or(0.0);
        let divisor = units.send_at(index).map_or(1, |unit| unit.divisor);
        LittleEndian::write_u16(&mut data[2 * slot..2 * slot + 2], descale(value, divisor));
    }
    let base = MessageSpace::AnalogBank(bank as u8).base();
    CanFrame::new(compose(base, node), data)
}

/// Frames for all eight banks, bank 0 first
pub fn encode(channels: &ChannelSet, units: &ChannelUnits, node: NodeId) -> Vec<CanFrame> {
    (0..BANK_COUNT)
        .map(|bank| encode_bank(bank, channels, units, node))
        .collect()
}
