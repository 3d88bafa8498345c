//! Digital channel codec
//!
//! 32 boolean channels travel in the first four bytes of the digital frame.
//! Channel `i*8 + b` is bit `b-1` of byte `i`; the remaining four bytes of a
//! sent frame are zero.

use crate::addressing::{compose, MessageSpace};
use crate::channels::{ChannelSet, Reading, CHANNEL_COUNT};
use crate::types::{CanFrame, NodeId};
use byteorder::{BigEndian, ByteOrder};

/// Bytes carrying channel bits
const BITFIELD_LEN: usize = 4;
/// Length of every digital frame sent
pub const FRAME_LEN: usize = 8;

/// Position of `channel` (1..=32) in the big-endian 32-bit word.
pub fn bit_position(channel: usize) -> u32 {
    assert!((1..=CHANNEL_COUNT).contains(&channel), "channel {} out of range", channel);
    let c = channel - 1;
    (31 + (c % 8 + 1) - (c / 8) * 8 - 8) as u32
}

/// Pack 32 channel values, channel 1 first, into the bitfield word.
pub fn pack(values: &[bool; CHANNEL_COUNT]) -> u32 {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &on)| on)
        .fold(0u32, |word, (i, _)| word | 1 << bit_position(i + 1))
}

/// Unpack the bitfield of a digital payload, channel 1 first.
///
/// Returns `None` if the payload is shorter than four bytes.
pub fn unpack(data: &[u8]) -> Option<[bool; CHANNEL_COUNT]> {
    if data.len() < BITFIELD_LEN {
        return None;
    }
    let mut values = [false; CHANNEL_COUNT];
    for (i, &byte) in data[..BITFIELD_LEN].iter().enumerate() {
        for b in 0..8 {
            values[i * 8 + b] = byte >> b & 1 == 1;
        }
    }
    Some(values)
}

/// Apply a received digital payload to `channels`.
///
/// A channel that reads 0 and has never been seen stays unset, so inputs
/// that are not wired on the controller do not show up as readings.
/// Returns the readings that were updated.
pub fn decode(data: &[u8], channels: &mut ChannelSet) -> Vec<Reading> {
    let Some(values) = unpack(data) else {
        log::debug!("Digital frame too short: {} bytes", data.len());
        return Vec::new();
    };

    let mut readings = Vec::new();
    for byte in 0..BITFIELD_LEN {
        for bit in (1..=8).rev() {
            let index = byte * 8 + bit - 1;
            let value = values[index];
            if value || channels.digital_seen(index) {
                channels.record_digital(index, value);
                readings.push(Reading::Digital {
                    channel: index + 1,
                    value,
                });
            }
        }
    }
    readings
}

/// Build the digital frame carrying the outgoing values of `channels`.
pub fn encode(channels: &ChannelSet, node: NodeId) -> CanFrame {
    let mut data = vec![0u8; FRAME_LEN];
    BigEndian::write_u32(&mut data[..BITFIELD_LEN], pack(&channels.outgoing_digital_values()));
    CanFrame::new(compose(MessageSpace::Digital.base(), node), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bit_positions_cover_word() {
        let positions: HashSet<u32> = (1..=CHANNEL_COUNT).map(bit_position).collect();
        assert_eq!(positions.len(), CHANNEL_COUNT);
        assert!(positions.iter().all(|&p| p < 32));
    }

    #[test]
    fn test_bit_position_layout() {
        // channel 1 is the lowest bit of the first byte on the wire
        assert_eq!(bit_position(1), 24);
        assert_eq!(bit_position(8), 31);
        assert_eq!(bit_position(9), 16);
        assert_eq!(bit_position(32), 7);
    }

    #[test]
    fn test_decode_first_byte() {
        let mut channels = ChannelSet::new();
        let readings = decode(&[0xFF, 0, 0, 0, 0, 0, 0, 0], &mut channels);

        assert_eq!(readings.len(), 8);
        assert_eq!(readings[0], Reading::Digital { channel: 8, value: true });
        for c in 1..=8 {
            assert_eq!(channels.digital(c), Some(true));
        }
        for c in 9..=32 {
            assert_eq!(channels.digital(c), None);
        }
    }

    #[test]
    fn test_zero_only_updates_seen_channels() {
        let mut channels = ChannelSet::new();
        decode(&[0b0000_0101, 0, 0, 0], &mut channels);
        assert_eq!(channels.digital(1), Some(true));
        assert_eq!(channels.digital(2), None);
        assert_eq!(channels.digital(3), Some(true));

        let readings = decode(&[0, 0, 0, 0], &mut channels);
        assert_eq!(channels.digital(1), Some(false));
        assert_eq!(channels.digital(2), None);
        assert_eq!(channels.digital(3), Some(false));
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn test_short_payload_is_ignored() {
        let mut channels = ChannelSet::new();
        assert!(decode(&[0xFF, 0xFF], &mut channels).is_empty());
        assert_eq!(channels.digital(1), None);
    }

    #[test]
    fn test_encode_layout() {
        let mut channels = ChannelSet::new();
        channels.set_digital(1, true).unwrap();
        channels.set_digital(10, true).unwrap();
        channels.set_digital(32, true).unwrap();

        let frame = encode(&channels, NodeId::new(62).unwrap());
        assert_eq!(frame.id, 0x180 + 62);
        assert_eq!(frame.data, vec![0x01, 0x02, 0x00, 0x80, 0, 0, 0, 0]);
    }

    #[test]
    fn test_round_trip() {
        let patterns: [u32; 5] = [0, u32::MAX, 0xA5A5_5A5A, 0x8000_0001, 0x1234_5678];
        for pattern in patterns {
            let mut bits = [false; CHANNEL_COUNT];
            for (i, bit) in bits.iter_mut().enumerate() {
                *bit = pattern >> i & 1 == 1;
            }
            let mut data = [0u8; 4];
            BigEndian::write_u32(&mut data, pack(&bits));
            assert_eq!(unpack(&data), Some(bits));

            let mut outgoing = ChannelSet::new();
            for (i, &bit) in bits.iter().enumerate() {
                outgoing.set_digital(i + 1, bit).unwrap();
            }
            let frame = encode(&outgoing, NodeId::new(1).unwrap());
            let mut received = ChannelSet::new();
            decode(&frame.data, &mut received);
            for (i, &bit) in bits.iter().enumerate() {
                assert_eq!(received.digital(i + 1).unwrap_or(false), bit);
            }
        }
    }
}
