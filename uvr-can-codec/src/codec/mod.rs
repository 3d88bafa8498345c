//! Frame decoding and encoding
//!
//! Dispatches received frames to the heartbeat, digital or analog decoder
//! after filtering on the node id, and builds the full set of frames that
//! carries the outgoing channel values.

pub mod analog;
pub mod digital;

use crate::addressing::{self, MessageSpace};
use crate::channels::{ChannelSet, ChannelUnits, Reading};
use crate::heartbeat::HeartbeatState;
use crate::types::{CanFrame, NodeId};

/// Decode one received frame for the controller at `node`.
///
/// Frames for other nodes or unrelated message spaces leave `channels`
/// untouched and produce no readings.
pub fn decode_frame(
    frame: &CanFrame,
    node: NodeId,
    channels: &mut ChannelSet,
    units: &ChannelUnits,
) -> Vec<Reading> {
    if !addressing::node_matches(frame.id, node) {
        log::trace!("Frame 0x{:03X} is for another node, ignored", frame.id);
        return Vec::new();
    }

    match addressing::classify(frame.id) {
        Some(MessageSpace::Heartbeat) => HeartbeatState::decode(&frame.data)
            .map(|state| vec![Reading::State { state }])
            .unwrap_or_default(),
        Some(MessageSpace::Digital) => digital::decode(&frame.data, channels),
        Some(MessageSpace::AnalogBank(bank)) => {
            analog::decode_bank(bank as usize, &frame.data, channels, units)
        }
        None => {
            log::trace!("Frame 0x{:03X} is in no known message space", frame.id);
            Vec::new()
        }
    }
}

/// Digital frame followed by the eight analog bank frames, sent as `node`.
pub fn encode_channels(channels: &ChannelSet, units: &ChannelUnits, node: NodeId) -> Vec<CanFrame> {
    let mut frames = Vec::with_capacity(1 + analog::BANK_COUNT);
    frames.push(digital::encode(channels, node));
    frames.extend(analog::encode(channels, units, node));
    frames
}
