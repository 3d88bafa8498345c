//! Heartbeat state
//!
//! The controller broadcasts a single status byte on `0x700 + node`. Each
//! frame fully determines the state; there is no transition history.

use serde::Serialize;
use std::fmt;

/// Operating state reported by the controller heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HeartbeatState {
    BootUp,
    PreOperational,
    Operational,
    Stopped,
    Unknown,
}

impl HeartbeatState {
    /// Map a heartbeat status byte to a state.
    pub fn from_status(status: u8) -> Self {
        match status {
            0x00 => HeartbeatState::BootUp,
            0x04 => HeartbeatState::Stopped,
            0x05 => HeartbeatState::Operational,
            0x7F => HeartbeatState::PreOperational,
            _ => HeartbeatState::Unknown,
        }
    }

    /// Decode a heartbeat payload. Unrecognised or missing status bytes
    /// yield `None`, leaving the previous state in place.
    pub fn decode(data: &[u8]) -> Option<Self> {
        match data.first().copied().map(Self::from_status) {
            Some(HeartbeatState::Unknown) | None => None,
            state => state,
        }
    }
}

impl fmt::Display for HeartbeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeartbeatState::BootUp => "BootUp",
            HeartbeatState::PreOperational => "PreOperational",
            HeartbeatState::Operational => "Operational",
            HeartbeatState::Stopped => "Stopped",
            HeartbeatState::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}
