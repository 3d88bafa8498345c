//! UVR CAN Codec Library
//!
//! Frame codecs and session logic for bridging a UVR16x2 heating controller
//! on a CAN bus to a home-automation host.
//!
//! # Architecture
//!
//! The library never opens a socket. Received traffic comes in as `candump`
//! text lines and outgoing frames leave as `cansend` commands, both through
//! the [`Transport`] trait:
//! - Parses capture lines into [`CanFrame`]s
//! - Decodes heartbeat, digital and analog frames of one node into [`Reading`]s
//! - Encodes the outgoing channel values and the bus time sync frame
//! - Drives the periodic resend and time sync timers of a [`DeviceSession`]
//!
//! Process management, reading publication and the host configuration
//! format belong to the application layer (uvr-can-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use std::time::Instant;
//! use uvr_can_codec::{DeviceSession, MemoryTransport, NodeId, SessionConfig};
//!
//! let mut session = DeviceSession::new(NodeId::new(1).unwrap(), SessionConfig::new());
//! session
//!     .apply_attribute("GetFactorAnalog01", "Temperatur_(°C)", Instant::now())
//!     .unwrap();
//!
//! for reading in session.handle_line("  can0  201   [8]  F5 00 00 00 00 00 00 00") {
//!     println!("{}", reading); // Analog01 = 24.5 °C
//! }
//!
//! let mut transport = MemoryTransport::new("can0");
//! session.force_time_sync(Instant::now(), &mut transport).unwrap();
//! ```

pub mod addressing;
pub mod channels;
pub mod codec;
pub mod config;
pub mod formats;
pub mod heartbeat;
pub mod schedule;
pub mod session;
pub mod timesync;
pub mod transport;
pub mod types;
pub mod units;

// Re-export main types for convenience
pub use channels::{AnalogReading, ChannelSet, ChannelUnits, Reading, CHANNEL_COUNT};
pub use config::{Attribute, SessionConfig};
pub use formats::{CaptureReader, CommandBuilder};
pub use heartbeat::HeartbeatState;
pub use session::DeviceSession;
pub use transport::{MemoryTransport, Transport};
pub use types::{CanFrame, CodecError, NodeId, Result};
pub use units::UnitDefinition;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh session has no readings and no timers
        let session = DeviceSession::new(NodeId::new(1).unwrap(), SessionConfig::new());
        assert!(session.readings().is_empty());
        assert_eq!(session.next_deadline(), None);
        assert!(!VERSION.is_empty());
    }
}
