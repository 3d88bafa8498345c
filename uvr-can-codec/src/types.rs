//! Core types for the UVR CAN codec
//!
//! This module defines the frame type exchanged with the transport, the node
//! id newtype and the error type shared by every module of the library.

use std::fmt;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Highest valid 11-bit CAN identifier
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Maximum payload length of a classic CAN frame
pub const MAX_PAYLOAD: usize = 8;

/// Raw CAN frame as received from a capture line or built for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// 11-bit CAN identifier
    pub id: u32,
    /// Frame data bytes (0-8)
    pub data: Vec<u8>,
}

impl CanFrame {
    /// Create a frame from an id and payload.
    ///
    /// Panics if the id does not fit in 11 bits or the payload is longer
    /// than 8 bytes; both are caller bugs, not bus conditions.
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        assert!(id <= MAX_STANDARD_ID, "CAN id 0x{:X} exceeds 11 bits", id);
        assert!(
            data.len() <= MAX_PAYLOAD,
            "CAN payload of {} bytes exceeds {}",
            data.len(),
            MAX_PAYLOAD
        );
        Self { id, data }
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X} [{}]", self.id, self.dlc())?;
        for byte in &self.data {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

/// Logical address of a controller on the bus, range-checked to 1..=63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u8);

impl NodeId {
    /// Create a node id, checking that it lies in 1..=63.
    pub fn new(node: impl TryInto<u8>) -> Result<Self> {
        match node.try_into() {
            Ok(node) if (1..=63).contains(&node) => Ok(Self(node)),
            _ => Err(CodecError::ConfigError(
                "node id must be in range 1..=63".to_string(),
            )),
        }
    }

    /// The raw node number
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let node: u8 = s
            .trim()
            .parse()
            .map_err(|_| CodecError::ConfigError(format!("invalid node id: {:?}", s)))?;
        Self::new(node)
    }
}

/// Errors that can occur while decoding, encoding or configuring
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to parse capture line: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Unknown unit: {0}")]
    UnitError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
