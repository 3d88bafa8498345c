//! Send command builder
//!
//! Renders a frame in the `cansend` argument form: `can0 201#f500000000000000`.

use crate::types::{CanFrame, MAX_PAYLOAD, MAX_STANDARD_ID};
use std::fmt::Write;

/// Builds send commands for one CAN interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    device: String,
}

impl CommandBuilder {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    /// Interface name the commands are addressed to
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Render `frame` as `<device> <id:03x>#<payload hex>`.
    pub fn build(&self, frame: &CanFrame) -> String {
        assert!(frame.id <= MAX_STANDARD_ID, "CAN id 0x{:X} exceeds 11 bits", frame.id);
        assert!(frame.data.len() <= MAX_PAYLOAD, "CAN payload exceeds 8 bytes");

        let mut command = String::with_capacity(self.device.len() + 5 + 2 * frame.data.len());
        command.push_str(&self.device);
        // writing into a String cannot fail
        let _ = write!(command, " {:03x}#", frame.id);
        for byte in &frame.data {
            let _ = write!(command, "{:02x}", byte);
        }
        command
    }
}
