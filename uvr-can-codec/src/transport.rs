//! Transport seam
//!
//! The session never touches a CAN socket. It pulls capture lines from and
//! pushes frames to a [`Transport`]; the binary provides one over stdio, the
//! in-memory [`MemoryTransport`] serves tests and one-shot commands.

use crate::formats::CommandBuilder;
use crate::types::{CanFrame, CodecError, Result};
use std::collections::VecDeque;

/// Narrow I/O interface between the session and the CAN tooling
pub trait Transport {
    /// Hand one frame to the bus.
    fn send(&mut self, frame: &CanFrame) -> Result<()>;

    /// Next buffered capture line, or `None` if nothing is available right
    /// now. Must not block.
    fn receive_nonblocking(&mut self) -> Option<String>;
}

/// Transport backed by in-memory queues
///
/// Every sent frame is also rendered into its send command so callers can
/// print or inspect exactly what would go out.
#[derive(Debug)]
pub struct MemoryTransport {
    builder: CommandBuilder,
    incoming: VecDeque<String>,
    sent: Vec<CanFrame>,
    commands: Vec<String>,
    fail_sends: bool,
}

impl MemoryTransport {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            builder: CommandBuilder::new(device),
            incoming: VecDeque::new(),
            sent: Vec::new(),
            commands: Vec::new(),
            fail_sends: false,
        }
    }

    /// Queue a capture line for the next receive.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.incoming.push_back(line.into());
    }

    /// Frames sent so far
    pub fn sent(&self) -> &[CanFrame] {
        &self.sent
    }

    /// Send commands rendered so far
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Remove and return the rendered commands.
    pub fn take_commands(&mut self) -> Vec<String> {
        self.sent.clear();
        std::mem::take(&mut self.commands)
    }

    /// Make every following send fail, to exercise error paths.
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: &CanFrame) -> Result<()> {
        if self.fail_sends {
            return Err(CodecError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "send disabled",
            )));
        }
        self.commands.push(self.builder.build(frame));
        self.sent.push(frame.clone());
        Ok(())
    }

    fn receive_nonblocking(&mut self) -> Option<String> {
        self.incoming.pop_front()
    }
}
