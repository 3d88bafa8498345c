//! Text frame formats
//!
//! This module contains the two textual representations the bridge talks to
//! the outside world in: `candump` capture lines coming in, and `cansend`
//! commands going out.

pub mod capture;
pub mod command;

// Re-export parser types
pub use capture::{parse_line, CaptureReader};
pub use command::CommandBuilder;
