//! Session configuration types
//!
//! The host framework hands configuration over as string attributes
//! (`SendInterval = "30"`, `GetFactorAnalog07 = "Temperatur_(°C)"`). They
//! are parsed and range-checked once here, before anything is applied, so a
//! rejected attribute leaves the previous configuration in place.

use crate::channels::{ChannelUnits, CHANNEL_COUNT};
use crate::types::{CodecError, NodeId, Result};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Valid range of `SendInterval`, in seconds
pub const SEND_INTERVAL_RANGE: RangeInclusive<u64> = 5..=600;
/// `SendInterval` used until configured
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(30);
/// Valid range of `SendNewTimeInterval`, in seconds
pub const TIME_SYNC_INTERVAL_RANGE: RangeInclusive<u64> = 5..=86_400;

/// Configuration of one device session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Node id frames are sent as; nothing is sent periodically until set
    pub send_as_node_id: Option<NodeId>,

    /// Interval of the full channel re-broadcast
    pub send_interval: Duration,

    /// Interval of the time broadcast, `None` disables it
    pub time_sync_interval: Option<Duration>,

    /// Receive and send units of the analog channels
    pub units: ChannelUnits,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_as_node_id: None,
            send_interval: DEFAULT_SEND_INTERVAL,
            time_sync_interval: None,
            units: ChannelUnits::default(),
        }
    }
}

/// A configuration attribute name, parsed from its string form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    SendAsNodeId,
    SendInterval,
    SendNewTimeInterval,
    /// `GetFactorAnalogNN`, receive unit of channel NN
    GetFactorAnalog(usize),
    /// `SetFactorAnalogNN`, send unit of channel NN
    SetFactorAnalog(usize),
}

impl Attribute {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "SendAsNodeId" => Ok(Attribute::SendAsNodeId),
            "SendInterval" => Ok(Attribute::SendInterval),
            "SendNewTimeInterval" => Ok(Attribute::SendNewTimeInterval),
            _ => {
                if let Some(nn) = name.strip_prefix("GetFactorAnalog") {
                    Ok(Attribute::GetFactorAnalog(parse_channel_suffix(name, nn)?))
                } else if let Some(nn) = name.strip_prefix("SetFactorAnalog") {
                    Ok(Attribute::SetFactorAnalog(parse_channel_suffix(name, nn)?))
                } else {
                    Err(CodecError::ConfigError(format!("unknown attribute: {}", name)))
                }
            }
        }
    }
}

/// Parse the two-digit `NN` suffix of a per-channel name (01..32).
pub fn parse_channel_suffix(name: &str, suffix: &str) -> Result<usize> {
    let channel = if suffix.len() == 2 && suffix.bytes().all(|c| c.is_ascii_digit()) {
        suffix.parse::<usize>().ok()
    } else {
        None
    };
    match channel {
        Some(channel) if (1..=CHANNEL_COUNT).contains(&channel) => Ok(channel),
        _ => Err(CodecError::ConfigError(format!(
            "{}: channel must be 01..{}",
            name, CHANNEL_COUNT
        ))),
    }
}

fn parse_seconds(name: &str, value: &str, range: &RangeInclusive<u64>) -> Result<Duration> {
    let secs: u64 = value.trim().parse().map_err(|_| {
        CodecError::ConfigError(format!("{}: {:?} is not a number of seconds", name, value))
    })?;
    if !range.contains(&secs) {
        return Err(CodecError::ConfigError(format!(
            "{}: {} is outside {}..={} seconds",
            name,
            secs,
            range.start(),
            range.end()
        )));
    }
    Ok(Duration::from_secs(secs))
}

impl SessionConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the node id frames are sent as
    pub fn with_send_as_node_id(mut self, node: NodeId) -> Self {
        self.send_as_node_id = Some(node);
        self
    }

    /// Builder method: set the channel re-broadcast interval
    pub fn with_send_interval(mut self, interval: Duration) -> Self {
        self.send_interval = interval;
        self
    }

    /// Builder method: enable the time broadcast
    pub fn with_time_sync_interval(mut self, interval: Duration) -> Self {
        self.time_sync_interval = Some(interval);
        self
    }

    /// Apply one string attribute. An empty value deletes the attribute.
    ///
    /// On error nothing is changed.
    pub fn apply_attribute(&mut self, name: &str, value: &str) -> Result<Attribute> {
        let attribute = Attribute::parse(name)?;
        let value = value.trim();
        let delete = value.is_empty();

        match attribute {
            Attribute::SendAsNodeId => {
                self.send_as_node_id = if delete { None } else { Some(value.parse()?) };
            }
            Attribute::SendInterval => {
                self.send_interval = if delete {
                    DEFAULT_SEND_INTERVAL
                } else {
                    parse_seconds(name, value, &SEND_INTERVAL_RANGE)?
                };
            }
            Attribute::SendNewTimeInterval => {
                self.time_sync_interval = if delete {
                    None
                } else {
                    Some(parse_seconds(name, value, &TIME_SYNC_INTERVAL_RANGE)?)
                };
            }
            Attribute::GetFactorAnalog(channel) => {
                self.units
                    .set_receive_unit(channel, (!delete).then_some(value))?;
            }
            Attribute::SetFactorAnalog(channel) => {
                self.units.set_send_unit(channel, (!delete).then_some(value))?;
            }
        }
        Ok(attribute)
    }
}
