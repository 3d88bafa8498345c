//! Channel values and readings
//!
//! A [`ChannelSet`] holds the last received value of every channel and the
//! values configured for sending. Channels are numbered 1..=32 in every
//! public API; the arrays are indexed by `channel - 1`.

use crate::heartbeat::HeartbeatState;
use crate::types::{CodecError, Result};
use crate::units::{self, UnitDefinition};
use serde::Serialize;
use std::fmt;

/// Number of digital and of analog channels
pub const CHANNEL_COUNT: usize = 32;

/// Validate a 1-based channel number and return its array index.
pub fn channel_index(channel: usize) -> Result<usize> {
    if (1..=CHANNEL_COUNT).contains(&channel) {
        Ok(channel - 1)
    } else {
        Err(CodecError::ConfigError(format!(
            "channel {} out of range 1..={}",
            channel, CHANNEL_COUNT
        )))
    }
}

/// Received analog value with the unit it was scaled into
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalogReading {
    pub value: f64,
    pub unit: &'static str,
}

impl fmt::Display for AnalogReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

/// Received and outgoing values of all channels of one controller
#[derive(Debug, Clone)]
pub struct ChannelSet {
    digital: [Option<bool>; CHANNEL_COUNT],
    analog: [Option<AnalogReading>; CHANNEL_COUNT],
    set_digital: [Option<bool>; CHANNEL_COUNT],
    set_analog: [Option<f64>; CHANNEL_COUNT],
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            digital: [None; CHANNEL_COUNT],
            analog: [None; CHANNEL_COUNT],
            set_digital: [None; CHANNEL_COUNT],
            set_analog: [None; CHANNEL_COUNT],
        }
    }

    /// Last received value of digital channel `channel`, if any was seen
    pub fn digital(&self, channel: usize) -> Option<bool> {
        channel_index(channel).ok().and_then(|i| self.digital[i])
    }

    /// Last received value of analog channel `channel`, if any was decoded
    pub fn analog(&self, channel: usize) -> Option<AnalogReading> {
        channel_index(channel).ok().and_then(|i| self.analog[i])
    }

    /// Value sent for digital channel `channel` (false until set)
    pub fn outgoing_digital(&self, channel: usize) -> bool {
        self.configured_digital(channel).unwrap_or(false)
    }

    /// Digital value explicitly set for sending, `None` until set
    pub fn configured_digital(&self, channel: usize) -> Option<bool> {
        channel_index(channel).ok().and_then(|i| self.set_digital[i])
    }

    /// Value sent for analog channel `channel`, `None` until set
    pub fn outgoing_analog(&self, channel: usize) -> Option<f64> {
        channel_index(channel).ok().and_then(|i| self.set_analog[i])
    }

    pub fn set_digital(&mut self, channel: usize, value: bool) -> Result<()> {
        let index = channel_index(channel)?;
        self.set_digital[index] = Some(value);
        Ok(())
    }

    pub fn set_analog(&mut self, channel: usize, value: f64) -> Result<()> {
        let index = channel_index(channel)?;
        if !value.is_finite() {
            return Err(CodecError::ConfigError(format!(
                "analog value for channel {} must be finite",
                channel
            )));
        }
        self.set_analog[index] = Some(value);
        Ok(())
    }

    /// All 32 outgoing digital values, channel 1 first
    pub fn outgoing_digital_values(&self) -> [bool; CHANNEL_COUNT] {
        self.set_digital.map(|value| value.unwrap_or(false))
    }

    pub(crate) fn record_digital(&mut self, index: usize, value: bool) {
        self.digital[index] = Some(value);
    }

    pub(crate) fn digital_seen(&self, index: usize) -> bool {
        self.digital[index].is_some()
    }

    pub(crate) fn record_analog(&mut self, index: usize, reading: AnalogReading) {
        self.analog[index] = Some(reading);
    }

    pub(crate) fn outgoing_analog_at(&self, index: usize) -> Option<f64> {
        self.set_analog[index]
    }
}

/// Per-channel unit configuration, independent for receive and send
#[derive(Debug, Clone)]
pub struct ChannelUnits {
    receive: [Option<&'static UnitDefinition>; CHANNEL_COUNT],
    send: [Option<&'static UnitDefinition>; CHANNEL_COUNT],
}

impl Default for ChannelUnits {
    fn default() -> Self {
        Self {
            receive: [None; CHANNEL_COUNT],
            send: [None; CHANNEL_COUNT],
        }
    }
}

impl ChannelUnits {
    pub fn receive_unit(&self, channel: usize) -> Option<&'static UnitDefinition> {
        channel_index(channel).ok().and_then(|i| self.receive[i])
    }

    pub fn send_unit(&self, channel: usize) -> Option<&'static UnitDefinition> {
        channel_index(channel).ok().and_then(|i| self.send[i])
    }

    /// Set (or with `None`, clear) the unit used to scale received values.
    pub fn set_receive_unit(&mut self, channel: usize, unit: Option<&str>) -> Result<()> {
        let index = channel_index(channel)?;
        self.receive[index] = unit.map(units::resolve).transpose()?;
        Ok(())
    }

    /// Set (or with `None`, clear) the unit used to scale sent values.
    pub fn set_send_unit(&mut self, channel: usize, unit: Option<&str>) -> Result<()> {
        let index = channel_index(channel)?;
        self.send[index] = unit.map(units::resolve).transpose()?;
        Ok(())
    }

    pub(crate) fn receive_at(&self, index: usize) -> Option<&'static UnitDefinition> {
        self.receive[index]
    }

    pub(crate) fn send_at(&self, index: usize) -> Option<&'static UnitDefinition> {
        self.send[index]
    }
}

/// One published value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    /// Received digital value (`DigitalNN`)
    Digital { channel: usize, value: bool },
    /// Received analog value (`AnalogNN`)
    Analog {
        channel: usize,
        value: f64,
        unit: &'static str,
    },
    /// Outgoing digital value (`SetDigitalNN`)
    SetDigital { channel: usize, value: bool },
    /// Outgoing analog value (`SetAnalogNN`)
    SetAnalog { channel: usize, value: f64 },
    /// Controller state from the heartbeat (`UVRstate`)
    State { state: HeartbeatState },
}

impl Reading {
    /// Reading name as exposed to the host framework
    pub fn name(&self) -> String {
        match self {
            Reading::Digital { channel, .. } => format!("Digital{:02}", channel),
            Reading::Analog { channel, .. } => format!("Analog{:02}", channel),
            Reading::SetDigital { channel, .. } => format!("SetDigital{:02}", channel),
            Reading::SetAnalog { channel, .. } => format!("SetAnalog{:02}", channel),
            Reading::State { .. } => "UVRstate".to_string(),
        }
    }

    /// Reading value rendered the way it is displayed
    pub fn value_string(&self) -> String {
        match self {
            Reading::Digital { value, .. } | Reading::SetDigital { value, .. } => {
                u8::from(*value).to_string()
            }
            Reading::Analog { value, unit, .. } => AnalogReading {
                value: *value,
                unit: *unit,
            }
            .to_string(),
            Reading::SetAnalog { value, .. } => value.to_string(),
            Reading::State { state } => state.to_string(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name(), self.value_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_bounds() {
        assert!(channel_index(0).is_err());
        assert_eq!(channel_index(1).unwrap(), 0);
        assert_eq!(channel_index(32).unwrap(), 31);
        assert!(channel_index(33).is_err());
    }

    #[test]
    fn test_outgoing_defaults() {
        let mut set = ChannelSet::new();
        assert!(!set.outgoing_digital(5));
        assert_eq!(set.outgoing_analog(5), None);

        set.set_digital(5, true).unwrap();
        set.set_analog(5, -3.5).unwrap();
        assert!(set.outgoing_digital(5));
        assert_eq!(set.outgoing_analog(5), Some(-3.5));

        assert!(set.set_digital(33, true).is_err());
        assert!(set.set_analog(1, f64::NAN).is_err());
        assert_eq!(set.outgoing_analog(1), None);
    }

    #[test]
    fn test_units_are_independent_per_direction() {
        let mut units = ChannelUnits::default();
        units.set_receive_unit(3, Some("Temperatur_(°C)")).unwrap();
        assert_eq!(units.receive_unit(3).unwrap().display_unit, "°C");
        assert!(units.send_unit(3).is_none());

        assert!(matches!(
            units.set_send_unit(3, Some("Parsec")),
            Err(CodecError::UnitError(_))
        ));
        assert!(units.send_unit(3).is_none());

        units.set_receive_unit(3, None).unwrap();
        assert!(units.receive_unit(3).is_none());
    }

    #[test]
    fn test_reading_names() {
        let reading = Reading::Analog {
            channel: 7,
            value: 24.5,
            unit: "°C",
        };
        assert_eq!(reading.name(), "Analog07");
        assert_eq!(reading.to_string(), "Analog07 = 24.5 °C");

        let reading = Reading::Digital {
            channel: 12,
            value: true,
        };
        assert_eq!(reading.to_string(), "Digital12 = 1");

        let reading = Reading::State {
            state: HeartbeatState::Operational,
        };
        assert_eq!(reading.to_string(), "UVRstate = Operational");
    }
}
