//! Device session
//!
//! A [`DeviceSession`] is everything the bridge knows about one controller:
//! the node id it listens to, its configuration, the channel values and the
//! two periodic send timers. The host loop owns it and calls into it:
//!
//! ```no_run
//! use std::time::Instant;
//! use uvr_can_codec::{DeviceSession, MemoryTransport, NodeId, SessionConfig};
//!
//! let mut session = DeviceSession::new(NodeId::new(1).unwrap(), SessionConfig::new());
//! session.apply_attribute("SendAsNodeId", "62", Instant::now()).unwrap();
//!
//! let mut transport = MemoryTransport::new("can0");
//! loop {
//!     for reading in session.drain(&mut transport) {
//!         println!("{}", reading);
//!     }
//!     session.poll(Instant::now(), &mut transport);
//!     # break;
//! }
//! ```

use crate::channels::{ChannelSet, Reading, CHANNEL_COUNT};
use crate::codec;
use crate::config::{parse_channel_suffix, Attribute, SessionConfig};
use crate::formats::capture;
use crate::heartbeat::HeartbeatState;
use crate::schedule::PeriodicTimer;
use crate::timesync;
use crate::transport::Transport;
use crate::types::{CanFrame, CodecError, NodeId, Result};
use std::time::Instant;

/// State of the bridge for one connected controller
#[derive(Debug)]
pub struct DeviceSession {
    node: NodeId,
    config: SessionConfig,
    channels: ChannelSet,
    state: Option<HeartbeatState>,
    resend_timer: PeriodicTimer,
    time_sync_timer: PeriodicTimer,
}

impl DeviceSession {
    /// Create a session for the controller listening at `node`.
    ///
    /// Timers stay unarmed until [`start`](Self::start) or an attribute
    /// change arms them.
    pub fn new(node: NodeId, config: SessionConfig) -> Self {
        Self {
            node,
            config,
            channels: ChannelSet::new(),
            state: None,
            resend_timer: PeriodicTimer::new(),
            time_sync_timer: PeriodicTimer::new(),
        }
    }

    /// Arm the periodic timers the configuration allows.
    pub fn start(&mut self, now: Instant) {
        self.rearm_resend(now);
        self.rearm_time_sync(now);
    }

    /// Node id of the controller this session decodes frames for
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Last recognised heartbeat state
    pub fn state(&self) -> Option<HeartbeatState> {
        self.state
    }

    /// Apply one configuration attribute and re-arm the affected timer.
    ///
    /// A rejected attribute leaves the configuration unchanged.
    pub fn apply_attribute(&mut self, name: &str, value: &str, now: Instant) -> Result<()> {
        let attribute = self.config.apply_attribute(name, value)?;
        log::info!("Attribute {} set to {:?}", name, value);

        match attribute {
            Attribute::SendAsNodeId => {
                self.rearm_resend(now);
                self.rearm_time_sync(now);
            }
            Attribute::SendInterval => self.rearm_resend(now),
            Attribute::SendNewTimeInterval => self.rearm_time_sync(now),
            Attribute::GetFactorAnalog(_) | Attribute::SetFactorAnalog(_) => {}
        }
        Ok(())
    }

    /// Set an outgoing value by reading name (`SetDigitalNN` / `SetAnalogNN`).
    pub fn apply_set(&mut self, name: &str, value: &str) -> Result<Reading> {
        if let Some(nn) = name.strip_prefix("SetDigital") {
            let channel = parse_channel_suffix(name, nn)?;
            let value = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "on" => true,
                "0" | "off" => false,
                other => {
                    return Err(CodecError::ConfigError(format!(
                        "{}: {:?} is not 0/1/on/off",
                        name, other
                    )))
                }
            };
            self.set_digital(channel, value)
        } else if let Some(nn) = name.strip_prefix("SetAnalog") {
            let channel = parse_channel_suffix(name, nn)?;
            let value: f64 = value.trim().parse().map_err(|_| {
                CodecError::ConfigError(format!("{}: {:?} is not a number", name, value))
            })?;
            self.set_analog(channel, value)
        } else {
            Err(CodecError::ConfigError(format!("unknown set target: {}", name)))
        }
    }

    pub fn set_digital(&mut self, channel: usize, value: bool) -> Result<Reading> {
        self.channels.set_digital(channel, value)?;
        Ok(Reading::SetDigital { channel, value })
    }

    pub fn set_analog(&mut self, channel: usize, value: f64) -> Result<Reading> {
        self.channels.set_analog(channel, value)?;
        Ok(Reading::SetAnalog { channel, value })
    }

    /// Decode one capture line. Malformed lines are logged and skipped.
    pub fn handle_line(&mut self, line: &str) -> Vec<Reading> {
        match capture::parse_line(line) {
            Ok(frame) => self.handle_frame(&frame),
            Err(e) => {
                log::debug!("Skipping capture line: {}", e);
                Vec::new()
            }
        }
    }

    /// Decode one received frame into readings.
    pub fn handle_frame(&mut self, frame: &CanFrame) -> Vec<Reading> {
        let readings =
            codec::decode_frame(frame, self.node, &mut self.channels, &self.config.units);
        for reading in &readings {
            if let Reading::State { state } = reading {
                self.state = Some(*state);
            }
        }
        readings
    }

    /// Decode every line the transport has buffered right now.
    pub fn drain<T: Transport>(&mut self, transport: &mut T) -> Vec<Reading> {
        let mut readings = Vec::new();
        while let Some(line) = transport.receive_nonblocking() {
            readings.extend(self.handle_line(&line));
        }
        readings
    }

    /// Frames carrying all outgoing channel values.
    ///
    /// Fails if no `SendAsNodeId` is configured.
    pub fn channel_frames(&self) -> Result<Vec<CanFrame>> {
        let node = self.config.send_as_node_id.ok_or_else(|| {
            CodecError::ConfigError("SendAsNodeId must be set before sending".to_string())
        })?;
        Ok(codec::encode_channels(&self.channels, &self.config.units, node))
    }

    /// Send all channel frames now and restart the resend period.
    ///
    /// Returns the number of frames the transport accepted. Failed sends
    /// are logged and not retried; the next period sends again.
    pub fn force_resend<T: Transport>(&mut self, now: Instant, transport: &mut T) -> Result<usize> {
        let frames = self.channel_frames()?;
        self.rearm_resend(now);

        let mut sent = 0;
        for frame in &frames {
            match transport.send(frame) {
                Ok(()) => sent += 1,
                Err(e) => log::warn!("Failed to send frame {}: {}", frame, e),
            }
        }
        log::debug!("Sent {} of {} channel frames", sent, frames.len());
        Ok(sent)
    }

    /// Send the time frame now and restart the time-sync period.
    pub fn force_time_sync<T: Transport>(&mut self, now: Instant, transport: &mut T) -> Result<()> {
        let frame = timesync::frame_now()?;
        self.rearm_time_sync(now);

        if let Err(e) = transport.send(&frame) {
            log::warn!("Failed to send time frame {}: {}", frame, e);
        }
        Ok(())
    }

    /// Run the timers that are due at `now`.
    pub fn poll<T: Transport>(&mut self, now: Instant, transport: &mut T) {
        if self.resend_timer.is_due(now) {
            if let Err(e) = self.force_resend(now, transport) {
                log::warn!("Periodic resend failed: {}", e);
                self.resend_timer.cancel();
            }
        }
        if self.time_sync_timer.is_due(now) {
            if let Err(e) = self.force_time_sync(now, transport) {
                log::warn!("Periodic time sync failed: {}", e);
                self.time_sync_timer.cancel();
            }
        }
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.resend_timer.deadline(), self.time_sync_timer.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Snapshot of every reading that currently has a value
    pub fn readings(&self) -> Vec<Reading> {
        let mut readings = Vec::new();
        for channel in 1..=CHANNEL_COUNT {
            if let Some(value) = self.channels.digital(channel) {
                readings.push(Reading::Digital { channel, value });
            }
        }
        for channel in 1..=CHANNEL_COUNT {
            if let Some(reading) = self.channels.analog(channel) {
                readings.push(Reading::Analog {
                    channel,
                    value: reading.value,
                    unit: reading.unit,
                });
            }
        }
        for channel in 1..=CHANNEL_COUNT {
            if let Some(value) = self.channels.configured_digital(channel) {
                readings.push(Reading::SetDigital { channel, value });
            }
        }
        for channel in 1..=CHANNEL_COUNT {
            if let Some(value) = self.channels.outgoing_analog(channel) {
                readings.push(Reading::SetAnalog { channel, value });
            }
        }
        if let Some(state) = self.state {
            readings.push(Reading::State { state });
        }
        readings
    }

    /// Whether the resend timer is pending
    pub fn resend_armed(&self) -> bool {
        self.resend_timer.is_armed()
    }

    /// Whether the time-sync timer is pending
    pub fn time_sync_armed(&self) -> bool {
        self.time_sync_timer.is_armed()
    }

    fn rearm_resend(&mut self, now: Instant) {
        if self.config.send_as_node_id.is_some() {
            self.resend_timer.arm(now, self.config.send_interval);
            log::debug!("Resend timer armed for {:?}", self.config.send_interval);
        } else {
            self.resend_timer.cancel();
        }
    }

    fn rearm_time_sync(&mut self, now: Instant) {
        match (self.config.send_as_node_id, self.config.time_sync_interval) {
            (Some(_), Some(interval)) => {
                self.time_sync_timer.arm(now, interval);
                log::debug!("Time sync timer armed for {:?}", interval);
            }
            _ => self.time_sync_timer.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use std::time::Duration;

    fn session() -> DeviceSession {
        DeviceSession::new(NodeId::new(1).unwrap(), SessionConfig::new())
    }

    #[test]
    fn test_handle_digital_line() {
        let mut session = session();
        let readings = session.handle_line("  can0  181   [8]  FF 00 00 00 00 00 00 00");
        assert_eq!(readings.len(), 8);
        for c in 1..=8 {
            assert_eq!(session.channels().digital(c), Some(true));
        }
        assert_eq!(session.channels().digital(9), None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut session = session();
        let mut transport = MemoryTransport::new("can0");
        transport.push_line("garbage");
        transport.push_line("  can0  181   [8]  ZZ 00 00 00 00 00 00 00");
        transport.push_line("  can0  701   [1]  05");
        let readings = session.drain(&mut transport);
        assert_eq!(
            readings,
            vec![Reading::State {
                state: HeartbeatState::Operational
            }]
        );
        assert_eq!(session.state(), Some(HeartbeatState::Operational));
    }

    #[test]
    fn test_unknown_heartbeat_keeps_state() {
        let mut session = session();
        session.handle_line("  can0  701   [1]  7F");
        assert!(session.handle_line("  can0  701   [1]  42").is_empty());
        assert_eq!(session.state(), Some(HeartbeatState::PreOperational));
    }

    #[test]
    fn test_unconfigured_analog_produces_nothing() {
        let mut session = session();
        assert!(session
            .handle_line("  can0  201   [8]  F5 00 00 00 00 00 00 00")
            .is_empty());
        assert_eq!(session.channels().analog(1), None);

        session
            .apply_attribute("GetFactorAnalog01", "Temperatur_(°C)", Instant::now())
            .unwrap();
        let readings = session.handle_line("  can0  201   [8]  F5 00 00 00 00 00 00 00");
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].name(), "Analog01");
        assert_eq!(session.channels().analog(1).unwrap().unit, "°C");
    }

    #[test]
    fn test_send_requires_node_id() {
        let mut session = session();
        let mut transport = MemoryTransport::new("can0");
        assert!(matches!(
            session.force_resend(Instant::now(), &mut transport),
            Err(CodecError::ConfigError(_))
        ));
        assert!(transport.sent().is_empty());
        assert!(!session.resend_armed());
    }

    #[test]
    fn test_force_resend_sends_nine_frames() {
        let mut session = session();
        let now = Instant::now();
        session.apply_attribute("SendAsNodeId", "62", now).unwrap();
        session.apply_attribute("SetFactorAnalog01", "Temperatur_(°C)", now).unwrap();
        session.apply_set("SetAnalog01", "24.5").unwrap();
        session.apply_set("SetDigital02", "on").unwrap();

        let mut transport = MemoryTransport::new("can0");
        assert_eq!(session.force_resend(now, &mut transport).unwrap(), 9);
        assert_eq!(transport.commands()[0], "can0 1be#0200000000000000");
        assert_eq!(transport.commands()[1], "can0 23e#f500000000000000");
    }

    #[test]
    fn test_send_failures_are_not_fatal() {
        let mut session = session();
        let now = Instant::now();
        session.apply_attribute("SendAsNodeId", "2", now).unwrap();
        let mut transport = MemoryTransport::new("can0");
        transport.set_fail_sends(true);
        assert_eq!(session.force_resend(now, &mut transport).unwrap(), 0);
        assert!(session.resend_armed());
    }

    #[test]
    fn test_timers_follow_configuration() {
        let mut session = session();
        let start = Instant::now();
        session.start(start);
        assert!(!session.resend_armed());

        session.apply_attribute("SendNewTimeInterval", "60", start).unwrap();
        assert!(!session.time_sync_armed());

        session.apply_attribute("SendAsNodeId", "62", start).unwrap();
        assert!(session.resend_armed());
        assert!(session.time_sync_armed());
        assert_eq!(session.next_deadline(), Some(start + Duration::from_secs(30)));

        session.apply_attribute("SendNewTimeInterval", "", start).unwrap();
        assert!(!session.time_sync_armed());
        assert!(session.resend_armed());
    }

    #[test]
    fn test_poll_fires_due_timers_once() {
        let mut session = DeviceSession::new(
            NodeId::new(1).unwrap(),
            SessionConfig::new()
                .with_send_as_node_id(NodeId::new(62).unwrap())
                .with_send_interval(Duration::from_secs(10))
                .with_time_sync_interval(Duration::from_secs(15)),
        );
        let start = Instant::now();
        session.start(start);
        let mut transport = MemoryTransport::new("can0");

        session.poll(start + Duration::from_secs(5), &mut transport);
        assert!(transport.sent().is_empty());

        session.poll(start + Duration::from_secs(10), &mut transport);
        assert_eq!(transport.sent().len(), 9);
        session.poll(start + Duration::from_secs(11), &mut transport);
        assert_eq!(transport.sent().len(), 9);

        session.poll(start + Duration::from_secs(15), &mut transport);
        assert_eq!(transport.sent().len(), 10);
        assert_eq!(transport.sent()[9].id, 0x100);
        assert_eq!(
            session.next_deadline(),
            Some(start + Duration::from_secs(20))
        );
    }

    #[test]
    fn test_manual_time_sync_without_interval() {
        let mut session = session();
        let mut transport = MemoryTransport::new("can0");
        session.force_time_sync(Instant::now(), &mut transport).unwrap();
        assert_eq!(transport.sent().len(), 1);
        assert!(transport.commands()[0].starts_with("can0 100#"));
        assert!(!session.time_sync_armed());
    }

    #[test]
    fn test_manual_time_sync_rearms_timer() {
        let mut session = DeviceSession::new(
            NodeId::new(1).unwrap(),
            SessionConfig::new()
                .with_send_as_node_id(NodeId::new(62).unwrap())
                .with_send_interval(Duration::from_secs(600))
                .with_time_sync_interval(Duration::from_secs(60)),
        );
        let start = Instant::now();
        session.start(start);
        assert_eq!(session.next_deadline(), Some(start + Duration::from_secs(60)));

        let mut transport = MemoryTransport::new("can0");
        let forced = start + Duration::from_secs(20);
        session.force_time_sync(forced, &mut transport).unwrap();
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(session.next_deadline(), Some(forced + Duration::from_secs(60)));

        session.poll(start + Duration::from_secs(60), &mut transport);
        assert_eq!(transport.sent().len(), 1);
        session.poll(forced + Duration::from_secs(60), &mut transport);
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn test_apply_set_validation() {
        let mut session = session();
        assert!(session.apply_set("SetDigital01", "maybe").is_err());
        assert!(session.apply_set("SetDigital33", "1").is_err());
        assert!(session.apply_set("SetAnalog01", "warm").is_err());
        assert!(session.apply_set("Digital01", "1").is_err());
        assert_eq!(
            session.apply_set("SetAnalog02", "-3.5").unwrap(),
            Reading::SetAnalog {
                channel: 2,
                value: -3.5
            }
        );
    }

    #[test]
    fn test_readings_snapshot() {
        let mut session = session();
        session.handle_line("  can0  181   [8]  01 00 00 00 00 00 00 00");
        session.handle_line("  can0  701   [1]  00");
        session.apply_set("SetDigital04", "1").unwrap();

        let names: Vec<String> = session.readings().iter().map(Reading::name).collect();
        assert_eq!(names, vec!["Digital01", "SetDigital04", "UVRstate"]);
    }
}
