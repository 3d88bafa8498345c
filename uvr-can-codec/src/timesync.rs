//! Time broadcast frame
//!
//! The controller keeps its clock only while powered and reads the bus time
//! at boot, so the bridge periodically broadcasts the local wall clock on
//! id 0x100: milliseconds since local midnight (u32, little-endian) followed
//! by days since 1984-01-01 (u16, little-endian).
//!
//! Both the midnight boundary and the 1984 epoch use the local calendar
//! fields read as if they were UTC. No offset normalisation is applied: the
//! controller shows local time.

use crate::addressing::TIME_SYNC_ID;
use crate::types::{CanFrame, CodecError, Result};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{Local, NaiveDateTime};

/// 1984-01-01 00:00:00 as milliseconds since 1970-01-01 00:00:00
pub const CAN_EPOCH_MS: i64 = 441_763_200_000;

const MS_PER_DAY: i64 = 86_400_000;

/// Decomposed bus time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTime {
    /// 0..=86_399_999
    pub ms_since_midnight: u32,
    pub days_since_epoch: u16,
}

impl BusTime {
    /// Split a local calendar time into bus time fields.
    ///
    /// Fails for dates before 1984 or after the 16-bit day counter wraps.
    pub fn from_local(local: NaiveDateTime) -> Result<Self> {
        let now_ms = local.and_utc().timestamp_millis();
        let ms_since_midnight = now_ms.rem_euclid(MS_PER_DAY);
        let days = (now_ms - CAN_EPOCH_MS - ms_since_midnight) / MS_PER_DAY;

        let days_since_epoch = u16::try_from(days).map_err(|_| {
            CodecError::ConfigError(format!("{} is outside the bus time range", local))
        })?;
        Ok(Self {
            ms_since_midnight: ms_since_midnight as u32,
            days_since_epoch,
        })
    }

    /// Six-byte frame payload
    pub fn to_bytes(self) -> [u8; 6] {
        let mut buf = [0u8; 6];
        LittleEndian::write_u32(&mut buf[0..4], self.ms_since_midnight);
        buf[4] = (self.days_since_epoch & 0xFF) as u8;
        buf[5] = (self.days_since_epoch >> 8) as u8;
        buf
    }
}

/// Time frame for the given local calendar time
pub fn frame_at(local: NaiveDateTime) -> Result<CanFrame> {
    let time = BusTime::from_local(local)?;
    Ok(CanFrame::new(TIME_SYNC_ID, time.to_bytes().to_vec()))
}

/// Time frame for the current local time of the host
pub fn frame_now() -> Result<CanFrame> {
    let now = Local::now().naive_local();
    log::debug!("Encoding time frame for {}", now);
    frame_at(now)
}
