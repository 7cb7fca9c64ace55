//! Log page decoding
//!
//! Decoders for the three mandatory admin log pages: SMART / health
//! information (02h), firmware slot information (03h), and error
//! information (01h). All are little-endian fixed layouts.

use crate::error::Result;
use crate::layout::FieldReader;

/// Byte offsets into the SMART / health information log
mod smart {
    pub const CRITICAL_WARNING: usize = 0;
    pub const TEMPERATURE: usize = 1;
    pub const AVAILABLE_SPARE: usize = 3;
    pub const SPARE_THRESHOLD: usize = 4;
    pub const PERCENTAGE_USED: usize = 5;
    pub const DATA_UNITS_READ: usize = 32;
    pub const DATA_UNITS_WRITTEN: usize = 48;
    pub const HOST_READ_COMMANDS: usize = 64;
    pub const HOST_WRITE_COMMANDS: usize = 80;
    pub const CONTROLLER_BUSY_TIME: usize = 96;
    pub const POWER_CYCLES: usize = 112;
    pub const POWER_ON_HOURS: usize = 128;
    pub const UNSAFE_SHUTDOWNS: usize = 144;
    pub const MEDIA_ERRORS: usize = 160;
    pub const NUM_ERR_LOG_ENTRIES: usize = 176;
    pub const WARNING_TEMP_TIME: usize = 192;
    pub const CRITICAL_COMP_TIME: usize = 196;
    pub const TEMP_SENSORS: usize = 200;

    pub const TEMP_SENSOR_COUNT: usize = 8;
}

/// Byte offsets into the firmware slot information log
mod fw {
    pub const AFI: usize = 0;
    pub const SLOTS: usize = 8;

    pub const SLOT_LEN: usize = 8;
    pub const SLOT_COUNT: usize = 7;
}

/// Byte offsets into one error information log entry
mod err {
    pub const ERROR_COUNT: usize = 0;
    pub const SQID: usize = 8;
    pub const CID: usize = 10;
    pub const STATUS: usize = 12;
    pub const LBA: usize = 16;
    pub const NSID: usize = 24;
}

/// SMART / health information log decoded from a 512-byte response
///
/// The 128-bit counters are reported verbatim; data unit counters are in
/// units of 1000 512-byte blocks regardless of the formatted LBA size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartLog {
    /// Critical warning bit flags, zero when healthy
    pub critical_warning: u8,
    /// Composite temperature in kelvins
    pub temperature: u16,
    /// Remaining spare capacity as a percentage of normal
    pub available_spare: u8,
    /// Spare capacity threshold that raises the warning flag
    pub available_spare_threshold: u8,
    /// Vendor estimate of device life used, percent, may exceed 100
    pub percentage_used: u8,
    /// Data units read over the device life
    pub data_units_read: u128,
    /// Data units written over the device life
    pub data_units_written: u128,
    /// Host read commands completed
    pub host_read_commands: u128,
    /// Host write commands completed
    pub host_write_commands: u128,
    /// Controller busy time in minutes
    pub controller_busy_time: u128,
    /// Power cycle count
    pub power_cycles: u128,
    /// Power-on hours
    pub power_on_hours: u128,
    /// Unsafe shutdown count
    pub unsafe_shutdowns: u128,
    /// Unrecovered media error count
    pub media_errors: u128,
    /// Error information log entries over the device life
    pub num_err_log_entries: u128,
    /// Minutes spent above the warning temperature threshold
    pub warning_temp_time: u32,
    /// Minutes spent above the critical temperature threshold
    pub critical_comp_time: u32,
    /// Per-sensor temperatures in kelvins, zero where not implemented
    pub temperature_sensors: [u16; smart::TEMP_SENSOR_COUNT],
}

impl SmartLog {
    /// Size of the SMART / health information log
    pub const SIZE: usize = 512;

    const RECORD: &'static str = "smart log";

    /// Decode a raw SMART / health log response
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let r = FieldReader::new(Self::RECORD, buf);
        let mut temperature_sensors = [0u16; smart::TEMP_SENSOR_COUNT];
        for (i, sensor) in temperature_sensors.iter_mut().enumerate() {
            *sensor = r.u16_at(smart::TEMP_SENSORS + i * 2)?;
        }
        Ok(Self {
            critical_warning: r.u8_at(smart::CRITICAL_WARNING)?,
            temperature: r.u16_at(smart::TEMPERATURE)?,
            available_spare: r.u8_at(smart::AVAILABLE_SPARE)?,
            available_spare_threshold: r.u8_at(smart::SPARE_THRESHOLD)?,
            percentage_used: r.u8_at(smart::PERCENTAGE_USED)?,
            data_units_read: r.u128_at(smart::DATA_UNITS_READ)?,
            data_units_written: r.u128_at(smart::DATA_UNITS_WRITTEN)?,
            host_read_commands: r.u128_at(smart::HOST_READ_COMMANDS)?,
            host_write_commands: r.u128_at(smart::HOST_WRITE_COMMANDS)?,
            controller_busy_time: r.u128_at(smart::CONTROLLER_BUSY_TIME)?,
            power_cycles: r.u128_at(smart::POWER_CYCLES)?,
            power_on_hours: r.u128_at(smart::POWER_ON_HOURS)?,
            unsafe_shutdowns: r.u128_at(smart::UNSAFE_SHUTDOWNS)?,
            media_errors: r.u128_at(smart::MEDIA_ERRORS)?,
            num_err_log_entries: r.u128_at(smart::NUM_ERR_LOG_ENTRIES)?,
            warning_temp_time: r.u32_at(smart::WARNING_TEMP_TIME)?,
            critical_comp_time: r.u32_at(smart::CRITICAL_COMP_TIME)?,
            temperature_sensors,
        })
    }

    /// Composite temperature in degrees Celsius
    pub fn temperature_celsius(&self) -> i32 {
        i32::from(self.temperature) - 273
    }

    /// Whether any critical warning flag is raised
    pub fn has_warning(&self) -> bool {
        self.critical_warning != 0
    }
}

/// Firmware slot information log decoded from a 512-byte response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareLog {
    /// Active firmware info: running slot in bits 2:0, slot pending
    /// activation at the next reset in bits 6:4
    pub afi: u8,
    /// Firmware revisions for slots 1 through 7, `None` when empty
    pub revisions: [Option<String>; fw::SLOT_COUNT],
}

impl FirmwareLog {
    /// Size of the firmware slot information log
    pub const SIZE: usize = 512;

    const RECORD: &'static str = "firmware log";

    /// Decode a raw firmware slot log response
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let r = FieldReader::new(Self::RECORD, buf);
        let afi = r.u8_at(fw::AFI)?;
        let mut revisions: [Option<String>; fw::SLOT_COUNT] = Default::default();
        for (i, slot) in revisions.iter_mut().enumerate() {
            let text = r.ascii_at(fw::SLOTS + i * fw::SLOT_LEN, fw::SLOT_LEN)?;
            if !text.is_empty() {
                *slot = Some(text);
            }
        }
        Ok(Self { afi, revisions })
    }

    /// Slot number of the running firmware image, 1-based
    pub fn active_slot(&self) -> u8 {
        self.afi & 0x07
    }

    /// Slot to be activated at the next reset, zero when none pending
    pub fn pending_slot(&self) -> u8 {
        (self.afi >> 4) & 0x07
    }

    /// Revision string of the running firmware image
    pub fn active_revision(&self) -> Option<&str> {
        let slot = self.active_slot();
        if slot == 0 {
            return None;
        }
        self.revisions[usize::from(slot) - 1].as_deref()
    }
}

/// One error information log entry (64 bytes on the wire)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogEntry {
    /// Monotonic error count; the log is a ring ordered by this field
    pub error_count: u64,
    /// Submission queue the faulted command was issued on
    pub sqid: u16,
    /// Command identifier of the faulted command
    pub cid: u16,
    /// Completion status of the faulted command, including the phase bit
    pub status: u16,
    /// First LBA the error touched
    pub lba: u64,
    /// Namespace the error touched
    pub nsid: u32,
}

impl ErrorLogEntry {
    /// Size of one error information log entry
    pub const SIZE: usize = 64;

    const RECORD: &'static str = "error log";

    /// Decode every used entry in a raw error log response
    ///
    /// Slots with a zero error count have never held an error and are
    /// dropped, so the result may be shorter than the transfer.
    pub fn from_bytes(buf: &[u8]) -> Result<Vec<Self>> {
        let count = buf.len() / Self::SIZE;
        if buf.len() % Self::SIZE != 0 {
            return Err(crate::error::NvmeError::Truncated {
                record: Self::RECORD,
                offset: count * Self::SIZE,
                end: (count + 1) * Self::SIZE,
                len: buf.len(),
            });
        }

        let mut entries = Vec::new();
        for chunk in buf.chunks_exact(Self::SIZE) {
            let r = FieldReader::new(Self::RECORD, chunk);
            let error_count = r.u64_at(err::ERROR_COUNT)?;
            if error_count == 0 {
                continue;
            }
            entries.push(Self {
                error_count,
                sqid: r.u16_at(err::SQID)?,
                cid: r.u16_at(err::CID)?,
                status: r.u16_at(err::STATUS)?,
                lba: r.u64_at(err::LBA)?,
                nsid: r.u32_at(err::NSID)?,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NvmeError;
    use crate::testutil;

    #[test]
    fn test_smart_round_trip() {
        let log = testutil::sample_smart();
        let buf = testutil::smart_buf(&log);
        assert_eq!(buf.len(), SmartLog::SIZE);

        let decoded = SmartLog::from_bytes(&buf).unwrap();
        assert_eq!(decoded, log);
    }

    #[test]
    fn test_smart_known_bytes() {
        let mut buf = vec![0u8; SmartLog::SIZE];
        buf[0] = 0x01; // spare capacity warning
        buf[1..3].copy_from_slice(&331u16.to_le_bytes());
        buf[3] = 9;
        buf[4] = 10;
        buf[5] = 97;

        let log = SmartLog::from_bytes(&buf).unwrap();
        assert_eq!(log.critical_warning, 1);
        assert!(log.has_warning());
        assert_eq!(log.temperature, 331);
        assert_eq!(log.temperature_celsius(), 58);
        assert_eq!(log.available_spare, 9);
        assert_eq!(log.available_spare_threshold, 10);
        assert_eq!(log.percentage_used, 97);
        assert_eq!(log.data_units_read, 0);
    }

    #[test]
    fn test_smart_truncated() {
        let buf = vec![0u8; 128];
        let e = SmartLog::from_bytes(&buf).unwrap_err();
        match e {
            NvmeError::Truncated { record, len, .. } => {
                assert_eq!(record, "smart log");
                assert_eq!(len, 128);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_firmware_log_decode() {
        let mut buf = vec![0u8; FirmwareLog::SIZE];
        buf[0] = 0x12; // slot 2 running, slot 1 pending
        buf[8..16].copy_from_slice(b"1.0.3   ");
        buf[16..24].copy_from_slice(b"1.1.0   ");

        let log = FirmwareLog::from_bytes(&buf).unwrap();
        assert_eq!(log.active_slot(), 2);
        assert_eq!(log.pending_slot(), 1);
        assert_eq!(log.revisions[0].as_deref(), Some("1.0.3"));
        assert_eq!(log.revisions[1].as_deref(), Some("1.1.0"));
        assert_eq!(log.revisions[2], None);
        assert_eq!(log.active_revision(), Some("1.1.0"));
    }

    #[test]
    fn test_firmware_log_no_active_slot() {
        let buf = vec![0u8; FirmwareLog::SIZE];
        let log = FirmwareLog::from_bytes(&buf).unwrap();
        assert_eq!(log.active_slot(), 0);
        assert_eq!(log.active_revision(), None);
        assert!(log.revisions.iter().all(Option::is_none));
    }

    #[test]
    fn test_error_log_filters_unused_slots() {
        let mut buf = vec![0u8; 4 * ErrorLogEntry::SIZE];
        // slot 0: error 17 on sq 1, command 0x2A
        buf[0..8].copy_from_slice(&17u64.to_le_bytes());
        buf[8..10].copy_from_slice(&1u16.to_le_bytes());
        buf[10..12].copy_from_slice(&0x2Au16.to_le_bytes());
        buf[12..14].copy_from_slice(&0x4281u16.to_le_bytes());
        buf[16..24].copy_from_slice(&0xDEAD_BEEFu64.to_le_bytes());
        buf[24..28].copy_from_slice(&1u32.to_le_bytes());
        // slot 2: error 16, other fields zero
        buf[128..136].copy_from_slice(&16u64.to_le_bytes());
        // slots 1 and 3 unused

        let entries = ErrorLogEntry::from_bytes(&buf).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].error_count, 17);
        assert_eq!(entries[0].sqid, 1);
        assert_eq!(entries[0].cid, 0x2A);
        assert_eq!(entries[0].status, 0x4281);
        assert_eq!(entries[0].lba, 0xDEAD_BEEF);
        assert_eq!(entries[0].nsid, 1);
        assert_eq!(entries[1].error_count, 16);
    }

    #[test]
    fn test_error_log_empty() {
        let buf = vec![0u8; 8 * ErrorLogEntry::SIZE];
        let entries = ErrorLogEntry::from_bytes(&buf).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_error_log_partial_entry() {
        let buf = vec![0u8; ErrorLogEntry::SIZE + 12];
        let e = ErrorLogEntry::from_bytes(&buf).unwrap_err();
        match e {
            NvmeError::Truncated { record, offset, end, len } => {
                assert_eq!(record, "error log");
                assert_eq!(offset, 64);
                assert_eq!(end, 128);
                assert_eq!(len, 76);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
