//! NVMe admin command structure
//!
//! The fixed-layout 64-bit passthrough command the Linux driver expects
//! (`struct nvme_passthru_cmd64`), plus builders for the two read-only
//! admin operations this crate issues.

use std::fmt;

use crate::error::{NvmeError, Result};

/// NVMe admin command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AdminOpcode {
    /// Get Log Page
    GetLogPage = 0x02,
    /// Identify
    Identify = 0x06,
}

impl AdminOpcode {
    /// Create from raw opcode
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(Self::GetLogPage),
            0x06 => Some(Self::Identify),
            _ => None,
        }
    }
}

/// Log page identifiers understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogPageId {
    /// Error Information
    ErrorInformation = 0x01,
    /// SMART / Health Information
    SmartHealth = 0x02,
    /// Firmware Slot Information
    FirmwareSlot = 0x03,
}

impl LogPageId {
    /// Create from raw log identifier
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::ErrorInformation),
            0x02 => Some(Self::SmartHealth),
            0x03 => Some(Self::FirmwareSlot),
            _ => None,
        }
    }
}

/// CNS (Controller or Namespace Structure) values for Identify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IdentifyCns {
    /// Identify Namespace (NSID specified)
    Namespace = 0x00,
    /// Identify Controller
    Controller = 0x01,
}

impl IdentifyCns {
    /// Create from raw value
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Namespace),
            0x01 => Some(Self::Controller),
            _ => None,
        }
    }
}

/// Controller-wide namespace sentinel (all bits set)
pub const NSID_ALL: u32 = 0xFFFF_FFFF;

/// Upper bound on a single Get Log Page transfer, in bytes
pub const MAX_LOG_PAGE_LEN: usize = 16384;

/// 64-bit admin passthrough command - 80 bytes
///
/// Field order and widths match `struct nvme_passthru_cmd64`: the 64-byte
/// submission entry region, then timeout, a reserved word, and the 64-bit
/// completion result the driver writes back. The driver reads this memory
/// directly, so the layout is the wire contract.
///
/// `addr` is left zero by the builders and bound to the payload buffer
/// inside the submitting call, never earlier and never stored beyond it.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct AdminCommand {
    /// Command opcode
    pub opcode: u8,
    /// Command flags (fused operation, PSDT)
    pub flags: u8,
    rsvd1: u16,
    /// Namespace identifier, or `NSID_ALL`
    pub nsid: u32,
    /// Command Dword 2
    pub cdw2: u32,
    /// Command Dword 3
    pub cdw3: u32,
    /// Metadata buffer address
    pub metadata: u64,
    /// Payload buffer address
    pub addr: u64,
    /// Metadata length in bytes
    pub metadata_len: u32,
    /// Payload length in bytes
    pub data_len: u32,
    /// Command Dword 10
    pub cdw10: u32,
    /// Command Dword 11
    pub cdw11: u32,
    /// Command Dword 12
    pub cdw12: u32,
    /// Command Dword 13
    pub cdw13: u32,
    /// Command Dword 14
    pub cdw14: u32,
    /// Command Dword 15
    pub cdw15: u32,
    /// Timeout in milliseconds, 0 for the driver default
    pub timeout_ms: u32,
    rsvd2: u32,
    /// Completion result (Dword 0/1) written by the driver
    pub result: u64,
}

impl AdminCommand {
    /// Size of the passthrough structure in bytes
    pub const SIZE: usize = 80;

    /// Create an Identify command for the given namespace and selector
    ///
    /// `cns = Controller` returns the controller structure (nsid is ignored
    /// by the device, conventionally 0); `cns = Namespace` returns the
    /// structure for a specific 1-based nsid.
    pub fn identify(nsid: u32, cns: IdentifyCns, data_len: usize) -> Self {
        Self {
            opcode: AdminOpcode::Identify as u8,
            nsid,
            data_len: data_len as u32,
            cdw10: cns as u32,
            ..Self::default()
        }
    }

    /// Create a Get Log Page command for the given log and payload length
    ///
    /// Fails fast, before any I/O, unless the length is a multiple of 4 in
    /// `4..=16384`: cdw10 carries the payload size in dwords minus one in
    /// its high 16 bits, alongside the log identifier in the low byte.
    /// Log reads are controller-scoped (`NSID_ALL`).
    pub fn get_log_page(lid: LogPageId, data_len: usize) -> Result<Self> {
        if data_len < 4 || data_len > MAX_LOG_PAGE_LEN || data_len % 4 != 0 {
            return Err(NvmeError::InvalidBufferSize { len: data_len });
        }
        let numd = (data_len / 4 - 1) as u32;
        Ok(Self {
            opcode: AdminOpcode::GetLogPage as u8,
            nsid: NSID_ALL,
            data_len: data_len as u32,
            cdw10: lid as u32 | (numd << 16),
            ..Self::default()
        })
    }
}

impl fmt::Debug for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCommand")
            .field("opcode", &format_args!("{:#04x}", self.opcode))
            .field("nsid", &format_args!("{:#010x}", self.nsid))
            .field("data_len", &self.data_len)
            .field("cdw10", &format_args!("{:#010x}", self.cdw10))
            .field("timeout_ms", &self.timeout_ms)
            .field("result", &format_args!("{:#x}", self.result))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;
    use std::ptr::addr_of;

    #[test]
    fn test_admin_command_size() {
        assert_eq!(size_of::<AdminCommand>(), AdminCommand::SIZE);
        assert_eq!(AdminCommand::SIZE, 80);
    }

    #[test]
    fn test_admin_command_offsets() {
        let cmd = AdminCommand::default();
        let base = &cmd as *const AdminCommand as usize;
        let off = |p: usize| p - base;

        assert_eq!(off(addr_of!(cmd.opcode) as usize), 0);
        assert_eq!(off(addr_of!(cmd.flags) as usize), 1);
        assert_eq!(off(addr_of!(cmd.rsvd1) as usize), 2);
        assert_eq!(off(addr_of!(cmd.nsid) as usize), 4);
        assert_eq!(off(addr_of!(cmd.cdw2) as usize), 8);
        assert_eq!(off(addr_of!(cmd.cdw3) as usize), 12);
        assert_eq!(off(addr_of!(cmd.metadata) as usize), 16);
        assert_eq!(off(addr_of!(cmd.addr) as usize), 24);
        assert_eq!(off(addr_of!(cmd.metadata_len) as usize), 32);
        assert_eq!(off(addr_of!(cmd.data_len) as usize), 36);
        assert_eq!(off(addr_of!(cmd.cdw10) as usize), 40);
        assert_eq!(off(addr_of!(cmd.cdw11) as usize), 44);
        assert_eq!(off(addr_of!(cmd.cdw12) as usize), 48);
        assert_eq!(off(addr_of!(cmd.cdw13) as usize), 52);
        assert_eq!(off(addr_of!(cmd.cdw14) as usize), 56);
        assert_eq!(off(addr_of!(cmd.cdw15) as usize), 60);
        assert_eq!(off(addr_of!(cmd.timeout_ms) as usize), 64);
        assert_eq!(off(addr_of!(cmd.rsvd2) as usize), 68);
        assert_eq!(off(addr_of!(cmd.result) as usize), 72);
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_admin_command_byte_layout() {
        let mut cmd = AdminCommand::default();
        cmd.opcode = 0xA5;
        cmd.nsid = 0x1122_3344;
        cmd.addr = 0x8877_6655_4433_2211;
        cmd.data_len = 0x0000_1000;
        cmd.cdw10 = 0x007F_0002;
        cmd.cdw15 = 0xDEAD_BEEF;
        cmd.timeout_ms = 30_000;
        cmd.result = 0x0102_0304_0506_0708;

        let bytes: &[u8] = unsafe {
            std::slice::from_raw_parts(
                (&cmd as *const AdminCommand).cast::<u8>(),
                AdminCommand::SIZE,
            )
        };
        assert_eq!(bytes[0], 0xA5);
        assert_eq!(&bytes[4..8], &0x1122_3344u32.to_le_bytes());
        assert_eq!(&bytes[24..32], &0x8877_6655_4433_2211u64.to_le_bytes());
        assert_eq!(&bytes[36..40], &0x0000_1000u32.to_le_bytes());
        assert_eq!(&bytes[40..44], &0x007F_0002u32.to_le_bytes());
        assert_eq!(&bytes[60..64], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&bytes[64..68], &30_000u32.to_le_bytes());
        assert_eq!(&bytes[72..80], &0x0102_0304_0506_0708u64.to_le_bytes());
    }

    #[test]
    fn test_identify_builder() {
        let cmd = AdminCommand::identify(0, IdentifyCns::Controller, 4096);
        assert_eq!(cmd.opcode, AdminOpcode::Identify as u8);
        assert_eq!(cmd.nsid, 0);
        assert_eq!(cmd.cdw10, IdentifyCns::Controller as u32);
        assert_eq!(cmd.data_len, 4096);
        assert_eq!(cmd.addr, 0);

        let cmd = AdminCommand::identify(3, IdentifyCns::Namespace, 4096);
        assert_eq!(cmd.nsid, 3);
        assert_eq!(cmd.cdw10, 0);
    }

    #[test]
    fn test_get_log_page_builder() {
        let cmd = AdminCommand::get_log_page(LogPageId::SmartHealth, 512).unwrap();
        assert_eq!(cmd.opcode, AdminOpcode::GetLogPage as u8);
        assert_eq!(cmd.nsid, NSID_ALL);
        assert_eq!(cmd.data_len, 512);
        // 512 bytes = 128 dwords, encoded as 127 in the high half
        assert_eq!(cmd.cdw10, 0x007F_0002);
    }

    #[test]
    fn test_get_log_page_size_limits() {
        assert!(AdminCommand::get_log_page(LogPageId::SmartHealth, 4).is_ok());
        assert!(AdminCommand::get_log_page(LogPageId::SmartHealth, 16384).is_ok());

        for len in [0usize, 3, 5, 6, 7, 510, 16385, 16388, 65536] {
            let err = AdminCommand::get_log_page(LogPageId::SmartHealth, len).unwrap_err();
            match err {
                NvmeError::InvalidBufferSize { len: reported } => assert_eq!(reported, len),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!(AdminOpcode::from_raw(0x02), Some(AdminOpcode::GetLogPage));
        assert_eq!(AdminOpcode::from_raw(0x06), Some(AdminOpcode::Identify));
        assert_eq!(AdminOpcode::from_raw(0xFF), None);

        assert_eq!(LogPageId::from_raw(0x02), Some(LogPageId::SmartHealth));
        assert_eq!(LogPageId::from_raw(0x00), None);

        assert_eq!(IdentifyCns::from_raw(0x01), Some(IdentifyCns::Controller));
        assert_eq!(IdentifyCns::from_raw(0x02), None);
    }
}
