//! Identify data structure decoding
//!
//! The Identify command returns 4096-byte structures describing the
//! controller (CNS 01h) or one namespace (CNS 00h). Both are fixed-layout
//! little-endian records; the decoders below lift the fields this crate
//! exposes and leave the rest of the structure alone.

use crate::error::Result;
use crate::layout::FieldReader;

/// Byte offsets into the Identify Controller data structure
mod ctrl {
    pub const VID: usize = 0;
    pub const SSVID: usize = 2;
    pub const SN: usize = 4;
    pub const MN: usize = 24;
    pub const FR: usize = 64;
    pub const MDTS: usize = 77;
    pub const CNTLID: usize = 78;
    pub const VER: usize = 80;
    pub const OACS: usize = 256;
    pub const WCTEMP: usize = 266;
    pub const CCTEMP: usize = 268;
    pub const TNVMCAP: usize = 280;
    pub const UNVMCAP: usize = 296;
    pub const NN: usize = 516;

    pub const SN_LEN: usize = 20;
    pub const MN_LEN: usize = 40;
    pub const FR_LEN: usize = 8;
}

/// Byte offsets into the Identify Namespace data structure
mod ns {
    pub const NSZE: usize = 0;
    pub const NCAP: usize = 8;
    pub const NUSE: usize = 16;
    pub const NLBAF: usize = 25;
    pub const FLBAS: usize = 26;
    pub const NGUID: usize = 104;
    pub const EUI64: usize = 120;
    pub const LBAF: usize = 128;

    pub const LBAF_STRIDE: usize = 4;
    pub const LBAF_COUNT: usize = 16;
}

/// Controller identity decoded from an Identify CNS 01h response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerIdentity {
    /// PCI vendor ID
    pub vid: u16,
    /// PCI subsystem vendor ID
    pub ssvid: u16,
    /// Serial number, ASCII with padding trimmed
    pub sn: String,
    /// Model number, ASCII with padding trimmed
    pub mn: String,
    /// Firmware revision, ASCII with padding trimmed
    pub fr: String,
    /// Maximum data transfer size, log2 in minimum-page-size units
    pub mdts: u8,
    /// Controller ID within the NVM subsystem
    pub cntlid: u16,
    /// NVMe specification version, packed major/minor/tertiary
    pub ver: u32,
    /// Optional admin command support flags
    pub oacs: u16,
    /// Warning composite temperature threshold in kelvins
    pub wctemp: u16,
    /// Critical composite temperature threshold in kelvins
    pub cctemp: u16,
    /// Total NVM capacity in bytes
    pub tnvmcap: u128,
    /// Unallocated NVM capacity in bytes
    pub unvmcap: u128,
    /// Number of namespaces the controller supports
    pub nn: u32,
}

impl ControllerIdentity {
    /// Size of the Identify Controller data structure
    pub const SIZE: usize = 4096;

    const RECORD: &'static str = "controller identity";

    /// Decode a raw Identify Controller response
    ///
    /// Numeric fields pass through uninterpreted; vendor-specific or
    /// reserved values are the caller's concern.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let r = FieldReader::new(Self::RECORD, buf);
        Ok(Self {
            vid: r.u16_at(ctrl::VID)?,
            ssvid: r.u16_at(ctrl::SSVID)?,
            sn: r.ascii_at(ctrl::SN, ctrl::SN_LEN)?,
            mn: r.ascii_at(ctrl::MN, ctrl::MN_LEN)?,
            fr: r.ascii_at(ctrl::FR, ctrl::FR_LEN)?,
            mdts: r.u8_at(ctrl::MDTS)?,
            cntlid: r.u16_at(ctrl::CNTLID)?,
            ver: r.u32_at(ctrl::VER)?,
            oacs: r.u16_at(ctrl::OACS)?,
            wctemp: r.u16_at(ctrl::WCTEMP)?,
            cctemp: r.u16_at(ctrl::CCTEMP)?,
            tnvmcap: r.u128_at(ctrl::TNVMCAP)?,
            unvmcap: r.u128_at(ctrl::UNVMCAP)?,
            nn: r.u32_at(ctrl::NN)?,
        })
    }

    /// Specification version as (major, minor, tertiary)
    pub fn version(&self) -> (u16, u8, u8) {
        ((self.ver >> 16) as u16, (self.ver >> 8) as u8, self.ver as u8)
    }
}

/// One LBA format descriptor from the Identify Namespace structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LbaFormat {
    /// Metadata bytes transferred per block
    pub ms: u16,
    /// Data size as a power of two (LBADS)
    pub ds: u8,
    /// Relative performance hint, lower is better
    pub rp: u8,
}

impl LbaFormat {
    /// Block data size in bytes, zero when the descriptor is unused
    pub fn block_size(&self) -> u64 {
        if self.ds == 0 || self.ds >= 64 {
            return 0;
        }
        1u64 << self.ds
    }
}

/// Namespace identity decoded from an Identify CNS 00h response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceIdentity {
    /// Namespace ID the structure was read for
    pub nsid: u32,
    /// Namespace size in logical blocks
    pub nsze: u64,
    /// Namespace capacity in logical blocks
    pub ncap: u64,
    /// Namespace utilization in logical blocks
    pub nuse: u64,
    /// Index of the last supported LBA format descriptor
    pub nlbaf: u8,
    /// Formatted LBA size selector, current format in the low nibble
    pub flbas: u8,
    /// Namespace globally unique identifier
    pub nguid: [u8; 16],
    /// IEEE extended unique identifier
    pub eui64: [u8; 8],
    /// LBA format descriptor table
    pub lba_formats: [LbaFormat; ns::LBAF_COUNT],
}

impl NamespaceIdentity {
    /// Size of the Identify Namespace data structure
    pub const SIZE: usize = 4096;

    const RECORD: &'static str = "namespace identity";

    /// Decode a raw Identify Namespace response read for `nsid`
    pub fn from_bytes(nsid: u32, buf: &[u8]) -> Result<Self> {
        let r = FieldReader::new(Self::RECORD, buf);
        let mut lba_formats = [LbaFormat::default(); ns::LBAF_COUNT];
        for (i, fmt) in lba_formats.iter_mut().enumerate() {
            let base = ns::LBAF + i * ns::LBAF_STRIDE;
            fmt.ms = r.u16_at(base)?;
            fmt.ds = r.u8_at(base + 2)?;
            fmt.rp = r.u8_at(base + 3)?;
        }
        Ok(Self {
            nsid,
            nsze: r.u64_at(ns::NSZE)?,
            ncap: r.u64_at(ns::NCAP)?,
            nuse: r.u64_at(ns::NUSE)?,
            nlbaf: r.u8_at(ns::NLBAF)?,
            flbas: r.u8_at(ns::FLBAS)?,
            nguid: r.bytes_at(ns::NGUID)?,
            eui64: r.bytes_at(ns::EUI64)?,
            lba_formats,
        })
    }

    /// Whether the namespace is allocated; controllers return an all-zero
    /// structure for inactive namespace IDs
    pub fn is_allocated(&self) -> bool {
        self.nsze != 0
    }

    /// Descriptor of the format the namespace is currently formatted with
    pub fn current_format(&self) -> LbaFormat {
        self.lba_formats[(self.flbas & 0x0F) as usize]
    }

    /// Block size in bytes for the current format
    pub fn block_size(&self) -> u64 {
        self.current_format().block_size()
    }
}
