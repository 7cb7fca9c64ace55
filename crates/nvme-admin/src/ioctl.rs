//! Linux ioctl request code construction
//!
//! Builds the 32-bit request codes addressing ioctl operations, per the
//! kernel's generic `_IOC` encoding: direction in bits 31:30, payload size
//! in bits 29:16, type tag in bits 15:8, command number in bits 7:0.

use std::mem::size_of;

use crate::command::AdminCommand;

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = 8;
const SIZE_SHIFT: u32 = 16;
const DIR_SHIFT: u32 = 30;

const SIZE_MASK: u32 = (1 << 14) - 1;

/// Data transfer direction encoded in a request code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    /// No payload
    None = 0,
    /// Userspace writes, kernel reads
    Write = 1,
    /// Kernel writes, userspace reads
    Read = 2,
    /// Payload travels both ways
    ReadWrite = 3,
}

/// Build a request code from direction, type tag, command number, and
/// payload size
///
/// Pure and total: every input combination yields a code. The caller must
/// pass the byte size of the actual payload structure, since the kernel
/// checks the embedded size against its own definition.
pub const fn request_code(dir: Direction, ty: u8, nr: u8, size: usize) -> u32 {
    ((dir as u32) << DIR_SHIFT)
        | (((size as u32) & SIZE_MASK) << SIZE_SHIFT)
        | ((ty as u32) << TYPE_SHIFT)
        | ((nr as u32) << NR_SHIFT)
}

/// Extract the payload size embedded in a request code
pub const fn payload_size(code: u32) -> usize {
    ((code >> SIZE_SHIFT) & SIZE_MASK) as usize
}

/// Type tag of the NVMe device family (`'N'`)
pub const NVME_IOCTL_TYPE: u8 = b'N';

/// Command number of the 64-bit admin passthrough operation
pub const NVME_ADMIN64_NR: u8 = 0x47;

/// Request code for the 64-bit admin command passthrough ioctl
///
/// The kernel's `NVME_IOCTL_ADMIN64_CMD`, i.e.
/// `_IOWR('N', 0x47, struct nvme_passthru_cmd64)`.
pub const NVME_IOCTL_ADMIN64_CMD: u32 = request_code(
    Direction::ReadWrite,
    NVME_IOCTL_TYPE,
    NVME_ADMIN64_NR,
    size_of::<AdminCommand>(),
);
