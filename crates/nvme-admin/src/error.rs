//! Error types for NVMe admin passthrough
//!
//! Errors surfaced by device access and admin command execution.

use std::fmt;
use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Result type for admin passthrough operations
pub type Result<T> = std::result::Result<T, NvmeError>;

/// NVMe admin passthrough error types
///
/// No failure is retried internally; each one propagates to the caller with
/// the OS or controller cause preserved. A handle that fails a command stays
/// open until `close()`, so callers may retry without reopening.
#[derive(Debug, Error)]
pub enum NvmeError {
    /// Device node could not be opened read-write
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        /// Path passed to open
        path: PathBuf,
        /// OS-level cause
        #[source]
        source: io::Error,
    },

    /// Path exists but is not a block or character device
    #[error("Not a block or character device: {}", .path.display())]
    NotADevice {
        /// Path passed to open
        path: PathBuf,
    },

    /// The OS rejected the control request
    #[error("Admin command {opcode:#04x} failed: {source}")]
    Command {
        /// Opcode of the failed command
        opcode: u8,
        /// errno from the ioctl
        #[source]
        source: Errno,
    },

    /// The driver completed the command with a non-zero NVMe status
    #[error("Admin command {opcode:#04x} completed with status {status}")]
    ControllerStatus {
        /// Opcode of the failed command
        opcode: u8,
        /// Completion status reported by the driver
        status: StatusCode,
    },

    /// A log page buffer violates the size contract
    #[error("Invalid log page buffer length {len}: must be a multiple of 4 in 4..=16384")]
    InvalidBufferSize {
        /// Offending buffer length in bytes
        len: usize,
    },

    /// A response buffer is shorter than the record layout requires
    #[error("Truncated {record} buffer: field occupies bytes {offset}..{end}, buffer has {len}")]
    Truncated {
        /// Record being decoded
        record: &'static str,
        /// Field start offset
        offset: usize,
        /// Field end offset (exclusive)
        end: usize,
        /// Actual buffer length
        len: usize,
    },

    /// Releasing the device resource failed
    #[error("Failed to close device: {0}")]
    Close(#[source] Errno),
}

/// NVMe completion status as reported by the Linux driver
///
/// A positive ioctl return value is the completion status field with the
/// phase tag stripped: status code in bits 7:0, status code type in bits
/// 10:8, do-not-retry in bit 14.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// Status code type (SCT)
    pub fn status_type(self) -> u8 {
        ((self.0 >> 8) & 0x07) as u8
    }

    /// Status code (SC) within the type
    pub fn code(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Do-not-retry flag
    pub fn dnr(self) -> bool {
        (self.0 >> 14) & 0x01 != 0
    }

    /// Name for the statuses a read-only admin workload can hit
    pub fn description(self) -> &'static str {
        match (self.status_type(), self.code()) {
            (0x0, 0x00) => "success",
            (0x0, 0x01) => "invalid command opcode",
            (0x0, 0x02) => "invalid field in command",
            (0x0, 0x04) => "data transfer error",
            (0x0, 0x06) => "internal error",
            (0x0, 0x0B) => "invalid namespace or format",
            (0x1, 0x09) => "invalid log page",
            (0x1, _) => "command specific error",
            (0x2, _) => "media or data integrity error",
            (0x3, _) => "path related error",
            _ => "unknown status",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x} ({})", self.0, self.description())
    }
}
