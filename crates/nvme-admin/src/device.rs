//! Device handles and command submission
//!
//! `NvmeDevice` wraps one open NVMe device node and issues admin commands
//! through a [`Passthrough`] implementation. The production passthrough
//! drives the `NVME_IOCTL_ADMIN64_CMD` ioctl; tests substitute an
//! in-memory one.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use tracing::{debug, trace, warn};

use crate::command::{AdminCommand, IdentifyCns, LogPageId};
use crate::config::DeviceConfig;
use crate::error::{NvmeError, Result, StatusCode};
use crate::identify::{ControllerIdentity, NamespaceIdentity};
use crate::logpage::{ErrorLogEntry, FirmwareLog, SmartLog};

mod sys {
    use crate::command::AdminCommand;
    use crate::ioctl::NVME_IOCTL_ADMIN64_CMD;

    nix::ioctl_readwrite_bad!(nvme_admin64_cmd, NVME_IOCTL_ADMIN64_CMD, AdminCommand);
}

/// Submission seam between a device handle and the operating system
///
/// The production implementation is [`IoctlPassthrough`]; in-memory
/// implementations back the pipeline tests.
pub trait Passthrough {
    /// Execute one admin command, filling `data` with the response payload
    ///
    /// The builders set `data_len`; the payload address is bound to `data`
    /// for exactly the duration of this call.
    fn submit(&mut self, cmd: &mut AdminCommand, data: &mut [u8]) -> Result<()>;

    /// Release the underlying device resource
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Admin command passthrough over an open device node
#[derive(Debug)]
pub struct IoctlPassthrough {
    file: Option<File>,
    path: PathBuf,
}

impl IoctlPassthrough {
    /// Open the node at `path` read-write and verify it is a device
    ///
    /// Both the controller character device (`/dev/nvme0`) and a namespace
    /// block device (`/dev/nvme0n1`) accept admin commands.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| NvmeError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let file_type = file
            .metadata()
            .map_err(|source| NvmeError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .file_type();
        if !file_type.is_char_device() && !file_type.is_block_device() {
            return Err(NvmeError::NotADevice {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "opened NVMe device");
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
        })
    }
}

impl Passthrough for IoctlPassthrough {
    fn submit(&mut self, cmd: &mut AdminCommand, data: &mut [u8]) -> Result<()> {
        let Some(file) = self.file.as_ref() else {
            // submissions after close fail the way a closed fd would
            return Err(NvmeError::Command {
                opcode: cmd.opcode,
                source: Errno::EBADF,
            });
        };

        cmd.addr = data.as_mut_ptr() as u64;
        let ret = unsafe { sys::nvme_admin64_cmd(file.as_raw_fd(), cmd as *mut _) };
        cmd.addr = 0;

        let status = ret.map_err(|source| NvmeError::Command {
            opcode: cmd.opcode,
            source,
        })?;
        if status != 0 {
            return Err(NvmeError::ControllerStatus {
                opcode: cmd.opcode,
                status: StatusCode(status as u32),
            });
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            debug!(path = %self.path.display(), "closing NVMe device");
            nix::unistd::close(file.into_raw_fd()).map_err(NvmeError::Close)?;
        }
        Ok(())
    }
}

/// Handle to one NVMe device node
///
/// Operations take `&mut self`: commands on one handle are strictly
/// sequential, and sharing a handle across threads needs an external
/// mutex. Every call performs fresh blocking I/O with no caching and no
/// retries.
#[derive(Debug)]
pub struct NvmeDevice<P = IoctlPassthrough> {
    passthrough: P,
    config: DeviceConfig,
}

impl NvmeDevice<IoctlPassthrough> {
    /// Open the device node at `path` with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, DeviceConfig::default())
    }

    /// Open the device node at `path` with an explicit configuration
    pub fn open_with(path: impl AsRef<Path>, config: DeviceConfig) -> Result<Self> {
        Ok(Self {
            passthrough: IoctlPassthrough::open(path.as_ref())?,
            config,
        })
    }
}

impl<P: Passthrough> NvmeDevice<P> {
    /// Build a handle over an explicit passthrough implementation
    pub fn with_passthrough(passthrough: P, config: DeviceConfig) -> Self {
        Self {
            passthrough,
            config,
        }
    }

    /// Close the handle and release the device
    pub fn close(mut self) -> Result<()> {
        self.passthrough.close()
    }

    fn submit(&mut self, mut cmd: AdminCommand, data: &mut [u8]) -> Result<()> {
        cmd.timeout_ms = self.config.timeout_ms();
        trace!(
            opcode = cmd.opcode,
            nsid = cmd.nsid,
            data_len = cmd.data_len,
            "submitting admin command"
        );
        self.passthrough.submit(&mut cmd, data)
    }

    /// Read the controller identity and every allocated namespace identity
    ///
    /// Issues one Identify for the controller structure, then one per
    /// namespace ID in `1..=nn`. Namespaces reporting zero size are
    /// dropped. The scan is clamped to
    /// [`max_namespaces`](DeviceConfig::max_namespaces), since the
    /// reported count is advisory on some platforms.
    pub fn identify(&mut self) -> Result<(ControllerIdentity, Vec<NamespaceIdentity>)> {
        let mut buf = vec![0u8; ControllerIdentity::SIZE];
        self.submit(
            AdminCommand::identify(0, IdentifyCns::Controller, buf.len()),
            &mut buf,
        )?;
        let ctrl = ControllerIdentity::from_bytes(&buf)?;
        debug!(model = %ctrl.mn, serial = %ctrl.sn, nn = ctrl.nn, "identified controller");

        let scan = ctrl.nn.min(self.config.max_namespaces);
        if ctrl.nn > scan {
            warn!(nn = ctrl.nn, cap = scan, "namespace count exceeds scan cap");
        }

        let mut namespaces = Vec::new();
        for nsid in 1..=scan {
            let mut buf = vec![0u8; NamespaceIdentity::SIZE];
            self.submit(
                AdminCommand::identify(nsid, IdentifyCns::Namespace, buf.len()),
                &mut buf,
            )?;
            let ns = NamespaceIdentity::from_bytes(nsid, &buf)?;
            if !ns.is_allocated() {
                trace!(nsid, "skipping unallocated namespace");
                continue;
            }
            namespaces.push(ns);
        }
        Ok((ctrl, namespaces))
    }

    /// Read the SMART / health information log
    pub fn smart_log(&mut self) -> Result<SmartLog> {
        let mut buf = vec![0u8; SmartLog::SIZE];
        self.read_log_page(LogPageId::SmartHealth, &mut buf)?;
        SmartLog::from_bytes(&buf)
    }

    /// Read the firmware slot information log
    pub fn firmware_log(&mut self) -> Result<FirmwareLog> {
        let mut buf = vec![0u8; FirmwareLog::SIZE];
        self.read_log_page(LogPageId::FirmwareSlot, &mut buf)?;
        FirmwareLog::from_bytes(&buf)
    }

    /// Read up to `entries` error information log entries
    ///
    /// Unused slots are dropped, so fewer entries than requested may come
    /// back. The request must fit one log transfer, which bounds `entries`
    /// to `1..=256`.
    pub fn error_log(&mut self, entries: usize) -> Result<Vec<ErrorLogEntry>> {
        let mut buf = vec![0u8; entries.saturating_mul(ErrorLogEntry::SIZE)];
        self.read_log_page(LogPageId::ErrorInformation, &mut buf)?;
        ErrorLogEntry::from_bytes(&buf)
    }

    /// Read a log page into a caller-sized buffer
    ///
    /// The buffer length must be a multiple of 4 in `4..=16384`; it is
    /// validated before any I/O happens.
    pub fn read_log_page(&mut self, lid: LogPageId, buf: &mut [u8]) -> Result<()> {
        let cmd = AdminCommand::get_log_page(lid, buf.len())?;
        self.submit(cmd, buf)
    }
}
