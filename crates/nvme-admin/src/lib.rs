//! NVMe admin command passthrough for Linux
//!
//! Retrieves identity and health telemetry straight from an NVMe
//! controller through the kernel's admin passthrough ioctl. No vendor
//! tool and no management daemon, just an open device node.
//!
//! The crate covers the read-only admin surface: Identify (controller
//! and namespace structures) and Get Log Page (SMART / health, firmware
//! slots, error information). Each operation issues one or more blocking
//! ioctls and decodes the fixed-layout response buffers into typed
//! records.
//!
//! # Example
//!
//! ```rust,no_run
//! use nvme_admin::NvmeDevice;
//!
//! fn main() -> nvme_admin::Result<()> {
//!     let mut device = NvmeDevice::open("/dev/nvme0")?;
//!
//!     let (ctrl, namespaces) = device.identify()?;
//!     println!("{} ({}), {} namespaces", ctrl.mn, ctrl.sn, namespaces.len());
//!
//!     let smart = device.smart_log()?;
//!     println!("temperature: {} C", smart.temperature_celsius());
//!
//!     device.close()
//! }
//! ```
//!
//! Device nodes need read-write access, which usually means root or a
//! udev rule. A handle is strictly sequential; share one across threads
//! only behind a mutex.

pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod identify;
pub mod ioctl;
pub mod layout;
pub mod logpage;

// Re-exports
pub use command::{AdminCommand, AdminOpcode, IdentifyCns, LogPageId, MAX_LOG_PAGE_LEN, NSID_ALL};
pub use config::DeviceConfig;
pub use device::{IoctlPassthrough, NvmeDevice, Passthrough};
pub use error::{NvmeError, Result, StatusCode};
pub use identify::{ControllerIdentity, LbaFormat, NamespaceIdentity};
pub use ioctl::{request_code, Direction, NVME_IOCTL_ADMIN64_CMD};
pub use logpage::{ErrorLogEntry, FirmwareLog, SmartLog};
