//! zipl Boot Map Loader
//!
//! Host side of the boot map loader: opens the Linux block device holding a
//! zipl boot map, runs the [`bootmap`] reader on it, stages kernel and
//! initrd as local files and starts the kernel through kexec.
//!
//! # Modules
//!
//! - [`device`] - Block device handle with geometry and DASD type queries
//! - [`boot`] - Boot orchestration from identified objects to handoff
//! - [`attach`] - DASD and FCP disk attach/detach through sysfs
//! - [`uri`] - `dasd://` and `zfcp://` boot map URIs
//! - [`cmdline`] - Kernel command line composition
//! - [`fetch`] / [`kexec`] - Default collaborators
//! - [`inspect`] - Boot map listing for the `inspect` command

pub mod attach;
pub mod boot;
pub mod cmdline;
pub mod config;
pub mod device;
pub mod fetch;
pub mod inspect;
pub mod kexec;
pub mod uri;

pub use attach::{DasdDisk, DiskAttach, SysfsLayout, ZfcpDisk};
pub use boot::BootContext;
pub use config::{BootEntry, LoaderPaths};
pub use device::{open_disk, DeviceHandle};
pub use fetch::{Fetch, LocalFetcher};
pub use inspect::DiskReport;
pub use kexec::{Handoff, Kexec};
pub use uri::BootmapUri;
