//! zipl Boot Map Reader
//!
//! A `no_std` reader for the boot maps written by the s390 `zipl` tool.
//!
//! # Overview
//!
//! A boot map is a small directory of chained pointer tables on a raw disk.
//! This crate provides:
//! - Block pointer decoding for SCSI, FBA and ECKD disk layouts
//! - Boot record parsing (SCSI/FBA master boot record, DASD boot record)
//! - Program table and component table parsing
//! - Segment table walking to rebuild component images in memory
//! - Kernel/initrd/parmfile identification via the stage 3 parameter block
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Pointer layer** - Decodes and validates packed block pointers
//! 2. **Disk layer** - Geometry-aware physical block reads over [`BlockIo`]
//! 3. **Table layer** - Boot record, program table and component tables
//! 4. **Boot layer** - Segment walking and boot object identification
//!
//! # Usage
//!
//! ```ignore
//! use bootmap::{copy_component, load_program, Disk, DiskType, Geometry};
//!
//! // Attach to an opened block device and read its boot record
//! let mut disk = Disk::open(block_io, DiskType::EckdCompatible, geometry)?;
//!
//! // Locate kernel, initrd and parmfile of boot program 0
//! let objects = load_program(&mut disk, 0)?;
//!
//! // Rebuild the kernel image from its segment tables
//! let kernel = copy_component(&mut disk, &objects.kernel)?;
//! ```
//!
//! [`BlockIo`]: gpt_disk_io::BlockIo

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod boot;
pub mod disk;
pub mod error;
pub mod pointer;
pub mod record;
pub mod segment;
pub mod table;
pub mod types;

pub use error::{Error, Result};
pub use pointer::{BlockPointer, PointerFormat};
pub use types::{
    BootObjects, ComponentEntry, ComponentKind, DiskInfo, DiskType, Geometry, InitrdObject,
    IplType, Stage3Params,
};

// High-level API exports
pub use boot::{
    identify_boot_objects, initrd_payload, load_program, parmfile_text, BootStage,
};
pub use disk::Disk;
pub use segment::copy_component;
pub use table::{ComponentTable, ProgramTable};
