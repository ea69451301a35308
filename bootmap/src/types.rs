//! Common types and constants for zipl boot maps

use crate::error::{Error, Result};
use crate::pointer::{BlockPointer, PointerFormat};
use alloc::format;
use core::fmt;

/// Magic number identifying boot map data structures
pub const MAGIC: &[u8; 4] = b"zIPL";

/// The program table always occupies a 512 byte region
pub const PROGRAM_TABLE_SIZE: usize = 512;

/// Unit of the raw device size reported by the kernel
pub const DEVICE_SECTOR_SIZE: u64 = 512;

/// zipl strips the kernel image header; this many zero bytes restore it
pub const KERNEL_HEADER_SIZE: usize = 65536;

/// Address bits of a 31-bit PSW
pub const PSW_ADDRESS_MASK: u64 = 0x0000_0000_7fff_ffff;

/// PSW loaded by data segment (dump) boot entries
pub const PSW_DISABLED_WAIT: u64 = 0x000a_0000_0000_0000;

/// Size of a component table entry
pub const COMPONENT_ENTRY_SIZE: usize = 32;

/// Size of the stage 3 parameter block
pub const STAGE3_PARAMS_SIZE: usize = 32;

/// Disk access method family
///
/// Determines the block pointer wire layout and the addressing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskType {
    /// FCP attached SCSI disk (linear addressing)
    Scsi,
    /// Fixed block architecture DASD (linear addressing)
    Fba,
    /// Diagnose access virtual disk (never bootable here)
    Diag,
    /// ECKD DASD with classic (LDL) layout
    EckdClassic,
    /// ECKD DASD with compatible (CDL) layout
    EckdCompatible,
    /// Disk the driver could not classify
    Unknown,
}

impl DiskType {
    /// Block pointer layout used on this disk type
    ///
    /// Diag and unknown disks have no supported layout.
    pub const fn pointer_format(self) -> Option<PointerFormat> {
        match self {
            Self::Scsi => Some(PointerFormat::Scsi),
            Self::Fba => Some(PointerFormat::Fba),
            Self::EckdClassic | Self::EckdCompatible => Some(PointerFormat::Eckd),
            Self::Diag | Self::Unknown => None,
        }
    }

    /// Does this disk use cylinder/head/sector addressing?
    pub const fn is_chs(self) -> bool {
        matches!(self, Self::EckdClassic | Self::EckdCompatible)
    }

    /// Short name used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scsi => "SCSI",
            Self::Fba => "FBA",
            Self::Diag => "DIAG",
            Self::EckdClassic => "ECKD (classic)",
            Self::EckdCompatible => "ECKD (compatible)",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Disk geometry as reported by the driver
///
/// Only meaningful for CHS addressed (ECKD) disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    /// Tracks per cylinder
    pub heads: u32,
    /// Blocks per track
    pub sectors: u32,
    /// Number of cylinders
    pub cylinders: u32,
}

/// Vital data of an opened disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskInfo {
    /// Access method family
    pub disk_type: DiskType,
    /// Block pointer layout (derived from `disk_type`)
    pub format: PointerFormat,
    /// Physical block size in bytes
    pub phy_block_size: u32,
    /// Device capacity in physical blocks
    pub phy_blocks: u64,
    /// Device geometry
    pub geometry: Geometry,
}

impl DiskInfo {
    /// Physical block size as a buffer length
    pub fn block_len(&self) -> usize {
        self.phy_block_size as usize
    }

    /// Size in bytes of the region addressed by `ptr`
    pub fn region_len(&self, ptr: &BlockPointer) -> usize {
        ptr.blocks() as usize * self.block_len()
    }

    /// Is `ptr` a valid address on this disk?
    ///
    /// The size field must equal the physical block size and the start
    /// address must lie within the device capacity (linear) or geometry (CHS).
    pub fn is_valid(&self, ptr: &BlockPointer) -> bool {
        if u32::from(ptr.size()) != self.phy_block_size {
            return false;
        }
        match (*ptr, self.format) {
            (BlockPointer::Linear { block, .. }, PointerFormat::Scsi | PointerFormat::Fba) => {
                block < self.phy_blocks
            }
            (BlockPointer::Chs { cyl, head, sec, .. }, PointerFormat::Eckd) => {
                let geo = &self.geometry;
                u32::from(cyl) < geo.cylinders
                    && u32::from(head) < geo.heads
                    && sec >= 1
                    && u32::from(sec) <= geo.sectors
            }
            _ => false,
        }
    }

    /// Linear physical block number of the first block addressed by `ptr`
    pub fn linear_block(&self, ptr: &BlockPointer) -> u64 {
        match *ptr {
            BlockPointer::Linear { block, .. } => block,
            BlockPointer::Chs { cyl, head, sec, .. } => {
                let geo = &self.geometry;
                let track = u64::from(head) + u64::from(cyl) * u64::from(geo.heads);
                u64::from(sec) + u64::from(geo.sectors) * track - 1
            }
        }
    }
}

/// Component table entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComponentKind {
    /// Jump to the stored PSW
    Execute = 0x01,
    /// Load segments to the stored address
    Load = 0x02,
}

impl ComponentKind {
    /// Parse the type byte of a component entry
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Execute),
            0x02 => Some(Self::Load),
            _ => None,
        }
    }
}

/// IPL flavour stored in the component table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IplType {
    /// Ordinary list-directed IPL
    Ordinary = 0x00,
    /// Load-with-dump list-directed IPL
    DumpDirected = 0x01,
}

impl IplType {
    /// Parse the `opt` byte of a component table header
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Self::Ordinary),
            0x01 => Ok(Self::DumpDirected),
            _ => Err(Error::format("Error - invalid list directed IPL type.")),
        }
    }
}

/// Component table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentEntry {
    /// First segment table of the component (`None` for unused slots)
    pub segment_ptr: Option<BlockPointer>,
    /// Entry type (`None` for unused slots)
    pub kind: Option<ComponentKind>,
    /// Load address, or PSW for execute entries
    pub address: u64,
}

impl ComponentEntry {
    /// PSW of an execute entry
    pub fn load_psw(&self) -> u64 {
        self.address
    }
}

/// Parameter block at the start of zipl's stage 3 loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stage3Params {
    /// Load address of the parmfile
    pub parm_addr: u64,
    /// Load address of the initrd
    pub initrd_addr: u64,
    /// Exact initrd length in bytes
    pub initrd_len: u64,
    /// PSW used to start the kernel
    pub load_psw: u64,
}

impl Stage3Params {
    /// Parse the big-endian parameter block from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < STAGE3_PARAMS_SIZE {
            return Err(Error::Format(format!(
                "Error - stage 3 loader too short ({} bytes)",
                data.len()
            )));
        }
        let field = |n: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&data[n * 8..n * 8 + 8]);
            u64::from_be_bytes(raw)
        };
        Ok(Self {
            parm_addr: field(0),
            initrd_addr: field(1),
            initrd_len: field(2),
            load_psw: field(3),
        })
    }

    /// Kernel entry address encoded in the load PSW
    pub fn kernel_address(&self) -> u64 {
        self.load_psw & PSW_ADDRESS_MASK
    }
}

/// Initrd component located through the stage 3 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitrdObject {
    /// First segment table of the initrd
    pub ptr: BlockPointer,
    /// Trusted length; the copied image may carry block padding beyond it
    pub len: u64,
}

/// Boot objects of one boot program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootObjects {
    /// Kernel image component
    pub kernel: BlockPointer,
    /// Initial RAM disk, if the program has one
    pub initrd: Option<InitrdObject>,
    /// Kernel parameter file, if the program has one
    pub parmfile: Option<BlockPointer>,
}
