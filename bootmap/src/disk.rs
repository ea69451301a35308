//! Geometry-aware access to a boot disk
//!
//! [`Disk`] owns the block device for the duration of one boot attempt. It
//! knows the disk type, the physical block size and the device capacity, and
//! translates block pointers into reads on the underlying [`BlockIo`].

use crate::error::{Error, Result};
use crate::pointer::{self, BlockPointer};
use crate::record;
use crate::types::{DiskInfo, DiskType, Geometry};
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::debug;

/// An opened boot disk
pub struct Disk<B: BlockIo> {
    io: B,
    info: DiskInfo,
    program_table_ptr: Option<BlockPointer>,
}

impl<B: BlockIo> Disk<B> {
    /// Attach to a block device without reading anything from it
    ///
    /// The physical block size and capacity are taken from the device.
    /// Diag and unknown disks are rejected here.
    pub fn attach(mut io: B, disk_type: DiskType, geometry: Geometry) -> Result<Self> {
        let format = disk_type
            .pointer_format()
            .ok_or_else(|| Error::Unsupported(String::from("Unsupported disk type.")))?;

        let phy_block_size = io.block_size().to_u32();
        let phy_blocks = io
            .num_blocks()
            .map_err(|e| Error::Device(format!("Error getting device size - {e}")))?;

        let info = DiskInfo {
            disk_type,
            format,
            phy_block_size,
            phy_blocks,
            geometry,
        };
        debug!(
            "attached {} disk: {} blocks of {} bytes, geometry {:?}",
            disk_type, phy_blocks, phy_block_size, geometry
        );

        Ok(Self {
            io,
            info,
            program_table_ptr: None,
        })
    }

    /// Attach to a block device and read its boot record
    ///
    /// On success the program table pointer is known and valid.
    pub fn open(io: B, disk_type: DiskType, geometry: Geometry) -> Result<Self> {
        let mut disk = Self::attach(io, disk_type, geometry)?;
        let ptr = record::read_boot_record(&mut disk)?;
        if !pointer::validate(&ptr, &disk.info) {
            return Err(Error::format(
                "Error - invalid program table pointer in boot record",
            ));
        }
        debug!("program table at {}", ptr);
        disk.program_table_ptr = Some(ptr);
        Ok(disk)
    }

    /// Disk parameters
    pub fn info(&self) -> &DiskInfo {
        &self.info
    }

    /// Program table pointer read from the boot record
    ///
    /// `None` until the boot record has been read by [`Disk::open`].
    pub fn program_table_ptr(&self) -> Option<BlockPointer> {
        self.program_table_ptr
    }

    /// Underlying block device
    pub fn block_io(&self) -> &B {
        &self.io
    }

    /// Read the blocks addressed by `ptr` into `buf`
    ///
    /// `buf` must hold exactly `(block_count + 1) * phy_block_size` bytes.
    pub fn read_phy_blocks(&mut self, ptr: &BlockPointer, buf: &mut [u8]) -> Result<()> {
        if !pointer::validate(ptr, &self.info) {
            return Err(Error::format(
                "Error reading block from disk - invalid block pointer",
            ));
        }
        if buf.len() != self.info.region_len(ptr) {
            return Err(Error::Io(format!(
                "Error reading data from disk - buffer of {} bytes for {} blocks",
                buf.len(),
                ptr.blocks()
            )));
        }

        let lba = Lba(self.info.linear_block(ptr));
        self.io
            .read_blocks(lba, buf)
            .map_err(|e| Error::Io(format!("Error reading data from disk - {e}")))
    }

    /// Read the blocks addressed by `ptr` into a fresh buffer
    pub fn read_region(&mut self, ptr: &BlockPointer) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.info.region_len(ptr)];
        self.read_phy_blocks(ptr, &mut buf)?;
        Ok(buf)
    }
}
