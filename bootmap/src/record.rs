//! Boot record parsing
//!
//! The boot record sits at a fixed location and holds the pointer to the
//! program table:
//! - SCSI and FBA disks: master boot record in the first physical block,
//!   `"zIPL"` at offset 0, program table pointer at offset 16, PC BIOS
//!   signature `0x55 0xAA` at offsets 510-511
//! - ECKD disks: block at cylinder 0, head 0, record 2, program table pointer
//!   at offset 4 (the magic is checked on the program table itself)

use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::pointer::{self, BlockPointer, PointerFormat};
use crate::types::{DiskType, MAGIC};
use alloc::string::String;
use gpt_disk_io::BlockIo;

/// Offset of the program table pointer in a SCSI/FBA master boot record
pub const MBR_PROGRAM_TABLE_OFFSET: usize = 16;

/// Offset of the program table pointer in a DASD boot record
pub const DASD_PROGRAM_TABLE_OFFSET: usize = 4;

/// PC BIOS boot signature at offsets 510-511
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// CHS record number of the DASD boot record
pub const DASD_BOOT_RECORD_SECTOR: u8 = 2;

/// Read the boot record of `disk` and return its program table pointer
pub fn read_boot_record<B: BlockIo>(disk: &mut Disk<B>) -> Result<BlockPointer> {
    let info = *disk.info();
    let size = u16::try_from(info.phy_block_size)
        .map_err(|_| Error::format("Error - unsupported physical block size"))?;

    match info.disk_type {
        DiskType::Scsi | DiskType::Fba => {
            let block = disk.read_region(&BlockPointer::Linear {
                block: 0,
                size,
                block_count: 0,
            })?;
            parse_scsi_mbr(info.format, &block)
        }
        DiskType::EckdClassic | DiskType::EckdCompatible => {
            let block = disk.read_region(&BlockPointer::Chs {
                cyl: 0,
                head: 0,
                sec: DASD_BOOT_RECORD_SECTOR,
                size,
                block_count: 0,
            })?;
            parse_dasd_boot_record(&block)
        }
        DiskType::Diag | DiskType::Unknown => {
            Err(Error::Unsupported(String::from("Unsupported disk type.")))
        }
    }
}

/// Parse a SCSI/FBA master boot record
pub fn parse_scsi_mbr(format: PointerFormat, block: &[u8]) -> Result<BlockPointer> {
    if block.get(510..512) != Some(&BOOT_SIGNATURE[..]) {
        return Err(Error::format("Unsupported SCSI disk layout."));
    }
    if !block.starts_with(MAGIC) {
        return Err(Error::format("Missing boot signature on SCSI disk."));
    }
    program_table_ptr(format, &block[MBR_PROGRAM_TABLE_OFFSET..])
}

/// Parse a DASD boot record
pub fn parse_dasd_boot_record(block: &[u8]) -> Result<BlockPointer> {
    let raw = block
        .get(DASD_PROGRAM_TABLE_OFFSET..)
        .ok_or_else(|| Error::format("Error - DASD boot record too short"))?;
    program_table_ptr(PointerFormat::Eckd, raw)
}

fn program_table_ptr(format: PointerFormat, raw: &[u8]) -> Result<BlockPointer> {
    pointer::decode(format, raw)?
        .ok_or_else(|| Error::format("Error - no program table pointer in boot record"))
}
