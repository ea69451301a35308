//! Program table
//!
//! Lists the boot programs of a boot map. Slot 0 of the 512 byte region holds
//! the magic, every following pointer-sized slot addresses the component
//! table of one program.

use super::{check_magic, read_table_block};
use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::pointer::{self, BlockPointer, PointerFormat};
use crate::types::PROGRAM_TABLE_SIZE;
use alloc::format;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use log::debug;

const WHAT: &str = "program table";

/// Decoded program table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramTable {
    entries: Vec<Option<BlockPointer>>,
}

impl ProgramTable {
    /// Number of program slots for a pointer layout
    ///
    /// 55 on ECKD, 63 on FBA and 31 on SCSI disks.
    pub const fn capacity(format: PointerFormat) -> usize {
        PROGRAM_TABLE_SIZE / format.size() - 1
    }

    /// Parse a program table from the start of `block`
    pub fn parse(format: PointerFormat, block: &[u8]) -> Result<Self> {
        check_magic(block, WHAT)?;
        if block.len() < PROGRAM_TABLE_SIZE {
            return Err(Error::Format(format!(
                "Error - {WHAT} too short ({} bytes)",
                block.len()
            )));
        }

        let region = &block[..PROGRAM_TABLE_SIZE];
        let entries = (1..=Self::capacity(format))
            .map(|slot| pointer::decode_slot(format, region, slot))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Read the program table addressed by the disk's boot record
    pub fn read<B: BlockIo>(disk: &mut Disk<B>) -> Result<Self> {
        let ptr = disk
            .program_table_ptr()
            .ok_or_else(|| Error::format("Error - invalid program table pointer"))?;
        let block = read_table_block(disk, &ptr, WHAT)?;
        let table = Self::parse(disk.info().format, &block)?;
        debug!(
            "program table: {} of {} slots in use",
            table.iter().count(),
            table.len()
        );
        Ok(table)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Does the table have no slots at all?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Component table pointer of program `index`
    ///
    /// `None` for empty slots and indices beyond the table.
    pub fn entry(&self, index: usize) -> Option<BlockPointer> {
        self.entries.get(index).copied().flatten()
    }

    /// Iterate over `(index, pointer)` of every non-empty slot
    pub fn iter(&self) -> impl Iterator<Item = (usize, BlockPointer)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, ptr)| ptr.map(|ptr| (index, ptr)))
    }
}
