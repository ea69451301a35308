//! Segment table walking
//!
//! A component is stored as a chain of segment tables. Each table is an array
//! of block pointers addressing extents of the component; the chain ends at
//! the first null pointer. When the last slot of a table is in use it points
//! to the next segment table instead of an extent.

use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::pointer::{self, BlockPointer};
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use log::trace;

/// One segment table held in memory with its slot cursor
struct SegmentTable {
    data: Vec<u8>,
    slots: usize,
    cursor: usize,
}

impl SegmentTable {
    fn read<B: BlockIo>(disk: &mut Disk<B>, ptr: &BlockPointer) -> Result<Self> {
        let data = disk.read_region(ptr)?;
        let slots = data.len() / disk.info().format.size();
        trace!("segment table at {} with {} slots", ptr, slots);
        Ok(Self { data, slots, cursor: 0 })
    }

    fn current<B: BlockIo>(&self, disk: &Disk<B>) -> Result<Option<BlockPointer>> {
        pointer::decode_slot(disk.info().format, &self.data, self.cursor)
    }

    fn at_last_slot(&self) -> bool {
        self.cursor + 1 == self.slots
    }
}

/// Copy the component whose first segment table is `ptr` into memory
///
/// Extents are concatenated in table order. The result is a multiple of the
/// physical block size; trailing padding is the caller's concern.
pub fn copy_component<B: BlockIo>(disk: &mut Disk<B>, ptr: &BlockPointer) -> Result<Vec<u8>> {
    let mut table = SegmentTable::read(disk, ptr)?;
    let mut image = Vec::new();
    let mut extent = table.current(disk)?;

    while let Some(code_ptr) = extent {
        if !pointer::validate(&code_ptr, disk.info()) {
            return Err(Error::format(
                "Error reading block from disk - invalid block pointer",
            ));
        }
        let start = image.len();
        image.resize(start + disk.info().region_len(&code_ptr), 0);
        disk.read_phy_blocks(&code_ptr, &mut image[start..])?;
        trace!("copied extent {} ({} bytes total)", code_ptr, image.len());

        table.cursor += 1;
        extent = table.current(disk)?;

        if let Some(next) = extent.filter(|_| table.at_last_slot()) {
            table = SegmentTable::read(disk, &next)?;
            extent = table.current(disk)?;
        }
    }

    Ok(image)
}
