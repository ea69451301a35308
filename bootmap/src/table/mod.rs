//! Magic-tagged boot map tables
//!
//! Program tables and component tables share one frame: a single physical
//! block starting with `"zIPL"`, followed by packed slots.

pub mod component;
pub mod program;

pub use component::ComponentTable;
pub use program::ProgramTable;

use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::pointer::BlockPointer;
use crate::types::MAGIC;
use alloc::format;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;

/// Read the single block holding a table
///
/// `what` names the table in error messages ("program table", ...).
fn read_table_block<B: BlockIo>(
    disk: &mut Disk<B>,
    ptr: &BlockPointer,
    what: &str,
) -> Result<Vec<u8>> {
    if ptr.block_count() != 0 {
        return Err(Error::Format(format!("Error - invalid {what} pointer")));
    }
    disk.read_region(ptr)
}

fn check_magic(block: &[u8], what: &str) -> Result<()> {
    if block.starts_with(MAGIC) {
        Ok(())
    } else {
        Err(Error::Format(format!("Error - invalid magic number in {what}")))
    }
}
