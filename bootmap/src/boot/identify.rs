//! Boot object identification
//!
//! zipl places a stage 3 loader in the load entry right before the execute
//! entry. Its parameter block names the addresses of the kernel, the initrd
//! and the parmfile, which are matched against the load addresses of the
//! preceding entries.

use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::pointer::BlockPointer;
use crate::segment::copy_component;
use crate::table::ComponentTable;
use crate::types::{
    BootObjects, ComponentEntry, InitrdObject, Stage3Params, PSW_DISABLED_WAIT,
};
use alloc::string::String;
use gpt_disk_io::BlockIo;
use log::debug;

fn invalid_table() -> Error {
    Error::format("Error - invalid component table found")
}

/// Locate kernel, initrd and parmfile of a component table
pub fn identify_boot_objects<B: BlockIo>(
    disk: &mut Disk<B>,
    table: &ComponentTable,
) -> Result<BootObjects> {
    let exec = match table.execute_index() {
        Some(index) if index > 0 => index,
        _ => return Err(invalid_table()),
    };
    if table.entries[exec].load_psw() == PSW_DISABLED_WAIT {
        return Err(Error::Unsupported(String::from(
            "Error - data segment load is not supported",
        )));
    }

    let stage3_ptr = table.entries[exec - 1]
        .segment_ptr
        .ok_or_else(invalid_table)?;
    let stage3 = Stage3Params::parse(&copy_component(disk, &stage3_ptr)?)?;
    debug!("stage 3 parameters: {:x?}", stage3);

    let loads = &table.entries[..exec];
    let kernel = segment_at(loads, stage3.kernel_address()).ok_or_else(invalid_table)?;
    let initrd = segment_at(loads, stage3.initrd_addr).map(|ptr| InitrdObject {
        ptr,
        len: stage3.initrd_len,
    });
    let parmfile = segment_at(loads, stage3.parm_addr);

    let objects = BootObjects {
        kernel,
        initrd,
        parmfile,
    };
    debug!("boot objects: {:?}", objects);
    Ok(objects)
}

/// Segment pointer of the first entry loaded at `address`
fn segment_at(entries: &[ComponentEntry], address: u64) -> Option<BlockPointer> {
    entries
        .iter()
        .find(|entry| entry.address == address)
        .and_then(|entry| entry.segment_ptr)
}
