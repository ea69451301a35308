//! Component table
//!
//! Describes one boot program. The header carries the magic and the IPL type
//! (`opt` byte at offset 4); each following 32 byte entry holds
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 23   | segment table pointer, zero padded      |
//! | 23     | 1    | type (0x01 execute, 0x02 load)          |
//! | 24     | 8    | load address or PSW (big-endian)        |

use super::{check_magic, read_table_block};
use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::pointer::{self, BlockPointer, PointerFormat};
use crate::types::{ComponentEntry, ComponentKind, IplType, COMPONENT_ENTRY_SIZE};
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use log::debug;

const WHAT: &str = "component table";
const OPT_OFFSET: usize = 4;
const TYPE_OFFSET: usize = 23;
const ADDRESS_OFFSET: usize = 24;

/// Decoded component table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTable {
    /// IPL flavour from the table header
    pub ipl_type: IplType,
    /// Entries in table order
    pub entries: Vec<ComponentEntry>,
}

impl ComponentTable {
    /// Number of entry slots for a pointer layout and block size
    pub const fn capacity(format: PointerFormat, phy_block_size: u32) -> usize {
        (phy_block_size as usize / format.size()).saturating_sub(1)
    }

    /// Parse a component table block
    ///
    /// Only entries lying completely inside `block` are decoded.
    pub fn parse(format: PointerFormat, block: &[u8]) -> Result<Self> {
        check_magic(block, WHAT)?;
        let opt = block
            .get(OPT_OFFSET)
            .copied()
            .ok_or_else(|| Error::format("Error - component table too short"))?;
        let ipl_type = IplType::from_byte(opt)?;

        let slots = Self::capacity(format, block.len() as u32);
        let entries = block
            .chunks_exact(COMPONENT_ENTRY_SIZE)
            .skip(1)
            .take(slots)
            .map(|raw| parse_entry(format, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { ipl_type, entries })
    }

    /// Read the component table addressed by `ptr`
    pub fn read<B: BlockIo>(disk: &mut Disk<B>, ptr: &BlockPointer) -> Result<Self> {
        let block = read_table_block(disk, ptr, WHAT)?;
        let table = Self::parse(disk.info().format, &block)?;
        debug!(
            "component table at {}: {:?}, {} entries",
            ptr,
            table.ipl_type,
            table.entries.len()
        );
        Ok(table)
    }

    /// Index of the first execute entry
    pub fn execute_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.kind == Some(ComponentKind::Execute))
    }
}

fn parse_entry(format: PointerFormat, raw: &[u8]) -> Result<ComponentEntry> {
    let mut address = [0u8; 8];
    address.copy_from_slice(&raw[ADDRESS_OFFSET..ADDRESS_OFFSET + 8]);
    Ok(ComponentEntry {
        segment_ptr: pointer::decode(format, raw)?,
        kind: ComponentKind::from_byte(raw[TYPE_OFFSET]),
        address: u64::from_be_bytes(address),
    })
}
