//! Block pointer codec
//!
//! zipl addresses every on-disk structure through packed block pointers whose
//! layout depends on the disk type. All fields are stored big-endian.
//!
//! | Layout | Fields                                                    | Size |
//! |--------|-----------------------------------------------------------|------|
//! | SCSI   | u64 block, u16 size, u16 blockct, 4 reserved              | 16   |
//! | FBA    | u32 block, u16 size, u16 blockct                          | 8    |
//! | ECKD   | u16 cyl, u16 head, u8 sec, u16 size, u8 blockct, reserved | 9    |
//!
//! A pointer whose encoding is entirely zero is the null pointer. It marks
//! unused table slots and the end of segment chains, and is never a valid
//! address. Decoding returns `None` for it.

use crate::error::{Error, Result};
use crate::types::{DiskInfo, DiskType};
use alloc::format;
use core::fmt;

/// Wire layout of a block pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerFormat {
    /// 16 byte linear pointer
    Scsi,
    /// 8 byte linear pointer
    Fba,
    /// 9 byte cylinder/head/sector pointer
    Eckd,
}

impl PointerFormat {
    /// Encoded size in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Scsi => 16,
            Self::Fba => 8,
            Self::Eckd => 9,
        }
    }
}

/// Decoded block pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPointer {
    /// Linear block address (SCSI and FBA disks)
    Linear {
        /// First physical block
        block: u64,
        /// Block size the pointer was written for
        size: u16,
        /// Number of additional blocks following the first one
        block_count: u16,
    },
    /// Cylinder/head/sector address (ECKD disks)
    Chs {
        /// Cylinder
        cyl: u16,
        /// Head (track within cylinder)
        head: u16,
        /// Record on the track, starting at 1
        sec: u8,
        /// Block size the pointer was written for
        size: u16,
        /// Number of additional blocks following the first one
        block_count: u8,
    },
}

impl BlockPointer {
    /// Block size field
    pub fn size(&self) -> u16 {
        match *self {
            Self::Linear { size, .. } | Self::Chs { size, .. } => size,
        }
    }

    /// Number of additional blocks following the first one
    pub fn block_count(&self) -> u16 {
        match *self {
            Self::Linear { block_count, .. } => block_count,
            Self::Chs { block_count, .. } => u16::from(block_count),
        }
    }

    /// Total number of blocks addressed
    pub fn blocks(&self) -> u64 {
        u64::from(self.block_count()) + 1
    }
}

impl fmt::Display for BlockPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Linear { block, size, block_count } => {
                write!(f, "block={block}, size={size}, blockct={block_count}")
            }
            Self::Chs { cyl, head, sec, size, block_count } => write!(
                f,
                "cyl={cyl}, head={head}, sec={sec}, size={size}, blockct={block_count}"
            ),
        }
    }
}

/// Encoded pointer size for a disk type
///
/// Diag and unknown disks have no pointer layout and report 0.
pub fn size(disk_type: DiskType) -> usize {
    disk_type.pointer_format().map_or(0, PointerFormat::size)
}

/// Is the raw pointer encoding the null pointer?
pub fn is_null(raw: &[u8]) -> bool {
    raw.iter().all(|&b| b == 0)
}

/// Check `ptr` against the geometry and capacity of a disk
///
/// See [`DiskInfo::is_valid`].
pub fn validate(ptr: &BlockPointer, disk: &DiskInfo) -> bool {
    disk.is_valid(ptr)
}

/// Decode one packed pointer from the start of `raw`
///
/// # Returns
/// `None` for the null pointer, the decoded pointer otherwise
pub fn decode(format: PointerFormat, raw: &[u8]) -> Result<Option<BlockPointer>> {
    let len = format.size();
    let raw = raw.get(..len).ok_or_else(|| {
        Error::Format(format!(
            "Error - truncated block pointer ({} of {} bytes)",
            raw.len(),
            len
        ))
    })?;
    if is_null(raw) {
        return Ok(None);
    }

    let be16 = |at: usize| u16::from_be_bytes([raw[at], raw[at + 1]]);
    let ptr = match format {
        PointerFormat::Scsi => {
            let mut block = [0u8; 8];
            block.copy_from_slice(&raw[0..8]);
            BlockPointer::Linear {
                block: u64::from_be_bytes(block),
                size: be16(8),
                block_count: be16(10),
            }
        }
        PointerFormat::Fba => BlockPointer::Linear {
            block: u64::from(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
            size: be16(4),
            block_count: be16(6),
        },
        PointerFormat::Eckd => BlockPointer::Chs {
            cyl: be16(0),
            head: be16(2),
            sec: raw[4],
            size: be16(5),
            block_count: raw[7],
        },
    };
    Ok(Some(ptr))
}

/// Decode the pointer stored in slot `index` of a packed pointer array
///
/// Slots that do not fit completely inside `table` read as null.
pub fn decode_slot(
    format: PointerFormat,
    table: &[u8],
    index: usize,
) -> Result<Option<BlockPointer>> {
    let start = index * format.size();
    match table.get(start..start + format.size()) {
        Some(raw) => decode(format, raw),
        None => Ok(None),
    }
}
