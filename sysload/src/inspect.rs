//! Human-readable boot map listing

use bootmap::{BlockPointer, ComponentKind, ComponentTable, Disk, DiskInfo, ProgramTable, Result};
use gpt_disk_io::BlockIo;
use std::fmt;

/// One program table slot and its component table
#[derive(Debug)]
pub struct ProgramReport {
    pub index: usize,
    pub table_ptr: BlockPointer,
    /// Decoded component table, or the message of the failed read
    pub components: std::result::Result<ComponentTable, String>,
}

/// Everything `sysload inspect` prints about a disk
#[derive(Debug)]
pub struct DiskReport {
    pub info: DiskInfo,
    pub program_table_ptr: Option<BlockPointer>,
    pub programs: Vec<ProgramReport>,
}

impl DiskReport {
    /// Read the program table and every component table it references
    ///
    /// A broken component table is recorded in the report instead of
    /// failing the whole listing.
    pub fn collect<B: BlockIo>(disk: &mut Disk<B>) -> Result<Self> {
        let program_table = ProgramTable::read(disk)?;
        let programs = program_table
            .iter()
            .map(|(index, table_ptr)| ProgramReport {
                index,
                table_ptr,
                components: ComponentTable::read(disk, &table_ptr).map_err(|e| e.into_message()),
            })
            .collect();
        Ok(Self {
            info: *disk.info(),
            program_table_ptr: disk.program_table_ptr(),
            programs,
        })
    }
}

impl fmt::Display for DiskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "disk type:     {}", self.info.disk_type)?;
        writeln!(f, "block size:    {}", self.info.phy_block_size)?;
        writeln!(f, "blocks:        {}", self.info.phy_blocks)?;
        match &self.program_table_ptr {
            Some(ptr) => writeln!(f, "program table: {ptr}")?,
            None => writeln!(f, "program table: none")?,
        }
        for program in &self.programs {
            writeln!(f, "program {}: {}", program.index, program.table_ptr)?;
            let table = match &program.components {
                Ok(table) => table,
                Err(msg) => {
                    writeln!(f, "  {msg}")?;
                    continue;
                }
            };
            writeln!(f, "  ipl type: {:?}", table.ipl_type)?;
            for entry in &table.entries {
                match (entry.kind, &entry.segment_ptr) {
                    (Some(ComponentKind::Execute), _) => {
                        writeln!(f, "  execute psw=0x{:016x}", entry.load_psw())?;
                    }
                    (Some(ComponentKind::Load), Some(ptr)) => {
                        writeln!(f, "  load addr=0x{:x} {ptr}", entry.address)?;
                    }
                    (Some(ComponentKind::Load), None) => {
                        writeln!(f, "  load addr=0x{:x} (no segment table)", entry.address)?;
                    }
                    (None, _) => {}
                }
            }
        }
        Ok(())
    }
}
