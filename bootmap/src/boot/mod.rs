//! Boot program loading
//!
//! Walks from the program table down to the boot objects of one program.
//! A boot attempt moves through [`BootStage`]s strictly in order; this crate
//! performs the stages up to [`BootStage::IdentifyObjects`], the host side
//! materializes the objects and hands off to the new kernel.

pub mod identify;
pub mod image;

pub use identify::identify_boot_objects;
pub use image::{initrd_payload, parmfile_text};

use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::table::{ComponentTable, ProgramTable};
use crate::types::{BootObjects, IplType};
use alloc::format;
use alloc::string::String;
use core::fmt;
use gpt_disk_io::BlockIo;
use log::info;

/// Stages of a boot attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootStage {
    /// Check the requested program number
    ValidateIndex,
    /// Read the program table
    LoadProgramTable,
    /// Read the component table of the program
    LoadComponentTable,
    /// Locate kernel, initrd and parmfile
    IdentifyObjects,
    /// Write the kernel image file
    WriteKernel,
    /// Write the initrd file
    WriteInitrd,
    /// Read the parmfile component
    WriteParmfile,
    /// Assemble the kernel command line
    ComposeCmdline,
    /// Start the new kernel
    Handoff,
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValidateIndex => "validating program number",
            Self::LoadProgramTable => "loading program table",
            Self::LoadComponentTable => "loading component table",
            Self::IdentifyObjects => "identifying boot objects",
            Self::WriteKernel => "writing kernel image",
            Self::WriteInitrd => "writing initrd",
            Self::WriteParmfile => "reading parmfile",
            Self::ComposeCmdline => "composing kernel command line",
            Self::Handoff => "starting kernel",
        };
        f.write_str(name)
    }
}

/// Load program `program` from the disk's boot map and identify its objects
///
/// The program number is checked against the table capacity before anything
/// is read from the disk.
pub fn load_program<B: BlockIo>(disk: &mut Disk<B>, program: usize) -> Result<BootObjects> {
    info!("{}", BootStage::ValidateIndex);
    if program >= ProgramTable::capacity(disk.info().format) {
        return Err(Error::format("Error - program number out of valid range."));
    }

    info!("{}", BootStage::LoadProgramTable);
    let programs = ProgramTable::read(disk)?;
    let table_ptr = programs
        .entry(program)
        .ok_or_else(|| Error::Format(format!("Error - program entry {program} is empty.")))?;

    info!("{}", BootStage::LoadComponentTable);
    let components = ComponentTable::read(disk, &table_ptr)?;
    if components.ipl_type == IplType::DumpDirected {
        return Err(Error::Unsupported(String::from(
            "Error - load-with-dump-list-directed IPL is not supported.",
        )));
    }

    info!("{}", BootStage::IdentifyObjects);
    identify_boot_objects(disk, &components)
}
