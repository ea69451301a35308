//! Boot orchestration on the host
//!
//! [`bootmap::load_program`] carries a boot attempt up to
//! [`BootStage::IdentifyObjects`]. The functions here continue from there:
//! the kernel and initrd are written to local files, the parmfile becomes
//! the base of the kernel command line, and the staged kernel is handed to
//! the [`Handoff`] collaborator.

use crate::attach::{self, DiskAttach, SysfsLayout};
use crate::cmdline;
use crate::config::{BootEntry, LoaderPaths};
use crate::device::open_disk;
use crate::fetch::Fetch;
use crate::kexec::Handoff;
use crate::uri::BootmapUri;
use bootmap::types::KERNEL_HEADER_SIZE;
use bootmap::{copy_component, initrd_payload, load_program, parmfile_text, BootStage, Disk};
use bootmap::{Error, Result};
use gpt_disk_io::BlockIo;
use log::{info, warn};
use std::convert::Infallible;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Collaborators and paths of one boot attempt
pub struct BootContext<F, H> {
    pub paths: LoaderPaths,
    pub fetcher: F,
    pub handoff: H,
}

impl<F: Fetch, H: Handoff> BootContext<F, H> {
    pub fn new(paths: LoaderPaths, fetcher: F, handoff: H) -> Self {
        Self {
            paths,
            fetcher,
            handoff,
        }
    }

    /// Boot program `program` of an already opened disk
    ///
    /// Returns only on failure.
    pub fn boot_disk<B: BlockIo>(
        &mut self,
        entry: &BootEntry,
        disk: &mut Disk<B>,
        program: usize,
    ) -> Result<Infallible> {
        let objects = load_program(disk, program)?;

        info!("{}", BootStage::WriteKernel);
        let kernel = copy_component(disk, &objects.kernel)
            .map_err(|e| e.context("Error loading kernel"))?;
        write_file(&self.paths.kernel, &[&[0u8; KERNEL_HEADER_SIZE][..], kernel.as_slice()])
            .map_err(|e| Error::Io(format!("Error writing kernel file - {e}")))?;

        let initrd = match objects.initrd {
            Some(initrd) => {
                info!("{}", BootStage::WriteInitrd);
                let image = copy_component(disk, &initrd.ptr)
                    .map_err(|e| e.context("Error loading initrd"))?;
                let payload = initrd_payload(&image, initrd.len)?;
                write_file(&self.paths.initrd, &[payload])
                    .map_err(|e| Error::Io(format!("Error writing initrd file - {e}")))?;
                Some(self.paths.initrd.as_path())
            }
            None => None,
        };

        let base = match objects.parmfile {
            Some(parmfile) => {
                info!("{}", BootStage::WriteParmfile);
                let image = copy_component(disk, &parmfile)
                    .map_err(|e| e.context("Error loading parmfile"))?;
                parmfile_text(&image)
            }
            None => String::new(),
        };

        info!("{}", BootStage::ComposeCmdline);
        let extra = cmdline::config_cmdline(entry, &self.paths, &mut self.fetcher)?;
        let cmdline = cmdline::join(&base, &extra);

        info!("{}", BootStage::Handoff);
        self.handoff.handoff(&self.paths.kernel, initrd, &cmdline)
    }

    /// Boot program `program` from the block device at `device`
    pub fn boot_from_bootmap(
        &mut self,
        entry: &BootEntry,
        device: &Path,
        program: usize,
    ) -> Result<Infallible> {
        let mut disk = open_disk(device)?;
        self.boot_disk(entry, &mut disk, program)
    }

    /// Attach a disk, boot from it, and detach it again when booting fails
    pub fn boot_attached(
        &mut self,
        entry: &BootEntry,
        disk: &mut dyn DiskAttach,
        program: usize,
    ) -> Result<Infallible> {
        let device = disk.attach();
        let result = device.and_then(|device| self.boot_from_bootmap(entry, &device, program));
        disk.detach();
        result
    }

    /// Boot the entry's boot map URI
    pub fn bootmap_boot(&mut self, entry: &BootEntry, layout: SysfsLayout) -> Result<Infallible> {
        let uri = entry
            .bootmap
            .as_deref()
            .ok_or_else(|| Error::Format("Error - no boot map URI in boot entry".to_string()))?;
        let uri = BootmapUri::parse(uri)?;
        let mut disk = attach::for_uri(&uri, layout);
        self.boot_attached(entry, disk.as_mut(), uri.program())
    }
}

/// Write `parts` to a new file at `path`, removing it again on failure
fn write_file(path: &Path, parts: &[&[u8]]) -> io::Result<()> {
    let result = File::create(path).and_then(|mut file| {
        for part in parts {
            file.write_all(part)?;
        }
        file.sync_all()
    });
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Error removing {} - {e}", path.display());
            }
        }
    }
    result
}
