//! Linux block device access
//!
//! Opens a disk read-only and queries the kernel for its geometry, block size,
//! capacity and DASD type. The opened [`DeviceHandle`] implements [`BlockIo`]
//! so the boot map reader can run on it; dropping it closes the descriptor.

use bootmap::types::DEVICE_SECTOR_SIZE;
use bootmap::{Disk, DiskType, Error, Geometry, Result};
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Get device geometry
const HDIO_GETGEO: u32 = 0x0301;
/// Get logical block size
const BLKSSZGET: u32 = 0x1268;
/// Get device size in 512 byte sectors
const BLKGETSIZE: u32 = 0x1260;
/// `_IOR('D', 1, dasd_information_t)`
const BIODASDINFO: u32 = (2 << 30) | ((DASD_INFO_SIZE as u32) << 16) | (0x44 << 8) | 1;

const DASD_INFO_SIZE: usize = 376;

/// `struct hd_geometry`
#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct HdGeometry {
    heads: u8,
    sectors: u8,
    cylinders: u16,
    start: libc::c_ulong,
}

/// `dasd_information_t`
#[repr(C)]
#[allow(dead_code)]
struct DasdInformation {
    devno: u32,
    real_devno: u32,
    schid: u32,
    /// cu_type:16 cu_model:8
    cu_type_model: u32,
    /// dev_type:16 dev_model:8
    dev_type_model: u32,
    open_count: u32,
    req_queue_len: u32,
    chanq_len: u32,
    kind: [u8; 4],
    status: u32,
    label_block: u32,
    fba_layout: u32,
    characteristics_size: u32,
    confdata_size: u32,
    characteristics: [u8; 64],
    configuration_data: [u8; 256],
}

const _: () = assert!(core::mem::size_of::<DasdInformation>() == DASD_INFO_SIZE);

/// Classify a DASD from its driver type string and layout flag
pub fn dasd_type(kind: &[u8; 4], fba_layout: bool) -> DiskType {
    match kind {
        b"FBA " => DiskType::Fba,
        b"DIAG" => DiskType::Diag,
        b"ECKD" if fba_layout => DiskType::EckdClassic,
        b"ECKD" => DiskType::EckdCompatible,
        _ => DiskType::Unknown,
    }
}

/// Device capacity in physical blocks from its size in 512 byte sectors
pub fn phy_blocks(sectors: u64, block_size: u32) -> u64 {
    let sectors_per_block = (u64::from(block_size) / DEVICE_SECTOR_SIZE).max(1);
    sectors / sectors_per_block
}

/// An opened block device
#[derive(Debug)]
pub struct DeviceHandle {
    file: File,
    path: PathBuf,
    disk_type: DiskType,
    geometry: Geometry,
    block_size: BlockSize,
    sectors: u64,
}

impl DeviceHandle {
    /// Open `path` and query its parameters
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| Error::Device(format!("Error opening disk - {e}")))?;
        let fd = file.as_raw_fd();

        let mut geo = HdGeometry::default();
        ioctl(fd, HDIO_GETGEO, &mut geo)
            .map_err(|e| Error::Device(format!("Error getting disk geometry - {e}")))?;

        let mut size: libc::c_int = 0;
        ioctl(fd, BLKSSZGET, &mut size)
            .map_err(|e| Error::Device(format!("Error getting blocksize - {e}")))?;
        let block_size = u32::try_from(size)
            .ok()
            .and_then(BlockSize::new)
            .ok_or_else(|| {
                Error::Device(format!("Error getting blocksize - invalid size {size}"))
            })?;

        let mut sectors: libc::c_ulong = 0;
        ioctl(fd, BLKGETSIZE, &mut sectors)
            .map_err(|e| Error::Device(format!("Error getting device size - {e}")))?;

        // SAFETY: an all-zero dasd_information_t is a valid value
        let mut info: DasdInformation = unsafe { std::mem::zeroed() };
        let disk_type = match ioctl(fd, BIODASDINFO, &mut info) {
            Ok(()) => dasd_type(&info.kind, info.fba_layout != 0),
            Err(e) => {
                debug!("{}: no DASD information ({e}), assuming SCSI", path.display());
                DiskType::Scsi
            }
        };

        let geometry = Geometry {
            heads: u32::from(geo.heads),
            sectors: u32::from(geo.sectors),
            cylinders: u32::from(geo.cylinders),
        };
        debug!(
            "{}: {} disk, {} byte blocks, {} sectors, {:?}",
            path.display(),
            disk_type,
            block_size.to_u32(),
            sectors,
            geometry
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            disk_type,
            geometry,
            block_size,
            sectors: u64::from(sectors),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn disk_type(&self) -> DiskType {
        self.disk_type
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }
}

impl BlockIo for DeviceHandle {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        self.block_size
    }

    fn num_blocks(&mut self) -> io::Result<u64> {
        Ok(phy_blocks(self.sectors, self.block_size.to_u32()))
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> io::Result<()> {
        self.file
            .read_exact_at(dst, start_lba.0 * self.block_size.to_u64())
    }

    fn write_blocks(&mut self, _start_lba: Lba, _src: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "boot disks are opened read-only",
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Open the block device at `path` and read its boot record
pub fn open_disk(path: &Path) -> Result<Disk<DeviceHandle>> {
    let handle = DeviceHandle::open(path)?;
    let (disk_type, geometry) = (handle.disk_type(), handle.geometry());
    Disk::open(handle, disk_type, geometry)
}

fn ioctl<T>(fd: libc::c_int, request: u32, arg: &mut T) -> io::Result<()> {
    // SAFETY: callers pair each request with the argument type the kernel
    // expects for it, and `arg` is valid for writes
    let ret = unsafe { libc::ioctl(fd, request as _, arg as *mut T) };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
