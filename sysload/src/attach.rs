//! Boot disk attach and detach through sysfs
//!
//! Before a boot map can be read, the disk holding it has to be set online
//! and given a device node. [`DasdDisk`] handles ECKD and FBA DASDs on a CCW
//! bus ID, [`ZfcpDisk`] handles SCSI LUNs behind an FCP channel. Detaching
//! undoes the attach steps in reverse order; failures there are only logged.

use crate::uri::BootmapUri;
use bootmap::{Error, Result};
use log::{debug, warn};
use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const DASD_ONLINE_DELAY: Duration = Duration::from_millis(100);
const ZFCP_ONLINE_DELAY: Duration = Duration::from_millis(200);

/// Makes a boot disk available as a block device node
pub trait DiskAttach {
    /// Bring the disk online and return its device node
    fn attach(&mut self) -> Result<PathBuf>;

    /// Undo [`DiskAttach::attach`]
    fn detach(&mut self);
}

/// Roots of the sysfs and device node trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsLayout {
    pub sys: PathBuf,
    pub dev: PathBuf,
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self {
            sys: PathBuf::from("/sys"),
            dev: PathBuf::from("/dev"),
        }
    }
}

/// Attach helper for the disk named by a boot map URI
pub fn for_uri(uri: &BootmapUri, layout: SysfsLayout) -> Box<dyn DiskAttach> {
    match uri {
        BootmapUri::Dasd { busid, .. } => Box::new(DasdDisk::new(busid, layout)),
        BootmapUri::Zfcp {
            busid, wwpn, lun, ..
        } => Box::new(ZfcpDisk::new(busid, wwpn, lun, layout)),
    }
}

/// DASD on a CCW bus ID
#[derive(Debug)]
pub struct DasdDisk {
    busid: String,
    layout: SysfsLayout,
    node: Option<PathBuf>,
}

impl DasdDisk {
    pub fn new(busid: &str, layout: SysfsLayout) -> Self {
        Self {
            busid: busid.to_string(),
            layout,
            node: None,
        }
    }

    fn device_dir(&self) -> PathBuf {
        self.layout.sys.join("bus/ccw/devices").join(&self.busid)
    }
}

impl DiskAttach for DasdDisk {
    fn attach(&mut self) -> Result<PathBuf> {
        let busid = &self.busid;
        let dir = self.device_dir();
        if !dir.exists() {
            return Err(Error::Device(format!(
                "Error setting DASD '{busid}' online - no such channel device"
            )));
        }

        let online = dir.join("online");
        if echo_and_test(&online, "1", DASD_ONLINE_DELAY, &online).ok() != Some(1) {
            return Err(Error::Device(format!("Error setting DASD '{busid}' online")));
        }

        let dev_file = find_block_dev(&dir).ok_or_else(|| {
            Error::Device(format!(
                "Error setting DASD '{busid}' online - could not get block:* sysfs link"
            ))
        })?;
        let dev_numbers = read_trimmed(&dev_file).map_err(|e| {
            Error::Device(format!(
                "Error getting device node information for DASD '{busid}' - {e}"
            ))
        })?;
        let (major, minor) = parse_dev_numbers(&dev_numbers).ok_or_else(|| {
            Error::Device(format!(
                "Error getting device node information for DASD '{busid}'"
            ))
        })?;

        let node = self.layout.dev.join(format!("b{busid}"));
        make_block_node(&node, major, minor).map_err(|e| {
            Error::Device(format!("Error creating device node for DASD '{busid}' - {e}"))
        })?;
        debug!("DASD {} attached as {}", busid, node.display());
        self.node = Some(node.clone());
        Ok(node)
    }

    fn detach(&mut self) {
        if let Err(e) = fs::write(self.device_dir().join("online"), "0") {
            warn!("Error setting DASD '{}' offline - {e}", self.busid);
        }
        remove_node(self.node.take());
    }
}

/// SCSI LUN behind an FCP channel
#[derive(Debug)]
pub struct ZfcpDisk {
    busid: String,
    wwpn: String,
    lun: String,
    layout: SysfsLayout,
    scsi_device: Option<PathBuf>,
    node: Option<PathBuf>,
}

impl ZfcpDisk {
    pub fn new(busid: &str, wwpn: &str, lun: &str, layout: SysfsLayout) -> Self {
        Self {
            busid: busid.to_string(),
            wwpn: wwpn.to_string(),
            lun: lun.to_string(),
            layout,
            scsi_device: None,
            node: None,
        }
    }

    fn channel_dir(&self) -> PathBuf {
        self.layout.sys.join("bus/ccw/drivers/zfcp").join(&self.busid)
    }

    fn port_dir(&self) -> PathBuf {
        self.channel_dir().join(&self.wwpn)
    }

    fn name(&self) -> String {
        format!("{}:{}:{}", self.busid, self.wwpn, self.lun)
    }
}

impl DiskAttach for ZfcpDisk {
    fn attach(&mut self) -> Result<PathBuf> {
        let (busid, wwpn, lun) = (&self.busid, &self.wwpn, &self.lun);
        let channel = self.channel_dir();
        if !channel.exists() {
            return Err(Error::Device(format!(
                "Error setting FCP channel '{busid}' online - no such channel device"
            )));
        }

        let online = channel.join("online");
        if echo_and_test(&online, "1", ZFCP_ONLINE_DELAY, &online).ok() != Some(1) {
            return Err(Error::Device(format!(
                "Error setting FCP channel '{busid}' online"
            )));
        }

        let port = self.port_dir();
        if !port.exists() {
            let failed = port.join("failed");
            let port_add = channel.join("port_add");
            if echo_and_test(&port_add, wwpn, ZFCP_ONLINE_DELAY, &failed).ok() != Some(0) {
                return Err(Error::Device(format!(
                    "Error configuring WWPN '{wwpn}' on FCP channel '{busid}'"
                )));
            }
        }

        let unit = port.join(lun);
        if !unit.exists() {
            let failed = unit.join("failed");
            let unit_add = port.join("unit_add");
            if echo_and_test(&unit_add, lun, ZFCP_ONLINE_DELAY, &failed).ok() != Some(0) {
                return Err(Error::Device(format!(
                    "Error configuring LUN '{lun}' on WWPN '{wwpn}' on FCP channel '{busid}'"
                )));
            }
        }

        let name = self.name();
        let node_info_error = |detail: Option<String>| {
            let msg = format!("Error getting device node information for FCP disk {name}");
            Error::Device(match detail {
                Some(detail) => format!("{msg} - {detail}"),
                None => msg,
            })
        };
        let devices = self.layout.sys.join("bus/scsi/devices");
        let scsi_device =
            find_scsi_device(&devices, busid, wwpn, lun).ok_or_else(|| node_info_error(None))?;
        self.scsi_device = Some(scsi_device.clone());
        let dev_file = find_block_dev(&scsi_device).ok_or_else(|| {
            node_info_error(Some("could not get block:* sysfs link".to_string()))
        })?;
        let dev_numbers =
            read_trimmed(&dev_file).map_err(|e| node_info_error(Some(e.to_string())))?;
        let (major, minor) =
            parse_dev_numbers(&dev_numbers).ok_or_else(|| node_info_error(None))?;

        let node = self.layout.dev.join(format!("b{name}"));
        make_block_node(&node, major, minor).map_err(|e| {
            Error::Device(format!(
                "Error creating device node for FCP disk {name} - {e}"
            ))
        })?;
        debug!("FCP disk {} attached as {}", name, node.display());
        self.node = Some(node.clone());
        Ok(node)
    }

    fn detach(&mut self) {
        let name = self.name();
        if let Some(scsi_device) = self.scsi_device.take() {
            if let Err(e) = fs::write(scsi_device.join("delete"), "1") {
                warn!("Error removing SCSI device of FCP disk {name} - {e}");
            }
        }
        let channel = self.channel_dir();
        let steps = [
            (self.port_dir().join("unit_remove"), self.lun.as_str()),
            (channel.join("port_remove"), self.wwpn.as_str()),
            (channel.join("online"), "0"),
        ];
        for (file, data) in steps {
            if let Err(e) = fs::write(&file, data) {
                warn!("Error detaching FCP disk {name} - {}: {e}", file.display());
            }
        }
        remove_node(self.node.take());
    }
}

/// Write `data` to `echo`, wait `delay`, then read back `test` as an integer
fn echo_and_test(echo: &Path, data: &str, delay: Duration, test: &Path) -> io::Result<i64> {
    fs::write(echo, data)?;
    thread::sleep(delay);
    read_trimmed(test)?
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn read_trimmed(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

/// Locate the `dev` attribute of the block device below a sysfs device
///
/// Both the `block:<name>` link and the `block/<name>` directory layouts
/// are recognised.
fn find_block_dev(device: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(device).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("block:") {
            return Some(entry.path().join("dev"));
        }
        if name == "block" {
            let inner = fs::read_dir(entry.path()).ok()?.flatten().next()?;
            return Some(inner.path().join("dev"));
        }
    }
    None
}

/// Parse a `major:minor` pair
fn parse_dev_numbers(text: &str) -> Option<(u32, u32)> {
    let (major, minor) = text.trim().split_once(':')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Find the SCSI device whose `hba_id`, `wwpn` and `fcp_lun` attributes match
fn find_scsi_device(devices: &Path, busid: &str, wwpn: &str, lun: &str) -> Option<PathBuf> {
    let matches = |dir: &Path, attr: &str, expected: &str| {
        read_trimmed(&dir.join(attr)).is_ok_and(|value| value.eq_ignore_ascii_case(expected))
    };
    fs::read_dir(devices)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .find(|dir| {
            matches(dir, "hba_id", busid)
                && matches(dir, "wwpn", wwpn)
                && matches(dir, "fcp_lun", lun)
        })
}

fn make_block_node(node: &Path, major: u32, minor: u32) -> io::Result<()> {
    match fs::remove_file(node) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let path = CString::new(node.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: `path` is a valid NUL-terminated string
    let ret = unsafe {
        libc::mknod(
            path.as_ptr(),
            libc::S_IFBLK | 0o660,
            libc::makedev(major, minor),
        )
    };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn remove_node(node: Option<PathBuf>) {
    if let Some(node) = node {
        if let Err(e) = fs::remove_file(&node) {
            warn!("Error removing device node {} - {e}", node.display());
        }
    }
}
