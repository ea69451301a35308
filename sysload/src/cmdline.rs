//! Kernel command line composition

use crate::config::{prefix_root, BootEntry, LoaderPaths};
use crate::fetch::Fetch;
use bootmap::{Error, Result};
use std::fs;
use std::path::Path;

/// Longest command line accepted from a boot entry
pub const MAX_KERNEL_CMDLINE: usize = 4096;

/// Command line contributed by the boot entry
///
/// When the entry names a parmfile it is fetched to the local parmfile path
/// and its contents are joined with the entry's `cmdline`.
pub fn config_cmdline<F: Fetch + ?Sized>(
    entry: &BootEntry,
    paths: &LoaderPaths,
    fetcher: &mut F,
) -> Result<String> {
    let Some(parmfile) = entry.parmfile.as_deref() else {
        return Ok(entry.cmdline.clone());
    };
    let uri = prefix_root(&entry.root, parmfile);
    fetcher
        .fetch(&paths.parmfile, &uri)
        .map_err(|e| e.context("Error loading parmfile"))?;
    compose_with_parmfile(&paths.parmfile, &entry.cmdline)
}

/// Prepend the contents of the local file `path` to `cmdline`
pub fn compose_with_parmfile(path: &Path, cmdline: &str) -> Result<String> {
    let size = fs::metadata(path).map(|m| m.len()).map_err(|e| {
        Error::Io(format!(
            "Unable to access local parmfile '{}' - {e}",
            path.display()
        ))
    })?;
    if size.saturating_add(cmdline.len() as u64) > MAX_KERNEL_CMDLINE as u64 {
        return Err(Error::Format("Kernel command line too long.".to_string()));
    }
    let text = fs::read(path).map_err(|e| {
        Error::Io(format!(
            "Unable to read local parmfile '{}' - {e}",
            path.display()
        ))
    })?;
    Ok(join(&String::from_utf8_lossy(&text), cmdline))
}

/// Final command line: the boot map's parmfile text, a space, the extra text
pub fn join(base: &str, extra: &str) -> String {
    format!("{base} {extra}")
}
