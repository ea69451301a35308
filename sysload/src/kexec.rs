//! Kernel handoff

use bootmap::{Error, Result};
use log::info;
use std::convert::Infallible;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Starts a staged kernel
///
/// A successful handoff replaces the running system and never returns, so
/// the only value an implementation can produce is an error.
pub trait Handoff {
    fn handoff(
        &mut self,
        kernel: &Path,
        initrd: Option<&Path>,
        cmdline: &str,
    ) -> Result<Infallible>;
}

/// Handoff through the kexec tool
#[derive(Debug, Clone)]
pub struct Kexec {
    binary: PathBuf,
}

impl Kexec {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments of the `kexec -l` invocation
    pub fn load_args(kernel: &Path, initrd: Option<&Path>, cmdline: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("-l")];
        if let Some(initrd) = initrd {
            let mut arg = OsString::from("--initrd=");
            arg.push(initrd);
            args.push(arg);
        }
        if !cmdline.is_empty() {
            args.push(OsString::from(format!("--command-line={cmdline}")));
        }
        args.push(kernel.as_os_str().to_os_string());
        args
    }

    fn run(&self, args: &[OsString]) -> i32 {
        Command::new(&self.binary)
            .args(args)
            .status()
            .ok()
            .and_then(|status| status.code())
            .unwrap_or(-1)
    }
}

impl Handoff for Kexec {
    fn handoff(
        &mut self,
        kernel: &Path,
        initrd: Option<&Path>,
        cmdline: &str,
    ) -> Result<Infallible> {
        info!("loading {} with command line '{}'", kernel.display(), cmdline);
        let status = self.run(&Self::load_args(kernel, initrd, cmdline));
        if status != 0 {
            return Err(Error::Handoff(format!(
                "kexec load failed with return code {status}."
            )));
        }

        let status = self.run(&[OsString::from("-e")]);
        Err(Error::Handoff(format!(
            "kexec execute failed with return code {status}."
        )))
    }
}
