//! Boot entry configuration and local staging paths

use std::path::{Path, PathBuf};

/// Default location of the kexec tool
pub const KEXEC_PATH: &str = "/sbin/kexec";

/// Boot entry fields consumed by the loader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootEntry {
    /// Prefix for relative URIs
    pub root: String,
    /// Extra kernel command line
    pub cmdline: String,
    /// URI of an additional parmfile
    pub parmfile: Option<String>,
    /// Boot map URI (`dasd://(...)` or `zfcp://(...)`)
    pub bootmap: Option<String>,
}

/// Where boot objects are staged before the handoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderPaths {
    pub kernel: PathBuf,
    pub initrd: PathBuf,
    pub parmfile: PathBuf,
    pub kexec: PathBuf,
}

impl Default for LoaderPaths {
    fn default() -> Self {
        Self {
            kernel: PathBuf::from("/tmp/kernel.img"),
            initrd: PathBuf::from("/tmp/initrd.img"),
            parmfile: PathBuf::from("/tmp/parmfile.txt"),
            kexec: PathBuf::from(KEXEC_PATH),
        }
    }
}

impl LoaderPaths {
    /// Stage files in `dir` instead of `/tmp`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            kernel: dir.join("kernel.img"),
            initrd: dir.join("initrd.img"),
            parmfile: dir.join("parmfile.txt"),
            ..Self::default()
        }
    }
}

/// Prefix `uri` with `root` unless it is an absolute URI
///
/// A URI is absolute when it starts with a scheme (`[A-Za-z][A-Za-z0-9+.-]*:`).
/// A URI enclosed in single quotes is always relative; the quotes are dropped.
pub fn prefix_root(root: &str, uri: &str) -> String {
    if uri.is_empty() {
        return String::new();
    }
    if let Some(inner) = uri
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return format!("{root}{inner}");
    }
    if has_scheme(uri) {
        uri.to_string()
    } else {
        format!("{root}{uri}")
    }
}

fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
