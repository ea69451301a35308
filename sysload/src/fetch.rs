//! Staging of configuration resources

use bootmap::{Error, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Copies a resource named by URI to a local file
pub trait Fetch {
    /// Stage the resource at `uri` as `destination`
    fn fetch(&mut self, destination: &Path, uri: &str) -> Result<()>;
}

/// Fetches bare paths and `file://` URIs from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl Fetch for LocalFetcher {
    fn fetch(&mut self, destination: &Path, uri: &str) -> Result<()> {
        let source = match uri.split_once("://") {
            None => uri,
            Some(("file", path)) => path,
            Some((scheme, _)) => {
                return Err(Error::Unsupported(format!(
                    "Unsupported URI scheme '{scheme}'"
                )));
            }
        };
        debug!("fetching {} to {}", source, destination.display());
        fs::copy(source, destination)
            .map(|_| ())
            .map_err(|e| Error::Io(format!("Unable to copy '{source}' - {e}")))
    }
}
