//! Post-processing of copied component images

use crate::error::{Error, Result};
use alloc::string::String;

/// Trim a copied initrd image to its trusted length
///
/// The copy is block aligned and may carry padding beyond `len`. A copy
/// shorter than `len` means the boot map is corrupt.
pub fn initrd_payload(image: &[u8], len: u64) -> Result<&[u8]> {
    usize::try_from(len)
        .ok()
        .and_then(|len| image.get(..len))
        .ok_or_else(|| {
            Error::format("Error writing initrd file - invalid initrd component length")
        })
}

/// Interpret a copied parmfile component as kernel command line text
///
/// The last byte is always dropped and the text ends at the first NUL.
pub fn parmfile_text(image: &[u8]) -> String {
    let text = &image[..image.len().saturating_sub(1)];
    let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
    String::from_utf8_lossy(&text[..end]).into_owned()
}
