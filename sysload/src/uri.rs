//! Boot map URIs
//!
//! - `dasd://(<busid>[,<program>])`
//! - `zfcp://(<busid>,<wwpn>,<lun>[,<program>])`
//!
//! Bus IDs have the form `x.x.xxxx` (hex), WWPN and LUN are `0x` followed by
//! 16 hex digits, and the optional program number has one or two digits.
//! A program number with a leading zero is octal, so `07` is program 7 and
//! `08` is program 0.

use bootmap::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const DASD_RE: &str =
    r"^dasd://\(([[:xdigit:]]\.[[:xdigit:]]\.[[:xdigit:]]{4})(?:,([[:digit:]]{1,2}))?\)$";
const ZFCP_RE: &str = concat!(
    r"^zfcp://\(([[:xdigit:]]\.[[:xdigit:]]\.[[:xdigit:]]{4}),",
    r"(0x[[:xdigit:]]{16}),(0x[[:xdigit:]]{16})(?:,([[:digit:]]{1,2}))?\)$"
);

type Compiled = std::result::Result<Regex, regex::Error>;

static DASD: Lazy<Compiled> = Lazy::new(|| Regex::new(DASD_RE));
static ZFCP: Lazy<Compiled> = Lazy::new(|| Regex::new(ZFCP_RE));

/// Parsed boot map location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootmapUri {
    /// ECKD or FBA DASD
    Dasd { busid: String, program: usize },
    /// FCP attached SCSI disk
    Zfcp {
        busid: String,
        wwpn: String,
        lun: String,
        program: usize,
    },
}

impl BootmapUri {
    /// Parse a boot map URI, dispatching on its scheme
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.starts_with("dasd://") {
            let caps = captures(&DASD, uri, "Error - invalid 'dasd' boot map URI.")?;
            Ok(Self::Dasd {
                busid: field(&caps, 1),
                program: program(&caps, 2),
            })
        } else if uri.starts_with("zfcp://") {
            let caps = captures(&ZFCP, uri, "Error - invalid 'zfcp' boot map URI.")?;
            Ok(Self::Zfcp {
                busid: field(&caps, 1),
                wwpn: field(&caps, 2),
                lun: field(&caps, 3),
                program: program(&caps, 4),
            })
        } else {
            Err(Error::Unsupported("Unsupported bootmap URI scheme.".to_string()))
        }
    }

    /// Boot program number
    pub fn program(&self) -> usize {
        match self {
            Self::Dasd { program, .. } | Self::Zfcp { program, .. } => *program,
        }
    }
}

fn captures<'u>(re: &Compiled, uri: &'u str, invalid: &str) -> Result<Captures<'u>> {
    let re = re.as_ref().map_err(|e| {
        Error::Format(format!(
            "Internal error: unable to compile regular expression - {e}"
        ))
    })?;
    re.captures(uri)
        .ok_or_else(|| Error::Format(invalid.to_string()))
}

fn field(caps: &Captures<'_>, group: usize) -> String {
    caps.get(group)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

fn program(caps: &Captures<'_>, group: usize) -> usize {
    caps.get(group).map_or(0, |m| parse_program(m.as_str()))
}

/// Parse a program number, octal when it starts with `0`
///
/// Parsing stops at the first digit that is invalid for the base.
fn parse_program(digits: &str) -> usize {
    let (digits, radix) = match digits.strip_prefix('0') {
        Some(rest) => (rest, 8),
        None => (digits, 10),
    };
    digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(0, |n, d| n * radix as usize + d as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dasd_uri() {
        assert_eq!(
            BootmapUri::parse("dasd://(0.0.5C1F)").unwrap(),
            BootmapUri::Dasd {
                busid: "0.0.5c1f".to_string(),
                program: 0
            }
        );
        assert_eq!(BootmapUri::parse("dasd://(0.0.1234,12)").unwrap().program(), 12);
    }

    #[test]
    fn test_zfcp_uri() {
        let uri = BootmapUri::parse(
            "zfcp://(0.0.1700,0x5005076300C213E9,0x5022000000000000,3)",
        )
        .unwrap();
        assert_eq!(
            uri,
            BootmapUri::Zfcp {
                busid: "0.0.1700".to_string(),
                wwpn: "0x5005076300c213e9".to_string(),
                lun: "0x5022000000000000".to_string(),
                program: 3
            }
        );
    }

    #[test]
    fn test_program_number_base() {
        assert_eq!(parse_program("7"), 7);
        assert_eq!(parse_program("12"), 12);
        assert_eq!(parse_program("0"), 0);
        assert_eq!(parse_program("07"), 7);
        assert_eq!(parse_program("08"), 0);
        assert_eq!(BootmapUri::parse("dasd://(0.0.1234,09)").unwrap().program(), 0);
    }

    #[test]
    fn test_invalid_dasd_uri() {
        for uri in ["dasd://(0.0.123)", "dasd://(0.0.1234,123)", "dasd://0.0.1234"] {
            let err = BootmapUri::parse(uri).unwrap_err();
            assert_eq!(err.message(), "Error - invalid 'dasd' boot map URI.", "{uri}");
        }
    }

    #[test]
    fn test_invalid_zfcp_uri() {
        let err = BootmapUri::parse("zfcp://(0.0.1700,0x50,0x5022000000000000)").unwrap_err();
        assert_eq!(err.message(), "Error - invalid 'zfcp' boot map URI.");
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = BootmapUri::parse("nfs://host/boot").unwrap_err();
        assert_eq!(
            err,
            Error::Unsupported("Unsupported bootmap URI scheme.".to_string())
        );
    }
}
