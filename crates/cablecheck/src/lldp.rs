//! LLDP neighbor dump parser
//!
//! Each device's dump is the captured text output of `lldpctl`, one section
//! per local interface, separated by dashed rules:
//!
//! ```text
//! -------------------------------------------------------------------------------
//! Interface:    swp1, via: LLDP, RID: 2, Time: 0 day, 00:10:01
//!   Chassis:
//!     SysName:      spine01
//!     SysDescr:     Cumulus Linux version 5.4.0 running on Mellanox
//!   Port:
//!     PortID:       ifname swp3
//!     PortDescr:    swp3
//! -------------------------------------------------------------------------------
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::CableCheckError;
use crate::types::{Adjacency, UNKNOWN_NEIGHBOR};

/// File name suffix of per-device dumps (`<device>_lldp_result.ini`).
pub const DUMP_FILE_SUFFIX: &str = "_lldp_result.ini";

/// Banner substring identifying the Cumulus dialect.
const CUMULUS_MARKER: &str = "Cumulus";

static SECTION_DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^-{20,}[ \t]*\r?$").expect("Invalid regex pattern"));
static INTERFACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Interface:\s*([^\s,]+)").expect("Invalid regex pattern"));
static SYSNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SysName:[ \t]*([^\r\n]*)").expect("Invalid regex pattern"));
static PORT_ID_IFNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PortID:\s*ifname\s+(\S+)").expect("Invalid regex pattern"));
static PORT_DESCR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PortDescr:[ \t]*(\S+)").expect("Invalid regex pattern"));

/// Vendor dialect of one dump section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LldpDialect {
    /// Cumulus Linux: the neighbor port is `PortID: ifname <port>`.
    Cumulus,
    /// Anything else: the neighbor port is carried in `PortDescr`.
    Generic,
}

impl LldpDialect {
    /// Detects the dialect from the section text.
    pub fn detect(section: &str) -> Self {
        if section.contains(CUMULUS_MARKER) {
            Self::Cumulus
        } else {
            Self::Generic
        }
    }
}

/// Parsed contents of one device dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LldpDump {
    /// Device that produced the dump.
    pub device: String,
    /// Adjacencies in section order.
    pub adjacencies: Vec<Adjacency>,
    /// Sections skipped for lacking an interface or a port.
    pub skipped_sections: usize,
}

/// Returns the device name encoded in a dump file name.
pub fn device_from_dump_file<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    file_name
        .strip_suffix(suffix)
        .filter(|device| !device.is_empty())
}

/// LLDP dump parser.
#[derive(Debug, Clone)]
pub struct LldpParser {
    /// DNS suffixes stripped from generic-dialect system names.
    domain_suffixes: Vec<String>,
}

impl Default for LldpParser {
    fn default() -> Self {
        Self {
            domain_suffixes: vec![".cm.cluster".to_string()],
        }
    }
}

impl LldpParser {
    pub fn new(domain_suffixes: Vec<String>) -> Self {
        Self { domain_suffixes }
    }

    /// Parses one device dump into adjacency records.
    ///
    /// Sections without an interface or without a port identifier are
    /// skipped. A section without a system name still yields a record with
    /// the neighbor set to [`UNKNOWN_NEIGHBOR`].
    pub fn parse(&self, device: &str, text: &str) -> LldpDump {
        let mut dump = LldpDump {
            device: device.to_string(),
            ..Default::default()
        };

        for section in SECTION_DELIMITER_RE.split(text) {
            let section = section.trim();
            if section.is_empty() {
                continue;
            }

            match self.parse_section(device, section) {
                Ok(Some(adjacency)) => dump.adjacencies.push(adjacency),
                Ok(None) => {}
                Err(e) => {
                    debug!(device, error = %e, "Skipping LLDP section");
                    dump.skipped_sections += 1;
                }
            }
        }

        dump
    }

    /// Parses a single section. `Ok(None)` is a banner with no neighbor fields.
    fn parse_section(
        &self,
        device: &str,
        section: &str,
    ) -> Result<Option<Adjacency>, CableCheckError> {
        let dialect = LldpDialect::detect(section);
        let interface = capture(&INTERFACE_RE, section);
        let port = neighbor_port(section, dialect);

        let (interface, port) = match (interface, port) {
            (Some(interface), Some(port)) => (interface, port),
            (None, None) => return Ok(None),
            (None, Some(_)) => {
                return Err(CableCheckError::malformed_section(
                    device,
                    "no Interface field",
                ))
            }
            (Some(interface), None) => {
                return Err(CableCheckError::malformed_section(
                    device,
                    format!("no PortID or PortDescr for {}", interface),
                ))
            }
        };

        let neighbor = match capture(&SYSNAME_RE, section) {
            Some(name) if dialect == LldpDialect::Generic => self.strip_domain(name),
            Some(name) => name,
            None => UNKNOWN_NEIGHBOR,
        };

        Ok(Some(Adjacency::new(device, interface, neighbor, port)))
    }

    fn strip_domain<'a>(&self, name: &'a str) -> &'a str {
        self.domain_suffixes
            .iter()
            .filter(|suffix| !suffix.is_empty())
            .filter_map(|suffix| name.find(suffix.as_str()))
            .min()
            .map_or(name, |idx| &name[..idx])
    }
}

/// Parses a dump with the default parser settings.
pub fn parse_lldp_dump(device: &str, text: &str) -> LldpDump {
    LldpParser::default().parse(device, text)
}

/// Neighbor port per dialect, falling back to the other field.
fn neighbor_port(section: &str, dialect: LldpDialect) -> Option<&str> {
    let ifname = capture(&PORT_ID_IFNAME_RE, section);
    let descr = capture(&PORT_DESCR_RE, section);
    match dialect {
        LldpDialect::Cumulus => ifname.or(descr),
        LldpDialect::Generic => descr.or(ifname),
    }
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}
