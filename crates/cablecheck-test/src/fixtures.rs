//! Input fixtures for cabling scenarios
//!
//! Builders for LLDP dump text, asset tables, host lists and expected
//! topology files in the formats the collectors produce.

/// Dashed rule separating `lldpctl` sections.
pub const SECTION_RULE: &str =
    "-------------------------------------------------------------------------------";

/// Neighbor port representation of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PortField {
    IfName(String),
    Descr(String),
    None,
}

/// One `lldpctl` neighbor section.
#[derive(Debug, Clone)]
pub struct NeighborSection {
    interface: String,
    sysname: Option<String>,
    port: PortField,
    cumulus: bool,
}

impl NeighborSection {
    /// Cumulus neighbor advertising `PortID: ifname <port>`.
    pub fn cumulus(interface: &str, sysname: &str, port: &str) -> Self {
        Self {
            interface: interface.to_string(),
            sysname: Some(sysname.to_string()),
            port: PortField::IfName(port.to_string()),
            cumulus: true,
        }
    }

    /// Non-Cumulus neighbor carrying its port in `PortDescr`.
    pub fn generic(interface: &str, sysname: &str, descr: &str) -> Self {
        Self {
            interface: interface.to_string(),
            sysname: Some(sysname.to_string()),
            port: PortField::Descr(descr.to_string()),
            cumulus: false,
        }
    }

    /// Drop the `SysName` line.
    pub fn without_sysname(mut self) -> Self {
        self.sysname = None;
        self
    }

    /// Drop every port line.
    pub fn without_port(mut self) -> Self {
        self.port = PortField::None;
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "Interface:    {}, via: LLDP, RID: 1, Time: 0 day, 01:02:03\n  Chassis:\n",
            self.interface
        );
        out.push_str("    ChassisID:    mac 44:38:39:00:00:01\n");
        if let Some(name) = &self.sysname {
            out.push_str(&format!("    SysName:      {name}\n"));
        }
        if self.cumulus {
            out.push_str("    SysDescr:     Cumulus Linux version 5.4.0 running on Mellanox\n");
        } else {
            out.push_str("    SysDescr:     Ubuntu 22.04.3 LTS Linux 5.15.0-91-generic\n");
        }
        out.push_str("  Port:\n");
        match &self.port {
            PortField::IfName(port) => {
                out.push_str(&format!("    PortID:       ifname {port}\n"));
                out.push_str(&format!("    PortDescr:    {port}\n"));
            }
            PortField::Descr(descr) => {
                out.push_str("    PortID:       mac 0c:42:a1:00:00:01\n");
                out.push_str(&format!("    PortDescr:    {descr}\n"));
            }
            PortField::None => {}
        }
        out
    }
}

/// Builder for one device's dump file.
#[derive(Debug, Clone, Default)]
pub struct DumpBuilder {
    sections: Vec<NeighborSection>,
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: NeighborSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Shorthand for a Cumulus section.
    pub fn neighbor(self, interface: &str, sysname: &str, port: &str) -> Self {
        self.section(NeighborSection::cumulus(interface, sysname, port))
    }

    /// Renders the dump as `lldpctl` prints it.
    pub fn render(&self) -> String {
        let mut out = format!("{SECTION_RULE}\nLLDP neighbors:\n{SECTION_RULE}\n");
        for section in &self.sections {
            out.push_str(&section.render());
            out.push_str(SECTION_RULE);
            out.push('\n');
        }
        out
    }
}

/// Asset table with a header and one generated row per device.
pub fn asset_table(devices: &[&str]) -> String {
    let mut out = String::from("DEVICE-NAME        IP            MAC                SERIAL       MODEL       RELEASE\n");
    for (i, device) in devices.iter().enumerate() {
        let n = i + 1;
        out.push_str(&format!(
            "{device:<18} 10.0.0.{n:<5} 44:38:39:00:00:{n:02x}  MT{n:08}   SN3700      5.4.0\n"
        ));
    }
    out
}

/// Host list grouped under one section header.
pub fn host_list(hosts: &[&str]) -> String {
    let mut out = String::from("# fabric hosts\n[all]\n");
    for host in hosts {
        out.push_str(host);
        out.push('\n');
    }
    out
}

/// Expected topology file from `("dev:port", "dev:port")` pairs.
pub fn topology(links: &[(&str, &str)]) -> String {
    let mut out = String::from("graph G {\n");
    for (a, b) in links {
        out.push_str(&format!("  \"{a}\" -- \"{b}\"\n"));
    }
    out.push_str("}\n");
    out
}
