use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read cloud inventory from {path}", path = path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to deserialize cloud inventory"))]
    Deserialize { source: serde_yaml::Error },
}

/// Snapshot of the OpenStack resources that the install config refers to.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudInfo {
    #[serde(default)]
    pub flavors: Vec<Flavor>,

    #[serde(default)]
    pub networks: Vec<Network>,

    #[serde(default)]
    pub subnets: Vec<Subnet>,

    #[serde(default)]
    pub security_groups: Vec<String>,

    #[serde(default, rename = "floatingIPs")]
    pub floating_ips: Vec<FloatingIp>,

    #[serde(default)]
    pub compute_zones: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Flavor {
    pub name: String,
    /// RAM in MiB.
    #[serde(default)]
    pub ram: u64,
    #[serde(default)]
    pub vcpus: u64,
    /// Ephemeral disk in GiB.
    #[serde(default)]
    pub disk: u64,
    /// Baremetal flavors are not held to the virtual machine minimums.
    #[serde(default)]
    pub baremetal: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub network_id: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIp {
    pub address: String,
    /// Set if the floating IP is already attached to a port.
    #[serde(default, rename = "portID", skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
}

impl CloudInfo {
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        serde_yaml::from_str(yaml).context(DeserializeSnafu)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let contents = fs::read_to_string(&path).context(ReadFileSnafu { path })?;
        Self::from_yaml(&contents)
    }

    pub fn flavor(&self, name: &str) -> Option<&Flavor> {
        self.flavors.iter().find(|flavor| flavor.name == name)
    }

    /// Looks a network up by ID or name.
    pub fn network(&self, name_or_id: &str) -> Option<&Network> {
        self.networks
            .iter()
            .find(|network| network.id == name_or_id || network.name == name_or_id)
    }

    /// Looks a subnet up by ID or name.
    pub fn subnet(&self, name_or_id: &str) -> Option<&Subnet> {
        self.subnets
            .iter()
            .find(|subnet| subnet.id == name_or_id || subnet.name == name_or_id)
    }

    pub fn floating_ip(&self, address: &str) -> Option<&FloatingIp> {
        self.floating_ips.iter().find(|ip| ip.address == address)
    }

    pub fn has_security_group(&self, id: &str) -> bool {
        self.security_groups.iter().any(|group| group == id)
    }
}
