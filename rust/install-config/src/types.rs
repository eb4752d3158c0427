use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::openstack;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read install config from {path}", path = path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to deserialize install config"))]
    Deserialize { source: serde_yaml::Error },
}

/// The install config as written by the operator.
///
/// Only the sections that take part in validation are modelled, unknown fields are ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub base_domain: String,

    /// PEM-encoded CA certificates that the bootstrap node and the cluster should trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_trust_bundle: Option<String>,

    #[serde(default)]
    pub networking: Networking,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<MachinePool>,

    #[serde(default)]
    pub compute: Vec<MachinePool>,

    #[serde(default)]
    pub platform: Platform,
}

impl InstallConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        serde_yaml::from_str(yaml).context(DeserializeSnafu)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let contents = fs::read_to_string(&path).context(ReadFileSnafu { path })?;
        Self::from_yaml(&contents)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,

    /// The first entry must match the machines subnet, if one is configured.
    #[serde(default)]
    pub machine_network: Vec<MachineNetworkEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MachineNetworkEntry {
    pub cidr: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachinePool {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,

    #[serde(default)]
    pub platform: MachinePoolPlatform,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MachinePoolPlatform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<openstack::MachinePool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Platform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<openstack::Platform>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialization() {
        let input: &str = r#"
        apiVersion: v1
        metadata:
          name: ostest
        baseDomain: example.com
        additionalTrustBundle: |
          -----BEGIN CERTIFICATE-----
          Zm9v
          -----END CERTIFICATE-----
        networking:
          networkType: OVNKubernetes
          machineNetwork:
          - cidr: 10.0.0.0/16
        controlPlane:
          name: master
          replicas: 3
          platform:
            openstack:
              type: m1.xlarge
              zones: [az0]
        compute:
        - name: worker
          replicas: 2
          platform:
            openstack:
              type: m1.large
              rootVolume:
                size: 30
                type: performance
              additionalNetworkIDs: [net-1]
        - name: edge
          platform: {}
        platform:
          openstack:
            cloud: mycloud
            externalNetwork: external
            computeFlavor: m1.xlarge
            apiFloatingIP: 203.0.113.10
            defaultMachinePlatform:
              type: m1.large
              additionalSecurityGroupIDs: [sg-1]
        "#;
        let config = InstallConfig::from_yaml(input).unwrap();

        assert_eq!(config.metadata.name, "ostest");
        assert_eq!(
            config.additional_trust_bundle.as_deref(),
            Some("-----BEGIN CERTIFICATE-----\nZm9v\n-----END CERTIFICATE-----\n")
        );
        assert_eq!(config.networking.machine_network[0].cidr, "10.0.0.0/16");

        let control_plane = config.control_plane.unwrap();
        assert_eq!(control_plane.replicas, Some(3));
        let control_plane = control_plane.platform.openstack.unwrap();
        assert_eq!(control_plane.flavor_name.as_deref(), Some("m1.xlarge"));
        assert_eq!(control_plane.zones, vec!["az0"]);

        assert_eq!(config.compute.len(), 2);
        let worker = config.compute[0].platform.openstack.as_ref().unwrap();
        let root_volume = worker.root_volume.as_ref().unwrap();
        assert_eq!(root_volume.size, 30);
        assert_eq!(root_volume.volume_type, "performance");
        assert_eq!(worker.additional_network_ids, vec!["net-1"]);
        assert_eq!(config.compute[1].platform.openstack, None);

        let platform = config.platform.openstack.unwrap();
        assert_eq!(platform.cloud, "mycloud");
        assert_eq!(platform.external_network.as_deref(), Some("external"));
        assert_eq!(platform.api_floating_ip.as_deref(), Some("203.0.113.10"));
        assert_eq!(platform.ingress_floating_ip, None);
        let default_pool = platform.default_machine_platform.unwrap();
        assert_eq!(default_pool.flavor_name.as_deref(), Some("m1.large"));
        assert_eq!(default_pool.additional_security_group_ids, vec!["sg-1"]);
    }

    #[test]
    fn test_missing_file() {
        let err = InstallConfig::from_file("/nonexistent/install-config.yaml").unwrap_err();
        assert!(matches!(err, Error::ReadFile { .. }));
    }
}
