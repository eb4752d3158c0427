//! OpenStack platform section of the install config, and its validation against a snapshot of
//! the cloud's inventory.

use serde::{Deserialize, Serialize};

pub use self::cloud_info::{
    CloudInfo, Error as CloudInfoError, FloatingIp, Flavor, Network, Subnet,
};
use crate::{
    field::{AggregateError, ErrorList, FieldPath},
    types::Networking,
    validate::PlatformValidator,
    InstallConfig,
};

mod cloud_info;
pub mod validation;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// Name of the cloud in `clouds.yaml`.
    #[serde(default)]
    pub cloud: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_network: Option<String>,

    /// Flavor used for machines that don't set one themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_flavor: Option<String>,

    /// Subnet (name or ID) that machines are attached to, instead of one created by the installer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machines_subnet: Option<String>,

    #[serde(
        default,
        rename = "apiFloatingIP",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_floating_ip: Option<String>,

    #[serde(
        default,
        rename = "ingressFloatingIP",
        skip_serializing_if = "Option::is_none"
    )]
    pub ingress_floating_ip: Option<String>,

    /// Settings applied to every machine pool that doesn't override them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_machine_platform: Option<MachinePool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MachinePool {
    /// Flavor name.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub flavor_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<RootVolume>,

    /// Compute availability zones to spread machines over.
    #[serde(default)]
    pub zones: Vec<String>,

    #[serde(default, rename = "additionalNetworkIDs")]
    pub additional_network_ids: Vec<String>,

    #[serde(default, rename = "additionalSecurityGroupIDs")]
    pub additional_security_group_ids: Vec<String>,
}

/// Boot the machines from a Cinder volume rather than the flavor's ephemeral disk.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RootVolume {
    /// Size in GiB.
    #[serde(default)]
    pub size: i64,

    #[serde(default, rename = "type")]
    pub volume_type: String,
}

/// [`PlatformValidator`] that checks the OpenStack sections against a [`CloudInfo`].
pub struct CloudInfoValidator<'a> {
    cloud_info: &'a CloudInfo,
}

impl<'a> CloudInfoValidator<'a> {
    pub fn new(cloud_info: &'a CloudInfo) -> Self {
        Self { cloud_info }
    }
}

impl PlatformValidator for CloudInfoValidator<'_> {
    fn validate_platform(
        &self,
        platform: &Platform,
        networking: &Networking,
        path: &FieldPath,
    ) -> ErrorList {
        validation::validate_platform(platform, networking, self.cloud_info, path)
    }

    fn validate_machine_pool(
        &self,
        pool: &MachinePool,
        control_plane: bool,
        path: &FieldPath,
    ) -> ErrorList {
        validation::validate_machine_pool(pool, self.cloud_info, control_plane, path)
    }
}

/// Validates an install config for the OpenStack platform, reporting every problem at once.
pub fn validate(
    install_config: &InstallConfig,
    cloud_info: &CloudInfo,
) -> Result<(), AggregateError> {
    crate::validate::validate(install_config, &CloudInfoValidator::new(cloud_info))
}
