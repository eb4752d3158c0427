//! Checks of the OpenStack install-config sections against a [`CloudInfo`].
//!
//! All functions return every problem they find, never just the first one.

use super::{CloudInfo, MachinePool, Platform, RootVolume};
use crate::{
    field::{ErrorList, FieldError, FieldPath},
    types::Networking,
};

pub struct FlavorRequirements {
    /// MiB
    pub ram: u64,
    pub vcpus: u64,
    /// GiB
    pub disk: u64,
}

pub const CONTROL_PLANE_FLAVOR_MINIMUMS: FlavorRequirements = FlavorRequirements {
    ram: 16384,
    vcpus: 4,
    disk: 25,
};

pub const COMPUTE_FLAVOR_MINIMUMS: FlavorRequirements = FlavorRequirements {
    ram: 8192,
    vcpus: 2,
    disk: 25,
};

/// GiB
pub const MINIMUM_ROOT_VOLUME_SIZE: i64 = 25;

/// Validates the platform-wide settings. `path` points at the OpenStack platform section.
pub fn validate_platform(
    platform: &Platform,
    networking: &Networking,
    cloud_info: &CloudInfo,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    errors.extend(validate_external_network(platform, cloud_info, path));
    errors.extend(validate_floating_ips(platform, cloud_info, path));
    errors.extend(validate_machines_subnet(platform, networking, cloud_info, path));
    if let Some(flavor) = &platform.compute_flavor {
        errors.extend(validate_flavor(
            flavor,
            cloud_info,
            &CONTROL_PLANE_FLAVOR_MINIMUMS,
            true,
            &path.child("computeFlavor"),
        ));
    }
    errors
}

/// Validates one machine pool. `path` points at the pool's OpenStack section.
pub fn validate_machine_pool(
    pool: &MachinePool,
    cloud_info: &CloudInfo,
    control_plane: bool,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    if let Some(flavor) = &pool.flavor_name {
        let minimums = if control_plane {
            &CONTROL_PLANE_FLAVOR_MINIMUMS
        } else {
            &COMPUTE_FLAVOR_MINIMUMS
        };
        // The flavor's disk is not used when booting from a volume
        let check_disk = pool.root_volume.is_none();
        errors.extend(validate_flavor(
            flavor,
            cloud_info,
            minimums,
            check_disk,
            &path.child("type"),
        ));
    }
    if let Some(root_volume) = &pool.root_volume {
        errors.extend(validate_root_volume(root_volume, &path.child("rootVolume")));
    }
    for (i, zone) in pool.zones.iter().enumerate() {
        if !cloud_info.compute_zones.contains(zone) {
            errors.push(FieldError::not_supported(
                path.child("zones").index(i),
                zone,
                &cloud_info.compute_zones,
            ));
        }
    }
    for (i, network) in pool.additional_network_ids.iter().enumerate() {
        if cloud_info.network(network).is_none() {
            errors.push(FieldError::not_found(
                path.child("additionalNetworkIDs").index(i),
                network,
            ));
        }
    }
    for (i, group) in pool.additional_security_group_ids.iter().enumerate() {
        if !cloud_info.has_security_group(group) {
            errors.push(FieldError::not_found(
                path.child("additionalSecurityGroupIDs").index(i),
                group,
            ));
        }
    }
    errors
}

fn validate_external_network(
    platform: &Platform,
    cloud_info: &CloudInfo,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    if let Some(name) = &platform.external_network {
        let path = path.child("externalNetwork");
        match cloud_info.network(name) {
            None => errors.push(FieldError::not_found(path, name)),
            Some(network) if !network.external => errors.push(FieldError::invalid(
                path,
                name,
                "network is not an external network",
            )),
            Some(_) => {}
        }
    }
    errors
}

fn validate_floating_ips(
    platform: &Platform,
    cloud_info: &CloudInfo,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    let floating_ips = [
        ("apiFloatingIP", &platform.api_floating_ip),
        ("ingressFloatingIP", &platform.ingress_floating_ip),
    ];
    for (field, address) in floating_ips {
        let Some(address) = address else {
            continue;
        };
        let path = path.child(field);
        if platform.external_network.is_none() {
            errors.push(FieldError::invalid(
                path,
                address,
                "cannot set floating IPs when externalNetwork is not set",
            ));
            continue;
        }
        match cloud_info.floating_ip(address) {
            None => errors.push(FieldError::not_found(path, address)),
            Some(ip) if ip.port_id.is_some() => errors.push(FieldError::invalid(
                path,
                address,
                "floating IP is already in use",
            )),
            Some(_) => {}
        }
    }
    errors
}

fn validate_machines_subnet(
    platform: &Platform,
    networking: &Networking,
    cloud_info: &CloudInfo,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    let Some(subnet_ref) = &platform.machines_subnet else {
        return errors;
    };
    let Some(subnet) = cloud_info.subnet(subnet_ref) else {
        errors.push(FieldError::not_found(path.child("machinesSubnet"), subnet_ref));
        return errors;
    };
    let machine_network = FieldPath::new("networking").child("machineNetwork");
    match networking.machine_network.first() {
        None => errors.push(FieldError::required(
            machine_network,
            "machineNetwork is required when machinesSubnet is set",
        )),
        Some(first) if first.cidr != subnet.cidr => errors.push(FieldError::invalid(
            machine_network.index(0).child("cidr"),
            &first.cidr,
            format!("doesn't match the CIDR of the machinesSubnet, {}", subnet.cidr),
        )),
        Some(_) => {}
    }
    errors
}

fn validate_flavor(
    name: &str,
    cloud_info: &CloudInfo,
    minimums: &FlavorRequirements,
    check_disk: bool,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    let Some(flavor) = cloud_info.flavor(name) else {
        errors.push(FieldError::not_found(path.clone(), name));
        return errors;
    };
    if flavor.baremetal {
        return errors;
    }

    let mut unmet = Vec::new();
    if flavor.ram < minimums.ram {
        unmet.push(format!(
            "Must have minimum of {} MB RAM, had {} MB",
            minimums.ram, flavor.ram
        ));
    }
    if flavor.vcpus < minimums.vcpus {
        unmet.push(format!(
            "Must have minimum of {} VCPUs, had {}",
            minimums.vcpus, flavor.vcpus
        ));
    }
    if check_disk && flavor.disk < minimums.disk {
        unmet.push(format!(
            "Must have minimum of {} GB Disk, had {} GB",
            minimums.disk, flavor.disk
        ));
    }
    if !unmet.is_empty() {
        errors.push(FieldError::invalid(
            path.clone(),
            name,
            format!(
                "Flavor did not meet the following minimum requirements: {}",
                unmet.join(", ")
            ),
        ));
    }
    errors
}

fn validate_root_volume(root_volume: &RootVolume, path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();
    if root_volume.size < MINIMUM_ROOT_VOLUME_SIZE {
        errors.push(FieldError::invalid(
            path.child("size"),
            root_volume.size,
            format!("Volume size must be at least {MINIMUM_ROOT_VOLUME_SIZE} GB"),
        ));
    }
    if root_volume.volume_type.is_empty() {
        errors.push(FieldError::required(
            path.child("type"),
            "A volume type must be specified to use root volumes",
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::ErrorType, types::MachineNetworkEntry};

    fn cloud_info() -> CloudInfo {
        CloudInfo::from_yaml(
            r#"
            flavors:
            - name: m1.xlarge
              ram: 16384
              vcpus: 4
              disk: 40
            - name: m1.large
              ram: 8192
              vcpus: 2
              disk: 20
            - name: m1.small
              ram: 2048
              vcpus: 1
              disk: 10
            - name: baremetal
              baremetal: true
            networks:
            - id: 0b2c8a0e-ext
              name: external
              external: true
            - id: 6e4d1f2a-int
              name: internal
            subnets:
            - id: 4f0b6a3c-sub
              name: machines
              cidr: 10.0.0.0/16
              networkId: 6e4d1f2a-int
            securityGroups: [sg-1]
            floatingIPs:
            - address: 203.0.113.10
            - address: 203.0.113.11
              portID: port-1
            computeZones: [az0, az1]
            "#,
        )
        .unwrap()
    }

    fn openstack_path(root: FieldPath) -> FieldPath {
        root.child("platform").child("openstack")
    }

    fn networking(cidr: &str) -> Networking {
        Networking {
            machine_network: vec![MachineNetworkEntry {
                cidr: cidr.to_owned(),
            }],
            ..Networking::default()
        }
    }

    fn messages(errors: ErrorList) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    fn platform_errors(platform: &Platform, networking: &Networking) -> Vec<String> {
        let path = FieldPath::new("platform").child("openstack");
        let errors = validate_platform(platform, networking, &cloud_info(), &path);
        messages(errors)
    }

    fn pool_errors(pool: &MachinePool, control_plane: bool, path: &FieldPath) -> Vec<String> {
        let errors = validate_machine_pool(pool, &cloud_info(), control_plane, path);
        messages(errors)
    }

    #[test]
    fn test_valid_platform() {
        let platform = Platform {
            cloud: "mycloud".to_owned(),
            external_network: Some("external".to_owned()),
            compute_flavor: Some("m1.xlarge".to_owned()),
            machines_subnet: Some("machines".to_owned()),
            api_floating_ip: Some("203.0.113.10".to_owned()),
            ingress_floating_ip: None,
            default_machine_platform: None,
        };
        let errors = platform_errors(&platform, &networking("10.0.0.0/16"));
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_external_network() {
        let mut platform = Platform {
            external_network: Some("missing".to_owned()),
            ..Platform::default()
        };
        assert_eq!(
            platform_errors(&platform, &Networking::default()),
            vec![r#"platform.openstack.externalNetwork: Not found: "missing""#]
        );

        platform.external_network = Some("internal".to_owned());
        let path = FieldPath::new("platform").child("openstack");
        let errors = validate_platform(&platform, &Networking::default(), &cloud_info(), &path);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().kind, ErrorType::Invalid);
    }

    #[test]
    fn test_floating_ips() {
        let platform = Platform {
            api_floating_ip: Some("203.0.113.10".to_owned()),
            ..Platform::default()
        };
        let errors = platform_errors(&platform, &Networking::default());
        assert_eq!(errors.len(), 1);
        assert!(
            errors[0].ends_with("cannot set floating IPs when externalNetwork is not set"),
            "{errors:?}"
        );

        let platform = Platform {
            external_network: Some("external".to_owned()),
            api_floating_ip: Some("198.51.100.1".to_owned()),
            ingress_floating_ip: Some("203.0.113.11".to_owned()),
            ..Platform::default()
        };
        assert_eq!(
            platform_errors(&platform, &Networking::default()),
            vec![
                r#"platform.openstack.apiFloatingIP: Not found: "198.51.100.1""#,
                r#"platform.openstack.ingressFloatingIP: Invalid value: "203.0.113.11": floating IP is already in use"#,
            ]
        );
    }

    #[test]
    fn test_machines_subnet() {
        let platform = Platform {
            machines_subnet: Some("4f0b6a3c-sub".to_owned()),
            ..Platform::default()
        };

        assert_eq!(
            platform_errors(&platform, &networking("10.1.0.0/16")),
            vec![
                r#"networking.machineNetwork[0].cidr: Invalid value: "10.1.0.0/16": doesn't match the CIDR of the machinesSubnet, 10.0.0.0/16"#
            ]
        );
        assert_eq!(
            platform_errors(&platform, &Networking::default()),
            vec![
                "networking.machineNetwork: Required value: machineNetwork is required when machinesSubnet is set"
            ]
        );

        let platform = Platform {
            machines_subnet: Some("other".to_owned()),
            ..Platform::default()
        };
        assert_eq!(
            platform_errors(&platform, &networking("10.0.0.0/16")),
            vec![r#"platform.openstack.machinesSubnet: Not found: "other""#]
        );
    }

    #[test]
    fn test_platform_flavor_uses_control_plane_minimums() {
        let platform = Platform {
            compute_flavor: Some("m1.large".to_owned()),
            ..Platform::default()
        };
        let errors = platform_errors(&platform, &Networking::default());
        assert_eq!(errors.len(), 1);
        let prefix = r#"platform.openstack.computeFlavor: Invalid value: "m1.large""#;
        assert!(errors[0].starts_with(prefix), "{errors:?}");
        for unmet in [
            "Must have minimum of 16384 MB RAM, had 8192 MB",
            "Must have minimum of 4 VCPUs, had 2",
            "Must have minimum of 25 GB Disk, had 20 GB",
        ] {
            assert!(errors[0].contains(unmet), "{errors:?}");
        }
    }

    #[test]
    fn test_machine_pool_flavor() {
        let path = openstack_path(FieldPath::new("compute").index(0));
        let pool = MachinePool {
            flavor_name: Some("m1.large".to_owned()),
            ..MachinePool::default()
        };

        // Disk is too small, everything else meets the compute minimums
        assert_eq!(
            pool_errors(&pool, false, &path),
            vec![
                r#"compute[0].platform.openstack.type: Invalid value: "m1.large": Flavor did not meet the following minimum requirements: Must have minimum of 25 GB Disk, had 20 GB"#
            ]
        );

        // Booting from a volume makes the flavor's disk irrelevant
        let pool = MachinePool {
            root_volume: Some(RootVolume {
                size: 30,
                volume_type: "performance".to_owned(),
            }),
            ..pool
        };
        assert!(pool_errors(&pool, false, &path).is_empty());

        // ...but RAM and CPU still count for the control plane
        assert_eq!(pool_errors(&pool, true, &path).len(), 1);
    }

    #[test]
    fn test_machine_pool_unknown_and_baremetal_flavor() {
        let path = openstack_path(FieldPath::new("controlPlane"));
        let unknown = MachinePool {
            flavor_name: Some("m9.huge".to_owned()),
            ..MachinePool::default()
        };
        assert_eq!(
            pool_errors(&unknown, true, &path),
            vec![r#"controlPlane.platform.openstack.type: Not found: "m9.huge""#]
        );

        let baremetal = MachinePool {
            flavor_name: Some("baremetal".to_owned()),
            ..MachinePool::default()
        };
        assert!(pool_errors(&baremetal, true, &path).is_empty());
    }

    #[test]
    fn test_machine_pool_root_volume() {
        let path = openstack_path(FieldPath::new("compute").index(1));
        let pool = MachinePool {
            root_volume: Some(RootVolume {
                size: 10,
                volume_type: String::new(),
            }),
            ..MachinePool::default()
        };
        assert_eq!(
            pool_errors(&pool, false, &path),
            vec![
                r#"compute[1].platform.openstack.rootVolume.size: Invalid value: "10": Volume size must be at least 25 GB"#,
                "compute[1].platform.openstack.rootVolume.type: Required value: A volume type must be specified to use root volumes",
            ]
        );
    }

    #[test]
    fn test_machine_pool_references() {
        let path = openstack_path(FieldPath::new("compute").index(0));
        let pool = MachinePool {
            zones: vec!["az1".to_owned(), "az7".to_owned()],
            additional_network_ids: vec!["6e4d1f2a-int".to_owned(), "net-x".to_owned()],
            additional_security_group_ids: vec!["sg-2".to_owned(), "sg-1".to_owned()],
            ..MachinePool::default()
        };
        assert_eq!(
            pool_errors(&pool, false, &path),
            vec![
                r#"compute[0].platform.openstack.zones[1]: Unsupported value: "az7": supported values: "az0", "az1""#,
                r#"compute[0].platform.openstack.additionalNetworkIDs[1]: Not found: "net-x""#,
                r#"compute[0].platform.openstack.additionalSecurityGroupIDs[0]: Not found: "sg-2""#,
            ]
        );
    }
}
