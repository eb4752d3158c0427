//! Walks an [`InstallConfig`] and hands each section that needs checking to a
//! [`PlatformValidator`], collecting every error along the way.

use cluster_installer_utils::error::error_full_message;

use crate::{
    field::{AggregateError, ErrorList, ErrorType, FieldError, FieldPath},
    openstack,
    types::Networking,
    InstallConfig,
};

/// Platform-specific checks, invoked once per install config section that belongs to the platform.
pub trait PlatformValidator {
    fn validate_platform(
        &self,
        platform: &openstack::Platform,
        networking: &Networking,
        path: &FieldPath,
    ) -> ErrorList;

    fn validate_machine_pool(
        &self,
        pool: &openstack::MachinePool,
        control_plane: bool,
        path: &FieldPath,
    ) -> ErrorList;
}

#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// `None` if the install config has no OpenStack platform section.
    Platform {
        platform: Option<&'a openstack::Platform>,
        networking: &'a Networking,
    },
    MachinePool {
        pool: &'a openstack::MachinePool,
        control_plane: bool,
    },
    TrustBundle(&'a str),
}

#[derive(Debug, Clone)]
pub struct Visit<'a> {
    pub path: FieldPath,
    pub target: Target<'a>,
}

/// Lists the sections of `install_config` to validate, in reporting order.
pub fn visits(install_config: &InstallConfig) -> Vec<Visit<'_>> {
    let mut visits = vec![Visit {
        path: FieldPath::new("platform").child("openstack"),
        target: Target::Platform {
            platform: install_config.platform.openstack.as_ref(),
            networking: &install_config.networking,
        },
    }];

    if let Some(pool) = install_config
        .platform
        .openstack
        .as_ref()
        .and_then(|platform| platform.default_machine_platform.as_ref())
    {
        visits.push(Visit {
            path: FieldPath::new("platform")
                .child("openstack")
                .child("defaultMachinePlatform"),
            target: Target::MachinePool {
                pool,
                control_plane: false,
            },
        });
    }

    if let Some(pool) = install_config
        .control_plane
        .as_ref()
        .and_then(|control_plane| control_plane.platform.openstack.as_ref())
    {
        visits.push(Visit {
            path: FieldPath::new("controlPlane")
                .child("platform")
                .child("openstack"),
            target: Target::MachinePool {
                pool,
                control_plane: true,
            },
        });
    }

    visits.extend(
        install_config
            .compute
            .iter()
            .enumerate()
            .filter_map(|(i, compute)| {
                let pool = compute.platform.openstack.as_ref()?;
                Some(Visit {
                    path: FieldPath::new("compute")
                        .index(i)
                        .child("platform")
                        .child("openstack"),
                    target: Target::MachinePool {
                        pool,
                        control_plane: false,
                    },
                })
            }),
    );

    if let Some(bundle) = &install_config.additional_trust_bundle {
        visits.push(Visit {
            path: FieldPath::new("additionalTrustBundle"),
            target: Target::TrustBundle(bundle),
        });
    }

    visits
}

/// Runs every visit of `install_config` through `validator`.
///
/// A failing section never stops the others from being checked.
pub fn validate(
    install_config: &InstallConfig,
    validator: &impl PlatformValidator,
) -> Result<(), AggregateError> {
    let mut errors = ErrorList::new();
    for Visit { path, target } in visits(install_config) {
        let found = match target {
            Target::Platform {
                platform: Some(platform),
                networking,
            } => validator.validate_platform(platform, networking, &path),
            Target::Platform { platform: None, .. } => ErrorList::from(FieldError::required(
                path.clone(),
                "platform.openstack must be set",
            )),
            Target::MachinePool {
                pool,
                control_plane,
            } => validator.validate_machine_pool(pool, control_plane, &path),
            Target::TrustBundle(bundle) => validate_trust_bundle(bundle, &path),
        };
        tracing::debug!(%path, error.count = found.len(), "validated install config section");
        errors.extend(found);
    }
    errors.into_aggregate()
}

fn validate_trust_bundle(bundle: &str, path: &FieldPath) -> ErrorList {
    match cluster_installer_ca_bundle::parse_certificate_bundle(bundle.as_bytes()) {
        Ok(_) => ErrorList::new(),
        Err(err) => ErrorList::from(FieldError::new(
            ErrorType::Invalid,
            path.clone(),
            None,
            Some(error_full_message(&err)),
        )),
    }
}
