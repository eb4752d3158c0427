use std::path::PathBuf;

use cluster_installer_install_config::{
    field::AggregateError,
    openstack::{self, CloudInfo},
    InstallConfig,
};
use snafu::{ResultExt, Snafu};

use crate::cli::ValidateInstallConfigArguments;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to load install config from {path}", path = path.display()))]
    LoadInstallConfig {
        source: cluster_installer_install_config::types::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to load cloud inventory from {path}", path = path.display()))]
    LoadCloudInfo {
        source: openstack::CloudInfoError,
        path: PathBuf,
    },

    #[snafu(display("install config {path} is invalid", path = path.display()))]
    Invalid {
        source: AggregateError,
        path: PathBuf,
    },
}

pub fn validate_install_config(args: ValidateInstallConfigArguments) -> Result<(), Error> {
    let install_config = InstallConfig::from_file(&args.install_config).context(
        LoadInstallConfigSnafu {
            path: &args.install_config,
        },
    )?;
    let cloud_info = CloudInfo::from_file(&args.cloud_info).context(LoadCloudInfoSnafu {
        path: &args.cloud_info,
    })?;

    if let Err(err) = openstack::validate(&install_config, &cloud_info) {
        for error in err.errors() {
            tracing::error!(
                field.path = %error.path,
                field.error = %error.kind,
                "{error}"
            );
        }
        return Err(err).context(InvalidSnafu {
            path: args.install_config,
        });
    }

    tracing::info!(
        install_config = %args.install_config.display(),
        "Install config is valid"
    );
    Ok(())
}
