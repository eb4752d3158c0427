use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cluster_installer_ca_bundle::DEFAULT_ANCHORS_DIR;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a PEM bundle of CA certificates into one trust anchor file per certificate
    ParseCaBundle(ParseCaBundleArguments),

    /// Check an OpenStack install config against an inventory of the target cloud
    ValidateInstallConfig(ValidateInstallConfigArguments),
}

#[derive(Parser, Debug)]
pub struct ParseCaBundleArguments {
    /// PEM file containing zero or more CA certificates
    #[arg(long, env = "CA_BUNDLE")]
    pub bundle: PathBuf,

    /// Directory to write one `.crt` file per certificate into
    ///
    /// Nothing is written if this is not set, only the manifest is produced.
    #[arg(long, env = "CA_BUNDLE_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// File to write the JSON manifest to. Defaults to stdout.
    #[arg(long, env = "CA_BUNDLE_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Directory the certificates are installed into on the target machines, used for the
    /// paths in the manifest
    #[arg(long, env = "CA_BUNDLE_ANCHORS_DIR", default_value = DEFAULT_ANCHORS_DIR)]
    pub anchors_dir: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ValidateInstallConfigArguments {
    /// The install config YAML to validate
    #[arg(long, env = "INSTALL_CONFIG")]
    pub install_config: PathBuf,

    /// YAML snapshot of the flavors, networks, subnets, security groups, floating IPs and
    /// availability zones of the target cloud
    #[arg(long, env = "CLOUD_INFO")]
    pub cloud_info: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_anchors_dir_default() {
        let args = ["cluster-installer", "parse-ca-bundle", "--bundle", "ca.crt"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::ParseCaBundle(args) = cli.command else {
            panic!("unexpected subcommand {:?}", cli.command);
        };
        assert_eq!(args.bundle, PathBuf::from("ca.crt"));
        assert_eq!(args.anchors_dir, PathBuf::from(DEFAULT_ANCHORS_DIR));
        assert_eq!(args.out_dir, None);
    }
}
