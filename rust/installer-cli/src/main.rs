use clap::Parser;
use cli::{Cli, Command};
use snafu::{ResultExt, Snafu};
use tracing::level_filters::LevelFilter;

mod cli;
mod cmds;

const LOG_ENV_VAR: &str = "CLUSTER_INSTALLER_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to create tracing subscriber EnvFilter"))]
    CreateEnvFilter {
        source: tracing_subscriber::filter::FromEnvError,
    },

    #[snafu(display("failed to parse CA bundle"))]
    ParseCaBundle { source: cmds::ca_bundle::Error },

    #[snafu(display("failed to validate install config"))]
    ValidateInstallConfig {
        source: cmds::install_config::Error,
    },
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env()
        .context(CreateEnvFilterSnafu)?;
    tracing_subscriber::fmt()
        // Short running tool does not need any complex output
        .with_target(false)
        .without_time()
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::ParseCaBundle(args) => {
            cmds::ca_bundle::parse_ca_bundle(args).context(ParseCaBundleSnafu)
        }
        Command::ValidateInstallConfig(args) => {
            cmds::install_config::validate_install_config(args)
                .context(ValidateInstallConfigSnafu)
        }
    }
}
