pub mod ca_bundle;
pub mod install_config;
