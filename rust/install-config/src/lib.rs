//! The parts of the install config that are validated before a cluster is installed, and the
//! validation itself.

pub mod field;
pub mod openstack;
pub mod types;
pub mod validate;

pub use crate::types::InstallConfig;
