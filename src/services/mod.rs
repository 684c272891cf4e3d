mod provisioner;

pub use provisioner::{ProvisionError, UserProvisioner};
