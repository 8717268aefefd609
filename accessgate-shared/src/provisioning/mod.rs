/// Account provisioning from confirmed purchases
///
/// # Modules
///
/// - `workflow`: the idempotent check → generate → hash → persist → notify run
/// - `dispatcher`: detached background execution of runs with graceful drain

pub mod dispatcher;
pub mod workflow;

pub use dispatcher::Dispatcher;
pub use workflow::{
    ProvisionError, ProvisionOutcome, ProvisionRequest, ProvisioningConfig, ProvisioningWorkflow,
};
