/// Background dispatch of provisioning runs
///
/// The webhook route answers the payment platform immediately and hands the
/// actual work to a [`Dispatcher`]. Each run is spawned as its own Tokio task,
/// so a client disconnect or a dropped request future does not cancel it.
/// The task is the error boundary: errors and panics are logged and then
/// discarded, since nobody is left to receive them.
///
/// All runs are tracked so that shutdown can wait for in-flight work.
///
/// # Example
///
/// ```no_run
/// use accessgate_shared::notify::DisabledNotifier;
/// use accessgate_shared::provisioning::{Dispatcher, ProvisionRequest, ProvisioningConfig, ProvisioningWorkflow};
/// use accessgate_shared::store::MemoryUserStore;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() {
/// let workflow = ProvisioningWorkflow::new(
///     Arc::new(MemoryUserStore::new()),
///     Arc::new(DisabledNotifier::new("not configured")),
///     ProvisioningConfig::default(),
/// );
/// let dispatcher = Dispatcher::new(workflow);
///
/// dispatcher.dispatch(ProvisionRequest::new("Ana Silva", "ana@example.com"));
/// dispatcher.shutdown(Duration::from_secs(30)).await;
/// # }
/// ```

use super::workflow::{ProvisionOutcome, ProvisionRequest, ProvisioningWorkflow};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Spawns provisioning runs detached from the request that triggered them
#[derive(Clone)]
pub struct Dispatcher {
    workflow: Arc<ProvisioningWorkflow>,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Creates a dispatcher for the given workflow
    pub fn new(workflow: ProvisioningWorkflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
            tracker: TaskTracker::new(),
        }
    }

    /// Starts a provisioning run in the background
    ///
    /// Returns immediately. The returned handle may be dropped; the run keeps
    /// going either way.
    pub fn dispatch(&self, request: ProvisionRequest) -> JoinHandle<()> {
        let span = tracing::info_span!("provision", email = %request.email);
        let workflow = self.workflow.clone();

        let run = tokio::spawn(async move { workflow.run(request).await }.instrument(span.clone()));

        self.tracker.spawn(
            async move {
                match run.await {
                    Ok(Ok(ProvisionOutcome::AlreadyExists)) => {
                        tracing::debug!("Provisioning finished: already provisioned")
                    }
                    Ok(Ok(ProvisionOutcome::Created { user_id, notification })) => {
                        tracing::info!(user_id = %user_id, notification = %notification, "Provisioning finished")
                    }
                    Ok(Err(e)) => tracing::error!(error = %e, "Provisioning failed"),
                    Err(e) if e.is_panic() => tracing::error!("Provisioning task panicked"),
                    Err(e) => tracing::error!(error = %e, "Provisioning task was cancelled"),
                }
            }
            .instrument(span),
        )
    }

    /// Number of runs still in flight
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits for in-flight runs to finish, up to `grace`
    ///
    /// Returns `true` if every run finished in time. Runs dispatched after
    /// this call are still executed and awaited by later calls.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();

        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for in-flight provisioning runs");
        }

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Provisioning runs still in flight after grace period"
                );
                false
            }
        }
    }
}
