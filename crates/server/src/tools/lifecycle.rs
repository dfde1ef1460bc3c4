//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use swcache_client::{ActivateReport, InstallReport, ServiceWorker, WorkerState};

use super::json_result;

/// Output structure for the sw_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwInstallOutput {
    #[serde(flatten)]
    pub report: InstallReport,
    pub state: WorkerState,
}

/// Output structure for the sw_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwActivateOutput {
    #[serde(flatten)]
    pub report: ActivateReport,
    pub state: WorkerState,
    pub controlling: bool,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&SwInstallOutput { report, state: worker.state().await })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&SwActivateOutput { report, state: worker.state().await, controlling: worker.is_controlling().await })
}
