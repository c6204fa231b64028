//! One-shot request handling.
//!
//! Map in, string out. The response strings are part of the interface and
//! callers match on them, so don't get creative here.

use std::collections::HashMap;

use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::log::CommandLog;
use crate::remote::RemoteConnector;
use crate::state::DeploymentState;
use crate::types::DeployRequest;
use crate::workflow::DeploymentWorkflow;

/// Handle one deployment request given as key-value fields.
///
/// A missing or empty `appName` is answered without any remote action.
pub async fn handle<C: RemoteConnector>(
    connector: &C,
    config: DeployConfig,
    log: &dyn CommandLog,
    fields: &HashMap<String, String>,
) -> String {
    match DeployRequest::from_fields(fields) {
        Ok(request) => run_and_respond(connector, config, log, &request).await,
        Err(err) => failure_response(&err),
    }
}

/// Handle one deployment request given as a JSON envelope,
/// e.g. `{"appName":"orders-svc"}`.
pub async fn handle_json<C: RemoteConnector>(
    connector: &C,
    config: DeployConfig,
    log: &dyn CommandLog,
    payload: &str,
) -> String {
    match DeployRequest::from_json(payload) {
        Ok(request) => run_and_respond(connector, config, log, &request).await,
        Err(err) => failure_response(&err),
    }
}

/// Run one attempt on its own task, with remote output going to `tracing`.
///
/// The task is the fault barrier: anything unexpected, a panic included,
/// is caught here and folded into the normal failure response instead of
/// taking the caller down.
pub async fn handle_in_task<C>(
    connector: C,
    config: DeployConfig,
    fields: HashMap<String, String>,
) -> String
where
    C: RemoteConnector + 'static,
{
    use crate::log::TracingLog;

    let task = tokio::spawn(async move { handle(&connector, config, &TracingLog, &fields).await });

    match task.await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "deployment task aborted");
            failure_response(&DeployError::Fault(format!("deployment task aborted: {err}")))
        }
    }
}

/// Production wiring: the bundled SSH connector, config from the
/// environment, the fault barrier of [`handle_in_task`].
#[cfg(feature = "ssh-client")]
pub async fn handle_request(fields: HashMap<String, String>) -> String {
    use crate::ssh::SshConnector;

    handle_in_task(SshConnector::new(), DeployConfig::from_env(), fields).await
}

async fn run_and_respond<C: RemoteConnector>(
    connector: &C,
    config: DeployConfig,
    log: &dyn CommandLog,
    request: &DeployRequest,
) -> String {
    let workflow = DeploymentWorkflow::new(connector, config, log);
    let mut state = DeploymentState::new(&request.app_name);

    match workflow.run(&mut state).await {
        Ok(()) => format!("App '{}' successfully deployed on EC2!", request.app_name),
        Err(err) => failure_response(&err),
    }
}

fn failure_response(err: &DeployError) -> String {
    match err {
        // Input problems keep their own prefix; the message already says
        // what was wrong with the request.
        DeployError::Input(msg) => format!("Error: {msg}"),
        other => format!("Error during deployment: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_response_input() {
        let err = DeployError::Input("'appName' is required!".to_string());
        assert_eq!(failure_response(&err), "Error: 'appName' is required!");
    }

    #[test]
    fn test_failure_response_deployment_errors() {
        let err = DeployError::StepFailed {
            step: "docker build".to_string(),
            exit_status: 1,
        };
        assert_eq!(
            failure_response(&err),
            "Error during deployment: step 'docker build' failed with exit status: 1"
        );

        let err = DeployError::Connection("connect to 16.171.129.206:22 failed".to_string());
        assert_eq!(
            failure_response(&err),
            "Error during deployment: connection failed: connect to 16.171.129.206:22 failed"
        );
    }
}
