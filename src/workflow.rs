//! Deployment workflow engine.
//!
//! The state machine that drives one deployment attempt. It's dumb: it
//! walks the fixed command sequence and calls the transport. No SSH, no
//! key handling, no persistence. Just logic.

use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::log::CommandLog;
use crate::remote::{RemoteConnector, RemoteSession};
use crate::state::{DeploymentState, Phase};
use crate::types::{CommandOutcome, CommandStep};

/// The deployment workflow engine.
///
/// Parameterized by the connector; you provide the transport. One instance
/// drives one attempt at a time, and an attempt is one-shot: fresh state in,
/// terminal state out, no resume.
pub struct DeploymentWorkflow<'a, C: RemoteConnector> {
    connector: &'a C,
    config: DeployConfig,
    log: &'a dyn CommandLog,
}

impl<'a, C: RemoteConnector> DeploymentWorkflow<'a, C> {
    /// Create a new workflow engine.
    pub fn new(connector: &'a C, config: DeployConfig, log: &'a dyn CommandLog) -> Self {
        Self {
            connector,
            config,
            log,
        }
    }

    /// Run the attempt to a terminal phase.
    ///
    /// Opens one session, issues the command steps in order, and closes the
    /// session before returning, on every path. A non-zero exit status stops
    /// the sequence; so does any transport error. Whatever the steps did to
    /// the remote host by then stays done: there is no rollback.
    pub async fn run(&self, state: &mut DeploymentState) -> Result<(), DeployError> {
        let mut session = match self.open_session().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(host = %self.config.target.host, error = %err, "could not establish session");
                state.fail(err.to_string());
                return Err(err);
            }
        };
        state.transition(Phase::Connected);
        tracing::info!(host = %self.config.target.host, "connected to remote host");

        let result = self.run_steps(&mut session, state).await;

        // The single close point. Every path after a successful open funnels
        // through here exactly once.
        session.close().await;

        match result {
            Ok(()) => {
                state.transition(Phase::Succeeded);
                tracing::info!(app = %state.app_name, "deployment succeeded");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(app = %state.app_name, error = %err, "deployment failed");
                state.fail(err.to_string());
                Err(err)
            }
        }
    }

    async fn run_steps(
        &self,
        session: &mut C::Session,
        state: &mut DeploymentState,
    ) -> Result<(), DeployError> {
        let steps = self.config.command_steps(&state.app_name);
        let phases = [Phase::Fetched, Phase::Built, Phase::Running, Phase::Cleaned];

        for (step, phase) in steps.iter().zip(phases) {
            let outcome = self.run_step(session, step).await?;
            state.record_step(&step.description, outcome.exit_status);

            if !outcome.is_success() {
                return Err(DeployError::StepFailed {
                    step: step.description.clone(),
                    exit_status: outcome.exit_status,
                });
            }
            state.transition(phase);
        }

        Ok(())
    }

    async fn run_step(
        &self,
        session: &mut C::Session,
        step: &CommandStep,
    ) -> Result<CommandOutcome, DeployError> {
        tracing::info!(step = %step.description, command = %step.command, "executing remote command");

        match self.config.command_timeout {
            Some(limit) => tokio::time::timeout(limit, session.run(step, self.log))
                .await
                .map_err(|_| {
                    DeployError::Command(format!(
                        "step '{}' timed out after {}s",
                        step.description,
                        limit.as_secs()
                    ))
                })?,
            None => session.run(step, self.log).await,
        }
    }

    async fn open_session(&self) -> Result<C::Session, DeployError> {
        let target = &self.config.target;

        match self.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, self.connector.open(target))
                .await
                .map_err(|_| {
                    DeployError::Connection(format!(
                        "connect to {}:{} timed out after {}s",
                        target.host,
                        target.port,
                        limit.as_secs()
                    ))
                })?,
            None => self.connector.open(target).await,
        }
    }
}
