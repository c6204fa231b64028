//! The transport seam: `RemoteConnector` and `RemoteSession`.
//!
//! These two traits are the single abstraction point for everything that
//! touches the network. The workflow engine is pure logic: it doesn't know
//! about SSH, exec channels, or key files. That's YOUR problem when you
//! implement them.

use crate::config::RemoteTarget;
use crate::error::DeployError;
use crate::log::CommandLog;
use crate::types::{CommandOutcome, CommandStep};
use std::future::Future;

/// Opens authenticated sessions against a remote target.
///
/// One `open` call per deployment attempt. Connectors are stateless and
/// shareable; sessions are not.
pub trait RemoteConnector: Send + Sync {
    /// The session type `open` yields.
    type Session: RemoteSession;

    /// Establish and authenticate a session.
    ///
    /// Covers TCP connect, host key verification per the target's policy,
    /// and publickey auth. Any failure is a `Connection` error; an
    /// implementation must not leak a half-open transport when auth is
    /// rejected.
    fn open(
        &self,
        target: &RemoteTarget,
    ) -> impl Future<Output = Result<Self::Session, DeployError>> + Send;
}

/// One authenticated session. Exclusively owned by its deployment attempt.
pub trait RemoteSession: Send {
    /// Run one command to completion, forwarding each output line to `log`
    /// as it arrives.
    ///
    /// A non-zero exit status is a normal outcome, not an error. Errors are
    /// channel-level only: the command could not be dispatched, output could
    /// not be read, or the channel ended without reporting an exit status.
    fn run(
        &mut self,
        step: &CommandStep,
        log: &dyn CommandLog,
    ) -> impl Future<Output = Result<CommandOutcome, DeployError>> + Send;

    /// Terminate the session. Infallible and idempotent: calling it twice,
    /// or on a session whose transport already died, does nothing.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
