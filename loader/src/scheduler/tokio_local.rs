use std::rc::Rc;
use std::time::Duration;

use log::trace;
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, LocalSet};

use super::{Action, Scheduler};
use crate::error::{Error, Result};

/// Runs settle actions as tasks on a tokio [`LocalSet`].
///
/// Actions are not `Send`, so they are spawned onto the set this scheduler
/// holds rather than onto the runtime. Reporting works from anywhere on the
/// thread; settles run while the set is driven (`run_until` or awaiting it).
/// Cancelling aborts the sleeping task before it can run the action.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    local: Rc<LocalSet>,
}

impl TokioScheduler {
    pub fn new(local: Rc<LocalSet>) -> Self {
        Self { local }
    }

    /// Same as [`new`](Self::new), but fails unless called inside a runtime
    /// that can later drive the set's timers.
    pub fn try_current(local: Rc<LocalSet>) -> Result<Self> {
        Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::new(local))
    }

    pub fn local_set(&self) -> &Rc<LocalSet> {
        &self.local
    }
}

impl Scheduler for TokioScheduler {
    type Token = JoinHandle<()>;

    fn schedule(&self, delay: Duration, action: Action) -> JoinHandle<()> {
        self.local.spawn_local(async move {
            tokio::time::sleep(delay).await;
            action();
        })
    }

    fn cancel(&self, token: JoinHandle<()>) {
        trace!("aborting settle task");
        token.abort();
    }
}
