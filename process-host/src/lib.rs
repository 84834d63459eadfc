#![deny(missing_docs)]
//! Multi-process concurrent hosting (§5) — runs many [`AgentProcess`]es
//! concurrently, one [`Executor`] per registered agent.
//!
//! Dispatches to registered agents via `HashMap<String, Arc<Executor>>`,
//! the same dispatch-table shape used by this workspace's earlier
//! single-call orchestration code. Concurrent dispatch still uses
//! `tokio::spawn`, one task per process, collected back through their
//! `JoinHandle`s. What changes is the unit of work: a single operator
//! call before, a whole plan-act-observe run (every tick until the
//! process stops ticking on its own) per task now.
//!
//! No durability and no in-flight process tracking: a process's
//! lifetime is the lifetime of its `dispatch`/`dispatch_many` call.
//! Cooperative cancellation (§5 "a `KILLED` signal checked at each tick
//! boundary") is threaded explicitly as a [`KillSwitch`] the caller
//! retains and can flip from another task, since there is no
//! in-flight process registry here to signal against by id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agentex_core::{AgentId, AgentProcess, BlackboardUpdater, HostError, ProcessStatus, ResponseOutcome};
use agentex_executor::Executor;

/// A shared, cooperative cancellation flag for one dispatched process.
///
/// Cloning shares the same underlying flag: the caller keeps a clone and
/// calls [`KillSwitch::kill`] from another task or thread to request
/// the process stop at its next tick boundary (§5).
#[derive(Clone, Default)]
pub struct KillSwitch(Arc<AtomicBool>);

impl KillSwitch {
    /// A fresh, not-yet-killed switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn kill(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether `kill` has been called.
    pub fn is_killed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

async fn run_to_completion(executor: &Executor, process: &mut AgentProcess, kill: &KillSwitch) {
    while process.status.should_tick() {
        if kill.is_killed() {
            process.status = ProcessStatus::Killed;
            return;
        }
        executor.tick(process).await;
    }
}

/// In-process host that dispatches to registered agent executors.
///
/// Uses `Arc<Executor>` for true concurrent dispatch via `tokio::spawn`.
/// Suitable for development, testing, and single-process deployments;
/// a durable/distributed host is a different crate entirely (§6
/// "Persistence" is handled by `agentex-store`, independently of this
/// one).
pub struct Host {
    executors: HashMap<String, Arc<Executor>>,
}

impl Host {
    /// Create a new, empty host.
    pub fn new() -> Self {
        Self { executors: HashMap::new() }
    }

    /// Register an executor under an agent id. Replaces any executor
    /// previously registered under the same id.
    pub fn register(&mut self, id: AgentId, executor: Arc<Executor>) {
        self.executors.insert(id.to_string(), executor);
    }

    /// Run `process` to completion against its registered agent: every
    /// tick until the process reaches `Waiting`, `Paused`, `Stuck`, or a
    /// terminal status, or until `kill` is flipped.
    pub async fn dispatch(
        &self,
        agent: &AgentId,
        mut process: AgentProcess,
        kill: KillSwitch,
    ) -> Result<AgentProcess, HostError> {
        let executor = self
            .executors
            .get(agent.as_str())
            .ok_or_else(|| HostError::AgentNotFound(agent.to_string()))?;
        run_to_completion(executor, &mut process, &kill).await;
        Ok(process)
    }

    /// Dispatch many processes concurrently, one `tokio::spawn`ed task
    /// per process, in the same order as `tasks`. An agent id with no
    /// registered executor fails only that task; the rest still run.
    pub async fn dispatch_many(
        &self,
        tasks: Vec<(AgentId, AgentProcess, KillSwitch)>,
    ) -> Vec<Result<AgentProcess, HostError>> {
        let mut handles = Vec::with_capacity(tasks.len());

        for (agent_id, mut process, kill) in tasks {
            match self.executors.get(agent_id.as_str()) {
                Some(executor) => {
                    let executor = Arc::clone(executor);
                    handles.push(tokio::spawn(async move {
                        run_to_completion(&executor, &mut process, &kill).await;
                        Ok(process)
                    }));
                }
                None => {
                    let name = agent_id.to_string();
                    handles.push(tokio::spawn(async move { Err(HostError::AgentNotFound(name)) }));
                }
            }
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(Err(HostError::DispatchFailed(e.to_string()))),
            }
        }

        results
    }

    /// Resume a `Waiting` process suspended on an awaitable (§4.6), then
    /// run it to completion again under the same kill switch. Delegates
    /// the resume step to the registered executor's
    /// [`agentex_executor::Executor::resume`].
    pub async fn resume(
        &self,
        agent: &AgentId,
        mut process: AgentProcess,
        updater: Option<BlackboardUpdater>,
        kill: KillSwitch,
    ) -> Result<(AgentProcess, ResponseOutcome), HostError> {
        let executor = self
            .executors
            .get(agent.as_str())
            .ok_or_else(|| HostError::AgentNotFound(agent.to_string()))?;
        let outcome = executor.resume(&mut process, updater);
        run_to_completion(executor, &mut process, &kill).await;
        Ok((process, outcome))
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}
