//! QoS retry envelope (§4.3 step 5, §7).

use agentex_core::{
    Action, ActionError, ActionStatus, Blackboard, ControlSignal, ErrorKind, ExecutorError, ProcessContext, ProcessId,
};

/// What the QoS envelope produced after running an action to completion,
/// exhaustion, or a control-flow signal.
pub(crate) enum QosOutcome {
    /// The action completed normally.
    Completed {
        /// Attempts taken, including the first.
        attempts: u32,
    },
    /// The action failed — either on business terms (never retried) or
    /// after exhausting its retry budget on a transient failure.
    Failed {
        /// Attempts taken, including the first.
        attempts: u32,
        /// The terminal error.
        error: ExecutorError,
    },
    /// A control-flow signal bypassed the envelope entirely. Per §7,
    /// these are never retried and never treated as a failure.
    ControlFlow {
        /// The signal raised.
        signal: ControlSignal,
        /// Which attempt raised it.
        attempts: u32,
    },
}

/// Run `action.body.execute` under its QoS envelope: retry on a
/// `Transient` failure whose `kind` is in `action.qos.retry_on`, up to
/// `action.qos.max_attempts` attempts total, waiting `action.qos.backoff`
/// between attempts.
pub(crate) async fn run_with_qos(
    action: &Action,
    process_id: &ProcessId,
    blackboard: &mut Blackboard,
) -> QosOutcome {
    let mut attempt: u32 = 1;
    loop {
        let mut ctx = ProcessContext::new(blackboard, process_id.clone(), attempt);
        match action.body.execute(&mut ctx).await {
            Ok(ActionStatus::Completed) => return QosOutcome::Completed { attempts: attempt },
            Ok(ActionStatus::Failed(message)) => {
                return QosOutcome::Failed {
                    attempts: attempt,
                    error: ExecutorError::ActionBusinessFailure(message),
                }
            }
            Err(ActionError::Business(message)) => {
                return QosOutcome::Failed {
                    attempts: attempt,
                    error: ExecutorError::ActionBusinessFailure(message),
                }
            }
            Err(ActionError::ControlFlow(signal)) => return QosOutcome::ControlFlow { signal, attempts: attempt },
            Err(ActionError::Transient { kind, message }) => {
                if action.qos.retry_on.contains(&kind) && attempt < action.qos.max_attempts {
                    tokio::time::sleep(action.qos.backoff.to_std()).await;
                    attempt += 1;
                    continue;
                }
                let error = if kind == ErrorKind::GuardRailViolation {
                    ExecutorError::GuardRailViolation(message)
                } else {
                    ExecutorError::ActionTransientFailure(message)
                };
                return QosOutcome::Failed { attempts: attempt, error };
            }
        }
    }
}
