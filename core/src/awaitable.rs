//! C9 — HITL Awaitable Protocol: the suspend/resume envelope for human
//! input, confirmations, and typed forms (§4.6).

use crate::id::AwaitableId;
use serde::{Deserialize, Serialize};

/// The shape of input an awaitable is requesting from outside the process.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AwaitableKind {
    /// A yes/no confirmation before a tool call proceeds.
    Confirmation,
    /// A request for a value of a specific domain type.
    TypeRequest,
    /// A request that binds a structured form's fields into the blackboard.
    FormBinding,
}

/// A request for external input that suspends the owning process.
///
/// An `AwaitableResponse` control signal (see
/// [`crate::model::ControlSignal::AwaitableResponse`]) thrown from a
/// tool transitions the process to `WAITING`; `payload` is what gets
/// surfaced to the caller.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Awaitable {
    /// Stable id, used to correlate a later response.
    pub id: AwaitableId,
    /// Arbitrary payload describing what's being asked for.
    pub payload: serde_json::Value,
    /// What kind of input is being requested.
    pub kind: AwaitableKind,
    /// If true, the platform must round-trip this awaitable through an
    /// opaque store (§6 "Persistence") so it survives a process restart.
    pub persistent: bool,
}

impl Awaitable {
    /// Create a new awaitable.
    pub fn new(
        id: impl Into<AwaitableId>,
        kind: AwaitableKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            payload,
            kind,
            persistent: false,
        }
    }

    /// Mark this awaitable as requiring durable storage.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

/// Outcome of handling a response to an awaitable (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The blackboard was updated (a bind or an added object).
    Updated,
    /// Nothing changed.
    Unchanged,
}
