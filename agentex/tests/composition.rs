//! Facade composition test: build a small agent purely through
//! `agentex::prelude` re-exports and drive it to completion through a
//! `Host`, proving the feature-gated re-export surface actually
//! composes end to end rather than just type-checking in isolation.
//!
//! Requires the `host` feature (which pulls in `core`, `planner`,
//! `events`, and `executor`): `cargo test -p agentex --features host`.

#![cfg(feature = "host")]

use agentex::prelude::*;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

struct Fetch;
#[async_trait]
impl agentex_core::ActionBody for Fetch {
    async fn execute(&self, ctx: &mut agentex_core::ProcessContext<'_>) -> agentex_core::ActionResult {
        ctx.set_condition("fetched", true);
        Ok(agentex_core::ActionStatus::Completed)
    }
}

struct Summarize;
#[async_trait]
impl agentex_core::ActionBody for Summarize {
    async fn execute(&self, ctx: &mut agentex_core::ProcessContext<'_>) -> agentex_core::ActionResult {
        ctx.set_condition("summarized", true);
        Ok(agentex_core::ActionStatus::Completed)
    }
}

fn researcher() -> Arc<Agent> {
    let fetch = Action {
        name: "Fetch".into(),
        description: String::new(),
        inputs: vec![],
        outputs: vec![],
        cost: Arc::new(|_| Decimal::ONE),
        value: Arc::new(|_| Decimal::ZERO),
        pre: vec![],
        post: vec![agentex_core::PostEffect::condition("fetched", true)],
        can_rerun: false,
        qos: QosConfig::default(),
        tool_groups: HashSet::new(),
        body: Arc::new(Fetch),
    };
    let summarize = Action {
        name: "Summarize".into(),
        description: String::new(),
        inputs: vec![],
        outputs: vec![],
        cost: Arc::new(|_| Decimal::ONE),
        value: Arc::new(|_| Decimal::ZERO),
        pre: vec![Predicate::condition("fetched", true)],
        post: vec![agentex_core::PostEffect::condition("summarized", true)],
        can_rerun: false,
        qos: QosConfig::default(),
        tool_groups: HashSet::new(),
        body: Arc::new(Summarize),
    };
    let goal = Goal {
        name: "Summarized".into(),
        description: String::new(),
        inputs: vec![],
        output_type: None,
        pre: vec![Predicate::condition("summarized", true)],
        value: Decimal::ONE,
    };
    Arc::new(Agent {
        name: "researcher".into(),
        provider: "local".into(),
        version: "0.1.0".into(),
        description: String::new(),
        actions: vec![fetch, summarize],
        goals: vec![goal],
        conditions: vec![],
        opaque: serde_json::Value::Null,
    })
}

#[tokio::test]
async fn prelude_types_compose_into_a_running_process() {
    let events = Arc::new(EventBus::new());
    let registry = Arc::new(agentex_core::TypeRegistry::new());
    let planner: Box<dyn Planner + Send + Sync> = Box::new(GoapPlanner::default());
    let executor = Arc::new(Executor::new(researcher(), registry, planner, Some(events), EarlyTermination::default()));

    let mut host = Host::new();
    let id = agentex_core::AgentId::new("researcher");
    host.register(id.clone(), executor);

    let process = AgentProcess::new(agentex_core::ProcessId::new("p1"), Blackboard::new());
    let result = host.dispatch(&id, process, KillSwitch::new()).await.unwrap();

    assert_eq!(result.status, ProcessStatus::Completed);
    assert_eq!(result.has_run, vec!["Fetch".to_string(), "Summarize".to_string()]);
}
