use agentex_core::{
    Action, ActionBody, ActionResult, ActionStatus, Agent, AgentId, AgentProcess, Blackboard, Goal, Predicate,
    ProcessContext, ProcessId, ProcessStatus, QosConfig, TypeRegistry,
};
use agentex_executor::Executor;
use agentex_host::{Host, KillSwitch};
use agentex_planner::GoapPlanner;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

struct Fetch;
#[async_trait]
impl ActionBody for Fetch {
    async fn execute(&self, ctx: &mut ProcessContext<'_>) -> ActionResult {
        ctx.set_condition("fetched", true);
        Ok(ActionStatus::Completed)
    }
}

struct Summarize;
#[async_trait]
impl ActionBody for Summarize {
    async fn execute(&self, ctx: &mut ProcessContext<'_>) -> ActionResult {
        ctx.set_condition("summarized", true);
        Ok(ActionStatus::Completed)
    }
}

fn goap_agent() -> Arc<Agent> {
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
async fn goap_backed_agent_runs_to_completion_through_the_host() {
    let agent = goap_agent();
    let registry = Arc::new(TypeRegistry::new());
    let planner = Box::new(GoapPlanner::default());
    let executor = Arc::new(Executor::new(agent, registry, planner, None, Default::default()));

    let mut host = Host::new();
    let id = AgentId::new("researcher");
    host.register(id.clone(), executor);

    let process = AgentProcess::new(ProcessId::new("p1"), Blackboard::new());
    let result = host.dispatch(&id, process, KillSwitch::new()).await.unwrap();

    assert_eq!(result.status, ProcessStatus::Completed);
    assert_eq!(result.has_run, vec!["Fetch".to_string(), "Summarize".to_string()]);
}

#[tokio::test]
async fn two_independent_processes_run_concurrently_without_interfering() {
    let registry = Arc::new(TypeRegistry::new());
    let executor = Arc::new(Executor::new(goap_agent(), registry, Box::new(GoapPlanner::default()), None, Default::default()));

    let mut host = Host::new();
    let id = AgentId::new("researcher");
    host.register(id.clone(), executor);

    let tasks = vec![
        (id.clone(), AgentProcess::new(ProcessId::new("p1"), Blackboard::new()), KillSwitch::new()),
        (id.clone(), AgentProcess::new(ProcessId::new("p2"), Blackboard::new()), KillSwitch::new()),
    ];

    let results = host.dispatch_many(tasks).await;
    for result in results {
        let process = result.unwrap();
        assert_eq!(process.status, ProcessStatus::Completed);
        assert_eq!(process.has_run, vec!["Fetch".to_string(), "Summarize".to_string()]);
    }
}
