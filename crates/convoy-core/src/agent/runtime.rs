//! Agent registry and execution runtime.
//!
//! Holds registered agents in a concurrent map, routes capability requests
//! through [`route`], runs depth-bounded handoff chains, and fans work out
//! across multiple agents in parallel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use convoy_types::agent::{AgentContext, AgentResult, Handoff};
use convoy_types::error::AgentError;
use dashmap::DashMap;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::box_agent::BoxAgent;
use super::router::{RoutingStrategy, route};

/// One completed handoff edge in a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffHop {
    /// Agent that issued the handoff.
    pub from: String,
    /// Agent that received it.
    pub to: String,
    /// Reason carried on the directive.
    pub reason: String,
    /// Forked branch the receiving agent ran on.
    pub thread_id: Uuid,
}

/// Final result of a handoff chain plus the edges it traversed.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffOutcome {
    /// Result of the last agent in the chain.
    pub result: AgentResult,
    /// Handoff edges in execution order; empty when the first agent
    /// answered terminally.
    pub hops: Vec<HandoffHop>,
}

/// Registry slot: an agent plus its registration sequence number.
pub struct RegisteredAgent {
    seq: u64,
    agent: BoxAgent,
}

/// Registry plus execution entry points for a set of agents.
pub struct AgentRuntime {
    agents: DashMap<String, Arc<RegisteredAgent>>,
    next_seq: AtomicU64,
    strategy: RoutingStrategy,
}

impl AgentRuntime {
    /// Default ceiling for handoff chains, counted in agent invocations.
    pub const DEFAULT_MAX_DEPTH: usize = 4;

    /// Empty runtime using [`RoutingStrategy::HighestPriority`].
    pub fn new() -> Self {
        Self::with_strategy(RoutingStrategy::default())
    }

    /// Empty runtime with an explicit routing strategy.
    pub fn with_strategy(strategy: RoutingStrategy) -> Self {
        Self {
            agents: DashMap::new(),
            next_seq: AtomicU64::new(0),
            strategy,
        }
    }

    /// Register an agent under its metadata name.
    ///
    /// Names are unique; re-registering one is a validation error.
    pub fn register(&self, agent: BoxAgent) -> Result<(), AgentError> {
        let name = agent.name().to_string();
        if name.trim().is_empty() {
            return Err(AgentError::Validation(
                "agent name must not be empty".to_string(),
            ));
        }
        match self.agents.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AgentError::Validation(format!(
                "agent '{name}' is already registered"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Arc::new(RegisteredAgent { seq, agent }));
                info!(agent = %name, "registered agent");
                Ok(())
            }
        }
    }

    /// Remove an agent by name. Returns whether it was registered.
    pub fn deregister(&self, name: &str) -> bool {
        let removed = self.agents.remove(name).is_some();
        if removed {
            info!(agent = %name, "deregistered agent");
        }
        removed
    }

    /// Look up a registered agent by name.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredAgent>> {
        self.agents.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agents are registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Registered agent names in registration order.
    pub fn agent_names(&self) -> Vec<String> {
        self.ordered()
            .iter()
            .map(|r| r.agent.name().to_string())
            .collect()
    }

    fn ordered(&self) -> Vec<Arc<RegisteredAgent>> {
        let mut snapshot: Vec<Arc<RegisteredAgent>> = self
            .agents
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        snapshot.sort_by_key(|r| r.seq);
        snapshot
    }

    /// Route `capability` to one agent under the runtime's strategy.
    pub fn resolve(&self, capability: &str) -> Result<Arc<RegisteredAgent>, AgentError> {
        let snapshot = self.ordered();
        let refs: Vec<&BoxAgent> = snapshot.iter().map(|r| &r.agent).collect();
        let chosen = route(&refs, capability, self.strategy)?;
        let name = chosen.name();
        self.get(name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_string()))
    }

    /// Route a capability and run the chosen agent once.
    pub async fn execute(
        &self,
        capability: &str,
        input: &str,
        context: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        let registered = self.resolve(capability)?;
        registered.agent.execute(input, context).await
    }

    /// Route a capability and follow handoff directives up to `max_depth`
    /// total invocations.
    ///
    /// Each hop forks the context onto a fresh branch, merges the previous
    /// agent's state patch, and re-renders the input from the handoff
    /// directive. A chain still handing off after `max_depth` invocations
    /// fails with a validation error; `max_depth == 0` fails before any
    /// agent runs.
    pub async fn execute_with_handoff(
        &self,
        capability: &str,
        input: &str,
        context: &AgentContext,
        max_depth: usize,
    ) -> Result<HandoffOutcome, AgentError> {
        if max_depth == 0 {
            return Err(AgentError::Validation(
                "handoff depth limit must be at least 1".to_string(),
            ));
        }
        let initial = self.resolve(capability)?;
        self.run_handoff_chain(initial, input, context, max_depth)
            .await
    }

    /// Follow handoff directives starting from a named agent instead of a
    /// routed capability.
    pub async fn execute_with_handoff_from(
        &self,
        initial_agent: &str,
        input: &str,
        context: &AgentContext,
        max_depth: usize,
    ) -> Result<HandoffOutcome, AgentError> {
        if max_depth == 0 {
            return Err(AgentError::Validation(
                "handoff depth limit must be at least 1".to_string(),
            ));
        }
        let initial = self
            .get(initial_agent)
            .ok_or_else(|| AgentError::AgentNotFound(initial_agent.to_string()))?;
        self.run_handoff_chain(initial, input, context, max_depth)
            .await
    }

    async fn run_handoff_chain(
        &self,
        initial: Arc<RegisteredAgent>,
        input: &str,
        context: &AgentContext,
        max_depth: usize,
    ) -> Result<HandoffOutcome, AgentError> {
        let mut current = initial;
        let mut current_input = input.to_string();
        let mut ctx = context.clone();
        let mut hops = Vec::new();

        for depth in 1..=max_depth {
            let result = current.agent.execute(&current_input, &ctx).await?;
            for (key, value) in &result.state_patch {
                ctx.set_state(key.clone(), value.clone());
            }

            let Some(handoff) = result.handoff.clone() else {
                info!(
                    agent = %result.agent,
                    hops = hops.len(),
                    "handoff chain completed"
                );
                return Ok(HandoffOutcome { result, hops });
            };

            if depth == max_depth {
                warn!(
                    agent = %result.agent,
                    target = %handoff.target,
                    max_depth,
                    "handoff chain exceeded depth limit"
                );
                return Err(AgentError::Validation(format!(
                    "handoff chain exceeded depth limit of {max_depth}"
                )));
            }

            let next = self
                .get(&handoff.target)
                .ok_or_else(|| AgentError::AgentNotFound(handoff.target.clone()))?;

            ctx = ctx.fork_for(Uuid::now_v7());
            hops.push(HandoffHop {
                from: result.agent.clone(),
                to: handoff.target.clone(),
                reason: handoff.reason.clone(),
                thread_id: ctx.thread_id,
            });
            current_input = render_handoff_input(&result.agent, &handoff);
            current = next;
        }

        // The loop either returns a terminal result or errors at the
        // depth boundary.
        unreachable!("handoff loop exits within max_depth iterations")
    }

    /// Run the named agents concurrently against the same input and fold
    /// their results with `aggregate`.
    ///
    /// Each agent runs on its own forked branch. Results come back in the
    /// order of `names` regardless of completion order; any single failure
    /// fails the whole fan-out.
    pub async fn execute_parallel<F>(
        &self,
        names: &[&str],
        input: &str,
        context: &AgentContext,
        aggregate: F,
    ) -> Result<AgentResult, AgentError>
    where
        F: Fn(&[AgentResult]) -> AgentResult,
    {
        if names.is_empty() {
            return Err(AgentError::Validation(
                "parallel execution needs at least one agent".to_string(),
            ));
        }

        let mut participants = Vec::with_capacity(names.len());
        for name in names {
            let registered = self
                .get(name)
                .ok_or_else(|| AgentError::AgentNotFound((*name).to_string()))?;
            participants.push(registered);
        }

        let mut join_set = JoinSet::new();
        for (index, registered) in participants.into_iter().enumerate() {
            let input = input.to_string();
            let ctx = context.fork_for(Uuid::now_v7());
            join_set.spawn(async move {
                let result = registered.agent.execute(&input, &ctx).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<AgentResult>> = vec![None; names.len()];
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(|e| AgentError::Execution {
                agent: "<parallel>".to_string(),
                message: format!("task panicked or was cancelled: {e}"),
            })?;
            slots[index] = Some(result?);
        }

        let results: Vec<AgentResult> = slots.into_iter().flatten().collect();
        if results.len() != names.len() {
            return Err(AgentError::Execution {
                agent: "<parallel>".to_string(),
                message: "fan-out lost a task result".to_string(),
            });
        }

        info!(agents = names.len(), "parallel fan-out completed");
        Ok(aggregate(&results))
    }
}

impl Default for AgentRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisteredAgent {
    /// The wrapped agent.
    pub fn agent(&self) -> &BoxAgent {
        &self.agent
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("agents", &self.agents.len())
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Render the input a handoff target receives.
fn render_handoff_input(from: &str, handoff: &Handoff) -> String {
    match &handoff.payload {
        Some(payload) => format!(
            "[handoff from {from}] {}\n{payload}",
            handoff.reason
        ),
        None => format!("[handoff from {from}] {}", handoff.reason),
    }
}

/// Default fan-out aggregator: one result per line, tagged by agent name,
/// with merged metadata and an `executed_count` entry.
pub fn default_aggregate(results: &[AgentResult]) -> AgentResult {
    let content = results
        .iter()
        .map(|r| format!("[{}] {}", r.agent, r.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut metadata = BTreeMap::new();
    for result in results {
        for (key, value) in &result.metadata {
            metadata.insert(key.clone(), value.clone());
        }
    }
    metadata.insert("executed_count".to_string(), results.len().to_string());

    AgentResult {
        agent: "aggregate".to_string(),
        content,
        handoff: None,
        state_patch: BTreeMap::new(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use convoy_types::agent::AgentMetadata;
    use serde_json::json;

    use super::*;
    use crate::agent::box_agent::Agent;

    /// Scripted agent: returns a fixed result, optionally a handoff.
    struct ScriptedAgent {
        meta: AgentMetadata,
        handoff: Option<Handoff>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedAgent {
        fn terminal(name: &str, capability: &str, priority: i32) -> (BoxAgent, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let agent = BoxAgent::new(Self {
                meta: AgentMetadata::new(name, [capability]).with_priority(priority),
                handoff: None,
                calls: Arc::clone(&calls),
            });
            (agent, calls)
        }

        fn forwarding(name: &str, capability: &str, target: &str) -> BoxAgent {
            BoxAgent::new(Self {
                meta: AgentMetadata::new(name, [capability]),
                handoff: Some(Handoff {
                    target: target.to_string(),
                    reason: format!("{name} forwards"),
                    payload: Some(json!({"from": name})),
                }),
                calls: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    impl Agent for ScriptedAgent {
        fn metadata(&self) -> &AgentMetadata {
            &self.meta
        }

        async fn execute(
            &self,
            input: &str,
            _context: &AgentContext,
        ) -> Result<AgentResult, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut result = AgentResult::new(&self.meta.name, format!("{}: {input}", self.meta.name))
                .with_metadata(format!("seen_by_{}", self.meta.name), "yes");
            if let Some(handoff) = &self.handoff {
                result = result.with_handoff(handoff.clone());
            }
            Ok(result)
        }
    }

    fn chain_runtime() -> AgentRuntime {
        // a -> b -> c -> d, three handoff edges, four invocations.
        let runtime = AgentRuntime::new();
        runtime
            .register(ScriptedAgent::forwarding("a", "triage", "b"))
            .unwrap();
        runtime
            .register(ScriptedAgent::forwarding("b", "refine", "c"))
            .unwrap();
        runtime
            .register(ScriptedAgent::forwarding("c", "draft", "d"))
            .unwrap();
        let (d, _) = ScriptedAgent::terminal("d", "answer", 0);
        runtime.register(d).unwrap();
        runtime
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let runtime = AgentRuntime::new();
        let (first, _) = ScriptedAgent::terminal("solo", "x", 0);
        let (second, _) = ScriptedAgent::terminal("solo", "y", 0);
        runtime.register(first).unwrap();
        let err = runtime.register(second).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert_eq!(runtime.len(), 1);
    }

    #[test]
    fn test_deregister_frees_the_name() {
        let runtime = AgentRuntime::new();
        let (first, _) = ScriptedAgent::terminal("solo", "x", 0);
        runtime.register(first).unwrap();

        assert!(runtime.deregister("solo"));
        assert!(!runtime.deregister("solo"));

        let (second, _) = ScriptedAgent::terminal("solo", "y", 0);
        runtime.register(second).unwrap();
        assert_eq!(runtime.agent_names(), vec!["solo".to_string()]);
    }

    #[tokio::test]
    async fn test_execute_routes_by_priority() {
        let runtime = AgentRuntime::new();
        let (high, high_calls) = ScriptedAgent::terminal("high", "search", 10);
        let (low, low_calls) = ScriptedAgent::terminal("low", "search", 1);
        runtime.register(low).unwrap();
        runtime.register(high).unwrap();

        let ctx = AgentContext::new(Uuid::now_v7());
        let result = runtime.execute("search", "query", &ctx).await.unwrap();

        assert_eq!(result.agent, "high");
        assert_eq!(high_calls.load(Ordering::SeqCst), 1);
        assert_eq!(low_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_unknown_capability() {
        let runtime = AgentRuntime::new();
        let ctx = AgentContext::new(Uuid::now_v7());
        let err = runtime.execute("nope", "x", &ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::NoAgentForCapability(_)));
    }

    #[tokio::test]
    async fn test_handoff_chain_within_depth() {
        let runtime = chain_runtime();
        let ctx = AgentContext::new(Uuid::now_v7());

        let outcome = runtime
            .execute_with_handoff("triage", "ticket 42", &ctx, 4)
            .await
            .unwrap();

        assert_eq!(outcome.result.agent, "d");
        assert_eq!(outcome.hops.len(), 3);
        assert_eq!(outcome.hops[0].from, "a");
        assert_eq!(outcome.hops[0].to, "b");
        assert_eq!(outcome.hops[2].to, "d");
        // Each hop runs on its own forked branch.
        let mut branches: Vec<Uuid> = outcome.hops.iter().map(|h| h.thread_id).collect();
        branches.dedup();
        assert_eq!(branches.len(), 3);
        assert!(!branches.contains(&ctx.thread_id));
    }

    #[tokio::test]
    async fn test_handoff_from_named_agent() {
        let runtime = chain_runtime();
        let ctx = AgentContext::new(Uuid::now_v7());

        // Start mid-chain at "c", skipping capability routing entirely.
        let outcome = runtime
            .execute_with_handoff_from("c", "ticket 42", &ctx, 4)
            .await
            .unwrap();
        assert_eq!(outcome.result.agent, "d");
        assert_eq!(outcome.hops.len(), 1);

        let err = runtime
            .execute_with_handoff_from("ghost", "x", &ctx, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::AgentNotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_handoff_input_carries_source_and_reason() {
        let runtime = AgentRuntime::new();
        runtime
            .register(ScriptedAgent::forwarding("front", "intake", "back"))
            .unwrap();
        let (back, _) = ScriptedAgent::terminal("back", "resolve", 0);
        runtime.register(back).unwrap();

        let ctx = AgentContext::new(Uuid::now_v7());
        let outcome = runtime
            .execute_with_handoff("intake", "hello", &ctx, 2)
            .await
            .unwrap();

        assert!(outcome.result.content.contains("[handoff from front]"));
        assert!(outcome.result.content.contains("front forwards"));
    }

    #[tokio::test]
    async fn test_handoff_chain_exceeding_depth_fails() {
        let runtime = chain_runtime();
        let ctx = AgentContext::new(Uuid::now_v7());

        let err = runtime
            .execute_with_handoff("triage", "ticket 42", &ctx, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_handoff_depth_zero_rejected_before_invocation() {
        let runtime = AgentRuntime::new();
        let (agent, calls) = ScriptedAgent::terminal("a", "triage", 0);
        runtime.register(agent).unwrap();

        let ctx = AgentContext::new(Uuid::now_v7());
        let err = runtime
            .execute_with_handoff("triage", "x", &ctx, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handoff_unknown_target() {
        let runtime = AgentRuntime::new();
        runtime
            .register(ScriptedAgent::forwarding("a", "triage", "ghost"))
            .unwrap();

        let ctx = AgentContext::new(Uuid::now_v7());
        let err = runtime
            .execute_with_handoff("triage", "x", &ctx, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::AgentNotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_parallel_results_in_input_order() {
        let runtime = AgentRuntime::new();
        for name in ["one", "two", "three"] {
            let (agent, _) = ScriptedAgent::terminal(name, "work", 0);
            runtime.register(agent).unwrap();
        }

        let ctx = AgentContext::new(Uuid::now_v7());
        let result = runtime
            .execute_parallel(&["three", "one", "two"], "go", &ctx, default_aggregate)
            .await
            .unwrap();

        let lines: Vec<&str> = result.content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[three]"));
        assert!(lines[1].starts_with("[one]"));
        assert!(lines[2].starts_with("[two]"));
        assert_eq!(result.metadata.get("executed_count"), Some(&"3".to_string()));
        assert_eq!(
            result.metadata.get("seen_by_one"),
            Some(&"yes".to_string())
        );
    }

    #[tokio::test]
    async fn test_parallel_unknown_agent_fails_fast() {
        let runtime = AgentRuntime::new();
        let (agent, calls) = ScriptedAgent::terminal("one", "work", 0);
        runtime.register(agent).unwrap();

        let ctx = AgentContext::new(Uuid::now_v7());
        let err = runtime
            .execute_parallel(&["one", "missing"], "go", &ctx, default_aggregate)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::AgentNotFound(name) if name == "missing"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parallel_single_failure_fails_fanout() {
        struct FailingAgent {
            meta: AgentMetadata,
        }

        impl Agent for FailingAgent {
            fn metadata(&self) -> &AgentMetadata {
                &self.meta
            }

            async fn execute(
                &self,
                _input: &str,
                _context: &AgentContext,
            ) -> Result<AgentResult, AgentError> {
                Err(AgentError::Execution {
                    agent: self.meta.name.clone(),
                    message: "boom".to_string(),
                })
            }
        }

        let runtime = AgentRuntime::new();
        let (ok_agent, _) = ScriptedAgent::terminal("ok", "work", 0);
        runtime.register(ok_agent).unwrap();
        runtime
            .register(BoxAgent::new(FailingAgent {
                meta: AgentMetadata::new("bad", ["work"]),
            }))
            .unwrap();

        let ctx = AgentContext::new(Uuid::now_v7());
        let err = runtime
            .execute_parallel(&["ok", "bad"], "go", &ctx, default_aggregate)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Execution { agent, .. } if agent == "bad"));
    }

    #[test]
    fn test_default_aggregate_empty() {
        let result = default_aggregate(&[]);
        assert_eq!(result.content, "");
        assert_eq!(result.metadata.get("executed_count"), Some(&"0".to_string()));
    }
}
