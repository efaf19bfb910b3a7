//! Workflow execution engine
//!
//! Orchestrates one end-to-end run: topological ordering, sequential
//! node execution, context merging, per-node result aggregation, and
//! the per-call log stream. Nodes execute strictly sequentially in
//! topological order; a node is never started before all of its
//! upstream dependencies have been attempted.
//!
//! Failure semantics are asymmetric on purpose: node-level failures
//! (a processor returning `success: false`, or an unknown node type)
//! are recorded and the run continues, while structural errors (a
//! cyclic graph) abort the whole run. The caller always receives an
//! [`ExecutionReport`], never an `Err`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::execution::{
    ExecutionLog, ExecutionReport, ExecutionStatus, LogStatus, NodeOutput, WorkflowExecution,
};
use crate::processor::CONFIG_KEY;
use crate::registry::NodeRegistry;
use crate::topo::topological_order;
use crate::types::{GraphEdge, GraphNode, NodeId};

/// How node inputs are assembled from prior outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Every node sees the full variable bag: any upstream success is
    /// visible to all downstream nodes, edge-connected or not.
    #[default]
    Global,
    /// A node sees only the initial inputs plus the outputs of its
    /// direct upstream (edge-connected) nodes.
    EdgeScoped,
}

/// Engine configuration for one or more runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Input assembly policy. Defaults to [`MergePolicy::Global`].
    pub merge_policy: MergePolicy,
    /// Skip nodes that are only reachable through an ifElse branch
    /// that was not taken. Off by default: all topologically-reachable
    /// nodes execute regardless of branch decisions.
    pub prune_untaken_branches: bool,
    /// Workflow identifier stamped on executions and logs.
    pub workflow_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::Global,
            prune_untaken_branches: false,
            workflow_id: "workflow".to_string(),
        }
    }
}

/// The workflow execution engine.
pub struct WorkflowEngine {
    registry: Arc<NodeRegistry>,
    config: EngineConfig,
}

impl WorkflowEngine {
    /// Create an engine with default configuration.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(registry: Arc<NodeRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Execute a workflow without external cancellation.
    pub async fn execute_workflow(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        inputs: HashMap<String, Value>,
    ) -> ExecutionReport {
        self.execute_workflow_with_cancellation(nodes, edges, inputs, CancellationToken::new())
            .await
    }

    /// Execute a workflow, checking `token` before each node.
    pub async fn execute_workflow_with_cancellation(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        inputs: HashMap<String, Value>,
        token: CancellationToken,
    ) -> ExecutionReport {
        let execution_id = format!("exec-{}", uuid::Uuid::new_v4());
        let workflow_id = self.config.workflow_id.clone();
        let mut logs: Vec<ExecutionLog> = Vec::new();
        let mut execution =
            WorkflowExecution::start(&execution_id, &workflow_id, inputs.clone());
        let mut context =
            ExecutionContext::new(&execution_id, inputs.clone()).with_cancellation(token.clone());

        log::info!(
            "Starting workflow '{}' ({} nodes, {} edges) as {}",
            workflow_id,
            nodes.len(),
            edges.len(),
            execution_id
        );
        logs.push(ExecutionLog::new(
            &workflow_id,
            "workflow",
            LogStatus::Running,
            format!("Workflow execution started ({} nodes)", nodes.len()),
        ));

        let order = match topological_order(nodes, edges) {
            Ok(order) => order,
            Err(err) => {
                // Structural precondition violation: fail the run
                // before executing anything further.
                let message = err.to_string();
                log::error!("Workflow '{}' failed: {}", workflow_id, message);
                logs.push(
                    ExecutionLog::new(&workflow_id, "workflow", LogStatus::Error, &message)
                        .with_error(&message),
                );
                execution.status = ExecutionStatus::Failed;
                execution.error = Some(message);
                execution.end_time = Some(chrono::Utc::now());
                return ExecutionReport { execution, logs };
            }
        };

        // Branch decisions made by ifElse nodes, for optional pruning.
        let mut taken_branches: HashMap<NodeId, String> = HashMap::new();
        let mut skipped: HashSet<NodeId> = HashSet::new();

        for index in order {
            let node = &nodes[index];

            if token.is_cancelled() {
                log::warn!("Workflow '{}' cancelled at node '{}'", workflow_id, node.id);
                logs.push(ExecutionLog::new(
                    &workflow_id,
                    &node.id,
                    LogStatus::Warning,
                    "Workflow cancelled before this node executed",
                ));
                execution.status = ExecutionStatus::Cancelled;
                execution.error = Some("Workflow cancelled".to_string());
                execution.end_time = Some(chrono::Utc::now());
                return ExecutionReport { execution, logs };
            }

            if self.config.prune_untaken_branches
                && is_pruned(node, edges, &taken_branches, &skipped)
            {
                log::debug!("Skipping node '{}' on untaken branch", node.id);
                logs.push(ExecutionLog::new(
                    &workflow_id,
                    &node.id,
                    LogStatus::Warning,
                    format!("Node '{}' skipped: only reachable via untaken branch", node.data.label),
                ));
                skipped.insert(node.id.clone());
                execution
                    .node_results
                    .insert(node.id.clone(), NodeOutput::success(json!({"skipped": true}), 0));
                continue;
            }

            let output = self.execute_node(node, edges, &context, &execution).await;

            if output.success {
                context.merge_output(&output.data);
                if let Some(branch) = output.data.get("branch").and_then(|b| b.as_str()) {
                    taken_branches.insert(node.id.clone(), branch.to_string());
                }
                logs.push(
                    ExecutionLog::new(
                        &workflow_id,
                        &node.id,
                        LogStatus::Success,
                        format!("Node '{}' completed", node.data.label),
                    )
                    .with_data(output.data.clone()),
                );
            } else {
                let error = output.error.clone().unwrap_or_else(|| "unknown error".to_string());
                log::warn!("Node '{}' failed: {}", node.id, error);
                logs.push(
                    ExecutionLog::new(
                        &workflow_id,
                        &node.id,
                        LogStatus::Error,
                        format!("Node '{}' failed", node.data.label),
                    )
                    .with_error(error),
                );
            }

            execution.node_results.insert(node.id.clone(), output);
        }

        execution.status = ExecutionStatus::Completed;
        execution.end_time = Some(chrono::Utc::now());
        execution.outputs = Some(context.variables.clone());
        logs.push(ExecutionLog::new(
            &workflow_id,
            "workflow",
            LogStatus::Success,
            "Workflow execution completed",
        ));
        log::info!("Workflow '{}' completed as {}", workflow_id, execution_id);

        ExecutionReport { execution, logs }
    }

    /// Execute a single node, converting every failure mode into a
    /// `NodeOutput` so the run can continue.
    async fn execute_node(
        &self,
        node: &GraphNode,
        edges: &[GraphEdge],
        context: &ExecutionContext,
        execution: &WorkflowExecution,
    ) -> NodeOutput {
        let started = Instant::now();

        let processor = match self.registry.create_processor(&node.data.node_type) {
            Ok(processor) => processor,
            Err(err) => {
                // Unknown type is fatal to this node only.
                return NodeOutput::failure(err.to_string(), elapsed_ms(started));
            }
        };

        let input = self.prepare_input(node, edges, context, execution);
        log::debug!("Executing node '{}' (type '{}')", node.id, node.data.node_type);

        // Under the edge-scoped policy the processor's view of the
        // variable bag must match its prepared input, or context
        // lookups would bypass the scoping.
        let scoped;
        let node_context = match self.config.merge_policy {
            MergePolicy::Global => context,
            MergePolicy::EdgeScoped => {
                let mut ctx = context.clone();
                ctx.variables = input
                    .iter()
                    .filter(|(key, _)| key.as_str() != CONFIG_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                scoped = ctx;
                &scoped
            }
        };

        processor.execute(&input, node_context).await
    }

    /// Assemble the input map for a node: its config under `config`,
    /// plus prior outputs per the configured merge policy.
    fn prepare_input(
        &self,
        node: &GraphNode,
        edges: &[GraphEdge],
        context: &ExecutionContext,
        execution: &WorkflowExecution,
    ) -> HashMap<String, Value> {
        let mut input: HashMap<String, Value> = match self.config.merge_policy {
            MergePolicy::Global => context.variables.clone(),
            MergePolicy::EdgeScoped => {
                let mut scoped = execution.inputs.clone();
                for edge in crate::types::incoming_edges(edges, &node.id) {
                    if let Some(result) = execution.node_results.get(&edge.source) {
                        if let Value::Object(map) = &result.data {
                            for (key, value) in map {
                                scoped.insert(key.clone(), value.clone());
                            }
                        }
                    }
                }
                scoped
            }
        };

        input.insert(
            CONFIG_KEY.to_string(),
            Value::Object(node.data.config.clone()),
        );
        input
    }
}

/// A node is pruned when it has incoming edges and every one of them
/// originates either from a pruned node or from an ifElse handle that
/// the condition did not take.
fn is_pruned(
    node: &GraphNode,
    edges: &[GraphEdge],
    taken_branches: &HashMap<NodeId, String>,
    skipped: &HashSet<NodeId>,
) -> bool {
    let mut has_incoming = false;
    for edge in crate::types::incoming_edges(edges, &node.id) {
        has_incoming = true;
        if skipped.contains(&edge.source) {
            continue;
        }
        match (taken_branches.get(&edge.source), &edge.source_handle) {
            (Some(taken), Some(handle)) if taken != handle => continue,
            // Live path into this node: not pruned.
            _ => return false,
        }
    }
    has_incoming
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{NodeCategory, NodeDefinition, NodeRegistration};
    use crate::schema::NodeSchema;
    use crate::processor::NodeProcessor;
    use async_trait::async_trait;
    use serde_json::Map;

    struct StampProcessor;

    #[async_trait]
    impl NodeProcessor for StampProcessor {
        fn schema(&self) -> NodeSchema {
            NodeSchema::default()
        }

        async fn execute(
            &self,
            input: &HashMap<String, Value>,
            _context: &ExecutionContext,
        ) -> NodeOutput {
            // Echo the configured key so tests can observe merging.
            let config = crate::processor::node_config(input);
            let key = config
                .get("key")
                .and_then(|v| v.as_str())
                .unwrap_or("stamp")
                .to_string();
            NodeOutput::success(json!({ key: true }), 1)
        }
    }

    struct FailProcessor;

    #[async_trait]
    impl NodeProcessor for FailProcessor {
        fn schema(&self) -> NodeSchema {
            NodeSchema::default()
        }

        async fn execute(
            &self,
            _input: &HashMap<String, Value>,
            _context: &ExecutionContext,
        ) -> NodeOutput {
            NodeOutput::failure("always fails", 1)
        }
    }

    fn test_registry() -> Arc<NodeRegistry> {
        let mut registry = NodeRegistry::new();
        registry.register(&NodeRegistration {
            node_type: "stamp",
            definition: || NodeDefinition {
                node_type: "stamp".to_string(),
                category: NodeCategory::Utilities,
                label: "Stamp".to_string(),
                description: "Stamps a variable".to_string(),
                color: "#999999".to_string(),
                schema: NodeSchema::default(),
                default_config: Map::new(),
            },
            factory: || Box::new(StampProcessor),
        });
        registry.register(&NodeRegistration {
            node_type: "alwaysFail",
            definition: || NodeDefinition {
                node_type: "alwaysFail".to_string(),
                category: NodeCategory::Utilities,
                label: "Always Fail".to_string(),
                description: "Fails".to_string(),
                color: "#990000".to_string(),
                schema: NodeSchema::default(),
                default_config: Map::new(),
            },
            factory: || Box::new(FailProcessor),
        });
        Arc::new(registry)
    }

    fn stamp_node(id: &str, key: &str) -> GraphNode {
        let mut config = Map::new();
        config.insert("key".to_string(), json!(key));
        GraphNode::new(id, "stamp").with_config(config)
    }

    #[tokio::test]
    async fn test_completed_run_has_all_results() {
        let engine = WorkflowEngine::new(test_registry());
        let nodes = vec![stamp_node("a", "a_done"), stamp_node("b", "b_done")];
        let edges = vec![GraphEdge::new("e1", "a", "b")];

        let report = engine.execute_workflow(&nodes, &edges, HashMap::new()).await;
        assert_eq!(report.execution.status, ExecutionStatus::Completed);
        assert_eq!(report.execution.node_results.len(), 2);
        let outputs = report.execution.outputs.unwrap();
        assert_eq!(outputs.get("a_done"), Some(&json!(true)));
        assert_eq!(outputs.get("b_done"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_cycle_fails_run() {
        let engine = WorkflowEngine::new(test_registry());
        let nodes = vec![stamp_node("a", "a"), stamp_node("b", "b")];
        let edges = vec![GraphEdge::new("e1", "a", "b"), GraphEdge::new("e2", "b", "a")];

        let report = engine.execute_workflow(&nodes, &edges, HashMap::new()).await;
        assert_eq!(report.execution.status, ExecutionStatus::Failed);
        let error = report.execution.error.unwrap();
        assert!(error.contains("Circular"));
    }

    #[tokio::test]
    async fn test_node_failure_does_not_stop_run() {
        let engine = WorkflowEngine::new(test_registry());
        let nodes = vec![
            GraphNode::new("bad", "alwaysFail"),
            stamp_node("after", "after_done"),
        ];
        let edges = vec![GraphEdge::new("e1", "bad", "after")];

        let report = engine.execute_workflow(&nodes, &edges, HashMap::new()).await;
        assert_eq!(report.execution.status, ExecutionStatus::Completed);
        assert!(!report.execution.node_results["bad"].success);
        assert!(report.execution.node_results["after"].success);
    }

    #[tokio::test]
    async fn test_unknown_node_type_fails_node_only() {
        let engine = WorkflowEngine::new(test_registry());
        let nodes = vec![GraphNode::new("ghost", "noSuchType"), stamp_node("ok", "ok")];

        let report = engine.execute_workflow(&nodes, &[], HashMap::new()).await;
        assert_eq!(report.execution.status, ExecutionStatus::Completed);
        let ghost = &report.execution.node_results["ghost"];
        assert!(!ghost.success);
        assert!(ghost.error.as_ref().unwrap().contains("Unknown node type"));
        assert!(report.execution.node_results["ok"].success);
    }

    #[tokio::test]
    async fn test_cancellation_before_first_node() {
        let engine = WorkflowEngine::new(test_registry());
        let nodes = vec![stamp_node("a", "a_done")];
        let token = CancellationToken::new();
        token.cancel();

        let report = engine
            .execute_workflow_with_cancellation(&nodes, &[], HashMap::new(), token)
            .await;
        assert_eq!(report.execution.status, ExecutionStatus::Cancelled);
        assert!(report.execution.node_results.is_empty());
    }

    #[tokio::test]
    async fn test_logs_are_per_call() {
        let engine = WorkflowEngine::new(test_registry());
        let nodes = vec![stamp_node("a", "a_done")];

        let first = engine.execute_workflow(&nodes, &[], HashMap::new()).await;
        let second = engine.execute_workflow(&nodes, &[], HashMap::new()).await;
        assert_eq!(first.logs.len(), second.logs.len());
        assert_ne!(first.execution.id, second.execution.id);
    }
}
