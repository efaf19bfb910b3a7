//! Node type registry
//!
//! A static, read-only mapping from node type identifier to its
//! definition (category, label, schema, default config) and processor
//! factory. Node crates submit registrations at link time via
//! `inventory`; the registry is built once at startup with
//! [`NodeRegistry::from_inventory`]. New node types are added by
//! submitting a new registration, never by runtime mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};
use crate::processor::NodeProcessor;
use crate::schema::NodeSchema;

/// Palette category of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    /// Sources and sinks (start, end, http, files, databases)
    InputOutput,
    /// Model-backed nodes (llm, agents, retrieval, classification)
    AiLlm,
    /// Control flow (conditionals, loops, iteration)
    Logic,
    /// Data transforms (code, templates, math, strings, variables)
    Transform,
    /// Everything else (delay, webhooks, capture)
    Utilities,
}

/// Static definition of a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    /// Unique type identifier (e.g. "httpRequest")
    pub node_type: String,
    /// Palette category
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Accent color used by the canvas
    pub color: String,
    /// Config schema for the properties form and validation
    pub schema: NodeSchema,
    /// Default config applied when the node is dropped on the canvas
    pub default_config: Map<String, Value>,
}

/// Link-time registration of a node type.
///
/// Submitted with `inventory::submit!` next to each processor
/// implementation; collected by [`NodeRegistry::from_inventory`].
pub struct NodeRegistration {
    /// Type identifier; must match `definition().node_type`
    pub node_type: &'static str,
    /// Builds the static definition
    pub definition: fn() -> NodeDefinition,
    /// Builds a processor instance
    pub factory: fn() -> Box<dyn NodeProcessor>,
}

inventory::collect!(NodeRegistration);

struct RegistryEntry {
    definition: NodeDefinition,
    factory: fn() -> Box<dyn NodeProcessor>,
}

/// Registry of node types with their definitions and processor factories
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build the registry from all link-time submitted registrations
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<NodeRegistration> {
            registry.register(registration);
        }
        registry
    }

    /// Register a node type
    pub fn register(&mut self, registration: &NodeRegistration) {
        let definition = (registration.definition)();
        debug_assert_eq!(definition.node_type, registration.node_type);
        self.entries.insert(
            registration.node_type.to_string(),
            RegistryEntry {
                definition,
                factory: registration.factory,
            },
        );
    }

    /// Get the definition for a node type
    pub fn definition(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.entries.get(node_type).map(|e| &e.definition)
    }

    /// All registered definitions
    pub fn all_definitions(&self) -> Vec<&NodeDefinition> {
        self.entries.values().map(|e| &e.definition).collect()
    }

    /// Definitions in a palette category
    pub fn by_category(&self, category: NodeCategory) -> Vec<&NodeDefinition> {
        self.entries
            .values()
            .map(|e| &e.definition)
            .filter(|d| d.category == category)
            .collect()
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// All registered node type identifiers
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Instantiate the processor for a node type.
    ///
    /// This is the single point where an invalid or typo'd type is
    /// caught at execution time.
    pub fn create_processor(&self, node_type: &str) -> Result<Box<dyn NodeProcessor>> {
        let entry = self
            .entries
            .get(node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(node_type.to_string()))?;
        Ok((entry.factory)())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::from_inventory()
    }
}
