//! Flowcraft node library
//!
//! Built-in node types for the Flowcraft workflow engine. Each module
//! implements [`flowcraft_engine::NodeProcessor`] for one node type and
//! registers it with `inventory::submit!`; linking this crate is enough
//! for `NodeRegistry::from_inventory()` to see every type.
//!
//! All effects are simulated: HTTP never leaves the process, the LLM
//! produces deterministic completions, and the code node evaluates a
//! restricted expression language. The control flow around them
//! (validation, retry, timeout, cancellation) is real.

pub mod ai;
pub mod io;
pub mod logic;
pub mod passthrough;
pub mod transform;
pub mod utility;

pub use ai::LlmProcessor;
pub use io::{EndProcessor, HttpRequestProcessor, StartProcessor};
pub use logic::IfElseProcessor;
pub use passthrough::DefaultProcessor;
pub use transform::{
    CodeProcessor, MathCalculatorProcessor, StringProcessor, TemplateProcessor,
    VariableAggregatorProcessor, VariableAssignProcessor,
};
pub use utility::DelayProcessor;

#[cfg(test)]
mod tests {
    use flowcraft_engine::{NodeCategory, NodeRegistry};

    const EXPECTED_TYPES: &[&str] = &[
        "start",
        "end",
        "httpRequest",
        "fileUpload",
        "database",
        "llm",
        "agent",
        "knowledgeRetrieval",
        "questionClassification",
        "ifElse",
        "loop",
        "iteration",
        "code",
        "template",
        "variableAggregator",
        "variableAssign",
        "stringProcessor",
        "mathCalculator",
        "delay",
        "webhook",
        "screenCapture",
    ];

    #[test]
    fn test_all_node_types_registered() {
        let registry = NodeRegistry::from_inventory();
        for node_type in EXPECTED_TYPES {
            assert!(
                registry.has_node_type(node_type),
                "missing node type '{node_type}'"
            );
        }
        assert_eq!(registry.node_types().len(), EXPECTED_TYPES.len());
    }

    #[test]
    fn test_category_assignment() {
        let registry = NodeRegistry::from_inventory();
        let llm = registry.definition("llm").unwrap();
        assert_eq!(llm.category, NodeCategory::AiLlm);
        let if_else = registry.definition("ifElse").unwrap();
        assert_eq!(if_else.category, NodeCategory::Logic);
        let math = registry.definition("mathCalculator").unwrap();
        assert_eq!(math.category, NodeCategory::Transform);
        let delay = registry.definition("delay").unwrap();
        assert_eq!(delay.category, NodeCategory::Utilities);
    }

    #[test]
    fn test_factories_produce_processors() {
        let registry = NodeRegistry::from_inventory();
        for node_type in EXPECTED_TYPES {
            let processor = registry
                .create_processor(node_type)
                .unwrap_or_else(|_| panic!("no factory for '{node_type}'"));
            // Schema is always retrievable, even when empty
            let _ = processor.schema();
        }
    }
}
