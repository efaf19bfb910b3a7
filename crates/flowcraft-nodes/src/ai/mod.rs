//! AI node types. Only the LLM node has dedicated behavior; agent,
//! knowledge retrieval, and question classification use the shared
//! pass-through until their backends land.

pub mod llm;

pub use llm::LlmProcessor;
