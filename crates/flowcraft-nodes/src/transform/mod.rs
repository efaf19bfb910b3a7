//! Transform node types: code evaluation, math, string transforms,
//! template rendering, and variable plumbing.

pub mod code;
pub mod expr;
pub mod math;
pub mod strings;
pub mod template;
pub mod variables;

pub use code::CodeProcessor;
pub use math::MathCalculatorProcessor;
pub use strings::StringProcessor;
pub use template::TemplateProcessor;
pub use variables::{VariableAggregatorProcessor, VariableAssignProcessor};
