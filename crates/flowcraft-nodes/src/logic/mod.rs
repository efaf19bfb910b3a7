//! Logic node types. If/else has dedicated branching behavior; loop
//! and iteration use the shared pass-through.

pub mod if_else;

pub use if_else::IfElseProcessor;
