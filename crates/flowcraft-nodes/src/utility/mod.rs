//! Utility node types. Delay has dedicated behavior; webhook and
//! screen capture use the shared pass-through.

pub mod delay;

pub use delay::DelayProcessor;
