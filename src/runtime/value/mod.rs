//! Type-erased values carried by events
//!
//! `Value` stores either a small set of primitives, which can cross a wire
//! boundary through serde, or an opaque shared payload of any `Send + Sync`
//! type, which stays in-process.

pub mod container;
pub use container::*;

#[cfg(test)]
mod tests;
