//! Utility types and functions

pub mod config;
pub mod hash;
pub mod logger;
