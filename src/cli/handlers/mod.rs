//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - rag: Questions and retrieval
//! - info: Information display (corpus, tier, backends)

pub mod info;
pub mod rag;

// Re-export all public handlers
pub use info::*;
pub use rag::*;
