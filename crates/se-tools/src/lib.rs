//! Tool Surface for the Sketch Session
//!
//! Named tools with JSON arguments over a [`se_cad::SketchSession`], plus a
//! runner for newline-delimited tool scripts.

pub mod config;
pub mod router;

pub use config::{EngineKind, ToolConfig};
pub use router::{ToolCall, ToolDefinition, ToolError, ToolRouter, run_script};
