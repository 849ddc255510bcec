//! MCP tool modules.

pub mod active;
