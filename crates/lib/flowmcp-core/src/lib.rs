//! Core engine for flowmcp.
//!
//! This crate turns tool names and tool references into executable calls:
//! it merges the global and project configuration, enumerates and loads schema
//! modules, types their parameters, composes optional handler hooks, and
//! serves preload routes from an on-disk TTL cache. The outbound request itself
//! is delegated to a [`runtime::SchemaRuntime`] supplied by the host.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod control;
pub mod handlers;
pub mod params;
pub mod paths;
pub mod reference;
pub mod runtime;

pub use control::{
    CallOptions, CallResult, CoreError, FlowControlPlane, GroupSummary, LiveTestFilters,
    LiveTestReport, StatusReport, ToolDescriptor, ValidationReport,
};
pub use paths::FlowPaths;
pub use runtime::{PreparedCall, RuntimeError, SchemaRuntime};
