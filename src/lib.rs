//! In-process cognitive memory for AI agents, served over MCP.
//!
//! Mnemo keeps a bounded table of memories, each indexed four ways at once:
//!
//! | Index | Answers |
//! |-------|---------|
//! | **Type** | every memory of one cognitive category |
//! | **Time** | memories created inside a window, bucketed by hour |
//! | **Keyword** | memories whose content contains any of a set of words |
//! | **Embedding** | the k nearest memories by cosine similarity |
//!
//! A directed relation graph links memories, and two background tasks keep
//! the table healthy: decay lowers the importance of idle memories and drops
//! those below a floor, while consolidation promotes busy or important
//! short-term memories to long-term.
//!
//! Memory types:
//!
//! | Type | Purpose |
//! |------|---------|
//! | **short_term** | Fresh working memory, candidates for consolidation |
//! | **long_term** | Consolidated memory |
//! | **episodic** | Events, decisions, session logs |
//! | **semantic** | Facts, knowledge, preferences |
//! | **procedural** | Workflows, patterns, how-to |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`memory`]: The engine: store, query, relations, stats and maintenance

pub mod config;
pub mod memory;
