//! MCP `query_memories` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `query_memories` MCP tool.
///
/// `query_type` selects which other fields are read.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryMemoriesParams {
    /// `"similarity"`, `"temporal"`, `"type"`, `"related"`, or `"keywords"`.
    #[schemars(
        description = "Retrieval strategy: 'similarity', 'temporal', 'type', 'related', or 'keywords'. Unrecognized values search by keywords."
    )]
    pub query_type: String,

    #[schemars(description = "Words to match against memory content (keywords)")]
    pub keywords: Option<Vec<String>>,

    #[schemars(description = "Memory type to list (type)")]
    pub memory_type: Option<String>,

    #[schemars(description = "Query vector (similarity)")]
    pub embedding: Option<Vec<f32>>,

    /// RFC 3339. Exclusive.
    #[schemars(description = "Only memories created after this RFC 3339 time (temporal)")]
    pub start_time: Option<String>,

    /// RFC 3339. Exclusive.
    #[schemars(description = "Only memories created before this RFC 3339 time (temporal)")]
    pub end_time: Option<String>,

    #[schemars(description = "Memory to start the traversal from (related)")]
    pub memory_id: Option<String>,

    #[schemars(description = "Maximum hops to follow (related). Defaults to 1.")]
    pub depth: Option<usize>,

    #[schemars(description = "Maximum results, 1-1000. Defaults to 10.")]
    pub limit: Option<i64>,
}
