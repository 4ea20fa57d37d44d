//! MCP `create_relation` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `create_relation` MCP tool.
///
/// Creates a directed edge between two existing memories. Repeated calls
/// add parallel edges.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateRelationParams {
    /// ID of the source memory.
    #[schemars(description = "ID of the source memory")]
    pub from: String,

    /// ID of the target memory.
    #[schemars(description = "ID of the target memory")]
    pub to: String,

    /// Relationship label (e.g. `"causes"`, `"part_of"`).
    #[schemars(description = "Relationship label (e.g. 'causes', 'part_of', 'follows')")]
    pub relation_type: String,

    #[schemars(description = "Edge strength 0.0-1.0. Defaults to 0.5.")]
    pub strength: Option<f64>,
}
