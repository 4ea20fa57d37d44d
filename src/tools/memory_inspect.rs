use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryInspectParams {
    #[schemars(description = "ID of the memory to inspect")]
    pub id: String,

    #[schemars(description = "If false, omit outgoing relations from the response (default: true)")]
    pub include_relations: Option<bool>,
}
