use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreMemoryParams {
    #[schemars(description = "The natural language content of the memory")]
    pub content: String,

    #[schemars(
        description = "Memory type: 'short_term' (default), 'long_term', 'episodic' (events/experiences), 'semantic' (facts/knowledge), 'procedural' (how-to/processes)"
    )]
    pub r#type: Option<String>,

    #[schemars(description = "Importance 0.0-1.0. Missing or out-of-range values use the configured default.")]
    pub importance: Option<f64>,

    #[schemars(description = "Optional embedding vector for similarity search")]
    pub embedding: Option<Vec<f32>>,

    #[schemars(description = "Optional JSON object of caller metadata")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,

    #[schemars(description = "IDs of existing memories to link from this one with a 'related' edge")]
    pub relations: Option<Vec<String>>,
}
