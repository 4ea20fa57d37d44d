pub mod create_relation;
pub mod forget_memory;
pub mod memory_inspect;
pub mod memory_stats;
pub mod query_memories;
pub mod store_memory;

use chrono::{DateTime, Utc};
use create_relation::CreateRelationParams;
use forget_memory::ForgetMemoryParams;
use memory_inspect::MemoryInspectParams;
use memory_stats::MemoryStatsParams;
use query_memories::QueryMemoriesParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, ListResourcesResult, PaginatedRequestParams, RawResource,
    ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_handler, tool_router, ErrorData, RoleServer, ServerHandler};
use std::sync::Arc;
use store_memory::StoreMemoryParams;

use mnemo::memory::{MemoryStore, MemoryType, NewMemory, QueryCriteria};

/// The Mnemo MCP tool handler. Holds the shared engine and exposes every
/// operation via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct MnemoTools {
    tool_router: ToolRouter<Self>,
    store: Arc<MemoryStore>,
}

/// Read-only resource with the output of `memory_stats`.
pub const STATS_URI: &str = "memory://stats";
/// Read-only resource with node and edge counts of the relation graph.
pub const GRAPH_URI: &str = "memory://graph";

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

fn parse_time(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| format!("{field} is not an RFC 3339 time: {e}"))
        })
        .transpose()
}

#[tool_router]
impl MnemoTools {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            store,
        }
    }

    /// Store a new memory.
    #[tool(description = "Store a new memory. Types: short_term (default), long_term, episodic (events), semantic (facts), procedural (how-to). At capacity the least important memory is evicted.")]
    async fn store_memory(
        &self,
        Parameters(params): Parameters<StoreMemoryParams>,
    ) -> Result<String, String> {
        let memory_type = match params.r#type.as_deref() {
            Some(t) => t.parse::<MemoryType>().map_err(|e| e.to_string())?,
            None => MemoryType::default(),
        };

        tracing::info!(
            content_len = params.content.len(),
            memory_type = %memory_type,
            "store_memory called"
        );

        let input = NewMemory {
            memory_type,
            content: params.content,
            embedding: params.embedding,
            metadata: params.metadata.unwrap_or_default(),
            relations: params.relations.unwrap_or_default(),
            importance: params.importance,
        };
        let memory = self
            .store
            .store_memory(input)
            .map_err(|e| format!("store failed: {e}"))?;
        to_json(&memory)
    }

    /// Retrieve memories by one of the five strategies.
    #[tool(description = "Query memories. query_type selects the strategy: similarity (embedding), temporal (start_time/end_time), type (memory_type), related (memory_id/depth), or keywords. Every returned memory counts as accessed.")]
    async fn query_memories(
        &self,
        Parameters(params): Parameters<QueryMemoriesParams>,
    ) -> Result<String, String> {
        tracing::info!(query_type = %params.query_type, "query_memories called");

        let memory_type = params
            .memory_type
            .as_deref()
            .map(str::parse::<MemoryType>)
            .transpose()
            .map_err(|e| e.to_string())?;

        let criteria = QueryCriteria {
            start_time: parse_time("start_time", params.start_time.as_deref())?,
            end_time: parse_time("end_time", params.end_time.as_deref())?,
            query_type: params.query_type,
            keywords: params.keywords.unwrap_or_default(),
            memory_type,
            embedding: params.embedding,
            memory_id: params.memory_id,
            depth: params.depth.unwrap_or(1),
            limit: params.limit.unwrap_or(0),
        };

        let memories = self
            .store
            .query(&criteria)
            .map_err(|e| format!("query failed: {e}"))?;
        to_json(&serde_json::json!({
            "total": memories.len(),
            "memories": memories,
        }))
    }

    /// Link two memories.
    #[tool(description = "Create a directed relationship between two existing memories (e.g. 'causes', 'part_of'). Strength 0.0-1.0, default 0.5.")]
    async fn create_relation(
        &self,
        Parameters(params): Parameters<CreateRelationParams>,
    ) -> Result<String, String> {
        tracing::info!(
            from = %params.from,
            to = %params.to,
            relation_type = %params.relation_type,
            "create_relation called"
        );
        let relation = self
            .store
            .create_relation(
                &params.from,
                &params.to,
                &params.relation_type,
                params.strength,
            )
            .map_err(|e| format!("create_relation failed: {e}"))?;
        to_json(&relation)
    }

    /// Get statistics about the memory store.
    #[tool(description = "Get memory store statistics: counts by type, relation count, capacity used, index sizes.")]
    async fn memory_stats(
        &self,
        Parameters(_params): Parameters<MemoryStatsParams>,
    ) -> Result<String, String> {
        tracing::debug!("memory_stats called");
        to_json(&self.store.stats())
    }

    /// Delete a memory and every index entry pointing at it.
    #[tool(description = "Permanently delete a memory by ID, along with its outgoing relations.")]
    async fn forget_memory(
        &self,
        Parameters(params): Parameters<ForgetMemoryParams>,
    ) -> Result<String, String> {
        let result = self
            .store
            .forget(&params.memory_id, params.reason.as_deref())
            .map_err(|e| format!("forget failed: {e}"))?;
        to_json(&result)
    }

    /// Inspect a specific memory by ID.
    #[tool(description = "Inspect a memory by ID. Returns full content, metadata, access statistics and outgoing relations without counting as an access.")]
    async fn memory_inspect(
        &self,
        Parameters(params): Parameters<MemoryInspectParams>,
    ) -> Result<String, String> {
        let inspected = self
            .store
            .inspect(&params.id)
            .map_err(|e| format!("inspect failed: {e}"))?;

        if params.include_relations.unwrap_or(true) {
            to_json(&inspected)
        } else {
            to_json(&serde_json::json!({ "memory": inspected.memory }))
        }
    }
}

impl MnemoTools {
    fn resources() -> Vec<Resource> {
        [
            (STATS_URI, "Memory Statistics", "Current memory store statistics"),
            (GRAPH_URI, "Memory Graph", "Memory relationship graph"),
        ]
        .into_iter()
        .map(|(uri, name, description)| {
            let mut raw = RawResource::new(uri, name);
            raw.description = Some(description.into());
            raw.mime_type = Some("application/json".into());
            raw.no_annotation()
        })
        .collect()
    }

    fn resource_json(&self, uri: &str) -> Result<String, ErrorData> {
        let json = match uri {
            STATS_URI => to_json(&self.store.stats()),
            GRAPH_URI => to_json(&self.store.graph_summary()),
            _ => {
                return Err(ErrorData::resource_not_found(
                    format!("unknown resource: {uri}"),
                    Some(serde_json::json!({ "uri": uri })),
                ))
            }
        };
        json.map_err(|e| ErrorData::internal_error(e, None))
    }
}

#[tool_handler]
impl ServerHandler for MnemoTools {
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: Self::resources(),
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        tracing::debug!(uri = %request.uri, "read_resource called");
        let text = self.resource_json(&request.uri)?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }

    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Mnemo is an in-process cognitive memory server. Use store_memory to save \
                 memories, query_memories to retrieve them, create_relation to link them, \
                 and memory_inspect to view details. Resources memory://stats and \
                 memory://graph summarize the store."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn tools() -> MnemoTools {
        MnemoTools::new(Arc::new(MemoryStore::default()))
    }

    fn store_params(content: &str, memory_type: Option<&str>) -> StoreMemoryParams {
        StoreMemoryParams {
            content: content.into(),
            r#type: memory_type.map(Into::into),
            importance: None,
            embedding: None,
            metadata: None,
            relations: None,
        }
    }

    fn query_params(query_type: &str) -> QueryMemoriesParams {
        QueryMemoriesParams {
            query_type: query_type.into(),
            keywords: None,
            memory_type: None,
            embedding: None,
            start_time: None,
            end_time: None,
            memory_id: None,
            depth: None,
            limit: None,
        }
    }

    async fn stored_id(tools: &MnemoTools, content: &str) -> String {
        let json = tools
            .store_memory(Parameters(store_params(content, None)))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        value["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn store_defaults_to_short_term() {
        let tools = tools();
        let json = tools
            .store_memory(Parameters(store_params("remember the milk", None)))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "short_term");
        assert_eq!(value["importance"], 0.5);
    }

    #[tokio::test]
    async fn store_rejects_unknown_type() {
        let err = tools()
            .store_memory(Parameters(store_params("x", Some("working"))))
            .await
            .unwrap_err();
        assert!(err.contains("unknown memory type"));
    }

    #[tokio::test]
    async fn keyword_query_round_trip() {
        let tools = tools();
        stored_id(&tools, "Elephant55 seen at the zoo").await;

        let mut params = query_params("keywords");
        params.keywords = Some(vec!["elephant55".into()]);
        let json = tools.query_memories(Parameters(params)).await.unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["memories"][0]["access_count"], 1);
    }

    #[tokio::test]
    async fn related_query_defaults_to_one_hop() {
        let tools = tools();
        let a = stored_id(&tools, "first").await;
        let b = stored_id(&tools, "second").await;
        let c = stored_id(&tools, "third").await;
        for (from, to) in [(&a, &b), (&b, &c)] {
            tools
                .create_relation(Parameters(CreateRelationParams {
                    from: from.clone(),
                    to: to.clone(),
                    relation_type: "next".into(),
                    strength: None,
                }))
                .await
                .unwrap();
        }

        let mut params = query_params("related");
        params.memory_id = Some(a);
        let json = tools.query_memories(Parameters(params)).await.unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["memories"][0]["id"], b.as_str());
    }

    #[tokio::test]
    async fn query_rejects_bad_time() {
        let mut params = query_params("temporal");
        params.start_time = Some("yesterday".into());
        let err = tools().query_memories(Parameters(params)).await.unwrap_err();
        assert!(err.contains("start_time"));
    }

    #[tokio::test]
    async fn forget_then_inspect_is_not_found() {
        let tools = tools();
        let id = stored_id(&tools, "short lived").await;

        let json = tools
            .memory_inspect(Parameters(MemoryInspectParams {
                id: id.clone(),
                include_relations: Some(false),
            }))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["memory"]["content"], "short lived");
        assert!(value.get("relations").is_none());

        tools
            .forget_memory(Parameters(ForgetMemoryParams {
                memory_id: id.clone(),
                reason: None,
            }))
            .await
            .unwrap();
        let err = tools
            .memory_inspect(Parameters(MemoryInspectParams {
                id,
                include_relations: None,
            }))
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn stats_report_capacity() {
        let tools = tools();
        stored_id(&tools, "one").await;
        let json = tools
            .memory_stats(Parameters(MemoryStatsParams::default()))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_memories"], 1);
        assert_eq!(value["by_type"]["short_term"], 1);
        assert_eq!(value["max_memories"], 1000);
    }

    #[test]
    fn lists_stats_and_graph_resources() {
        let uris: Vec<String> = MnemoTools::resources()
            .into_iter()
            .map(|r| r.raw.uri)
            .collect();
        assert_eq!(uris, vec![STATS_URI.to_string(), GRAPH_URI.to_string()]);
    }

    #[tokio::test]
    async fn resources_reflect_store_contents() {
        let tools = tools();
        let a = stored_id(&tools, "graph node one").await;
        let b = stored_id(&tools, "graph node two").await;
        tools
            .create_relation(Parameters(CreateRelationParams {
                from: a,
                to: b,
                relation_type: "next".into(),
                strength: None,
            }))
            .await
            .unwrap();

        let graph: Value = serde_json::from_str(&tools.resource_json(GRAPH_URI).unwrap()).unwrap();
        assert_eq!(graph["nodes"], 2);
        assert_eq!(graph["edges"], 1);

        let stats: Value = serde_json::from_str(&tools.resource_json(STATS_URI).unwrap()).unwrap();
        assert_eq!(stats["total_memories"], 2);
        assert_eq!(stats["total_relations"], 1);

        assert!(tools.resource_json("memory://nope").is_err());
    }
}
