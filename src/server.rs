//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that build the
//! engine, start its maintenance tasks, and wire it into a running server.

use crate::tools::MnemoTools;
use anyhow::Result;
use mnemo::config::MnemoConfig;
use mnemo::memory::maintenance::{self, MaintenanceHandle};
use mnemo::memory::MemoryStore;
use rmcp::ServiceExt;
use std::sync::Arc;

/// The running engine and its background tasks.
struct Engine {
    store: Arc<MemoryStore>,
    maintenance: Option<MaintenanceHandle>,
}

impl Engine {
    fn start(config: &MnemoConfig) -> Self {
        let store = Arc::new(MemoryStore::new(
            config.store.clone(),
            config.maintenance.clone(),
        ));
        tracing::info!(
            max_memories = store.config().max_memories,
            embedding_dim = store.config().embedding_dim,
            "memory store ready"
        );

        let maintenance = config
            .maintenance
            .enabled
            .then(|| maintenance::spawn(Arc::clone(&store), &config.maintenance));
        if maintenance.is_none() {
            tracing::info!("maintenance disabled");
        }

        Self { store, maintenance }
    }

    /// Cancel the maintenance tasks and wait for them to exit.
    async fn stop(self) {
        self.store.shutdown();
        if let Some(handle) = self.maintenance {
            handle.join().await;
        }
        tracing::info!(memories = self.store.len(), "engine stopped");
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MnemoConfig) -> Result<()> {
    tracing::info!("starting Mnemo MCP server on stdio");

    let engine = Engine::start(&config);
    let tools = MnemoTools::new(Arc::clone(&engine.store));
    let transport = rmcp::transport::stdio();

    let served = async {
        let server = tools.serve(transport).await?;
        tracing::info!("MCP server running, waiting for client");
        server.waiting().await?;
        anyhow::Ok(())
    };

    tokio::select! {
        result = served => result?,
        _ = shutdown_signal() => {}
    }
    tracing::info!("MCP server shut down");

    engine.stop().await;
    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: MnemoConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting Mnemo MCP server on HTTP");

    let engine = Engine::start(&config);
    let store = Arc::clone(&engine.store);

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(MnemoTools::new(Arc::clone(&store))),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.stop().await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
