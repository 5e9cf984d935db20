//! MCP transport layer for stdio and SSE.
//!
//! Both transports cancel in-flight research workers when the server stops.

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;

use super::server::ResearchMcpServer;

/// Starts the MCP server with stdio transport.
///
/// The server reads JSON-RPC messages from stdin and writes responses to stdout.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a runtime error.
pub async fn serve_stdio(server: ResearchMcpServer) -> anyhow::Result<()> {
    let orchestrator = std::sync::Arc::clone(server.orchestrator());
    tracing::info!(has_remote = orchestrator.has_remote(), "serving MCP over stdio");

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to start MCP server"))?;
    let reason = service.waiting().await?;

    tracing::info!(?reason, "MCP session ended");
    orchestrator.shutdown();
    Ok(())
}

/// Starts the MCP server with streamable HTTP transport.
///
/// Listens on the given host and port for incoming MCP connections at `/mcp`.
/// Named `serve_sse` for CLI familiarity; the underlying transport is MCP's
/// streamable HTTP (the successor to the legacy SSE transport). Every
/// session is served by a clone of `server`, sharing its orchestrator.
///
/// # Errors
///
/// Returns an error if the server fails to bind or encounters a runtime error.
pub async fn serve_sse(server: ResearchMcpServer, host: &str, port: u16) -> anyhow::Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };
    use std::sync::Arc;

    let ct = tokio_util::sync::CancellationToken::new();
    let orchestrator = Arc::clone(server.orchestrator());

    let service = StreamableHttpService::new(
        move || Ok::<_, std::io::Error>(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    let router = axum::Router::new().nest_service("/mcp", service);
    let addr = format!("{host}:{port}");
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        url = %format!("http://{addr}/mcp"),
        has_remote = orchestrator.has_remote(),
        "parallel-mcp server listening"
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            ct.cancel();
        })
        .await?;

    orchestrator.shutdown();
    Ok(())
}
