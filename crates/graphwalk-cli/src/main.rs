use anyhow::{Context, Result};
use clap::Parser;
use graphwalk_core::{GraphStore, TraverseRuntime};
use graphwalk_mcp::GraphwalkServer;
use graphwalk_store::InMemoryGraphStore;
use rmcp::{transport::stdio, ServiceExt};
use std::sync::Arc;

mod cli;
mod config;

use cli::{Cli, Commands};
use config::GraphwalkConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = GraphwalkConfig::from_env();

    let store: Arc<dyn GraphStore> = match &cli.fixture {
        Some(path) => Arc::new(
            InMemoryGraphStore::load_fixture(path)
                .await
                .with_context(|| format!("loading fixture {}", path.display()))?,
        ),
        None => Arc::new(InMemoryGraphStore::empty()),
    };

    match cli.command {
        Commands::Traverse { start, depth, cursor } => {
            let runtime = TraverseRuntime::new(config.cursor_secret.clone());
            let depth = depth.map(|d| d.min(config.max_depth));
            let response = runtime
                .traverse_with_budget(
                    store.as_ref(),
                    start.as_deref(),
                    depth,
                    cursor.as_deref(),
                    graphwalk_core::TokenBudget::new(config.max_tokens_per_response),
                )
                .await
                .map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?;
            print_json(&response)
        }
        Commands::FindPaths { from, to, max_depth, max_paths } => {
            let max_paths = max_paths.min(config.max_paths_per_call);
            let response = graphwalk_core::find_paths(store.as_ref(), &from, &to, max_depth, max_paths)
                .await
                .context("find_paths failed")?;
            print_json(&response)
        }
        Commands::Subgraph { entities, max_hop, include_paths } => {
            let max_hop = max_hop.min(config.max_subgraph_hop);
            let response = graphwalk_core::build_subgraph(store.as_ref(), &entities, include_paths, max_hop)
                .await
                .context("build_subgraph failed")?;
            print_json(&response)
        }
        Commands::Relations { entity } => {
            let response = graphwalk_core::get_entity_relations(store.as_ref(), &entity)
                .await
                .context("get_entity_relations failed")?;
            print_json(&response)
        }
        Commands::Serve => {
            tracing::info!("starting graphwalk MCP server on stdio");
            let server = GraphwalkServer::new(store, config.cursor_secret.clone());
            let service = server.serve(stdio()).await.context("starting MCP server")?;
            service.waiting().await.context("MCP server loop")?;
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serializing response")?);
    Ok(())
}
