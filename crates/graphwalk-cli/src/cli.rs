use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "graphwalk", version, about = "Paginated breadth-first graph exploration engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a JSON fixture file seeding the in-memory graph store.
    /// Defaults to an empty graph.
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one page of a breadth-first traversal from a root entity, or
    /// resume a prior page via --cursor.
    Traverse {
        /// UUID of the root entity. Required unless --cursor is given.
        #[arg(long)]
        start: Option<String>,

        /// Maximum BFS depth, 0-5. Defaults to 1.
        #[arg(long)]
        depth: Option<u32>,

        /// Continuation cursor from a previous page.
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Find bounded-depth paths between two entities.
    FindPaths {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, default_value_t = 5)]
        max_depth: u32,

        #[arg(long, default_value_t = 10)]
        max_paths: usize,
    },

    /// Build a neighborhood subgraph around a set of seed entities.
    Subgraph {
        /// Seed entity UUIDs, comma-separated.
        #[arg(long, value_delimiter = ',')]
        entities: Vec<String>,

        #[arg(long, default_value_t = 1)]
        max_hop: u32,

        /// Additionally compute short paths between pairs of seeds.
        /// On by default; pass `--include-paths false` to skip them.
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
        include_paths: bool,
    },

    /// List the facts (edges) incident to one entity.
    Relations {
        #[arg(long)]
        entity: String,
    },

    /// Run the MCP server over stdio.
    Serve,
}
