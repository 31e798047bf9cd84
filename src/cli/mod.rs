//! CLI module for ontodeps.
//!
//! Subcommands:
//! - `init`: Connect to PostgreSQL and apply migrations
//! - `mcp`: Run the MCP server (stdio transport)
//! - `serve`: Run the HTTP API
//! - `extract`: Print the dependencies of a Turtle file
//! - `diff`: Print the change set between two ontology files

mod diff;
mod extract;
mod init;
mod mcp;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ontodeps - ontology change detection and microtheory dependency tracking
#[derive(Parser)]
#[command(name = "ontodeps")]
#[command(about = "Ontology change detection and microtheory dependency tracking")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the AGE graph and apply pending migrations
    Init,

    /// Run the MCP server (stdio transport for local use)
    Mcp,

    /// Run the HTTP API
    Serve {
        /// Host address to bind to (overrides `server.host`)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port`)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Extract ontology element references from a Turtle file
    Extract {
        file: PathBuf,

        /// Print declared elements instead of references
        #[arg(long)]
        declarations: bool,
    },

    /// Compare the declarations of two ontology files
    Diff { old: PathBuf, new: PathBuf },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Mcp => self.run_mcp().await,
            Command::Serve { ref host, port } => self.run_serve(host.clone(), port).await,
            Command::Extract {
                ref file,
                declarations,
            } => self.run_extract(file, declarations),
            Command::Diff { ref old, ref new } => self.run_diff(old, new),
        }
    }
}

/// Pretty JSON on stdout; logs stay on stderr.
fn print_json<T: serde::Serialize>(value: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
