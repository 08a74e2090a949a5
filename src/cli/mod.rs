//! CLI module for the co-occurrence service.
//!
//! Subcommands:
//! - `serve`: Run the TRAPI HTTP server

mod serve;

use clap::{Parser, Subcommand};

pub use serve::router;

/// Literature co-occurrence TRAPI service
#[derive(Parser)]
#[command(name = "cooccurrence")]
#[command(about = "TRAPI co-occurrence statistics over a text-mined concept store")]
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
    /// Run the TRAPI HTTP server
    Serve {
        /// Host address to bind to, overriding the configured value
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding the configured value
        #[arg(long)]
        port: Option<u16>,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Serve { ref host, port } => self.run_serve(host.as_deref(), port).await,
        }
    }
}
