use clap::{Parser, Subcommand};

/// Pseudogate — pseudonymization gateway for record linkage services
#[derive(Parser)]
#[command(name = "pseudogate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind (overrides PSEUDOGATE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Open and close one session to verify the linkage service is reachable
    Check,
}
