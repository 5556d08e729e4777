use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ccafinder")]
#[command(about = "Find the community choice aggregation (CCA) programs an address is eligible for")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the eligibility API server
    Serve {
        /// Address to bind (defaults to CCA_BIND_ADDR or 127.0.0.1:8000)
        #[arg(short, long)]
        bind: Option<String>,

        /// Database file path
        #[arg(short, long)]
        database: Option<String>,

        /// City/ZIP directory CSV (uscities.csv layout)
        #[arg(long)]
        cities: Option<String>,
    },

    /// Load a CCA coverage sheet into the catalog
    Ingest {
        /// Coverage CSV file
        #[arg(short, long, default_value = "cca_coverage.csv")]
        csv: String,

        /// Clear the catalog before loading
        #[arg(long)]
        reset: bool,

        /// Database file path
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Look up eligible programs for an address and print them
    Search {
        /// Address, city, or ZIP code
        address: String,

        /// Eligibility API base URL (defaults to CCA_API_URL)
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Launch the terminal UI
    Tui {
        /// Eligibility API base URL (defaults to CCA_API_URL)
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Show catalog statistics
    Stats {
        /// Database file path
        #[arg(short, long)]
        database: Option<String>,
    },
}

impl Commands {
    /// The TUI owns the terminal, so it must not log to stderr
    pub fn is_interactive(&self) -> bool {
        matches!(self, Commands::Tui { .. })
    }
}
