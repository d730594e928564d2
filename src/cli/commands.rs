use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weighted-router")]
#[command(author, version, about = "Weighted supervisor routing over a closed set of agents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a single query
    Route {
        query: String,

        /// Per-agent weight override, `<agent id or slug>=<value>` (repeatable)
        #[arg(short, long = "weight", value_parser = parse_weight_override)]
        weights: Vec<(String, String)>,

        /// Named weight preset for this query, e.g. `soccer_focus`
        #[arg(long)]
        preset: Option<String>,

        /// Sample from the weighted distribution instead of calling the model
        #[arg(long)]
        offline: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Route queries read from stdin until quit
    Interactive {
        #[arg(long)]
        offline: bool,
    },

    /// Route queries from a file, one per line
    Batch {
        file: String,

        #[arg(short, long, default_value = "5")]
        concurrency: usize,

        #[arg(long)]
        offline: bool,
    },

    /// Per-agent selection statistics over the recorded history
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent routing decisions
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

pub fn parse_weight_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(agent, value)| (agent.trim().to_string(), value.trim().to_string()))
        .filter(|(agent, _)| !agent.is_empty())
        .ok_or_else(|| format!("expected <agent>=<value>, got '{}'", raw))
}

/// Words that end the interactive loop
pub fn is_exit_command(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "quit" | "exit" | "종료" | "q")
}
